//! UseCase 層
//!
//! 1 操作 1 構造体。コンストラクタで `Arc<dyn Port>` を注入し、
//! Infrastructure 層の具体型には依存しません。

pub mod accept_request;
pub mod connect_session;
pub mod disconnect_session;
pub mod error;
pub mod list_active_requests;
pub mod report_location;
pub mod submit_request;
pub mod update_driver_status;
pub mod update_ride_status;

pub use accept_request::AcceptRequestUseCase;
pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{AcceptError, StatusUpdateError, SubmitError};
pub use list_active_requests::ListActiveRequestsUseCase;
pub use report_location::{DropReason, RelayOutcome, ReportLocationUseCase};
pub use submit_request::SubmitRequestUseCase;
pub use update_driver_status::UpdateDriverStatusUseCase;
pub use update_ride_status::UpdateRideStatusUseCase;
