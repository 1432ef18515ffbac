//! ドメイン層
//!
//! 配車ドメインの値オブジェクト・エンティティと、UseCase 層が依存する
//! ポート（Repository / ConnectionRegistry）の trait を定義します。

pub mod entity;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use entity::{
    DriverPresence, DriverProfile, LocationSample, RideRequest, RideStatus, TransitionError,
};
pub use registry::{ChannelId, ConnectionRegistry, Group, PusherChannel};
pub use repository::{DriverRepository, RepositoryError, RideRequestRepository};
pub use value_object::{Coordinate, PartyId, Place, RideId, Role, Timestamp, ValueError};
