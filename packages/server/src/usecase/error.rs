//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, RideStatus};

/// 配車リクエスト送信のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("failed to persist ride request: {0}")]
    Repository(#[from] RepositoryError),
}

/// 受諾試行のエラー
///
/// レース敗北（AlreadyTaken）はリクエストしたドライバーにだけ
/// 通知される非致命エラー。他の当事者の状態は一切変化しない。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcceptError {
    #[error("ride request '{0}' not found")]
    NotFound(String),
    #[error("ride request '{0}' was already taken by another driver")]
    AlreadyTaken(String),
    #[error("ride request '{0}' was already cancelled")]
    AlreadyCancelled(String),
    #[error("ride request '{0}' is already completed")]
    AlreadyCompleted(String),
    #[error("failed to accept ride request: {0}")]
    Repository(RepositoryError),
}

impl AcceptError {
    /// RepositoryError から受諾エラーへの対応付け
    pub fn from_repository(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RideNotFound(ride_id) => AcceptError::NotFound(ride_id),
            RepositoryError::StateConflict { ride_id, observed } => match observed {
                RideStatus::Accepted => AcceptError::AlreadyTaken(ride_id),
                RideStatus::Cancelled => AcceptError::AlreadyCancelled(ride_id),
                RideStatus::Completed => AcceptError::AlreadyCompleted(ride_id),
                RideStatus::Pending => AcceptError::Repository(RepositoryError::StateConflict {
                    ride_id,
                    observed,
                }),
            },
            other => AcceptError::Repository(other),
        }
    }

    /// リクエストしたドライバーへ返すメッセージ
    pub fn driver_message(&self) -> &'static str {
        match self {
            AcceptError::NotFound(_) => "Ride request not found",
            AcceptError::AlreadyTaken(_) | AcceptError::AlreadyCancelled(_) => {
                "Ride is no longer available"
            }
            AcceptError::AlreadyCompleted(_) => "Ride is already completed",
            AcceptError::Repository(_) => "Failed to accept ride",
        }
    }
}

/// 完了・キャンセル遷移のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatusUpdateError {
    #[error("ride request '{0}' not found")]
    NotFound(String),
    #[error("ride request '{ride_id}' cannot transition {observed:?} -> {target:?}")]
    InvalidTransition {
        ride_id: String,
        observed: RideStatus,
        target: RideStatus,
    },
    /// COMPLETED / CANCELLED 以外を指定された
    #[error("unsupported target status: {0:?}")]
    UnsupportedTarget(RideStatus),
    /// リクエストの当事者（ユーザー・担当ドライバー）以外からの操作
    #[error("party is not authorized to update ride request '{0}'")]
    Unauthorized(String),
    #[error("failed to update ride status: {0}")]
    Repository(RepositoryError),
}
