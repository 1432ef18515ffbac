//! UseCase: 完了・キャンセル遷移処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateRideStatusUseCase::execute() メソッド
//! - COMPLETED / CANCELLED への条件付き遷移と当事者チェック
//!
//! ### なぜこのテストが必要か
//! - 状態機械の閉包性（定義外の遷移が観測されない）を保証
//! - 当事者以外からの遷移要求が拒否されることを確認
//! - CANCELLED の終端性（以後の受諾を先取りして拒否）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：ACCEPTED → COMPLETED、PENDING/ACCEPTED → CANCELLED
//! - 異常系：PENDING → COMPLETED、終端状態からの遷移、第三者からの要求

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, PartyId, RepositoryError, RideId, RideRequest, RideRequestRepository,
    RideStatus, Timestamp,
};

use super::error::StatusUpdateError;

/// 完了・キャンセル遷移のユースケース
pub struct UpdateRideStatusUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RideRequestRepository>,
    /// ConnectionRegistry(通知の抽象化)
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl UpdateRideStatusUseCase {
    /// 新しい UpdateRideStatusUseCase を作成
    pub fn new(
        repository: Arc<dyn RideRequestRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            clock,
        }
    }

    /// 完了・キャンセル遷移を実行
    ///
    /// 許可される遷移は ACCEPTED → COMPLETED と
    /// PENDING/ACCEPTED → CANCELLED のみ。遷移自体は Repository の
    /// 条件付き更新で行うため、並行する受諾試行と競合しても
    /// どちらか一方だけが成立する。
    ///
    /// # Arguments
    ///
    /// * `ride_id` - 対象の配車リクエスト ID
    /// * `actor` - 検証済みの操作者 ID。リクエストのユーザーまたは
    ///   担当ドライバーでなければ拒否される
    /// * `target` - COMPLETED または CANCELLED
    /// * `reason` - キャンセル理由（CANCELLED のときのみ意味を持つ）
    pub async fn execute(
        &self,
        ride_id: RideId,
        actor: &PartyId,
        target: RideStatus,
        reason: Option<String>,
    ) -> Result<RideRequest, StatusUpdateError> {
        let expected: &[RideStatus] = match target {
            RideStatus::Completed => &[RideStatus::Accepted],
            RideStatus::Cancelled => &[RideStatus::Pending, RideStatus::Accepted],
            other => return Err(StatusUpdateError::UnsupportedTarget(other)),
        };

        // 当事者チェック。遷移の不可分性はこのチェックに依存しない
        let ride = self
            .repository
            .find_by_id(&ride_id)
            .await
            .map_err(StatusUpdateError::Repository)?
            .ok_or_else(|| StatusUpdateError::NotFound(ride_id.as_str().to_string()))?;
        let is_party =
            ride.user_id == *actor || ride.driver_id.as_ref() == Some(actor);
        if !is_party {
            return Err(StatusUpdateError::Unauthorized(
                ride_id.as_str().to_string(),
            ));
        }

        let at = Timestamp::new(self.clock.now_millis());
        let updated = self
            .repository
            .transition_if(&ride_id, expected, target, at, reason)
            .await
            .map_err(|e| match e {
                RepositoryError::RideNotFound(id) => StatusUpdateError::NotFound(id),
                RepositoryError::StateConflict { ride_id, observed } => {
                    StatusUpdateError::InvalidTransition {
                        ride_id,
                        observed,
                        target,
                    }
                }
                other => StatusUpdateError::Repository(other),
            })?;

        tracing::info!(
            "Ride request '{}' transitioned to {:?} by '{}'",
            updated.id.as_str(),
            target,
            actor.as_str()
        );
        Ok(updated)
    }

    /// rideCompleted / rideCancelled を当事者へ通知
    ///
    /// ユーザーの全チャンネルと、マッチング済みの場合は担当ドライバーの
    /// 全チャンネルに届く。
    pub async fn notify_parties(&self, ride: &RideRequest, message: &str) -> usize {
        let mut delivered = self.registry.emit_to_party(&ride.user_id, message).await;
        if let Some(driver_id) = &ride.driver_id {
            delivered += self.registry.emit_to_party(driver_id, message).await;
        }
        delivered
    }
}
