//! UseCase: ドライバー位置の記録と中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ReportLocationUseCase::execute() メソッド
//! - 位置記録（常に実行）と、配車スコープ付き中継（条件付き）の分離
//!
//! ### なぜこのテストが必要か
//! - 担当外ドライバーの位置が他人のユーザーに漏れないことを保証
//! - 中継が落ちても位置記録は残ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：担当ドライバーの位置が対象ユーザーだけに届く
//! - 異常系：ride_id 無し、存在しない ride_id、担当外ドライバー

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Coordinate, DriverRepository, PartyId, RepositoryError, RideId,
    RideRequestRepository, Timestamp,
};

/// 中継の結果
///
/// 中継は best-effort であり、落とされても呼び出し側のエラーにはならない。
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// 対象ユーザーへ転送した（delivered はチャンネル数）
    Forwarded { user_id: PartyId, delivered: usize },
    /// ride_id が無いため位置記録のみ行った
    PresenceOnly,
    /// 中継を落とした（位置記録は済んでいる）
    Dropped(DropReason),
}

/// 中継を落とした理由
#[derive(Debug, Clone, PartialEq)]
pub enum DropReason {
    /// 指定された配車リクエストが存在しない
    RideNotFound,
    /// 報告元が配車リクエストの担当ドライバーではない
    DriverMismatch,
    /// ストアへの問い合わせに失敗した
    StoreUnavailable,
}

/// ドライバー位置の記録と中継のユースケース
pub struct ReportLocationUseCase {
    /// Repository（配車リクエストのデータアクセス層の抽象化）
    ride_repository: Arc<dyn RideRequestRepository>,
    /// Repository（ドライバー情報のデータアクセス層の抽象化）
    driver_repository: Arc<dyn DriverRepository>,
    /// ConnectionRegistry(通知の抽象化)
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl ReportLocationUseCase {
    /// 新しい ReportLocationUseCase を作成
    pub fn new(
        ride_repository: Arc<dyn RideRequestRepository>,
        driver_repository: Arc<dyn DriverRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ride_repository,
            driver_repository,
            registry,
            clock,
        }
    }

    /// 位置を記録し、配車スコープ内であれば対象ユーザーへ中継する
    ///
    /// 位置記録は中継の成否に関わらず必ず先に行う。中継は ride_id が
    /// 指定され、かつ報告元がその配車リクエストの担当ドライバーで
    /// ある場合のみ行う。
    ///
    /// # Arguments
    ///
    /// * `driver_id` - 検証済みの報告元ドライバー ID
    /// * `coordinate` - 報告された座標
    /// * `ride_id` - 中継対象の配車リクエスト ID（省略可）
    /// * `message` - シリアライズ済みの driverLocationUpdated メッセージ
    pub async fn execute(
        &self,
        driver_id: &PartyId,
        coordinate: Coordinate,
        ride_id: Option<RideId>,
        message: &str,
    ) -> RelayOutcome {
        let at = Timestamp::new(self.clock.now_millis());
        if let Err(e) = self
            .driver_repository
            .update_location(driver_id, coordinate, at)
            .await
        {
            tracing::error!(
                "Failed to record location for driver '{}': {}",
                driver_id.as_str(),
                e
            );
        }

        let Some(ride_id) = ride_id else {
            return RelayOutcome::PresenceOnly;
        };

        let ride = match self.ride_repository.find_by_id(&ride_id).await {
            Ok(Some(ride)) => ride,
            Ok(None) => {
                tracing::warn!(
                    "Dropping location relay: ride request '{}' not found",
                    ride_id.as_str()
                );
                return RelayOutcome::Dropped(DropReason::RideNotFound);
            }
            Err(RepositoryError::RideNotFound(_)) => {
                return RelayOutcome::Dropped(DropReason::RideNotFound);
            }
            Err(e) => {
                tracing::error!("Dropping location relay: {}", e);
                return RelayOutcome::Dropped(DropReason::StoreUnavailable);
            }
        };

        if ride.driver_id.as_ref() != Some(driver_id) {
            tracing::warn!(
                "Dropping location relay: driver '{}' is not assigned to ride request '{}'",
                driver_id.as_str(),
                ride_id.as_str()
            );
            return RelayOutcome::Dropped(DropReason::DriverMismatch);
        }

        let delivered = self.registry.emit_to_party(&ride.user_id, message).await;
        RelayOutcome::Forwarded {
            user_id: ride.user_id,
            delivered,
        }
    }
}
