//! UseCase: 受諾試行処理（レースの裁定ポイント）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AcceptRequestUseCase::execute() メソッド
//! - 受諾レースの裁定（勝者 1 人の保証）と通知対象の選定
//!
//! ### なぜこのテストが必要か
//! - 「同一リクエストを受諾できるドライバーは必ず 1 人」はこの
//!   システムで唯一の正しさクリティカルな性質
//! - 裁定は Repository の条件付き更新に委譲されており、UseCase 層が
//!   ロックを持たないことを並行実行で確認する必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：PENDING リクエストの受諾と通知
//! - 異常系：受諾済み・キャンセル済み・存在しないリクエストへの受諾
//! - 並行系：多数のドライバーによる同時受諾（勝者はちょうど 1 人）

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Group, PartyId, RideId, RideRequest, RideRequestRepository, Timestamp,
};

use super::error::AcceptError;

/// 受諾試行のユースケース
///
/// ロック・mutex は一切持たない。PENDING → ACCEPTED の不可分性は
/// Repository の `accept_if_pending`（条件付き更新）が保証するため、
/// この UseCase が複数ワーカー・複数プロセスで並行実行されても
/// 勝者はちょうど 1 人になる。
pub struct AcceptRequestUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RideRequestRepository>,
    /// ConnectionRegistry（通知の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl AcceptRequestUseCase {
    /// 新しい AcceptRequestUseCase を作成
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

    /// 受諾試行を実行
    ///
    /// # Arguments
    ///
    /// * `ride_id` - 受諾対象の配車リクエスト ID
    /// * `driver_id` - 検証済みの受諾ドライバー ID（Domain Model）
    ///
    /// # Returns
    ///
    /// * `Ok(RideRequest)` - 受諾成功。遷移後のレコード
    /// * `Err(AcceptError)` - レース敗北・キャンセル済み・不存在など。
    ///   いずれの場合も状態は変化していない
    pub async fn execute(
        &self,
        ride_id: RideId,
        driver_id: PartyId,
    ) -> Result<RideRequest, AcceptError> {
        let at = Timestamp::new(self.clock.now_millis());
        let ride = self
            .repository
            .accept_if_pending(&ride_id, &driver_id, at)
            .await
            .map_err(AcceptError::from_repository)?;

        tracing::info!(
            "Ride request '{}' accepted by driver '{}'",
            ride.id.as_str(),
            driver_id.as_str()
        );
        Ok(ride)
    }

    /// rideAccepted をリクエストユーザーの全チャンネルへ通知
    pub async fn notify_user(&self, ride: &RideRequest, message: &str) -> usize {
        self.registry.emit_to_party(&ride.user_id, message).await
    }

    /// rideRequestClosed をドライバーグループへ通知
    ///
    /// 他のドライバーが UI から古いオファーを取り下げるための通知。
    /// 受諾したドライバー自身にも届くが、クライアント側で無害。
    pub async fn notify_drivers_closed(&self, message: &str) -> usize {
        self.registry.emit_to_group(&Group::Drivers, message).await
    }
}
