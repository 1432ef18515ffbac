//! UseCase: 配車リクエスト送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SubmitRequestUseCase::execute() メソッド
//! - 配車リクエストの作成・永続化と、ドライバーグループへのファンアウト
//!
//! ### なぜこのテストが必要か
//! - 新規リクエストが PENDING 状態で保存されることを保証
//! - オンラインの全ドライバーに newRideRequest が届くことを確認
//! - ドライバーが 1 人もいない場合も正常系であることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：リクエスト作成とブロードキャスト
//! - エッジケース：接続中のドライバーが 0 人

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{
    ConnectionRegistry, Group, PartyId, Place, RideId, RideRequest, RideRequestRepository,
    Timestamp,
};

use super::error::SubmitError;

/// 配車リクエスト送信のユースケース
pub struct SubmitRequestUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RideRequestRepository>,
    /// ConnectionRegistry（ファンアウトの抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl SubmitRequestUseCase {
    /// 新しい SubmitRequestUseCase を作成
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

    /// 配車リクエスト送信を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 検証済みのリクエストユーザー ID（Domain Model）
    /// * `user_name` / `user_phone` - ドライバーへ提示する連絡先
    /// * `pickup` / `drop` - 乗車・降車地点（境界バリデーション済み）
    /// * `distance_km` / `fare` - 外部の運賃計算コラボレーターの算出値。
    ///   ここでは不透明な入力として扱い、妥当性検証は行わない
    ///
    /// # Returns
    ///
    /// * `Ok(RideRequest)` - PENDING 状態で保存されたリクエスト
    /// * `Err(SubmitError)` - 永続化失敗
    #[allow(clippy::too_many_arguments)]
    pub async fn execute(
        &self,
        user_id: PartyId,
        user_name: String,
        user_phone: String,
        pickup: Place,
        drop: Place,
        distance_km: f64,
        fare: f64,
    ) -> Result<RideRequest, SubmitError> {
        let created_at = Timestamp::new(self.clock.now_millis());
        let ride = RideRequest::new(
            RideId::generate(),
            user_id,
            user_name,
            user_phone,
            pickup,
            drop,
            distance_km,
            fare,
            created_at,
        );

        self.repository.create(ride.clone()).await?;
        tracing::info!(
            "Ride request '{}' created for user '{}'",
            ride.id.as_str(),
            ride.user_id.as_str()
        );

        Ok(ride)
    }

    /// newRideRequest をドライバーグループへブロードキャスト
    ///
    /// # Returns
    ///
    /// 配信できたチャンネル数（0 件は正常系）
    pub async fn broadcast_to_drivers(&self, message: &str) -> usize {
        let delivered = self.registry.emit_to_group(&Group::Drivers, message).await;
        tracing::debug!("Broadcasted new ride request to {} driver channel(s)", delivered);
        delivered
    }
}
