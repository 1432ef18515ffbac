//! UseCase: ドライバーのオンライン状態更新
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - UpdateDriverStatusUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - オンライン・オフラインの切り替えが在圏記録に反映されることを保証
//! - オフライン化しても最後の位置が残ることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：位置つきオンライン化、オフライン化
//! - 異常系：未登録ドライバーのオフライン化

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{Coordinate, DriverRepository, PartyId, RepositoryError, Timestamp};

/// ドライバーのオンライン状態更新のユースケース
pub struct UpdateDriverStatusUseCase {
    /// Repository（ドライバー情報のデータアクセス層の抽象化）
    driver_repository: Arc<dyn DriverRepository>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl UpdateDriverStatusUseCase {
    /// 新しい UpdateDriverStatusUseCase を作成
    pub fn new(driver_repository: Arc<dyn DriverRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            driver_repository,
            clock,
        }
    }

    /// オンライン状態を更新する
    ///
    /// `coordinate` はオンライン化と同時に位置を報告する場合のみ指定。
    /// 在圏記録の更新であって、drivers グループへの参加・離脱は
    /// 接続のライフサイクル側が管理する。
    pub async fn execute(
        &self,
        driver_id: &PartyId,
        is_online: bool,
        coordinate: Option<Coordinate>,
    ) -> Result<(), RepositoryError> {
        let at = Timestamp::new(self.clock.now_millis());
        self.driver_repository
            .set_availability(driver_id, is_online, coordinate, at)
            .await?;

        tracing::info!(
            "Driver '{}' is now {}",
            driver_id.as_str(),
            if is_online { "online" } else { "offline" }
        );
        Ok(())
    }
}
