//! UseCase: セッション終了（チャンネル除去）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectSessionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 切断が配車リクエストの状態に影響しないことを保証
//! - 二重切断通知に対して安全であることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：切断後に当事者へのブロードキャストが届かない
//! - 異常系：同一チャンネルの二重切断、未登録チャンネルの切断

use std::sync::Arc;

use crate::domain::{ChannelId, ConnectionRegistry};

/// セッション終了のユースケース
///
/// チャンネルの除去のみを行う。進行中の配車リクエストには一切
/// 触れない（切断でキャンセルや再 PENDING 化はしない）。
pub struct DisconnectSessionUseCase {
    /// ConnectionRegistry(通知の抽象化)
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectSessionUseCase {
    /// 新しい DisconnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// チャンネルを全グループと当事者エントリから除去する（冪等）
    pub async fn execute(&self, channel_id: &ChannelId) {
        self.registry.unregister(channel_id).await;
        tracing::info!("Session ended: channel '{}'", channel_id.as_str());
    }
}
