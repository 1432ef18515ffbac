//! UseCase: セッション開始（チャンネル登録）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectSessionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 接続直後にロールグループとプライベートルームへ参加していることを保証
//! - 同一当事者の複数接続（マルチタブ）が独立に扱われることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：ユーザー接続、ドライバー接続、同一当事者の 2 本目の接続

use std::sync::Arc;

use noriba_shared::time::Clock;

use crate::domain::{ChannelId, ConnectionRegistry, Group, PartyId, PusherChannel, Role, Timestamp};

/// セッション開始のユースケース
///
/// 検証済みの identity assertion を受けてチャンネルを採番・登録し、
/// ロールに応じたプライベートルームへ参加させる。ドライバーの
/// drivers グループへの参加は ConnectionRegistry が登録時に行う。
pub struct ConnectSessionUseCase {
    /// ConnectionRegistry(通知の抽象化)
    registry: Arc<dyn ConnectionRegistry>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl ConnectSessionUseCase {
    /// 新しい ConnectSessionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// チャンネルを登録し、接続時刻とともに ChannelId を返す
    pub async fn execute(
        &self,
        party_id: PartyId,
        role: Role,
        sender: PusherChannel,
    ) -> (ChannelId, Timestamp) {
        let channel_id = ChannelId::generate();
        self.registry
            .register(party_id.clone(), role, channel_id.clone(), sender)
            .await;
        self.registry
            .join_group(&channel_id, Group::for_role(role, &party_id))
            .await;

        tracing::info!(
            "Session started: party '{}' ({}) on channel '{}'",
            party_id.as_str(),
            role.as_str(),
            channel_id.as_str()
        );
        (channel_id, Timestamp::new(self.clock.now_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::WebSocketConnectionRegistry;
    use noriba_shared::time::FixedClock;
    use tokio::sync::mpsc;

    fn party(id: &str) -> PartyId {
        PartyId::new(id.to_string()).unwrap()
    }

    fn create_test_usecase(registry: Arc<WebSocketConnectionRegistry>) -> ConnectSessionUseCase {
        ConnectSessionUseCase::new(registry, Arc::new(FixedClock::new(1_700_000_000_000)))
    }

    #[tokio::test]
    async fn test_user_connection_joins_private_room() {
        // テスト項目: ユーザーの接続がプライベートルームに参加する
        // given (前提条件):
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let usecase = create_test_usecase(registry.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        let (_, connected_at) = usecase.execute(party("user-1"), Role::User, tx).await;

        // then (期待する結果):
        assert_eq!(connected_at, Timestamp::new(1_700_000_000_000));
        assert_eq!(registry.count_channels().await, 1);
        let delivered = registry
            .emit_to_group(&Group::User(party("user-1")), "hello")
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_driver_connection_joins_drivers_group() {
        // テスト項目: ドライバーの接続が drivers グループに参加する
        // given (前提条件):
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let usecase = create_test_usecase(registry.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        // when (操作):
        usecase.execute(party("driver-1"), Role::Driver, tx).await;

        // then (期待する結果):
        let delivered = registry.emit_to_group(&Group::Drivers, "broadcast").await;
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await, Some("broadcast".to_string()));
        let private = registry
            .emit_to_group(&Group::Driver(party("driver-1")), "direct")
            .await;
        assert_eq!(private, 1);
    }

    #[tokio::test]
    async fn test_multiple_connections_for_same_party() {
        // テスト項目: 同一当事者の 2 本目の接続が独立したチャンネルになる
        // given (前提条件):
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let usecase = create_test_usecase(registry.clone());
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        // when (操作):
        let (channel1, _) = usecase.execute(party("user-1"), Role::User, tx1).await;
        let (channel2, _) = usecase.execute(party("user-1"), Role::User, tx2).await;

        // then (期待する結果):
        assert_ne!(channel1, channel2);
        assert_eq!(registry.count_channels().await, 2);
        let delivered = registry.emit_to_party(&party("user-1"), "fanout").await;
        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await, Some("fanout".to_string()));
        assert_eq!(rx2.recv().await, Some("fanout".to_string()));
    }
}
