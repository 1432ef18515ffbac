//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - WebSocket の `UnboundedSender` をチャンネル単位で管理
//! - 当事者 → チャンネル集合、グループ → チャンネル集合の索引を維持
//! - 当事者・グループへのメッセージ送信（emit_to_party, emit_to_group）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に
//! 使用します。索引は 3 つの HashMap を単一の Mutex で守ります。
//! 当事者 1 人が複数のチャンネルを持てる（マルチタブ接続）ことと、
//! `unregister` の冪等性がこの実装の要点です。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChannelId, ConnectionRegistry, Group, PartyId, PusherChannel, Role};

struct ChannelEntry {
    party_id: PartyId,
    sender: PusherChannel,
}

#[derive(Default)]
struct RegistryInner {
    /// channel_id → 接続エントリ
    channels: HashMap<String, ChannelEntry>,
    /// party_id → その当事者のチャンネル集合
    parties: HashMap<String, HashSet<String>>,
    /// グループ名 → 参加チャンネル集合
    groups: HashMap<String, HashSet<String>>,
}

/// WebSocket を使った ConnectionRegistry 実装
///
/// プロセスローカル・インメモリ。グローバルなシングルトンにはせず、
/// `main` で構築して `Arc<dyn ConnectionRegistry>` として UseCase 層へ
/// 注入します。
pub struct WebSocketConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl WebSocketConnectionRegistry {
    /// 新しい WebSocketConnectionRegistry を作成
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }
}

impl Default for WebSocketConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn emit_to_channels(inner: &RegistryInner, channel_ids: &HashSet<String>, message: &str) -> usize {
    let mut delivered = 0;
    for channel_id in channel_ids {
        if let Some(entry) = inner.channels.get(channel_id) {
            // 個々のチャンネルへの送信失敗は許容する（best-effort）
            if let Err(e) = entry.sender.send(message.to_string()) {
                tracing::warn!(
                    "Failed to push message to channel '{}' (party '{}'): {}",
                    channel_id,
                    entry.party_id.as_str(),
                    e
                );
            } else {
                delivered += 1;
            }
        }
    }
    delivered
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn register(
        &self,
        party_id: PartyId,
        role: Role,
        channel_id: ChannelId,
        sender: PusherChannel,
    ) {
        let mut inner = self.inner.lock().await;
        inner.channels.insert(
            channel_id.as_str().to_string(),
            ChannelEntry {
                party_id: party_id.clone(),
                sender,
            },
        );
        inner
            .parties
            .entry(party_id.as_str().to_string())
            .or_default()
            .insert(channel_id.as_str().to_string());

        // ドライバーはロールグループ drivers に自動参加する
        if role == Role::Driver {
            inner
                .groups
                .entry(Group::Drivers.label())
                .or_default()
                .insert(channel_id.as_str().to_string());
        }

        tracing::debug!(
            "Channel '{}' registered for {} '{}'",
            channel_id.as_str(),
            role.as_str(),
            party_id.as_str()
        );
    }

    async fn join_group(&self, channel_id: &ChannelId, group: Group) {
        let mut inner = self.inner.lock().await;
        inner
            .groups
            .entry(group.label())
            .or_default()
            .insert(channel_id.as_str().to_string());
        tracing::debug!(
            "Channel '{}' joined group '{}'",
            channel_id.as_str(),
            group.label()
        );
    }

    async fn leave_group(&self, channel_id: &ChannelId, group: &Group) {
        let mut inner = self.inner.lock().await;
        if let Some(members) = inner.groups.get_mut(&group.label()) {
            members.remove(channel_id.as_str());
            if members.is_empty() {
                inner.groups.remove(&group.label());
            }
        }
    }

    async fn unregister(&self, channel_id: &ChannelId) {
        let mut inner = self.inner.lock().await;

        let Some(entry) = inner.channels.remove(channel_id.as_str()) else {
            // 切断は複数回通知されうる。2 回目以降は何もしない
            tracing::debug!(
                "Channel '{}' already unregistered, skipping",
                channel_id.as_str()
            );
            return;
        };

        // 当事者エントリから除去し、最後のチャンネルならエントリごと消す
        let party_key = entry.party_id.as_str().to_string();
        if let Some(channels) = inner.parties.get_mut(&party_key) {
            channels.remove(channel_id.as_str());
            if channels.is_empty() {
                inner.parties.remove(&party_key);
            }
        }

        // 全グループから除去する
        inner.groups.retain(|_, members| {
            members.remove(channel_id.as_str());
            !members.is_empty()
        });

        tracing::debug!(
            "Channel '{}' unregistered (party '{}')",
            channel_id.as_str(),
            entry.party_id.as_str()
        );
    }

    async fn emit_to_party(&self, party_id: &PartyId, message: &str) -> usize {
        let inner = self.inner.lock().await;
        let Some(channel_ids) = inner.parties.get(party_id.as_str()) else {
            // ライブなチャンネルを持たない当事者への送信は正常系の no-op
            tracing::debug!(
                "Party '{}' has no live channels, dropping message",
                party_id.as_str()
            );
            return 0;
        };
        emit_to_channels(&inner, channel_ids, message)
    }

    async fn emit_to_group(&self, group: &Group, message: &str) -> usize {
        let inner = self.inner.lock().await;
        let Some(channel_ids) = inner.groups.get(&group.label()) else {
            tracing::debug!("Group '{}' is empty, dropping message", group.label());
            return 0;
        };
        emit_to_channels(&inner, channel_ids, message)
    }

    async fn count_channels(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - WebSocketConnectionRegistry の登録・索引・送信機能
    // - emit_to_party: 当事者の全チャンネルへの送信（マルチタブ）
    // - emit_to_group: グループメンバーへの送信と非メンバーの除外
    // - unregister の冪等性と、最後のチャンネル切断での当事者エントリ削除
    //
    // 【なぜこのテストが必要か】
    // - Registry は Dispatcher / Location Relay のファンアウトの土台
    // - 「切断後にダングリングしたチャンネルが残らない」ことが唯一の
    //   正しさ要件であり、それを冪等な unregister が担う
    //
    // 【どのようなシナリオをテストするか】
    // 1. 当事者への送信（単一・複数チャンネル）
    // 2. グループ送信のスコープ
    // 3. unregister の冪等性
    // 4. 未接続当事者への送信が 0 件で正常終了すること
    // ========================================

    fn user(id: &str) -> PartyId {
        PartyId::new(id.to_string()).unwrap()
    }

    async fn register_channel(
        registry: &WebSocketConnectionRegistry,
        party: &str,
        role: Role,
    ) -> (ChannelId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let channel_id = ChannelId::generate();
        registry
            .register(user(party), role, channel_id.clone(), tx)
            .await;
        (channel_id, rx)
    }

    #[tokio::test]
    async fn test_emit_to_party_single_channel() {
        // テスト項目: 当事者のチャンネルにメッセージが届く
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (_channel, mut rx) = register_channel(&registry, "user-1", Role::User).await;

        // when (操作):
        let delivered = registry.emit_to_party(&user("user-1"), "hello").await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_emit_to_party_multiple_channels() {
        // テスト項目: 同一当事者の複数チャンネル全てにメッセージが届く（マルチタブ）
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (_c1, mut rx1) = register_channel(&registry, "user-1", Role::User).await;
        let (_c2, mut rx2) = register_channel(&registry, "user-1", Role::User).await;

        // when (操作):
        let delivered = registry.emit_to_party(&user("user-1"), "hello").await;

        // then (期待する結果):
        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await, Some("hello".to_string()));
        assert_eq!(rx2.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_emit_to_party_without_channels_is_noop() {
        // テスト項目: チャンネルを持たない当事者への送信が 0 件で正常終了する
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();

        // when (操作):
        let delivered = registry.emit_to_party(&user("offline-user"), "hello").await;

        // then (期待する結果): エラーにならず 0 件
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_drivers_join_role_group_on_register() {
        // テスト項目: ドライバーは登録時に drivers グループへ自動参加する
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (_d1, mut rx1) = register_channel(&registry, "driver-1", Role::Driver).await;
        let (_d2, mut rx2) = register_channel(&registry, "driver-2", Role::Driver).await;
        let (_u1, mut rx3) = register_channel(&registry, "user-1", Role::User).await;

        // when (操作):
        let delivered = registry.emit_to_group(&Group::Drivers, "new ride").await;

        // then (期待する結果): ドライバーだけに届く
        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await, Some("new ride".to_string()));
        assert_eq!(rx2.recv().await, Some("new ride".to_string()));
        assert!(rx3.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_group_is_idempotent() {
        // テスト項目: 同じグループへの重複参加でメッセージが二重配信されない
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (channel, mut rx) = register_channel(&registry, "user-1", Role::User).await;
        let group = Group::User(user("user-1"));
        registry.join_group(&channel, group.clone()).await;
        registry.join_group(&channel, group.clone()).await;

        // when (操作):
        let delivered = registry.emit_to_group(&group, "hello").await;

        // then (期待する結果):
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await, Some("hello".to_string()));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_removes_channel_from_groups_and_party() {
        // テスト項目: unregister でチャンネルが全グループと当事者エントリから消える
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (channel, _rx) = register_channel(&registry, "driver-1", Role::Driver).await;
        registry
            .join_group(&channel, Group::Driver(user("driver-1")))
            .await;

        // when (操作):
        registry.unregister(&channel).await;

        // then (期待する結果):
        assert_eq!(registry.count_channels().await, 0);
        assert_eq!(registry.emit_to_group(&Group::Drivers, "x").await, 0);
        assert_eq!(registry.emit_to_party(&user("driver-1"), "x").await, 0);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        // テスト項目: 同一チャンネルへの unregister 2 回が 1 回と同じ結果になる
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (c1, _rx1) = register_channel(&registry, "user-1", Role::User).await;
        let (_c2, mut rx2) = register_channel(&registry, "user-1", Role::User).await;

        // when (操作):
        registry.unregister(&c1).await;
        registry.unregister(&c1).await;

        // then (期待する結果): 残りのチャンネルには影響しない
        assert_eq!(registry.count_channels().await, 1);
        let delivered = registry.emit_to_party(&user("user-1"), "still here").await;
        assert_eq!(delivered, 1);
        assert_eq!(rx2.recv().await, Some("still here".to_string()));
    }

    #[tokio::test]
    async fn test_last_channel_unregister_removes_party_entry() {
        // テスト項目: 最後のチャンネル切断で当事者エントリ自体が消える
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (c1, _rx1) = register_channel(&registry, "user-1", Role::User).await;
        let (c2, _rx2) = register_channel(&registry, "user-1", Role::User).await;

        // when (操作):
        registry.unregister(&c1).await;
        registry.unregister(&c2).await;

        // then (期待する結果):
        assert_eq!(registry.count_channels().await, 0);
        assert_eq!(registry.emit_to_party(&user("user-1"), "x").await, 0);
    }

    #[tokio::test]
    async fn test_emit_to_group_after_leave_group() {
        // テスト項目: グループから抜けたチャンネルにはグループ配信が届かない
        // given (前提条件):
        let registry = WebSocketConnectionRegistry::new();
        let (channel, mut rx) = register_channel(&registry, "user-1", Role::User).await;
        let group = Group::User(user("user-1"));
        registry.join_group(&channel, group.clone()).await;

        // when (操作):
        registry.leave_group(&channel, &group).await;
        let delivered = registry.emit_to_group(&group, "hello").await;

        // then (期待する結果):
        assert_eq!(delivered, 0);
        assert!(rx.try_recv().is_err());
    }
}
