//! ConnectionRegistry trait 定義
//!
//! 認証済みの当事者と、その当事者が現在持っているライブなチャンネルの
//! 対応を管理するポート。同一当事者の複数同時接続（マルチタブ）と、
//! グループ（「全オンラインドライバー」「この配車の当事者」）への
//! ブロードキャストをサポートします。
//!
//! 配信は best-effort です。ライブなチャンネルを持たない当事者への
//! 送信は単に何も届かないだけで、エラーにはなりません（キューイングや
//! リトライは行わない）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::value_object::{PartyId, Role};

/// チャンネルへのメッセージ送信用ハンドル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 1 本の WebSocket 接続を識別する ID
///
/// 当事者 ID とは独立。同一当事者が複数のチャンネルを持ちうる。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// 新しい ChannelId を採番（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// ブロードキャスト先のグループ
///
/// ロールベースのグループ（drivers）と、配車スコープのプライベート
/// ルーム（user_<id> / driver_<id>）の閉じた集合。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Group {
    /// オンラインの全ドライバー
    Drivers,
    /// 特定ユーザーのプライベートルーム
    User(PartyId),
    /// 特定ドライバーのプライベートルーム
    Driver(PartyId),
}

impl Group {
    /// ロールに対応するグループ
    pub fn for_role(role: Role, party_id: &PartyId) -> Group {
        match role {
            Role::User => Group::User(party_id.clone()),
            Role::Driver => Group::Driver(party_id.clone()),
        }
    }

    /// グループ名（ワイヤ上・ログ上の表記）
    pub fn label(&self) -> String {
        match self {
            Group::Drivers => "drivers".to_string(),
            Group::User(id) => format!("user_{}", id.as_str()),
            Group::Driver(id) => format!("driver_{}", id.as_str()),
        }
    }
}

/// ConnectionRegistry trait
///
/// プロセスローカル・インメモリ。Session Lifecycle だけが書き込み、
/// Dispatcher / Location Relay は読み取り（emit）のみ。
/// `emit_to_*` は配信できたチャンネル数を返す。0 件は正常系。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// チャンネルを当事者のエントリとロールグループに登録
    ///
    /// `party_id` / `role` は検証済みの identity assertion 由来で
    /// あること。クライアントのペイロードから渡してはならない。
    async fn register(
        &self,
        party_id: PartyId,
        role: Role,
        channel_id: ChannelId,
        sender: PusherChannel,
    );

    /// チャンネルをグループに参加させる（冪等）
    async fn join_group(&self, channel_id: &ChannelId, group: Group);

    /// チャンネルをグループから抜けさせる（冪等）
    async fn leave_group(&self, channel_id: &ChannelId, group: &Group);

    /// チャンネルを全グループと当事者エントリから除去する
    ///
    /// 当事者エントリの最後のチャンネルだった場合はエントリごと消える。
    /// 切断は複数回通知されうるため、同一チャンネルへの複数回呼び出しに
    /// 対して安全（冪等）であること。これが唯一のクリーンアップ経路で、
    /// バックグラウンドスイープは存在しない。
    async fn unregister(&self, channel_id: &ChannelId);

    /// 当事者の全チャンネルへメッセージを送信（best-effort）
    async fn emit_to_party(&self, party_id: &PartyId, message: &str) -> usize;

    /// グループの全チャンネルへメッセージを送信（best-effort）
    async fn emit_to_group(&self, group: &Group, message: &str) -> usize;

    /// 登録中のチャンネル数を取得
    async fn count_channels(&self) -> usize;
}
