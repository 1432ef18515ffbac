//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 正しさの要件
//!
//! このポート群の中で正しさが要求される操作は `accept_if_pending` と
//! `transition_if` の 2 つだけです。どちらも「期待する現在状態に一致する
//! 場合のみ更新する」単一の条件付き更新でなければなりません。
//! read-then-write の 2 操作に分解した実装は、並行な受諾リクエストの下で
//! 二重マッチを起こすため許されません。DBMS をバックエンドにする実装は
//! 条件付き書き込み 1 回（compare-and-swap 相当）にマップしてください。

use async_trait::async_trait;
use thiserror::Error;

use super::entity::{DriverPresence, RideRequest, RideStatus};
use super::value_object::{Coordinate, PartyId, RideId, Timestamp};

/// Repository 操作のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    /// 指定された配車リクエストが存在しない
    #[error("ride request '{0}' not found")]
    RideNotFound(String),
    /// 条件付き更新が現在状態と一致しなかった（observed は観測された状態）
    #[error("ride request '{ride_id}' state conflict (observed: {observed:?})")]
    StateConflict {
        ride_id: String,
        observed: RideStatus,
    },
    /// ストア自体が利用できない。リトライはこの層では行わない
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

/// RideRequest Repository trait
///
/// 配車リクエストのライフサイクル状態の唯一の信頼できる記録。
/// 受諾レースの裁定はこのポートの条件付き更新が担う。
#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    /// 配車リクエストを新規保存
    async fn create(&self, ride: RideRequest) -> Result<(), RepositoryError>;

    /// ID で配車リクエストを取得
    async fn find_by_id(&self, ride_id: &RideId) -> Result<Option<RideRequest>, RepositoryError>;

    /// PENDING の場合に限り ACCEPTED へ遷移させる条件付き更新
    ///
    /// 状態の読み取りと書き込みを単一の不可分な操作として行うこと。
    /// 成功時は遷移後のレコードを返す。PENDING でなかった場合は
    /// `StateConflict`（観測した状態つき）、存在しない場合は
    /// `RideNotFound` を返し、いずれも状態を変更しない。
    async fn accept_if_pending(
        &self,
        ride_id: &RideId,
        driver_id: &PartyId,
        at: Timestamp,
    ) -> Result<RideRequest, RepositoryError>;

    /// 現在状態が `expected` のいずれかである場合に限り `to` へ遷移させる
    ///
    /// COMPLETED / CANCELLED への遷移に使う。`reason` は CANCELLED のときのみ
    /// 意味を持つ。`accept_if_pending` と同じ不可分性の要件に従う。
    async fn transition_if(
        &self,
        ride_id: &RideId,
        expected: &[RideStatus],
        to: RideStatus,
        at: Timestamp,
        reason: Option<String>,
    ) -> Result<RideRequest, RepositoryError>;

    /// PENDING のリクエストを作成の新しい順で取得
    ///
    /// 「アクティブなリクエスト」の正準的な定義は `status == Pending`。
    async fn list_pending(&self) -> Result<Vec<RideRequest>, RepositoryError>;

    /// 全リクエストを取得（デバッグ用）
    async fn list_all(&self) -> Result<Vec<RideRequest>, RepositoryError>;
}

/// Driver Repository trait
///
/// ドライバーの在圏状態（オンライン状態・現在位置）の記録。
/// 配車リクエストのライフサイクルには関与しない。
#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// ドライバーの現在位置を更新（エントリが無ければ作成）
    async fn update_location(
        &self,
        driver_id: &PartyId,
        coordinate: Coordinate,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// ドライバーのオンライン状態を更新（エントリが無ければ作成）
    async fn set_availability(
        &self,
        driver_id: &PartyId,
        is_online: bool,
        coordinate: Option<Coordinate>,
        at: Timestamp,
    ) -> Result<(), RepositoryError>;

    /// ドライバーの在圏状態を取得
    async fn find(&self, driver_id: &PartyId) -> Result<Option<DriverPresence>, RepositoryError>;
}
