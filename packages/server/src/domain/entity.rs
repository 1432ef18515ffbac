//! エンティティ定義
//!
//! 配車リクエスト（RideRequest）のライフサイクル状態機械を中心とした
//! エンティティ群。状態遷移はエンティティ自身のメソッドでガードし、
//! 定義外の遷移をコンパイル時・実行時の両方で閉じ込めます。
//!
//! 許可される遷移:
//!
//! ```text
//! PENDING → ACCEPTED → COMPLETED
//! PENDING → CANCELLED
//! ACCEPTED → CANCELLED
//! ```
//!
//! COMPLETED / CANCELLED は終端状態で、以後の遷移は存在しません。

use serde::Serialize;
use thiserror::Error;

use super::value_object::{Coordinate, PartyId, Place, RideId, Timestamp};

/// 配車リクエストのライフサイクル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    /// 終端状態かどうか
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// 定義外の状態遷移エラー
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid ride transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: RideStatus,
    pub to: RideStatus,
}

/// 配車リクエスト
///
/// ユーザーとドライバープールの間の 1 回のマッチング試行を表す。
///
/// 不変条件:
/// - `driver_id.is_some()` ⇔ `status ∈ {Accepted, Completed}`
/// - `accepted_at.is_some()` ⇔ `driver_id.is_some()`
/// - `driver_id` を設定できるドライバーはリクエストごとに 1 人だけ
///   （Repository の条件付き更新で保証される。アプリケーション側の
///   ロックでは保証しない）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRequest {
    pub id: RideId,
    pub user_id: PartyId,
    pub user_name: String,
    pub user_phone: String,
    pub pickup: Place,
    pub drop: Place,
    pub distance_km: f64,
    pub fare: f64,
    pub status: RideStatus,
    pub driver_id: Option<PartyId>,
    pub created_at: Timestamp,
    pub accepted_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub cancellation_reason: Option<String>,
}

impl RideRequest {
    /// 新しい配車リクエストを PENDING 状態で作成
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RideId,
        user_id: PartyId,
        user_name: String,
        user_phone: String,
        pickup: Place,
        drop: Place,
        distance_km: f64,
        fare: f64,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            user_name,
            user_phone,
            pickup,
            drop,
            distance_km,
            fare,
            status: RideStatus::Pending,
            driver_id: None,
            created_at,
            accepted_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    /// PENDING → ACCEPTED の遷移
    ///
    /// PENDING 以外の状態からは失敗する。`driver_id` と `accepted_at` は
    /// この遷移でのみ設定される（set-once）。
    pub fn accept(&mut self, driver_id: PartyId, at: Timestamp) -> Result<(), TransitionError> {
        if self.status != RideStatus::Pending {
            return Err(TransitionError {
                from: self.status,
                to: RideStatus::Accepted,
            });
        }
        self.status = RideStatus::Accepted;
        self.driver_id = Some(driver_id);
        self.accepted_at = Some(at);
        Ok(())
    }

    /// ACCEPTED → COMPLETED の遷移
    pub fn complete(&mut self, at: Timestamp) -> Result<(), TransitionError> {
        if self.status != RideStatus::Accepted {
            return Err(TransitionError {
                from: self.status,
                to: RideStatus::Completed,
            });
        }
        self.status = RideStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }

    /// PENDING / ACCEPTED → CANCELLED の遷移
    pub fn cancel(&mut self, at: Timestamp, reason: Option<String>) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: RideStatus::Cancelled,
            });
        }
        self.status = RideStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.cancellation_reason = reason;
        Ok(())
    }
}

/// マッチング成立時にユーザーへ提示するドライバー情報
///
/// プロフィールや車両詳細の正式な管理は外部コラボレーターの責務。
/// ここでは通知ペイロードとして不透明に扱う。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverProfile {
    pub name: String,
    pub phone: String,
    pub rating: Option<f64>,
    pub vehicle_make: Option<String>,
    pub vehicle_model: Option<String>,
    pub license_plate: Option<String>,
}

/// ドライバーの在圏状態（オンライン状態 + 現在位置）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverPresence {
    pub driver_id: PartyId,
    pub is_online: bool,
    pub current_location: Option<Coordinate>,
    pub updated_at: Timestamp,
}

/// 位置情報サンプル
///
/// ドライバーのクライアントが位置変化のたびに生成する一時データ。
/// Location Relay が即時に消費し、履歴としては蓄積しない。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSample {
    pub driver_id: PartyId,
    pub ride_id: Option<RideId>,
    pub coordinate: Coordinate,
    pub at: Timestamp,
}
