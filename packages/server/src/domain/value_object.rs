//! 値オブジェクト定義
//!
//! 配車ドメインで使う値オブジェクト。生成時にバリデーションを行い、
//! 不正な値がドメイン内に入り込まないようにします。

use serde::Serialize;
use thiserror::Error;

/// 値オブジェクトのバリデーションエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("party id must not be empty")]
    EmptyPartyId,
    #[error("party id must be 64 characters or less (got {0})")]
    PartyIdTooLong(usize),
    #[error("latitude must be in [-90, 90] (got {0})")]
    LatitudeOutOfRange(f64),
    #[error("longitude must be in [-180, 180] (got {0})")]
    LongitudeOutOfRange(f64),
    #[error("address must not be empty")]
    EmptyAddress,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

/// 認証済みの当事者（ユーザーまたはドライバー）の ID
///
/// 認証境界で検証された identity assertion からのみ生成されることを想定。
/// クライアントのペイロードから直接生成してはならない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PartyId(String);

impl PartyId {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.is_empty() {
            return Err(ValueError::EmptyPartyId);
        }
        if value.len() > 64 {
            return Err(ValueError::PartyIdTooLong(value.len()));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 当事者のロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Driver => "driver",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValueError> {
        match value {
            "user" => Ok(Role::User),
            "driver" => Ok(Role::Driver),
            other => Err(ValueError::UnknownRole(other.to_string())),
        }
    }
}

/// 配車リクエストの ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RideId(String);

impl RideId {
    /// 新しい RideId を採番（UUID v4）
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// 既存の ID 文字列から RideId を復元
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 緯度経度
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValueError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValueError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValueError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// 乗車地点・降車地点（住所ラベル + 座標）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    address: String,
    coordinate: Coordinate,
}

impl Place {
    pub fn new(address: String, coordinate: Coordinate) -> Result<Self, ValueError> {
        if address.trim().is_empty() {
            return Err(ValueError::EmptyAddress);
        }
        Ok(Self {
            address,
            coordinate,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }
}

/// Unix タイムスタンプ（UTC ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
