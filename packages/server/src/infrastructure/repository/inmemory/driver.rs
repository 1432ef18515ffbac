//! InMemory Driver Repository 実装
//!
//! ドライバーの在圏状態（オンライン状態・現在位置）のインメモリ実装。
//! 配車リクエストのライフサイクルとは独立した、presence 用の記録です。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Coordinate, DriverPresence, DriverRepository, PartyId, RepositoryError, Timestamp,
};

/// インメモリ Driver Repository 実装
pub struct InMemoryDriverRepository {
    drivers: Mutex<HashMap<String, DriverPresence>>,
}

impl InMemoryDriverRepository {
    /// 新しい InMemoryDriverRepository を作成
    pub fn new() -> Self {
        Self {
            drivers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDriverRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverRepository for InMemoryDriverRepository {
    async fn update_location(
        &self,
        driver_id: &PartyId,
        coordinate: Coordinate,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut drivers = self.drivers.lock().await;
        drivers
            .entry(driver_id.as_str().to_string())
            .and_modify(|presence| {
                presence.current_location = Some(coordinate);
                presence.updated_at = at;
            })
            .or_insert_with(|| DriverPresence {
                driver_id: driver_id.clone(),
                is_online: true,
                current_location: Some(coordinate),
                updated_at: at,
            });
        Ok(())
    }

    async fn set_availability(
        &self,
        driver_id: &PartyId,
        is_online: bool,
        coordinate: Option<Coordinate>,
        at: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut drivers = self.drivers.lock().await;
        drivers
            .entry(driver_id.as_str().to_string())
            .and_modify(|presence| {
                presence.is_online = is_online;
                if let Some(coordinate) = coordinate {
                    presence.current_location = Some(coordinate);
                }
                presence.updated_at = at;
            })
            .or_insert_with(|| DriverPresence {
                driver_id: driver_id.clone(),
                is_online,
                current_location: coordinate,
                updated_at: at,
            });
        Ok(())
    }

    async fn find(&self, driver_id: &PartyId) -> Result<Option<DriverPresence>, RepositoryError> {
        let drivers = self.drivers.lock().await;
        Ok(drivers.get(driver_id.as_str()).cloned())
    }
}
