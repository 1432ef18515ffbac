//! InMemory RideRequest Repository 実装
//!
//! ドメイン層が定義する RideRequestRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## 不可分性について
//!
//! `accept_if_pending` / `transition_if` は 1 回のロック取得の中で
//! 状態チェックと書き込みを行うため、この実装では Mutex が条件付き
//! 更新の不可分性を与えます。DBMS をバックエンドにする実装では、
//! 同じ契約を条件付き書き込み 1 回（期待状態をキーにした
//! compare-and-swap）で満たす必要があります。read-then-write の
//! 2 クエリに分解してはいけません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    PartyId, RepositoryError, RideId, RideRequest, RideRequestRepository, RideStatus, Timestamp,
};

struct Entry {
    /// 挿入順（newest-first ソートのタイブレーク用）
    seq: u64,
    ride: RideRequest,
}

/// インメモリ RideRequest Repository 実装
pub struct InMemoryRideRequestRepository {
    rides: Mutex<HashMap<String, Entry>>,
    next_seq: Mutex<u64>,
}

impl InMemoryRideRequestRepository {
    /// 新しい InMemoryRideRequestRepository を作成
    pub fn new() -> Self {
        Self {
            rides: Mutex::new(HashMap::new()),
            next_seq: Mutex::new(0),
        }
    }
}

impl Default for InMemoryRideRequestRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideRequestRepository for InMemoryRideRequestRepository {
    async fn create(&self, ride: RideRequest) -> Result<(), RepositoryError> {
        let seq = {
            let mut next = self.next_seq.lock().await;
            *next += 1;
            *next
        };
        let mut rides = self.rides.lock().await;
        rides.insert(ride.id.as_str().to_string(), Entry { seq, ride });
        Ok(())
    }

    async fn find_by_id(&self, ride_id: &RideId) -> Result<Option<RideRequest>, RepositoryError> {
        let rides = self.rides.lock().await;
        Ok(rides.get(ride_id.as_str()).map(|e| e.ride.clone()))
    }

    async fn accept_if_pending(
        &self,
        ride_id: &RideId,
        driver_id: &PartyId,
        at: Timestamp,
    ) -> Result<RideRequest, RepositoryError> {
        // チェックと書き込みを単一のロック区間で行う（条件付き更新）
        let mut rides = self.rides.lock().await;
        let entry = rides
            .get_mut(ride_id.as_str())
            .ok_or_else(|| RepositoryError::RideNotFound(ride_id.as_str().to_string()))?;

        let observed = entry.ride.status;
        entry
            .ride
            .accept(driver_id.clone(), at)
            .map_err(|_| RepositoryError::StateConflict {
                ride_id: ride_id.as_str().to_string(),
                observed,
            })?;

        Ok(entry.ride.clone())
    }

    async fn transition_if(
        &self,
        ride_id: &RideId,
        expected: &[RideStatus],
        to: RideStatus,
        at: Timestamp,
        reason: Option<String>,
    ) -> Result<RideRequest, RepositoryError> {
        let mut rides = self.rides.lock().await;
        let entry = rides
            .get_mut(ride_id.as_str())
            .ok_or_else(|| RepositoryError::RideNotFound(ride_id.as_str().to_string()))?;

        let observed = entry.ride.status;
        if !expected.contains(&observed) {
            return Err(RepositoryError::StateConflict {
                ride_id: ride_id.as_str().to_string(),
                observed,
            });
        }

        let result = match to {
            RideStatus::Completed => entry.ride.complete(at),
            RideStatus::Cancelled => entry.ride.cancel(at, reason),
            // PENDING / ACCEPTED への遷移はこの操作の対象外
            other => {
                return Err(RepositoryError::StateConflict {
                    ride_id: ride_id.as_str().to_string(),
                    observed: other,
                });
            }
        };
        result.map_err(|_| RepositoryError::StateConflict {
            ride_id: ride_id.as_str().to_string(),
            observed,
        })?;

        Ok(entry.ride.clone())
    }

    async fn list_pending(&self) -> Result<Vec<RideRequest>, RepositoryError> {
        let rides = self.rides.lock().await;
        let mut pending: Vec<(u64, RideRequest)> = rides
            .values()
            .filter(|e| e.ride.status == RideStatus::Pending)
            .map(|e| (e.seq, e.ride.clone()))
            .collect();
        // 作成の新しい順
        pending.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(pending.into_iter().map(|(_, ride)| ride).collect())
    }

    async fn list_all(&self) -> Result<Vec<RideRequest>, RepositoryError> {
        let rides = self.rides.lock().await;
        let mut all: Vec<(u64, RideRequest)> =
            rides.values().map(|e| (e.seq, e.ride.clone())).collect();
        all.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(all.into_iter().map(|(_, ride)| ride).collect())
    }
}
