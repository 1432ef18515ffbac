//! Integration tests wiring the dispatch engine end to end, in process.
//!
//! Repositories, registry, and usecases are assembled exactly as the server
//! binary assembles them; the WebSocket transport is replaced by the
//! registry's channels so every delivery can be observed.

use std::sync::Arc;

use tokio::sync::mpsc;

use noriba_server::domain::{
    ChannelId, ConnectionRegistry, Coordinate, PartyId, Place, Role,
};
use noriba_server::infrastructure::registry::WebSocketConnectionRegistry;
use noriba_server::infrastructure::repository::{
    InMemoryDriverRepository, InMemoryRideRequestRepository,
};
use noriba_server::usecase::{
    AcceptError, AcceptRequestUseCase, ConnectSessionUseCase, DisconnectSessionUseCase,
    ListActiveRequestsUseCase, RelayOutcome, ReportLocationUseCase, SubmitRequestUseCase,
    UpdateRideStatusUseCase,
};
use noriba_shared::time::SystemClock;

/// Fully wired dispatch engine, as the server binary assembles it
struct Engine {
    registry: Arc<WebSocketConnectionRegistry>,
    submit: SubmitRequestUseCase,
    accept: Arc<AcceptRequestUseCase>,
    status: UpdateRideStatusUseCase,
    relay: ReportLocationUseCase,
    list: ListActiveRequestsUseCase,
    connect: ConnectSessionUseCase,
    disconnect: DisconnectSessionUseCase,
}

fn build_engine() -> Engine {
    let ride_repository = Arc::new(InMemoryRideRequestRepository::new());
    let driver_repository = Arc::new(InMemoryDriverRepository::new());
    let registry = Arc::new(WebSocketConnectionRegistry::new());
    let clock = Arc::new(SystemClock);

    Engine {
        registry: registry.clone(),
        submit: SubmitRequestUseCase::new(
            ride_repository.clone(),
            registry.clone(),
            clock.clone(),
        ),
        accept: Arc::new(AcceptRequestUseCase::new(
            ride_repository.clone(),
            registry.clone(),
            clock.clone(),
        )),
        status: UpdateRideStatusUseCase::new(
            ride_repository.clone(),
            registry.clone(),
            clock.clone(),
        ),
        relay: ReportLocationUseCase::new(
            ride_repository.clone(),
            driver_repository,
            registry.clone(),
            clock.clone(),
        ),
        list: ListActiveRequestsUseCase::new(ride_repository.clone()),
        connect: ConnectSessionUseCase::new(registry.clone(), clock.clone()),
        disconnect: DisconnectSessionUseCase::new(registry),
    }
}

fn party(id: &str) -> PartyId {
    PartyId::new(id.to_string()).unwrap()
}

fn place(address: &str, lat: f64, lng: f64) -> Place {
    Place::new(address.to_string(), Coordinate::new(lat, lng).unwrap()).unwrap()
}

async fn connect(
    engine: &Engine,
    id: &str,
    role: Role,
) -> (ChannelId, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (channel_id, _) = engine.connect.execute(party(id), role, tx).await;
    (channel_id, rx)
}

async fn submit_ride(engine: &Engine, user_id: &str) -> noriba_server::domain::RideRequest {
    engine
        .submit
        .execute(
            party(user_id),
            "Alice".to_string(),
            "080-0000-0001".to_string(),
            place("booth-1", 35.0, 135.0),
            place("main-st", 35.1, 135.1),
            4.2,
            50.0,
        )
        .await
        .unwrap()
}

fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        messages.push(msg);
    }
    messages
}

#[tokio::test]
async fn test_request_fans_out_to_all_online_drivers() {
    // テスト項目: 配車リクエストがオンラインの全ドライバーに届く
    // given (前提条件):
    let engine = build_engine();
    let (_, mut driver1_rx) = connect(&engine, "driver-1", Role::Driver).await;
    let (_, mut driver2_rx) = connect(&engine, "driver-2", Role::Driver).await;
    let (_, mut user_rx) = connect(&engine, "user-1", Role::User).await;

    // when (操作):
    let ride = submit_ride(&engine, "user-1").await;
    let delivered = engine
        .submit
        .broadcast_to_drivers(&format!(r#"{{"type":"newRideRequest","rideId":"{}"}}"#, ride.id.as_str()))
        .await;

    // then (期待する結果):
    assert_eq!(delivered, 2);
    assert_eq!(drain(&mut driver1_rx).len(), 1);
    assert_eq!(drain(&mut driver2_rx).len(), 1);
    assert!(drain(&mut user_rx).is_empty());
}

#[tokio::test]
async fn test_accept_notifies_user_and_closes_offer() {
    // テスト項目: 受諾でユーザーに通知が届き、全ドライバーにクローズが届く
    // given (前提条件):
    let engine = build_engine();
    let (_, mut user_rx) = connect(&engine, "user-1", Role::User).await;
    let (_, mut driver1_rx) = connect(&engine, "driver-1", Role::Driver).await;
    let (_, mut driver2_rx) = connect(&engine, "driver-2", Role::Driver).await;
    let ride = submit_ride(&engine, "user-1").await;

    // when (操作):
    let accepted = engine
        .accept
        .execute(ride.id.clone(), party("driver-1"))
        .await
        .unwrap();
    engine
        .accept
        .notify_user(&accepted, r#"{"type":"rideAccepted"}"#)
        .await;
    engine
        .accept
        .notify_drivers_closed(r#"{"type":"rideRequestClosed"}"#)
        .await;

    // then (期待する結果):
    let user_messages = drain(&mut user_rx);
    assert_eq!(user_messages, vec![r#"{"type":"rideAccepted"}"#.to_string()]);
    assert_eq!(drain(&mut driver1_rx).len(), 1);
    assert_eq!(drain(&mut driver2_rx).len(), 1);
}

#[tokio::test]
async fn test_concurrent_accepts_produce_exactly_one_winner() {
    // テスト項目: 多数の同時受諾で勝者がちょうど 1 人になる
    // given (前提条件):
    let engine = build_engine();
    let ride = submit_ride(&engine, "user-1").await;

    // when (操作): 50 人のドライバーが同時に受諾を試みる
    let mut handles = Vec::new();
    for i in 0..50 {
        let accept = engine.accept.clone();
        let ride_id = ride.id.clone();
        handles.push(tokio::spawn(async move {
            accept.execute(ride_id, party(&format!("driver-{}", i))).await
        }));
    }

    let mut winners = Vec::new();
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(ride) => winners.push(ride),
            Err(AcceptError::AlreadyTaken(_)) => losers += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    // then (期待する結果):
    assert_eq!(winners.len(), 1);
    assert_eq!(losers, 49);
    // 勝者として記録されたドライバーと、成功応答を得たドライバーが一致する
    assert!(winners[0].driver_id.is_some());
}

#[tokio::test]
async fn test_cancelled_request_cannot_be_accepted() {
    // テスト項目: キャンセル済みリクエストへの受諾が拒否される
    // given (前提条件):
    let engine = build_engine();
    let ride = submit_ride(&engine, "user-1").await;
    engine
        .status
        .execute(
            ride.id.clone(),
            &party("user-1"),
            noriba_server::domain::RideStatus::Cancelled,
            Some("changed my mind".to_string()),
        )
        .await
        .unwrap();

    // when (操作):
    let result = engine.accept.execute(ride.id.clone(), party("driver-1")).await;

    // then (期待する結果):
    assert!(matches!(result, Err(AcceptError::AlreadyCancelled(_))));
    assert!(engine.list.execute().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_location_relay_is_scoped_to_the_ride_owner() {
    // テスト項目: 位置中継が対象ユーザーだけに順序通り届く
    // given (前提条件): 2 人のユーザーがそれぞれ配車を持つ
    let engine = build_engine();
    let (_, mut user1_rx) = connect(&engine, "user-1", Role::User).await;
    let (_, mut user2_rx) = connect(&engine, "user-2", Role::User).await;

    let ride1 = submit_ride(&engine, "user-1").await;
    let _ride2 = submit_ride(&engine, "user-2").await;
    engine
        .accept
        .execute(ride1.id.clone(), party("driver-1"))
        .await
        .unwrap();

    // when (操作): 担当ドライバーが 5 回位置を報告する
    for i in 0..5 {
        let outcome = engine
            .relay
            .execute(
                &party("driver-1"),
                Coordinate::new(35.0 + f64::from(i) * 0.01, 135.0).unwrap(),
                Some(ride1.id.clone()),
                &format!(r#"{{"type":"driverLocationUpdated","seq":{}}}"#, i),
            )
            .await;
        assert!(matches!(outcome, RelayOutcome::Forwarded { .. }));
    }

    // then (期待する結果): user-1 に 5 件が送信順で届き、user-2 には届かない
    let user1_messages = drain(&mut user1_rx);
    assert_eq!(user1_messages.len(), 5);
    for (i, msg) in user1_messages.iter().enumerate() {
        assert!(msg.contains(&format!(r#""seq":{}"#, i)));
    }
    assert!(drain(&mut user2_rx).is_empty());
}

#[tokio::test]
async fn test_unassigned_driver_location_is_not_relayed() {
    // テスト項目: 担当外ドライバーの位置が他人のユーザーに漏れない
    // given (前提条件):
    let engine = build_engine();
    let (_, mut user_rx) = connect(&engine, "user-1", Role::User).await;
    let ride = submit_ride(&engine, "user-1").await;
    engine
        .accept
        .execute(ride.id.clone(), party("driver-1"))
        .await
        .unwrap();

    // when (操作): 別のドライバーが同じ配車 ID で報告する
    let outcome = engine
        .relay
        .execute(
            &party("driver-2"),
            Coordinate::new(35.0, 135.0).unwrap(),
            Some(ride.id.clone()),
            r#"{"type":"driverLocationUpdated"}"#,
        )
        .await;

    // then (期待する結果):
    assert!(matches!(outcome, RelayOutcome::Dropped(_)));
    assert!(drain(&mut user_rx).is_empty());
}

#[tokio::test]
async fn test_disconnect_does_not_touch_ride_state() {
    // テスト項目: 切断が進行中の配車リクエストに影響しない
    // given (前提条件):
    let engine = build_engine();
    let (user_channel, _user_rx) = connect(&engine, "user-1", Role::User).await;
    let ride = submit_ride(&engine, "user-1").await;

    // when (操作): ユーザーが切断し、二重に切断通知が届く
    engine.disconnect.execute(&user_channel).await;
    engine.disconnect.execute(&user_channel).await;

    // then (期待する結果): リクエストは PENDING のまま受諾可能
    let pending = engine.list.execute().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, ride.id);
    assert!(engine.accept.execute(ride.id, party("driver-1")).await.is_ok());
}

#[tokio::test]
async fn test_reconnected_driver_sees_pending_requests_newest_first() {
    // テスト項目: 後から接続したドライバーがアクティブ一覧を新しい順で取得できる
    // given (前提条件): 3 件中 1 件が受諾済み
    let engine = build_engine();
    let first = submit_ride(&engine, "user-1").await;
    let second = submit_ride(&engine, "user-2").await;
    let third = submit_ride(&engine, "user-3").await;
    engine
        .accept
        .execute(second.id.clone(), party("driver-1"))
        .await
        .unwrap();

    // when (操作):
    let pending = engine.list.execute().await.unwrap();

    // then (期待する結果):
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, third.id);
    assert_eq!(pending[1].id, first.id);
}

#[tokio::test]
async fn test_multi_channel_party_receives_on_every_tab() {
    // テスト項目: 同一ユーザーの複数接続すべてに通知が届く
    // given (前提条件):
    let engine = build_engine();
    let (_, mut tab1_rx) = connect(&engine, "user-1", Role::User).await;
    let (_, mut tab2_rx) = connect(&engine, "user-1", Role::User).await;
    let ride = submit_ride(&engine, "user-1").await;
    let accepted = engine
        .accept
        .execute(ride.id.clone(), party("driver-1"))
        .await
        .unwrap();

    // when (操作):
    let delivered = engine
        .accept
        .notify_user(&accepted, r#"{"type":"rideAccepted"}"#)
        .await;

    // then (期待する結果):
    assert_eq!(delivered, 2);
    assert_eq!(drain(&mut tab1_rx).len(), 1);
    assert_eq!(drain(&mut tab2_rx).len(), 1);
}

#[tokio::test]
async fn test_full_ride_lifecycle_reaches_completed() {
    // テスト項目: PENDING → ACCEPTED → COMPLETED の全工程が通る
    // given (前提条件):
    let engine = build_engine();
    let ride = submit_ride(&engine, "user-1").await;

    // when (操作):
    let accepted = engine
        .accept
        .execute(ride.id.clone(), party("driver-1"))
        .await
        .unwrap();
    let completed = engine
        .status
        .execute(
            accepted.id.clone(),
            &party("driver-1"),
            noriba_server::domain::RideStatus::Completed,
            None,
        )
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(completed.status, noriba_server::domain::RideStatus::Completed);
    assert!(completed.accepted_at.is_some());
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.driver_id, Some(party("driver-1")));
    // 完了後はアクティブ一覧に現れない
    assert!(engine.list.execute().await.unwrap().is_empty());
    // レジストリのチャンネル数は 0（誰も接続していない）
    assert_eq!(engine.registry.count_channels().await, 0);
}
