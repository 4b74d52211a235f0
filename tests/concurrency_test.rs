mod common;

use common::{ScriptedGateway, default_handler, start_command, two_item_cart};
use placeorder::domain::cart::SessionId;
use placeorder::domain::payment::PaymentStatus;
use placeorder::domain::process::{AWAIT_PAYMENT_CONFIRMATION, SUCCESS};
use placeorder::error::PlaceOrderError;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_on_one_session() {
    let gateway = ScriptedGateway::default();
    let (handler, _) = default_handler(&gateway);
    let handler = Arc::new(handler);
    let session = SessionId::new("shared");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let handler = handler.clone();
            let session = session.clone();
            tokio::spawn(async move {
                handler
                    .start_place_order(&session, start_command(two_item_cart()))
                    .await
            })
        })
        .collect();

    let mut started = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(process) => {
                assert_eq!(process.current_state_name(), AWAIT_PAYMENT_CONFIRMATION);
                started += 1;
            }
            Err(PlaceOrderError::AnotherProcessRunning) => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(started, 1);
    assert_eq!(rejected, 7);
    assert_eq!(gateway.creates.load(Ordering::SeqCst), 1);
    assert_eq!(gateway.inner.intent_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refreshes_place_one_order() {
    let gateway = ScriptedGateway::default();
    let (handler, orders) = default_handler(&gateway);
    let handler = Arc::new(handler);
    let session = SessionId::new("shared");

    let process = handler
        .start_place_order(&session, start_command(two_item_cart()))
        .await
        .unwrap();
    gateway
        .inner
        .set_status(&process.uuid().to_string(), PaymentStatus::Completed);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let handler = handler.clone();
            let session = session.clone();
            tokio::spawn(async move { handler.refresh_place_order(&session).await })
        })
        .collect();

    for task in tasks {
        let refreshed = task.await.unwrap().unwrap();
        assert_eq!(refreshed.current_state_name(), SUCCESS);
        assert_eq!(refreshed.uuid(), process.uuid());
    }
    assert_eq!(orders.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_sessions_progress_independently() {
    let gateway = ScriptedGateway::default();
    let (handler, _) = default_handler(&gateway);
    let handler = Arc::new(handler);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let handler = handler.clone();
            tokio::spawn(async move {
                let session = SessionId::new(format!("session-{i}"));
                handler
                    .start_place_order(&session, start_command(two_item_cart()))
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(gateway.inner.intent_count(), 16);
}
