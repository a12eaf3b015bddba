//! Admission gate behavior: the capacity invariant at the write path,
//! including the concurrent checkout race the gate exists to win.
//!
//! These tests need a Postgres instance; point TEST_DATABASE_URL at one and
//! run with `cargo test -- --ignored`.

mod common;

use common::{calendar_at, cleanup_window, create_test_window, place_order_request, test_pool};
use futures::future::join_all;
use grocery_platform_backend::error::AppError;
use grocery_platform_backend::models::Order;
use grocery_platform_backend::services::{OrderService, SchedulingService};
use grocery_platform_shared::OrderStatus;

// 10:00 in Toronto (14:00 UTC, June): before the 13:00 cutoff
const MORNING_INSTANT: &str = "2025-06-10T14:00:00Z";
// 13:30 in Toronto: past the cutoff
const PAST_CUTOFF_INSTANT: &str = "2025-06-10T17:30:00Z";

fn services(pool: &sqlx::PgPool, instant: &str) -> (SchedulingService, OrderService) {
    let calendar = calendar_at(instant);
    let scheduling = SchedulingService::new(pool.clone(), calendar, 2);
    let orders = OrderService::new(pool.clone(), scheduling.clone());
    (scheduling, orders)
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing at a Postgres instance"]
async fn admission_grants_up_to_capacity_then_rejects() {
    let pool = test_pool().await;
    let window = create_test_window(&pool, (5, 0), (5, 45), Some(2)).await;
    let (scheduling, orders) = services(&pool, MORNING_INSTANT);

    let date = scheduling.calendar().civil_date(1);
    let time_slot = window.time_slot();

    orders
        .place_order(place_order_request(date, &time_slot))
        .await
        .expect("first admitted");
    orders
        .place_order(place_order_request(date, &time_slot))
        .await
        .expect("second admitted");

    let third = orders.place_order(place_order_request(date, &time_slot)).await;
    assert!(matches!(third, Err(AppError::SlotFull { .. })));

    let count = Order::count_for_slot(&pool, date, &time_slot)
        .await
        .expect("count");
    assert_eq!(count, 2);

    cleanup_window(&pool, &window).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing at a Postgres instance"]
async fn uncancelling_into_a_full_slot_is_refused() {
    let pool = test_pool().await;
    let window = create_test_window(&pool, (6, 0), (6, 45), Some(1)).await;
    let (scheduling, orders) = services(&pool, MORNING_INSTANT);

    let date = scheduling.calendar().civil_date(1);
    let time_slot = window.time_slot();

    let first = orders
        .place_order(place_order_request(date, &time_slot))
        .await
        .expect("admitted");

    orders
        .update_status(first.id, OrderStatus::Cancelled)
        .await
        .expect("cancelled");

    // The freed seat goes to a new order
    let second = orders
        .place_order(place_order_request(date, &time_slot))
        .await
        .expect("re-admitted after cancellation");

    // Un-cancelling the first order would re-occupy a now-full slot
    let result = orders.update_status(first.id, OrderStatus::Confirmed).await;
    assert!(matches!(result, Err(AppError::SlotFull { .. })));

    // The refused transition left the order cancelled and the slot at capacity
    let first_reloaded = orders.get_order(first.id).await.expect("lookup");
    assert_eq!(first_reloaded.status, OrderStatus::Cancelled);
    let count = Order::count_for_slot(&pool, date, &time_slot)
        .await
        .expect("count");
    assert_eq!(count, 1);

    // With the slot freed again, the same transition goes through
    orders
        .update_status(second.id, OrderStatus::Cancelled)
        .await
        .expect("cancelled");
    let readmitted = orders
        .update_status(first.id, OrderStatus::Confirmed)
        .await
        .expect("un-cancel admitted");
    assert_eq!(readmitted.status, OrderStatus::Confirmed);

    cleanup_window(&pool, &window).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "requires TEST_DATABASE_URL pointing at a Postgres instance"]
async fn concurrent_admissions_never_overbook_a_slot() {
    let pool = test_pool().await;
    let window = create_test_window(&pool, (7, 0), (7, 45), Some(3)).await;
    let (scheduling, orders) = services(&pool, MORNING_INSTANT);

    let date = scheduling.calendar().civil_date(1);
    let time_slot = window.time_slot();

    // 10 checkouts race for 3 seats
    let mut handles = Vec::new();
    for _ in 0..10 {
        let orders = orders.clone();
        let request = place_order_request(date, &time_slot);
        handles.push(tokio::spawn(async move { orders.place_order(request).await }));
    }

    let results = join_all(handles).await;

    let mut granted = 0;
    let mut rejected = 0;
    for result in results {
        match result.expect("task completed") {
            Ok(_) => granted += 1,
            Err(AppError::SlotFull { .. }) => rejected += 1,
            Err(e) => panic!("unexpected admission error: {}", e),
        }
    }

    assert_eq!(granted, 3, "exactly capacity admissions succeed");
    assert_eq!(rejected, 7, "every other checkout loses the race cleanly");

    // The persisted occupancy never exceeds capacity
    let count = Order::count_for_slot(&pool, date, &time_slot)
        .await
        .expect("count");
    assert_eq!(count, 3);

    cleanup_window(&pool, &window).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing at a Postgres instance"]
async fn same_day_order_past_the_cutoff_is_rejected() {
    let pool = test_pool().await;
    let window = create_test_window(&pool, (22, 0), (22, 45), Some(5)).await;
    let (scheduling, orders) = services(&pool, PAST_CUTOFF_INSTANT);

    let today = scheduling.calendar().civil_date(0);
    let result = orders
        .place_order(place_order_request(today, &window.time_slot()))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Tomorrow is past the cutoff's reach
    orders
        .place_order(place_order_request(
            scheduling.calendar().civil_date(1),
            &window.time_slot(),
        ))
        .await
        .expect("next-day order admitted");

    cleanup_window(&pool, &window).await;
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL pointing at a Postgres instance"]
async fn unknown_slot_and_out_of_horizon_dates_are_rejected() {
    let pool = test_pool().await;
    let window = create_test_window(&pool, (9, 0), (9, 45), Some(5)).await;
    let (scheduling, orders) = services(&pool, MORNING_INSTANT);

    let date = scheduling.calendar().civil_date(1);

    let bogus_slot = orders
        .place_order(place_order_request(date, "04:13-04:57"))
        .await;
    assert!(matches!(bogus_slot, Err(AppError::Validation(_))));

    let beyond_horizon = orders
        .place_order(place_order_request(
            scheduling.calendar().civil_date(9),
            &window.time_slot(),
        ))
        .await;
    assert!(matches!(beyond_horizon, Err(AppError::Validation(_))));

    let in_the_past = orders
        .place_order(place_order_request(
            scheduling.calendar().civil_date(-1),
            &window.time_slot(),
        ))
        .await;
    assert!(matches!(in_the_past, Err(AppError::Validation(_))));

    cleanup_window(&pool, &window).await;
}
