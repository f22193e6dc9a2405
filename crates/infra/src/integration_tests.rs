//! Ledger-over-store tests.
//!
//! These exercise the full reservation path against `InMemoryTicketStore`,
//! including the concurrency properties the store contract promises.

use std::sync::Arc;

use proptest::prelude::*;

use eventick_ledger::{Ledger, LedgerError, NewEvent, Purchaser};

use crate::memory::{InMemoryTicketStore, InMemoryUserDirectory};

fn new_event(title: &str, capacity: u32) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        description: "integration".to_string(),
        date: "2026-03-15T18:00:00Z".parse().unwrap(),
        total_capacity: capacity,
    }
}

fn purchaser(n: usize) -> Purchaser {
    Purchaser {
        name: format!("Purchaser {n}"),
        email: format!("p{n}@example.com"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn twenty_racing_reserves_sell_exactly_ten_tickets() {
    let ledger = Arc::new(Ledger::new(InMemoryTicketStore::new()));
    let event = ledger.create_event(new_event("Race", 10)).await.unwrap();

    let barrier = Arc::new(tokio::sync::Barrier::new(20));
    let mut handles = Vec::new();
    for n in 0..20 {
        let ledger = ledger.clone();
        let barrier = barrier.clone();
        let event_id = event.id;
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ledger.reserve(event_id, 1, purchaser(n)).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(reservation) => {
                assert_eq!(reservation.registration.ticket_count, 1);
                successes += 1;
            }
            Err(LedgerError::InsufficientCapacity { remaining: 0, .. }) => insufficient += 1,
            Err(other) => panic!("unexpected reserve error: {other}"),
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(insufficient, 10);
    assert_eq!(ledger.get_availability(event.id).await.unwrap(), 0);

    let stats = ledger.stats().await.unwrap();
    assert_eq!(stats.total_events, 1);
    assert_eq!(stats.tickets_booked, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn reservations_for_different_events_proceed_independently() {
    let ledger = Arc::new(Ledger::new(InMemoryTicketStore::new()));
    let left = ledger.create_event(new_event("Left", 25)).await.unwrap();
    let right = ledger.create_event(new_event("Right", 25)).await.unwrap();

    let mut handles = Vec::new();
    for n in 0..50 {
        let ledger = ledger.clone();
        let event_id = if n % 2 == 0 { left.id } else { right.id };
        handles.push(tokio::spawn(async move {
            ledger.reserve(event_id, 1, purchaser(n)).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.get_availability(left.id).await.unwrap(), 0);
    assert_eq!(ledger.get_availability(right.id).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_event_cascades_to_registrations() {
    let ledger = Ledger::new(InMemoryTicketStore::new());
    let event = ledger.create_event(new_event("Gone", 10)).await.unwrap();
    ledger.reserve(event.id, 3, purchaser(1)).await.unwrap();

    ledger.delete_event(event.id).await.unwrap();

    assert_eq!(
        ledger.get_availability(event.id).await.unwrap_err(),
        LedgerError::EventNotFound(event.id)
    );
    let stats = ledger.stats().await.unwrap();
    assert_eq!(stats.total_events, 0);
    assert_eq!(stats.tickets_booked, 0);
}

#[tokio::test]
async fn events_list_is_ordered_by_scheduled_date() {
    let ledger = Ledger::new(InMemoryTicketStore::new());

    let mut later = new_event("Later", 5);
    later.date = "2026-06-01T10:00:00Z".parse().unwrap();
    let mut sooner = new_event("Sooner", 5);
    sooner.date = "2026-01-01T10:00:00Z".parse().unwrap();

    ledger.create_event(later).await.unwrap();
    ledger.create_event(sooner).await.unwrap();

    let titles: Vec<String> = ledger
        .list_events()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, vec!["Sooner".to_string(), "Later".to_string()]);
}

#[tokio::test]
async fn user_directory_rejects_duplicate_email() {
    use chrono::Utc;
    use eventick_auth::{DirectoryError, UserDirectory, UserRecord, hash_password};
    use eventick_core::UserId;

    let directory = InMemoryUserDirectory::new();
    let user = UserRecord {
        id: UserId::new(),
        email: "a@example.com".to_string(),
        password_digest: hash_password("pw"),
        created_at: Utc::now(),
    };

    directory.insert_user(&user).await.unwrap();
    let err = directory.insert_user(&user).await.unwrap_err();
    assert_eq!(err, DirectoryError::DuplicateEmail(user.email.clone()));

    let found = directory.find_by_email("a@example.com").await.unwrap();
    assert_eq!(found, Some(user));
}

proptest! {
    // Accounting identity: tickets_remaining always equals total_capacity
    // minus the sum of committed ticket counts, for arbitrary reserve
    // sequences.
    #[test]
    fn accounting_identity_holds_for_arbitrary_sequences(
        quantities in proptest::collection::vec(1u32..=15, 0..40)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            const CAPACITY: u32 = 40;
            let ledger = Ledger::new(InMemoryTicketStore::new());
            let event = ledger
                .create_event(new_event("Prop", CAPACITY))
                .await
                .unwrap();

            let mut committed = 0u32;
            for (n, quantity) in quantities.into_iter().enumerate() {
                match ledger.reserve(event.id, i64::from(quantity), purchaser(n)).await {
                    Ok(reservation) => {
                        committed += quantity;
                        assert_eq!(reservation.tickets_remaining, CAPACITY - committed);
                    }
                    Err(LedgerError::InsufficientCapacity { remaining, .. }) => {
                        assert_eq!(remaining, CAPACITY - committed);
                        assert!(quantity > remaining);
                    }
                    Err(other) => panic!("unexpected reserve error: {other}"),
                }

                assert_eq!(
                    ledger.get_availability(event.id).await.unwrap(),
                    CAPACITY - committed
                );
            }

            let stats = ledger.stats().await.unwrap();
            assert_eq!(stats.tickets_booked, u64::from(committed));
        });
    }
}
