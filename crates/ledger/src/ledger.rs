//! Reservation arbitration over a [`TicketStore`].
//!
//! `Ledger` is the only code path permitted to mutate `tickets_remaining`.
//! The decision "is there enough capacity" and "apply the decrement" are
//! never two independent steps: both live inside the store's atomic
//! `commit_registration`, and the ledger's job is validation, outcome
//! classification, and a bounded retry when a conditional write loses a
//! race.

use chrono::{DateTime, Utc};
use thiserror::Error;

use eventick_core::{EventId, RegistrationId};

use crate::model::{Event, LedgerStats, Purchaser, Registration, Reservation};
use crate::store::{ReserveOutcome, StoreError, TicketStore};

/// Ledger-level error taxonomy.
///
/// Every variant is terminal for the calling request. The ledger never
/// silently "succeeds" a reservation it could not durably commit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The referenced event does not exist. Definitive; not retried.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// Requested ticket count was not a positive integer. Definitive.
    #[error("ticket count must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    /// A field failed validation at the boundary. Definitive.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request is valid but cannot be satisfied right now. Definitive;
    /// state is unchanged.
    #[error("event {event_id}: requested {requested} tickets, {remaining} remaining")]
    InsufficientCapacity {
        event_id: EventId,
        requested: u32,
        /// Remaining count at the time of decision.
        remaining: u32,
    },

    /// The durable store could not be reached. Nothing happened; the caller
    /// may try again.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The conditional decrement lost its race on every attempt within the
    /// retry budget. State is unchanged.
    #[error("reservation lost {attempts} consecutive write races")]
    RetriesExhausted { attempts: u32 },
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => LedgerError::StorageUnavailable(msg),
            // Outside the reserve loop a lost race is just "nothing
            // happened, try again".
            StoreError::Conflict(msg) => LedgerError::StorageUnavailable(msg),
        }
    }
}

/// Bounded, transparent retry for lost conditional-write races.
///
/// Applies only to [`StoreError::Conflict`]; definitive failures
/// (`EventNotFound`, `InvalidQuantity`, `InsufficientCapacity`) and
/// `StorageUnavailable` are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Input for [`Ledger::create_event`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub total_capacity: u32,
}

/// The inventory ledger.
///
/// Owns an explicitly injected store handle (opened at startup, closed at
/// shutdown by the caller) rather than a lazily-initialized global.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(store: S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: TicketStore> Ledger<S> {
    /// Create an event with `tickets_remaining` initialized to
    /// `total_capacity`.
    ///
    /// Admin authorization is enforced by the routing layer before this is
    /// invoked; the ledger performs no authorization.
    pub async fn create_event(&self, new: NewEvent) -> Result<Event, LedgerError> {
        if new.title.trim().is_empty() {
            return Err(LedgerError::Validation("title cannot be empty".to_string()));
        }

        let event = Event {
            id: EventId::new(),
            title: new.title,
            description: new.description,
            date: new.date,
            total_capacity: new.total_capacity,
            tickets_remaining: new.total_capacity,
            created_at: Utc::now(),
        };

        self.store.insert_event(&event).await?;
        tracing::info!(
            event_id = %event.id,
            total_capacity = event.total_capacity,
            "event created"
        );
        Ok(event)
    }

    /// Reserve `ticket_count` tickets against an event.
    ///
    /// The capacity check, the counter decrement, and the registration
    /// insert are a single atomic unit in the store: either all three
    /// observable effects happen or none do. On success returns the created
    /// registration plus the updated remaining count.
    pub async fn reserve(
        &self,
        event_id: EventId,
        ticket_count: i64,
        purchaser: Purchaser,
    ) -> Result<Reservation, LedgerError> {
        if ticket_count <= 0 || ticket_count > i64::from(u32::MAX) {
            return Err(LedgerError::InvalidQuantity(ticket_count));
        }
        let requested = ticket_count as u32;

        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            purchaser,
            ticket_count: requested,
            created_at: Utc::now(),
        };

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.store.commit_registration(&registration).await {
                Ok(ReserveOutcome::Committed { tickets_remaining }) => {
                    tracing::info!(
                        event_id = %event_id,
                        registration_id = %registration.id,
                        ticket_count = requested,
                        tickets_remaining,
                        "reservation committed"
                    );
                    return Ok(Reservation {
                        registration,
                        tickets_remaining,
                    });
                }
                Ok(ReserveOutcome::Insufficient { tickets_remaining }) => {
                    return Err(LedgerError::InsufficientCapacity {
                        event_id,
                        requested,
                        remaining: tickets_remaining,
                    });
                }
                Ok(ReserveOutcome::EventMissing) => {
                    return Err(LedgerError::EventNotFound(event_id));
                }
                Err(StoreError::Conflict(reason)) if attempts < self.retry.max_attempts => {
                    tracing::warn!(
                        event_id = %event_id,
                        attempt = attempts,
                        %reason,
                        "reservation lost a write race, retrying"
                    );
                }
                Err(StoreError::Conflict(_)) => {
                    return Err(LedgerError::RetriesExhausted { attempts });
                }
                Err(StoreError::Unavailable(msg)) => {
                    // Fail closed: nothing was written, and we must not
                    // report success.
                    return Err(LedgerError::StorageUnavailable(msg));
                }
            }
        }
    }

    /// Current `tickets_remaining` for an event.
    ///
    /// Point-in-time read: it may be stale by the time a subsequent
    /// `reserve` is attempted and is not a reservation guarantee.
    pub async fn get_availability(&self, event_id: EventId) -> Result<u32, LedgerError> {
        match self.store.fetch_event(event_id).await? {
            Some(event) => Ok(event.tickets_remaining),
            None => Err(LedgerError::EventNotFound(event_id)),
        }
    }

    /// All events, ordered by scheduled date.
    pub async fn list_events(&self) -> Result<Vec<Event>, LedgerError> {
        Ok(self.store.list_events().await?)
    }

    /// Delete an event; dependent registrations are cascaded.
    pub async fn delete_event(&self, event_id: EventId) -> Result<(), LedgerError> {
        if self.store.delete_event(event_id).await? {
            tracing::info!(event_id = %event_id, "event deleted");
            Ok(())
        } else {
            Err(LedgerError::EventNotFound(event_id))
        }
    }

    /// Aggregate counters for the admin dashboard.
    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        Ok(self.store.stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Minimal single-threaded store for unit tests. The production-grade
    /// implementations (per-event locking, sqlx) live in `eventick-infra`.
    #[derive(Default)]
    struct TestStore {
        events: Mutex<HashMap<EventId, Event>>,
        registrations: Mutex<Vec<Registration>>,
        commit_calls: AtomicU32,
    }

    #[async_trait]
    impl TicketStore for TestStore {
        async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
            self.events
                .lock()
                .unwrap()
                .insert(event.id, event.clone());
            Ok(())
        }

        async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
            Ok(self.events.lock().unwrap().get(&id).cloned())
        }

        async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
            let mut events: Vec<Event> = self.events.lock().unwrap().values().cloned().collect();
            events.sort_by_key(|e| e.date);
            Ok(events)
        }

        async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
            let existed = self.events.lock().unwrap().remove(&id).is_some();
            self.registrations
                .lock()
                .unwrap()
                .retain(|r| r.event_id != id);
            Ok(existed)
        }

        async fn commit_registration(
            &self,
            registration: &Registration,
        ) -> Result<ReserveOutcome, StoreError> {
            self.commit_calls.fetch_add(1, Ordering::SeqCst);
            let mut events = self.events.lock().unwrap();
            let Some(event) = events.get_mut(&registration.event_id) else {
                return Ok(ReserveOutcome::EventMissing);
            };
            if event.tickets_remaining < registration.ticket_count {
                return Ok(ReserveOutcome::Insufficient {
                    tickets_remaining: event.tickets_remaining,
                });
            }
            event.tickets_remaining -= registration.ticket_count;
            self.registrations
                .lock()
                .unwrap()
                .push(registration.clone());
            Ok(ReserveOutcome::Committed {
                tickets_remaining: event.tickets_remaining,
            })
        }

        async fn stats(&self) -> Result<LedgerStats, StoreError> {
            Ok(LedgerStats {
                total_events: self.events.lock().unwrap().len() as u64,
                tickets_booked: self
                    .registrations
                    .lock()
                    .unwrap()
                    .iter()
                    .map(|r| u64::from(r.ticket_count))
                    .sum(),
            })
        }
    }

    /// Store whose commit path always fails as unreachable, without writing.
    #[derive(Default)]
    struct UnavailableStore {
        inner: TestStore,
    }

    #[async_trait]
    impl TicketStore for UnavailableStore {
        async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
            self.inner.insert_event(event).await
        }

        async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
            self.inner.fetch_event(id).await
        }

        async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
            self.inner.list_events().await
        }

        async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
            self.inner.delete_event(id).await
        }

        async fn commit_registration(
            &self,
            _registration: &Registration,
        ) -> Result<ReserveOutcome, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn stats(&self) -> Result<LedgerStats, StoreError> {
            self.inner.stats().await
        }
    }

    /// Store that loses the first `conflicts` commit races, then delegates.
    struct RacyStore {
        inner: TestStore,
        conflicts: AtomicU32,
    }

    impl RacyStore {
        fn losing(conflicts: u32) -> Self {
            Self {
                inner: TestStore::default(),
                conflicts: AtomicU32::new(conflicts),
            }
        }
    }

    #[async_trait]
    impl TicketStore for RacyStore {
        async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
            self.inner.insert_event(event).await
        }

        async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
            self.inner.fetch_event(id).await
        }

        async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
            self.inner.list_events().await
        }

        async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
            self.inner.delete_event(id).await
        }

        async fn commit_registration(
            &self,
            registration: &Registration,
        ) -> Result<ReserveOutcome, StoreError> {
            let left = self.conflicts.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict("serialization failure".to_string()));
            }
            self.inner.commit_registration(registration).await
        }

        async fn stats(&self) -> Result<LedgerStats, StoreError> {
            self.inner.stats().await
        }
    }

    fn new_event(capacity: u32) -> NewEvent {
        NewEvent {
            title: "Tech Talk".to_string(),
            description: "An evening of talks".to_string(),
            date: "2026-03-15T18:00:00Z".parse().unwrap(),
            total_capacity: capacity,
        }
    }

    fn purchaser(name: &str) -> Purchaser {
        Purchaser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    #[tokio::test]
    async fn create_event_initializes_remaining_to_capacity() {
        let ledger = Ledger::new(TestStore::default());
        let event = ledger.create_event(new_event(100)).await.unwrap();

        assert_eq!(event.total_capacity, 100);
        assert_eq!(event.tickets_remaining, 100);
        assert_eq!(ledger.get_availability(event.id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn create_event_rejects_blank_title() {
        let ledger = Ledger::new(TestStore::default());
        let mut new = new_event(10);
        new.title = "   ".to_string();

        let err = ledger.create_event(new).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn reserve_rejects_non_positive_quantity_without_touching_store() {
        let store = TestStore::default();
        let ledger = Ledger::new(store);
        let event = ledger.create_event(new_event(10)).await.unwrap();

        for bad in [0i64, -3] {
            let err = ledger
                .reserve(event.id, bad, purchaser("A"))
                .await
                .unwrap_err();
            assert_eq!(err, LedgerError::InvalidQuantity(bad));
        }
        assert_eq!(ledger.store().commit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reserve_for_unknown_event_is_not_found() {
        let ledger = Ledger::new(TestStore::default());
        let missing = EventId::new();

        let err = ledger
            .reserve(missing, 1, purchaser("A"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::EventNotFound(missing));
    }

    #[tokio::test]
    async fn reserve_scenario_decrements_then_rejects_oversized_request() {
        let ledger = Ledger::new(TestStore::default());
        let event = ledger.create_event(new_event(100)).await.unwrap();

        let reservation = ledger
            .reserve(event.id, 30, purchaser("A"))
            .await
            .unwrap();
        assert_eq!(reservation.tickets_remaining, 70);
        assert_eq!(reservation.registration.ticket_count, 30);
        assert_eq!(reservation.registration.event_id, event.id);

        let err = ledger
            .reserve(event.id, 80, purchaser("B"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientCapacity {
                event_id: event.id,
                requested: 80,
                remaining: 70,
            }
        );

        // The failed attempt left no trace.
        assert_eq!(ledger.get_availability(event.id).await.unwrap(), 70);
        let stats = ledger.stats().await.unwrap();
        assert_eq!(stats.tickets_booked, 30);
    }

    #[tokio::test]
    async fn reserving_exact_remaining_drives_counter_to_zero() {
        let ledger = Ledger::new(TestStore::default());
        let event = ledger.create_event(new_event(10)).await.unwrap();

        let reservation = ledger
            .reserve(event.id, 10, purchaser("A"))
            .await
            .unwrap();
        assert_eq!(reservation.tickets_remaining, 0);

        let err = ledger
            .reserve(event.id, 1, purchaser("B"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCapacity { remaining: 0, .. }
        ));
    }

    #[tokio::test]
    async fn storage_failure_fails_closed() {
        let ledger = Ledger::new(UnavailableStore::default());
        let event = ledger.create_event(new_event(10)).await.unwrap();

        let err = ledger
            .reserve(event.id, 2, purchaser("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::StorageUnavailable(_)));

        // No partial registration, no partial decrement.
        assert_eq!(ledger.get_availability(event.id).await.unwrap(), 10);
        assert_eq!(ledger.stats().await.unwrap().tickets_booked, 0);
    }

    #[tokio::test]
    async fn lost_race_is_retried_within_budget() {
        let ledger = Ledger::new(RacyStore::losing(2));
        let event = ledger.create_event(new_event(5)).await.unwrap();

        // Two conflicts, third attempt succeeds under the default budget of 3.
        let reservation = ledger
            .reserve(event.id, 1, purchaser("A"))
            .await
            .unwrap();
        assert_eq!(reservation.tickets_remaining, 4);
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_is_reported() {
        let ledger =
            Ledger::with_retry_policy(RacyStore::losing(u32::MAX), RetryPolicy { max_attempts: 3 });
        let event = ledger.create_event(new_event(5)).await.unwrap();

        let err = ledger
            .reserve(event.id, 1, purchaser("A"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::RetriesExhausted { attempts: 3 });
        assert_eq!(ledger.get_availability(event.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn availability_is_idempotent_between_writes() {
        let ledger = Ledger::new(TestStore::default());
        let event = ledger.create_event(new_event(42)).await.unwrap();

        let first = ledger.get_availability(event.id).await.unwrap();
        let second = ledger.get_availability(event.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_event_cascades_registrations() {
        let ledger = Ledger::new(TestStore::default());
        let event = ledger.create_event(new_event(10)).await.unwrap();
        ledger.reserve(event.id, 4, purchaser("A")).await.unwrap();

        ledger.delete_event(event.id).await.unwrap();

        let err = ledger.get_availability(event.id).await.unwrap_err();
        assert_eq!(err, LedgerError::EventNotFound(event.id));
        assert_eq!(ledger.stats().await.unwrap().tickets_booked, 0);

        let err = ledger.delete_event(event.id).await.unwrap_err();
        assert_eq!(err, LedgerError::EventNotFound(event.id));
    }
}
