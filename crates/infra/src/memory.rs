//! In-memory store implementations.
//!
//! Intended for tests/dev. Correctness still matters: the reservation path
//! holds one mutex per event entry for the duration of the
//! check-and-decrement, so racing reservations for the same event are
//! totally ordered while different events proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use eventick_auth::{DirectoryError, UserDirectory, UserRecord};
use eventick_core::EventId;
use eventick_ledger::{
    Event, LedgerStats, Registration, ReserveOutcome, StoreError, TicketStore,
};

#[derive(Debug)]
struct EventEntry {
    event: Event,
    registrations: Vec<Registration>,
}

/// In-memory ticket store.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    // Entries are Arc'd so the per-event mutex can be taken after the map
    // read lock is released by other readers; deletes take the write lock
    // and therefore cannot interleave with an in-flight commit.
    events: RwLock<HashMap<EventId, Arc<Mutex<EventEntry>>>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        let mut events = self.events.write().map_err(|_| poisoned())?;
        events.insert(
            event.id,
            Arc::new(Mutex::new(EventEntry {
                event: event.clone(),
                registrations: Vec::new(),
            })),
        );
        Ok(())
    }

    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let events = self.events.read().map_err(|_| poisoned())?;
        match events.get(&id) {
            Some(entry) => Ok(Some(entry.lock().map_err(|_| poisoned())?.event.clone())),
            None => Ok(None),
        }
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().map_err(|_| poisoned())?;
        let mut all = Vec::with_capacity(events.len());
        for entry in events.values() {
            all.push(entry.lock().map_err(|_| poisoned())?.event.clone());
        }
        all.sort_by_key(|e| e.date);
        Ok(all)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        let mut events = self.events.write().map_err(|_| poisoned())?;
        // Dropping the entry drops its registrations with it (cascade).
        Ok(events.remove(&id).is_some())
    }

    async fn commit_registration(
        &self,
        registration: &Registration,
    ) -> Result<ReserveOutcome, StoreError> {
        // Hold the map read lock across the commit so a concurrent delete
        // (write lock) cannot detach the entry mid-write. Readers of other
        // events are unaffected.
        let events = self.events.read().map_err(|_| poisoned())?;
        let Some(entry) = events.get(&registration.event_id) else {
            return Ok(ReserveOutcome::EventMissing);
        };

        let mut entry = entry.lock().map_err(|_| poisoned())?;
        if entry.event.tickets_remaining < registration.ticket_count {
            return Ok(ReserveOutcome::Insufficient {
                tickets_remaining: entry.event.tickets_remaining,
            });
        }

        entry.event.tickets_remaining -= registration.ticket_count;
        entry.registrations.push(registration.clone());
        Ok(ReserveOutcome::Committed {
            tickets_remaining: entry.event.tickets_remaining,
        })
    }

    async fn stats(&self) -> Result<LedgerStats, StoreError> {
        let events = self.events.read().map_err(|_| poisoned())?;
        let mut tickets_booked = 0u64;
        for entry in events.values() {
            let entry = entry.lock().map_err(|_| poisoned())?;
            tickets_booked += entry
                .registrations
                .iter()
                .map(|r| u64::from(r.ticket_count))
                .sum::<u64>();
        }
        Ok(LedgerStats {
            total_events: events.len() as u64,
            tickets_booked,
        })
    }
}

/// In-memory user directory (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let users = self
            .users
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(users.get(email).cloned())
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        if users.contains_key(&user.email) {
            return Err(DirectoryError::DuplicateEmail(user.email.clone()));
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }
}
