//! Postgres-backed store implementations.
//!
//! The reservation path is design (a) from the ledger contract: one
//! conditional `UPDATE ... WHERE tickets_remaining >= $n RETURNING ...`
//! committed in the same transaction as the registration `INSERT`. The
//! database is the serialization point, so this stays correct across
//! multiple server processes, not just threads in one process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use eventick_auth::{DirectoryError, UserDirectory, UserRecord};
use eventick_core::{EventId, UserId};
use eventick_ledger::{
    Event, LedgerStats, Registration, ReserveOutcome, StoreError, TicketStore,
};

/// Postgres ticket store over a shared connection pool.
///
/// The pool is constructed at startup and injected; there is no lazy global
/// client. Call [`PostgresTicketStore::ensure_schema`] once before serving.
#[derive(Debug, Clone)]
pub struct PostgresTicketStore {
    pool: PgPool,
}

impl PostgresTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the events/registrations tables if they do not exist yet.
    ///
    /// Deliberately not a migration framework; the schema is small and
    /// append-only.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                date TIMESTAMPTZ NOT NULL,
                total_capacity BIGINT NOT NULL,
                tickets_remaining BIGINT NOT NULL CHECK (tickets_remaining >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS registrations (
                id UUID PRIMARY KEY,
                event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                purchaser_name TEXT NOT NULL,
                purchaser_email TEXT NOT NULL,
                ticket_count BIGINT NOT NULL CHECK (ticket_count > 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;

        Ok(())
    }
}

fn map_store_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        // 40001 = serialization_failure, 40P01 = deadlock_detected; both
        // mean the transaction was rolled back and can be retried.
        if matches!(db.code().as_deref(), Some("40001") | Some("40P01")) {
            return StoreError::Conflict(db.message().to_string());
        }
    }
    StoreError::Unavailable(e.to_string())
}

fn remaining_from(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Unavailable(format!("corrupt tickets_remaining: {value}")))
}

fn event_from_row(row: &PgRow) -> Result<Event, StoreError> {
    let corrupt = |e: sqlx::Error| StoreError::Unavailable(format!("corrupt event row: {e}"));

    Ok(Event {
        id: EventId::from_uuid(row.try_get("id").map_err(corrupt)?),
        title: row.try_get("title").map_err(corrupt)?,
        description: row.try_get("description").map_err(corrupt)?,
        date: row.try_get::<DateTime<Utc>, _>("date").map_err(corrupt)?,
        total_capacity: remaining_from(row.try_get("total_capacity").map_err(corrupt)?)?,
        tickets_remaining: remaining_from(row.try_get("tickets_remaining").map_err(corrupt)?)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(corrupt)?,
    })
}

#[async_trait]
impl TicketStore for PostgresTicketStore {
    async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO events (
                id, title, description, date,
                total_capacity, tickets_remaining, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*event.id.as_uuid())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(i64::from(event.total_capacity))
        .bind(i64::from(event.tickets_remaining))
        .bind(event.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_store_err)?;
        Ok(())
    }

    async fn fetch_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, date,
                   total_capacity, tickets_remaining, created_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_store_err)?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, date,
                   total_capacity, tickets_remaining, created_at
            FROM events
            ORDER BY date
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_store_err)?;

        rows.iter().map(event_from_row).collect()
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        // Registrations cascade via the FK.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_store_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_registration(
        &self,
        registration: &Registration,
    ) -> Result<ReserveOutcome, StoreError> {
        let requested = i64::from(registration.ticket_count);
        let mut tx = self.pool.begin().await.map_err(map_store_err)?;

        // Single-statement conditional decrement: the check and the write
        // cannot be interleaved by a racing request.
        let updated = sqlx::query(
            r#"
            UPDATE events
            SET tickets_remaining = tickets_remaining - $2
            WHERE id = $1 AND tickets_remaining >= $2
            RETURNING tickets_remaining
            "#,
        )
        .bind(*registration.event_id.as_uuid())
        .bind(requested)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_store_err)?;

        let Some(updated) = updated else {
            // Decrement did not take effect: classify missing vs. short.
            let current =
                sqlx::query("SELECT tickets_remaining FROM events WHERE id = $1")
                    .bind(*registration.event_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(map_store_err)?;
            tx.rollback().await.map_err(map_store_err)?;

            return Ok(match current {
                None => ReserveOutcome::EventMissing,
                Some(row) => ReserveOutcome::Insufficient {
                    tickets_remaining: remaining_from(
                        row.try_get("tickets_remaining").map_err(map_store_err)?,
                    )?,
                },
            });
        };

        let tickets_remaining = remaining_from(
            updated
                .try_get("tickets_remaining")
                .map_err(map_store_err)?,
        )?;

        sqlx::query(
            r#"
            INSERT INTO registrations (
                id, event_id, purchaser_name, purchaser_email,
                ticket_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*registration.id.as_uuid())
        .bind(*registration.event_id.as_uuid())
        .bind(&registration.purchaser.name)
        .bind(&registration.purchaser.email)
        .bind(requested)
        .bind(registration.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_store_err)?;

        // All or nothing: a failed commit leaves both rows untouched.
        tx.commit().await.map_err(map_store_err)?;

        Ok(ReserveOutcome::Committed { tickets_remaining })
    }

    async fn stats(&self) -> Result<LedgerStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM events) AS total_events,
                (SELECT COALESCE(SUM(ticket_count), 0) FROM registrations)::BIGINT
                    AS tickets_booked
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_store_err)?;

        let total_events: i64 = row.try_get("total_events").map_err(map_store_err)?;
        let tickets_booked: i64 = row.try_get("tickets_booked").map_err(map_store_err)?;

        Ok(LedgerStats {
            total_events: total_events.max(0) as u64,
            tickets_booked: tickets_booked.max(0) as u64,
        })
    }
}

/// Postgres user directory sharing the same pool as the ticket store.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), DirectoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_digest TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(map_directory_err)?;
        Ok(())
    }
}

fn map_directory_err(e: sqlx::Error) -> DirectoryError {
    DirectoryError::Unavailable(e.to_string())
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(
            "SELECT id, email, password_digest, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_directory_err)?;

        match row {
            Some(row) => Ok(Some(UserRecord {
                id: UserId::from_uuid(row.try_get("id").map_err(map_directory_err)?),
                email: row.try_get("email").map_err(map_directory_err)?,
                password_digest: row.try_get("password_digest").map_err(map_directory_err)?,
                created_at: row
                    .try_get::<DateTime<Utc>, _>("created_at")
                    .map_err(map_directory_err)?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_digest, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                // unique_violation on email: two auto-registrations raced.
                Err(DirectoryError::DuplicateEmail(user.email.clone()))
            }
            Err(e) => Err(map_directory_err(e)),
        }
    }
}
