//! Repository for recorded debugging/QA sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{
    error::{CoreError, Result},
    models::{NewRecordedSession, RecordedSession},
};

const COLUMNS: &str = "id, name, started_at, ended_at, duration_seconds, notes, session_metadata";

/// Repository for recorded session database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Starts a new recording at the given time.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn start(
        &self,
        session: &NewRecordedSession,
        started_at: DateTime<Utc>,
    ) -> Result<RecordedSession> {
        let inserted = sqlx::query_as::<_, RecordedSession>(&format!(
            "INSERT INTO recorded_sessions (name, started_at, notes, session_metadata)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(&session.name)
        .bind(started_at)
        .bind(&session.notes)
        .bind(&session.session_metadata)
        .fetch_one(&*self.pool)
        .await?;

        Ok(inserted)
    }

    /// Ends an active recording, computing its duration and applying any
    /// last-minute metadata updates.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown sessions and `InvalidInput` when the
    /// session was already ended.
    pub async fn end(
        &self,
        id: i64,
        update: &NewRecordedSession,
        ended_at: DateTime<Utc>,
    ) -> Result<RecordedSession> {
        let session = self.find(id).await?;

        if session.ended_at.is_some() {
            return Err(CoreError::InvalidInput(format!("session {id} already ended")));
        }

        let duration_seconds =
            i32::try_from((ended_at - session.started_at).num_seconds().max(0)).unwrap_or(i32::MAX);

        let updated = sqlx::query_as::<_, RecordedSession>(&format!(
            "UPDATE recorded_sessions
             SET ended_at = $1,
                 duration_seconds = $2,
                 name = COALESCE($3, name),
                 notes = COALESCE($4, notes),
                 session_metadata = COALESCE($5, session_metadata)
             WHERE id = $6
             RETURNING {COLUMNS}"
        ))
        .bind(ended_at)
        .bind(duration_seconds)
        .bind(&update.name)
        .bind(&update.notes)
        .bind(&update.session_metadata)
        .bind(id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(updated)
    }

    /// Finds a recorded session by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown sessions.
    pub async fn find(&self, id: i64) -> Result<RecordedSession> {
        let session = sqlx::query_as::<_, RecordedSession>(&format!(
            "SELECT {COLUMNS} FROM recorded_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("recorded session {id} not found")))?;

        Ok(session)
    }

    /// Lists recorded sessions, newest first. `include_active` controls
    /// whether still-running recordings are returned.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn list(&self, limit: i64, include_active: bool) -> Result<Vec<RecordedSession>> {
        let sql = if include_active {
            format!(
                "SELECT {COLUMNS} FROM recorded_sessions ORDER BY started_at DESC LIMIT $1"
            )
        } else {
            format!(
                "SELECT {COLUMNS} FROM recorded_sessions WHERE ended_at IS NOT NULL
                 ORDER BY started_at DESC LIMIT $1"
            )
        };

        let sessions = sqlx::query_as::<_, RecordedSession>(&sql)
            .bind(limit.max(1))
            .fetch_all(&*self.pool)
            .await?;

        Ok(sessions)
    }

    /// Total number of recorded sessions.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM recorded_sessions")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }

    /// Number of recordings started strictly before the cutoff.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    pub async fn count_started_before(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM recorded_sessions WHERE started_at < $1")
                .bind(cutoff)
                .fetch_one(&*self.pool)
                .await?;

        Ok(count)
    }
}
