//! Database repositories for sessions, login transactions, and the
//! last-login ledger.
//!
//! The session store exclusively owns durability and expiry of authenticated
//! sessions; handlers only touch it through these accessors. Login
//! transactions are consumed with `DELETE ... RETURNING`, which makes
//! single use atomic: of two concurrent callbacks carrying the same state,
//! exactly one observes the row.

use chrono::{DateTime, Duration, Utc};
use gatehouse_platform_access::{AuthSession, LoginTransaction, SessionId};
use sqlx::{FromRow, PgPool};

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    username: String,
    access_token: String,
    refresh_token: String,
    id_token: String,
    expires_in: i64,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_record(self) -> SessionRecord {
        SessionRecord {
            session: AuthSession::new(
                SessionId::new(self.id),
                self.username,
                self.access_token,
                self.refresh_token,
                self.id_token,
                self.expires_in,
            ),
            expires_at: self.expires_at,
        }
    }
}

/// A stored session together with its store-owned expiry.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub session: AuthSession,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns true if the store-level TTL has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Repository for authenticated sessions.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a session by ID.
    pub async fn find_by_id(&self, id: &SessionId) -> Result<Option<SessionRecord>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, username, access_token, refresh_token, id_token, expires_in, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_record))
    }

    /// Persists a new session with the given time-to-live.
    ///
    /// All identity fields are written in one statement; the insert must be
    /// acknowledged before the login redirect is produced.
    pub async fn create(&self, session: &AuthSession, ttl: Duration) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO sessions (id, username, access_token, refresh_token, id_token, expires_in, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.username())
        .bind(session.access_token())
        .bind(session.refresh_token())
        .bind(session.id_token())
        .bind(session.expires_in())
        .bind(now)
        .bind(now + ttl)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a session by ID (logout).
    pub async fn delete(&self, id: &SessionId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes expired sessions.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Row type for transaction queries.
#[derive(FromRow)]
struct TransactionRow {
    state: String,
    nonce: String,
    redirect_uri: String,
}

/// Repository for pending login transactions.
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a pending transaction keyed by its state token.
    pub async fn create(&self, transaction: &LoginTransaction) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO login_transactions (state, nonce, redirect_uri, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(transaction.state())
        .bind(transaction.nonce())
        .bind(transaction.redirect_uri())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Consumes the transaction for the given state, if one exists.
    ///
    /// Delete-and-return makes the consumption atomic; the losing side of a
    /// concurrent callback race observes `None`.
    pub async fn consume(&self, state: &str) -> Result<Option<LoginTransaction>, sqlx::Error> {
        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            DELETE FROM login_transactions
            WHERE state = $1
            RETURNING state, nonce, redirect_uri
            "#,
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LoginTransaction::new(r.state, r.nonce, r.redirect_uri)))
    }

    /// Deletes transactions older than the given horizon (abandoned flows).
    pub async fn delete_stale(&self, horizon: Duration) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now() - horizon;
        let result = sqlx::query(
            r#"
            DELETE FROM login_transactions
            WHERE created_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Repository for the last-login ledger: one row per provider subject.
pub struct LastLoginRepository {
    pool: PgPool,
}

impl LastLoginRepository {
    /// Creates a new last-login repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the most recent successful login for a subject.
    ///
    /// Idempotent; last write wins. This is advisory telemetry, never an
    /// authorization input.
    pub async fn record_login(
        &self,
        subject: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_last_login (subject, last_login)
            VALUES ($1, $2)
            ON CONFLICT (subject)
            DO UPDATE SET
                last_login = EXCLUDED.last_login,
                updated_at = NOW()
            "#,
        )
        .bind(subject)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the most recent login timestamp for a subject.
    ///
    /// Absence (never logged in, or record purged) is a valid non-error
    /// outcome.
    pub async fn get_last_login(
        &self,
        subject: &str,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT last_login
            FROM user_last_login
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(ts,)| ts))
    }
}

/// Generates a unique session ID using ULID.
pub fn generate_session_id() -> SessionId {
    SessionId::new(ulid::Ulid::new().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_session_ids_are_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn fresh_session_record_is_not_expired() {
        let record = SessionRecord {
            session: AuthSession::new(
                generate_session_id(),
                "alice".to_string(),
                "at".to_string(),
                "rt".to_string(),
                "it".to_string(),
                300,
            ),
            expires_at: Utc::now() + Duration::minutes(5),
        };
        assert!(!record.is_expired());
    }

    #[test]
    fn past_expiry_is_expired() {
        let record = SessionRecord {
            session: AuthSession::new(
                generate_session_id(),
                "alice".to_string(),
                "at".to_string(),
                "rt".to_string(),
                "it".to_string(),
                300,
            ),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(record.is_expired());
    }
}
