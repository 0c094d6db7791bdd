//! Accounts and bearer sessions.
//!
//! Raw session tokens never touch the database; only a salted SHA-256 of the
//! token is stored and looked up.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use ratekit_core::{Account, AccountRole, SessionToken};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `accounts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl AccountRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidData`] for an unrecognized role.
    pub fn to_account(&self) -> Result<Account, DbError> {
        Ok(Account {
            id: self.id,
            role: parse_role(&self.role)?,
        })
    }
}

/// A freshly minted session. `token` is shown to the user once.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub account_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

fn parse_role(role: &str) -> Result<AccountRole, DbError> {
    match role {
        "member" => Ok(AccountRole::Member),
        "admin" => Ok(AccountRole::Admin),
        other => Err(DbError::InvalidData(format!("unknown account role '{other}'"))),
    }
}

/// Salted SHA-256 of a session token, hex encoded.
#[must_use]
pub fn hash_session_token(salt: &str, token: &SessionToken) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(token.as_str().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 256 bits of randomness, hex encoded.
#[must_use]
pub fn generate_session_token() -> SessionToken {
    let bytes: [u8; 32] = rand::rng().random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    SessionToken::new(hex)
}

/// Create an account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a duplicate email).
pub async fn create_account(
    pool: &PgPool,
    email: &str,
    role: AccountRole,
) -> Result<AccountRow, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "INSERT INTO accounts (email, role) VALUES ($1, $2) \
         RETURNING id, email, role, created_at, deleted_at",
    )
    .bind(email.trim().to_lowercase())
    .bind(role.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(account_id = %row.id, role = role.as_str(), "account created");
    Ok(row)
}

/// Look up a live (not deleted) account by email.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_account_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AccountRow>, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, email, role, created_at, deleted_at \
         FROM accounts \
         WHERE email = $1 AND deleted_at IS NULL",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Mint a new session for `account_id` valid for `ttl`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn issue_session(
    pool: &PgPool,
    salt: &str,
    account_id: Uuid,
    ttl: Duration,
) -> Result<IssuedSession, DbError> {
    let token = generate_session_token();
    let expires_at = Utc::now() + ttl;

    sqlx::query("INSERT INTO sessions (token_hash, account_id, expires_at) VALUES ($1, $2, $3)")
        .bind(hash_session_token(salt, &token))
        .bind(account_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    tracing::info!(%account_id, %expires_at, "session issued");
    Ok(IssuedSession {
        token,
        account_id,
        expires_at,
    })
}

/// Revoke a session. Returns `false` when it did not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn revoke_session(
    pool: &PgPool,
    salt: &str,
    token: &SessionToken,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(hash_session_token(salt, token))
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Resolve an unexpired session to its live account.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidData`] for a corrupt role.
pub async fn find_session_account(
    pool: &PgPool,
    salt: &str,
    token: &SessionToken,
) -> Result<Option<Account>, DbError> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT a.id, a.email, a.role, a.created_at, a.deleted_at \
         FROM sessions s \
         JOIN accounts a ON a.id = s.account_id \
         WHERE s.token_hash = $1 AND s.expires_at > NOW() AND a.deleted_at IS NULL",
    )
    .bind(hash_session_token(salt, token))
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(AccountRow::to_account).transpose()
}
