//! Idempotency key claims for retry-safe order creation
//!
//! INSERT-first: the claim row is taken before any side effect. A
//! completed claim stores the response for replay; a claim without a
//! response marks an in-flight (or crashed) request.

use sqlx::PgPool;

/// Outcome of attempting to claim an idempotency key
#[derive(Debug)]
pub enum ClaimOutcome {
    /// Key is ours; proceed with side effects
    Claimed,
    /// Key was completed earlier; replay the recorded response
    Replay(serde_json::Value),
    /// Key is held by an in-flight request
    InFlight,
}

pub async fn claim(
    pool: &PgPool,
    key: &str,
    user_id: i64,
    now: i64,
) -> Result<ClaimOutcome, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO idempotency_keys (key, user_id, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (key) DO NOTHING",
    )
    .bind(key)
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(ClaimOutcome::Claimed);
    }

    let response: Option<Option<serde_json::Value>> =
        sqlx::query_scalar("SELECT response FROM idempotency_keys WHERE key = $1")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match response.flatten() {
        Some(value) => Ok(ClaimOutcome::Replay(value)),
        None => Ok(ClaimOutcome::InFlight),
    }
}

/// Record the response for a claimed key so retries replay it
pub async fn complete(
    pool: &PgPool,
    key: &str,
    response: &serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE idempotency_keys SET response = $1 WHERE key = $2")
        .bind(response)
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Release a claim whose operation failed, so the caller can retry
pub async fn release(pool: &PgPool, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM idempotency_keys WHERE key = $1 AND response IS NULL")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Purge claims older than the cutoff (periodic background task)
pub async fn purge_expired(pool: &PgPool, cutoff: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM idempotency_keys WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
