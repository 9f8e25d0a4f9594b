use std::fmt;

use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Who performed an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    User(i32),
    Buyer(i64),
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::User(id) => write!(f, "user:{id}"),
            Actor::Buyer(id) => write!(f, "buyer:{id}"),
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    actor: Actor,
    action: &str,
    resource: &str,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (id, actor, action, resource, metadata) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(actor.to_string())
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Services call this one: a failed audit write is logged and never fails the request.
pub async fn record(pool: &DbPool, actor: Actor, action: &str, resource: &str, metadata: Value) {
    if let Err(err) = log_audit(pool, actor, action, resource, metadata).await {
        tracing::warn!(error = %err, %actor, action, "audit log failed");
    }
}

#[cfg(test)]
mod tests {
    use super::Actor;

    #[test]
    fn actor_is_tagged_by_kind() {
        assert_eq!(Actor::User(7).to_string(), "user:7");
        assert_eq!(Actor::Buyer(42).to_string(), "buyer:42");
    }
}
