//! Audit trail - records which API caller changed which record.

use crate::{
    core::Pagination,
    entities::{AuditAction, AuditLog, audit_log},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::debug;

/// Actor name used for changes not made through the API
pub const SYSTEM_ACTOR: &str = "system";

/// Optional filters for listing audit entries
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuditFilter {
    /// Only entries for this entity kind
    pub entity_type: Option<String>,
    /// Only entries for this record id
    pub entity_id: Option<i64>,
    /// Only entries made by this actor
    pub actor: Option<String>,
}

/// Writes one audit entry.
pub async fn record_audit<C>(
    db: &C,
    actor: &str,
    action: AuditAction,
    entity_type: &str,
    entity_id: i64,
    details: Option<serde_json::Value>,
) -> Result<audit_log::Model>
where
    C: ConnectionTrait,
{
    debug!(actor, ?action, entity_type, entity_id, "Recording audit entry");
    let entry = audit_log::ActiveModel {
        actor: Set(actor.to_string()),
        action: Set(action),
        entity_type: Set(entity_type.to_string()),
        entity_id: Set(entity_id),
        details: Set(details),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    entry.insert(db).await.map_err(Into::into)
}

/// Lists audit entries, newest first.
pub async fn list_audit_logs<C>(
    db: &C,
    filter: &AuditFilter,
    page: Pagination,
) -> Result<Vec<audit_log::Model>>
where
    C: ConnectionTrait,
{
    AuditLog::find()
        .apply_if(filter.entity_type.clone(), |q, v| {
            q.filter(audit_log::Column::EntityType.eq(v))
        })
        .apply_if(filter.entity_id, |q, v| {
            q.filter(audit_log::Column::EntityId.eq(v))
        })
        .apply_if(filter.actor.clone(), |q, v| {
            q.filter(audit_log::Column::Actor.eq(v))
        })
        .order_by_desc(audit_log::Column::CreatedAt)
        .order_by_desc(audit_log::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_record_and_filter() -> Result<()> {
        let db = setup_test_db().await?;

        record_audit(&db, "ops", AuditAction::Create, "order", 1, None).await?;
        record_audit(
            &db,
            "ops",
            AuditAction::StatusChange,
            "order",
            1,
            Some(serde_json::json!({"to": "confirmed"})),
        )
        .await?;
        record_audit(&db, SYSTEM_ACTOR, AuditAction::Create, "customer", 7, None).await?;

        let order_entries = list_audit_logs(
            &db,
            &AuditFilter {
                entity_type: Some("order".to_string()),
                entity_id: Some(1),
                actor: None,
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(order_entries.len(), 2);
        assert_eq!(order_entries[0].action, AuditAction::StatusChange);

        let system_entries = list_audit_logs(
            &db,
            &AuditFilter {
                actor: Some(SYSTEM_ACTOR.to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(system_entries.len(), 1);
        assert_eq!(system_entries[0].entity_type, "customer");

        Ok(())
    }
}
