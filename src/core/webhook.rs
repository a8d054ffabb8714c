//! Webhook log - Stores inbound webhook payloads for later processing.

use crate::{
    core::{Pagination, optional_text, required_text},
    entities::{WebhookLog, WebhookStatus, webhook_log},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, warn};

/// Payload keys checked, in order, for the event type
const EVENT_TYPE_KEYS: [&str; 3] = ["event_type", "event", "type"];

/// Optional filters for listing webhook logs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookFilter {
    /// Only payloads from this source
    pub source: Option<String>,
    /// Only payloads in this status
    pub status: Option<WebhookStatus>,
}

/// Reads the event type from a JSON object payload, if present.
#[must_use]
pub fn extract_event_type(payload: &Json) -> Option<String> {
    let object = payload.as_object()?;
    EVENT_TYPE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Json::as_str))
        .map(str::to_string)
}

/// Stores an inbound payload as `received`.
pub async fn log_webhook<C>(db: &C, source: &str, payload: Json) -> Result<webhook_log::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let source = required_text("source", source)?;
    let event_type = extract_event_type(&payload);

    let log = webhook_log::ActiveModel {
        source: Set(source),
        event_type: Set(event_type),
        payload: Set(payload),
        status: Set(WebhookStatus::Received),
        error_message: Set(None),
        received_at: Set(chrono::Utc::now()),
        processed_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        webhook_id = log.id,
        source = %log.source,
        event_type = ?log.event_type,
        "Received webhook"
    );
    Ok(log)
}

async fn finish<C>(
    db: &C,
    webhook_id: i64,
    status: WebhookStatus,
    error_message: Option<String>,
) -> Result<webhook_log::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = WebhookLog::find_by_id(webhook_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("webhook", webhook_id))?;
    if existing.status != WebhookStatus::Received {
        return Err(Error::conflict(format!(
            "webhook {webhook_id} was already {:?}",
            existing.status
        )));
    }

    let mut log: webhook_log::ActiveModel = existing.into();
    log.status = Set(status);
    log.error_message = Set(error_message);
    log.processed_at = Set(Some(chrono::Utc::now()));
    log.update(db).await.map_err(Into::into)
}

/// Marks a received payload as processed.
pub async fn mark_webhook_processed<C>(db: &C, webhook_id: i64) -> Result<webhook_log::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    finish(db, webhook_id, WebhookStatus::Processed, None).await
}

/// Marks a received payload as failed with an error message.
pub async fn mark_webhook_failed<C>(
    db: &C,
    webhook_id: i64,
    error_message: &str,
) -> Result<webhook_log::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    warn!(webhook_id, error_message, "Webhook processing failed");
    finish(
        db,
        webhook_id,
        WebhookStatus::Failed,
        optional_text(Some(error_message.to_string())),
    )
    .await
}

/// Lists webhook logs, newest first.
pub async fn list_webhook_logs<C>(
    db: &C,
    filter: &WebhookFilter,
    page: Pagination,
) -> Result<Vec<webhook_log::Model>>
where
    C: ConnectionTrait,
{
    WebhookLog::find()
        .apply_if(filter.source.clone(), |q, source| {
            q.filter(webhook_log::Column::Source.eq(source))
        })
        .apply_if(filter.status, |q, status| {
            q.filter(webhook_log::Column::Status.eq(status))
        })
        .order_by_desc(webhook_log::Column::ReceivedAt)
        .order_by_desc(webhook_log::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}
