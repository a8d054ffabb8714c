//! Webhook log entity - Raw inbound callbacks from third-party services.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Processing state of a webhook
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// Stored, not yet handled
    #[sea_orm(string_value = "received")]
    Received,
    /// Handled successfully
    #[sea_orm(string_value = "processed")]
    Processed,
    /// Handling failed, see `error_message`
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Webhook log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_logs")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sending service (e.g., "sms", "maps")
    pub source: String,
    /// Event name reported by the sender
    pub event_type: Option<String>,
    /// Raw JSON body
    pub payload: Json,
    /// Processing state
    pub status: WebhookStatus,
    /// Failure description
    pub error_message: Option<String>,
    /// When the webhook arrived
    pub received_at: DateTimeUtc,
    /// When processing finished
    pub processed_at: Option<DateTimeUtc>,
}

/// `WebhookLog` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
