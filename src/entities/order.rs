//! Order entity - A customer's request for gas cylinders on a given day.
//!
//! Orders move through a simple lifecycle: `pending` → `confirmed` → `assigned`
//! (placed on a route) → `in_delivery` → `delivered`. Any non-terminal order can be
//! cancelled. Amounts are computed from the order items when the order is created.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Received, not yet checked by the office
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Checked and ready to be planned
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Placed on a route
    #[sea_orm(string_value = "assigned")]
    Assigned,
    /// The route carrying this order has started
    #[sea_orm(string_value = "in_delivery")]
    InDelivery,
    /// Handed over to the customer
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Cancelled before delivery
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether an order in this status may move to `next`.
    ///
    /// `assigned` may fall back to `confirmed` when the order is taken off a route or
    /// a drop fails, `in_delivery` may fall back for the same reason.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed | Self::Pending, Self::Assigned)
            | (Self::Assigned, Self::InDelivery | Self::Confirmed)
            | (Self::InDelivery, Self::Delivered | Self::Confirmed) => true,
            (current, Self::Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Whether the order header and items may still be edited.
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Payment state of an order
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not paid yet
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Paid in full
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Payment returned to the customer
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing order number (e.g., "ORD-20240115-1A2B3C4D"), unique
    #[sea_orm(unique)]
    pub order_number: String,
    /// Customer placing the order
    pub customer_id: i64,
    /// Day the delivery is scheduled for
    pub scheduled_date: Date,
    /// Earliest preferred delivery time ("HH:MM")
    pub delivery_time_start: Option<String>,
    /// Latest preferred delivery time ("HH:MM")
    pub delivery_time_end: Option<String>,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Payment status
    pub payment_status: PaymentStatus,
    /// Payment method (cash, transfer, monthly invoice, ...)
    pub payment_method: Option<String>,
    /// Urgent orders are planned first
    pub is_urgent: bool,
    /// Sum of item gross amounts
    pub total_amount: f64,
    /// Sum of item discounts
    pub discount_amount: f64,
    /// Amount due (`total_amount - discount_amount`)
    pub final_amount: f64,
    /// Free-text notes for the driver
    pub delivery_notes: Option<String>,
    /// Route the order is currently planned on
    pub route_id: Option<i64>,
    /// Driver of that route
    pub driver_id: Option<i64>,
    /// When the order was created
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
    /// When the order was delivered
    pub delivered_at: Option<DateTimeUtc>,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// Each order may be planned on one route
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id"
    )]
    Route,
    /// Each order may be carried by one driver
    #[sea_orm(
        belongs_to = "super::driver::Entity",
        from = "Column::DriverId",
        to = "super::driver::Column::Id"
    )]
    Driver,
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Assigned));
        assert!(OrderStatus::Assigned.can_transition_to(OrderStatus::InDelivery));
        assert!(OrderStatus::InDelivery.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn test_terminal_statuses_are_final() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Assigned,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn test_skipping_steps_is_rejected() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::InDelivery));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_cancel_allowed_until_delivered() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::InDelivery.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn test_editable_statuses() {
        assert!(OrderStatus::Pending.is_editable());
        assert!(OrderStatus::Confirmed.is_editable());
        assert!(!OrderStatus::Assigned.is_editable());
    }
}
