//! Delivery execution - What happens at each drop of a running route.
//!
//! Completing a drop touches many tables (drop, stop, order, delivery record, history,
//! inventory, route counters); all of it is written in one transaction. When the last
//! open drop of a route is resolved the route completes automatically.

use crate::{
    core::{
        Pagination,
        customer::get_customer_by_id,
        inventory::apply_delivered_cylinders,
        optional_text,
        order::{get_order_items, require_order, set_order_status},
        route::{find_drop, find_stop, finish_route_if_done, require_route},
    },
    entities::{
        Delivery, DeliveryHistory, DeliveryStatus, DropStatus, OrderStatus, RouteStatus, delivery,
        delivery_history, route, route_delivery, route_stop,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Proof of delivery reported by the driver
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryReport {
    /// Person who accepted the cylinders
    pub recipient_name: Option<String>,
    /// Stored signature image
    pub signature_url: Option<String>,
    /// Stored photo of the drop
    pub photo_url: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
    /// Empties actually collected; defaults to the planned empties of the order
    pub empties_collected: Option<i32>,
}

/// Optional filters for listing deliveries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryFilter {
    /// Only deliveries made on this route
    pub route_id: Option<i64>,
    /// Only deliveries made by this driver
    pub driver_id: Option<i64>,
    /// Only delivered or failed attempts
    pub status: Option<DeliveryStatus>,
}

/// Result of resolving a drop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropOutcome {
    /// The delivery record written for the order
    pub delivery: delivery::Model,
    /// The route after the drop, possibly completed
    pub route: route::Model,
}

/// Splits collected empties over order lines.
///
/// Each line takes up to its planned empties in order; whatever is left over lands on
/// the last line.
#[must_use]
pub fn allocate_empties(planned: &[i32], collected: i32) -> Vec<i32> {
    let mut remaining = collected;
    let last = planned.len().saturating_sub(1);
    planned
        .iter()
        .enumerate()
        .map(|(index, &plan)| {
            let take = if index == last {
                remaining
            } else {
                plan.min(remaining).max(0)
            };
            remaining -= take;
            take
        })
        .collect()
}

async fn open_drop<C>(
    db: &C,
    route_id: i64,
    order_id: i64,
) -> Result<(route::Model, route_delivery::Model)>
where
    C: ConnectionTrait,
{
    let route = require_route(db, route_id).await?;
    if route.status != RouteStatus::InProgress {
        return Err(Error::conflict(format!(
            "route {} is not in progress",
            route.route_number
        )));
    }
    let drop = find_drop(db, route_id, order_id).await?;
    if drop.status.is_resolved() {
        return Err(Error::conflict(format!(
            "drop for order {order_id} is already {:?}",
            drop.status
        )));
    }
    Ok((route, drop))
}

/// Writes the delivery record of an order, replacing an earlier failed attempt.
async fn upsert_delivery<C>(
    db: &C,
    record: delivery::ActiveModel,
    order_id: i64,
) -> Result<delivery::Model>
where
    C: ConnectionTrait,
{
    let existing = Delivery::find()
        .filter(delivery::Column::OrderId.eq(order_id))
        .one(db)
        .await?;
    match existing {
        Some(previous) => {
            let mut record = record;
            record.id = Set(previous.id);
            record.update(db).await.map_err(Into::into)
        }
        None => record.insert(db).await.map_err(Into::into),
    }
}

/// Records the driver's arrival at a drop.
#[instrument(skip(db))]
pub async fn mark_arrived<C>(db: &C, route_id: i64, order_id: i64) -> Result<route_delivery::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let (_, drop) = open_drop(&txn, route_id, order_id).await?;
    if drop.status != DropStatus::Pending {
        return Err(Error::conflict(format!(
            "driver already arrived for order {order_id}"
        )));
    }

    let now = chrono::Utc::now();
    let stop = find_stop(&txn, route_id, order_id).await?;
    let mut stop: route_stop::ActiveModel = stop.into();
    stop.actual_arrival = Set(Some(now));
    stop.update(&txn).await?;

    let mut drop: route_delivery::ActiveModel = drop.into();
    drop.status = Set(DropStatus::Arrived);
    drop.arrived_at = Set(Some(now));
    let arrived = drop.update(&txn).await?;

    txn.commit().await?;
    info!(route_id, order_id, "Driver arrived at drop");
    Ok(arrived)
}

/// Records a successful delivery at a drop.
///
/// # Errors
/// Returns [`Error::Conflict`] if the route is not in progress or the drop is already
/// resolved, and [`Error::InvalidQuantity`] for a negative empties count.
#[instrument(skip(db, report))]
pub async fn complete_drop<C>(
    db: &C,
    route_id: i64,
    order_id: i64,
    report: DeliveryReport,
) -> Result<DropOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    if let Some(empties) = report.empties_collected
        && empties < 0
    {
        return Err(Error::InvalidQuantity {
            field: "empties_collected",
            quantity: i64::from(empties),
        });
    }

    let txn = db.begin().await?;
    let (route, drop) = open_drop(&txn, route_id, order_id).await?;
    let order = require_order(&txn, order_id).await?;
    let items = get_order_items(&txn, order_id).await?;

    let planned: Vec<i32> = items.iter().map(|i| i.empty_received).collect();
    let empties_total = report
        .empties_collected
        .unwrap_or_else(|| planned.iter().sum());
    let empties = allocate_empties(&planned, empties_total);
    let cylinders: i32 = items.iter().map(|i| i.quantity).sum();

    let now = chrono::Utc::now();
    let recipient_name = optional_text(report.recipient_name);
    let signature_url = optional_text(report.signature_url);
    let photo_url = optional_text(report.photo_url);
    let notes = optional_text(report.notes);

    let mut active_drop: route_delivery::ActiveModel = drop.into();
    active_drop.status = Set(DropStatus::Delivered);
    active_drop.delivered_at = Set(Some(now));
    active_drop.signature_url = Set(signature_url.clone());
    active_drop.photo_url = Set(photo_url.clone());
    active_drop.notes = Set(notes.clone());
    active_drop.update(&txn).await?;

    let stop = find_stop(&txn, route_id, order_id).await?;
    let arrival = stop.actual_arrival.unwrap_or(now);
    let mut stop: route_stop::ActiveModel = stop.into();
    stop.is_completed = Set(true);
    stop.actual_arrival = Set(Some(arrival));
    stop.update(&txn).await?;

    let customer_id = order.customer_id;
    set_order_status(&txn, order, OrderStatus::Delivered).await?;

    let record = delivery::ActiveModel {
        order_id: Set(order_id),
        route_id: Set(Some(route_id)),
        driver_id: Set(route.driver_id),
        vehicle_id: Set(route.vehicle_id),
        status: Set(DeliveryStatus::Delivered),
        cylinders_delivered: Set(cylinders),
        empties_collected: Set(empties_total),
        recipient_name: Set(recipient_name),
        signature_url: Set(signature_url),
        photo_url: Set(photo_url),
        notes: Set(notes),
        delivered_at: Set(now),
        ..Default::default()
    };
    let delivery = upsert_delivery(&txn, record, order_id).await?;

    for (item, empties_collected) in items.iter().zip(empties) {
        delivery_history::ActiveModel {
            customer_id: Set(customer_id),
            order_id: Set(Some(order_id)),
            gas_product_id: Set(item.gas_product_id),
            driver_id: Set(route.driver_id),
            delivery_date: Set(now.date_naive()),
            quantity: Set(item.quantity),
            empties_collected: Set(empties_collected),
            amount: Set(item.subtotal),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        apply_delivered_cylinders(
            &txn,
            customer_id,
            item.gas_product_id,
            item.quantity,
            item.is_exchange,
            now,
        )
        .await?;
    }

    let completed_stops = route.completed_stops + 1;
    let mut active_route: route::ActiveModel = route.into();
    active_route.completed_stops = Set(completed_stops);
    active_route.updated_at = Set(now);
    let route = active_route.update(&txn).await?;
    let route = finish_route_if_done(&txn, route_id).await?.unwrap_or(route);

    txn.commit().await?;
    info!(
        route_id,
        order_id,
        cylinders,
        empties = empties_total,
        "Delivered drop"
    );
    Ok(DropOutcome { delivery, route })
}

/// Records a failed delivery attempt.
///
/// The order goes back to `confirmed` and is released from the route so it can be
/// planned again.
#[instrument(skip(db, reason))]
pub async fn fail_drop<C>(
    db: &C,
    route_id: i64,
    order_id: i64,
    reason: Option<String>,
) -> Result<DropOutcome>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let (route, drop) = open_drop(&txn, route_id, order_id).await?;
    let reason = optional_text(reason);
    let now = chrono::Utc::now();

    let mut active_drop: route_delivery::ActiveModel = drop.into();
    active_drop.status = Set(DropStatus::Failed);
    active_drop.notes = Set(reason.clone());
    active_drop.update(&txn).await?;

    let order = require_order(&txn, order_id).await?;
    set_order_status(&txn, order, OrderStatus::Confirmed).await?;

    let record = delivery::ActiveModel {
        order_id: Set(order_id),
        route_id: Set(Some(route_id)),
        driver_id: Set(route.driver_id),
        vehicle_id: Set(route.vehicle_id),
        status: Set(DeliveryStatus::Failed),
        cylinders_delivered: Set(0),
        empties_collected: Set(0),
        recipient_name: Set(None),
        signature_url: Set(None),
        photo_url: Set(None),
        notes: Set(reason),
        delivered_at: Set(now),
        ..Default::default()
    };
    let delivery = upsert_delivery(&txn, record, order_id).await?;
    let route = finish_route_if_done(&txn, route_id).await?.unwrap_or(route);

    txn.commit().await?;
    warn!(route_id, order_id, "Delivery failed");
    Ok(DropOutcome { delivery, route })
}

/// Lists delivery records, newest first.
pub async fn list_deliveries<C>(
    db: &C,
    filter: &DeliveryFilter,
    page: Pagination,
) -> Result<Vec<delivery::Model>>
where
    C: ConnectionTrait,
{
    Delivery::find()
        .apply_if(filter.route_id, |q, id| {
            q.filter(delivery::Column::RouteId.eq(id))
        })
        .apply_if(filter.driver_id, |q, id| {
            q.filter(delivery::Column::DriverId.eq(id))
        })
        .apply_if(filter.status, |q, status| {
            q.filter(delivery::Column::Status.eq(status))
        })
        .order_by_desc(delivery::Column::DeliveredAt)
        .order_by_desc(delivery::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Per-product delivery history of a customer, newest first.
pub async fn customer_delivery_history<C>(
    db: &C,
    customer_id: i64,
    page: Pagination,
) -> Result<Vec<delivery_history::Model>>
where
    C: ConnectionTrait,
{
    if get_customer_by_id(db, customer_id).await?.is_none() {
        return Err(Error::not_found("customer", customer_id));
    }
    DeliveryHistory::find()
        .filter(delivery_history::Column::CustomerId.eq(customer_id))
        .order_by_desc(delivery_history::Column::DeliveryDate)
        .order_by_desc(delivery_history::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{inventory::get_customer_inventory, route::start_route};
    use crate::test_utils::*;

    #[test]
    fn test_allocate_empties() {
        assert_eq!(allocate_empties(&[2, 1], 3), vec![2, 1]);
        assert_eq!(allocate_empties(&[2, 1], 1), vec![1, 0]);
        assert_eq!(allocate_empties(&[2, 1], 5), vec![2, 3]);
        assert_eq!(allocate_empties(&[0], 2), vec![2]);
        assert!(allocate_empties(&[], 0).is_empty());
    }

    #[tokio::test]
    async fn test_complete_drop_updates_everything() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 2).await?;
        let route = create_ready_route(&db, &[order.id]).await?;
        start_route(&db, route.id).await?;

        mark_arrived(&db, route.id, order.id).await?;
        let outcome = complete_drop(
            &db,
            route.id,
            order.id,
            DeliveryReport {
                recipient_name: Some("Mrs. Lin".to_string()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(outcome.delivery.status, DeliveryStatus::Delivered);
        assert_eq!(outcome.delivery.cylinders_delivered, 2);
        assert_eq!(outcome.route.completed_stops, 1);
        assert_eq!(outcome.route.status, RouteStatus::Completed);
        assert!(outcome.route.completed_at.is_some());

        let delivered = require_order(&db, order.id).await?;
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());

        let stop = find_stop(&db, route.id, order.id).await?;
        assert!(stop.is_completed);
        assert!(stop.actual_arrival.is_some());

        let history =
            customer_delivery_history(&db, order.customer_id, Pagination::default()).await?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].quantity, 2);
        assert_eq!(history[0].amount, order.final_amount);

        let inventory = get_customer_inventory(&db, order.customer_id).await?;
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].quantity_owned, 2);
        assert_eq!(inventory[0].quantity_total, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_cannot_be_resolved_twice() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_order(&db, 1).await?;
        let second = create_test_order(&db, 1).await?;
        let route = create_ready_route(&db, &[first.id, second.id]).await?;
        start_route(&db, route.id).await?;

        let outcome = complete_drop(&db, route.id, first.id, DeliveryReport::default()).await?;
        assert_eq!(outcome.route.status, RouteStatus::InProgress);

        let result = complete_drop(&db, route.id, first.id, DeliveryReport::default()).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        let result = fail_drop(&db, route.id, first.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_drop_requires_started_route() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 1).await?;
        let route = create_ready_route(&db, &[order.id]).await?;

        let result = complete_drop(&db, route.id, order.id, DeliveryReport::default()).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_empties_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 1).await?;
        let route = create_ready_route(&db, &[order.id]).await?;
        start_route(&db, route.id).await?;

        let result = complete_drop(
            &db,
            route.id,
            order.id,
            DeliveryReport {
                empties_collected: Some(-1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidQuantity { .. }));

        let still_open = find_drop(&db, route.id, order.id).await?;
        assert_eq!(still_open.status, DropStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_drop_releases_order_and_completes_route() -> Result<()> {
        let db = setup_test_db().await?;
        let delivered = create_test_order(&db, 1).await?;
        let failed = create_test_order(&db, 1).await?;
        let route = create_ready_route(&db, &[delivered.id, failed.id]).await?;
        start_route(&db, route.id).await?;

        complete_drop(&db, route.id, delivered.id, DeliveryReport::default()).await?;
        let outcome = fail_drop(&db, route.id, failed.id, Some("nobody home".to_string())).await?;

        assert_eq!(outcome.delivery.status, DeliveryStatus::Failed);
        assert_eq!(outcome.delivery.notes.as_deref(), Some("nobody home"));
        assert_eq!(outcome.route.status, RouteStatus::Completed);
        assert_eq!(outcome.route.completed_stops, 1);

        let released = require_order(&db, failed.id).await?;
        assert_eq!(released.status, OrderStatus::Confirmed);
        assert_eq!(released.route_id, None);

        let failures = list_deliveries(
            &db,
            &DeliveryFilter {
                status: Some(DeliveryStatus::Failed),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].order_id, failed.id);
        Ok(())
    }
}
