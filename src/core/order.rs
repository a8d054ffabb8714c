//! Order business logic - Order intake, editing and lifecycle.
//!
//! An order and its items are always written together in one transaction. Prices are
//! copied from the product at creation time; discounts are per line and given in
//! percent. Status changes that depend on routing (`assigned`, `in_delivery`,
//! `delivered`) are driven by the route and delivery modules.

use crate::{
    core::{
        Pagination, customer::require_active_customer, gas_product::get_gas_product_by_id,
        optional_text, round_currency, route,
    },
    entities::{Order, OrderItem, OrderStatus, PaymentStatus, Route, order, order_item},
    errors::{Error, Result},
};
use chrono::NaiveTime;
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One product line of a new order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderItem {
    /// Product to deliver
    pub gas_product_id: i64,
    /// Number of cylinders, must be positive
    pub quantity: i32,
    /// Discount in percent (0-100)
    #[serde(default)]
    pub discount_percentage: f64,
    /// Exchange of empties for full cylinders
    #[serde(default)]
    pub is_exchange: bool,
    /// Empty cylinders to collect
    #[serde(default)]
    pub empty_received: i32,
}

/// Input for creating an order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    /// Ordering customer
    pub customer_id: i64,
    /// Delivery day
    pub scheduled_date: Date,
    /// Earliest delivery time, "HH:MM"
    pub delivery_time_start: Option<String>,
    /// Latest delivery time, "HH:MM"
    pub delivery_time_end: Option<String>,
    /// Plan this order first
    #[serde(default)]
    pub is_urgent: bool,
    /// How the customer pays
    pub payment_method: Option<String>,
    /// Notes for the driver
    pub delivery_notes: Option<String>,
    /// Product lines, at least one
    pub items: Vec<NewOrderItem>,
}

/// Editable order header fields; only allowed while pending or confirmed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    /// New delivery day
    pub scheduled_date: Option<Date>,
    /// New earliest delivery time
    pub delivery_time_start: Option<String>,
    /// New latest delivery time
    pub delivery_time_end: Option<String>,
    /// New urgency flag
    pub is_urgent: Option<bool>,
    /// New payment method
    pub payment_method: Option<String>,
    /// New driver notes
    pub delivery_notes: Option<String>,
}

/// Optional filters for listing orders
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    /// Only orders in this status
    pub status: Option<OrderStatus>,
    /// Only orders of this customer
    pub customer_id: Option<i64>,
    /// Only orders planned on this route
    pub route_id: Option<i64>,
    /// Scheduled on or after this day
    pub date_from: Option<Date>,
    /// Scheduled on or before this day
    pub date_to: Option<Date>,
    /// Only urgent (`true`) or normal (`false`) orders
    pub is_urgent: Option<bool>,
}

/// An order together with its product lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithItems {
    /// Order header
    #[serde(flatten)]
    pub order: order::Model,
    /// Product lines
    pub items: Vec<order_item::Model>,
}

/// Amounts of a single priced line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    /// `quantity * unit_price`
    pub gross: f64,
    /// Discount in currency
    pub discount_amount: f64,
    /// `gross - discount_amount`
    pub subtotal: f64,
}

/// Prices one order line. Amounts are rounded to cents.
#[must_use]
pub fn price_line(quantity: i32, unit_price: f64, discount_percentage: f64) -> PricedLine {
    let gross = round_currency(f64::from(quantity) * unit_price);
    let discount_amount = round_currency(gross * discount_percentage / 100.0);
    PricedLine {
        gross,
        discount_amount,
        subtotal: round_currency(gross - discount_amount),
    }
}

/// Builds an order number such as `ORD-20240115-1A2B3C4D`.
#[must_use]
pub fn generate_order_number(date: Date) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("ORD-{}-{suffix}", date.format("%Y%m%d"))
}

fn validate_item(item: &NewOrderItem) -> Result<()> {
    if item.quantity <= 0 {
        return Err(Error::InvalidQuantity {
            field: "quantity",
            quantity: i64::from(item.quantity),
        });
    }
    if item.empty_received < 0 {
        return Err(Error::InvalidQuantity {
            field: "empty_received",
            quantity: i64::from(item.empty_received),
        });
    }
    if !item.discount_percentage.is_finite() || !(0.0..=100.0).contains(&item.discount_percentage)
    {
        return Err(Error::validation(format!(
            "discount_percentage must be between 0 and 100, got {}",
            item.discount_percentage
        )));
    }
    Ok(())
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| Error::validation(format!("{field} must be HH:MM, got {value:?}")))
}

/// Normalizes a delivery window; the start must not be after the end.
fn validate_time_window(
    start: Option<String>,
    end: Option<String>,
) -> Result<(Option<String>, Option<String>)> {
    let start = optional_text(start);
    let end = optional_text(end);
    let parsed_start = start
        .as_deref()
        .map(|s| parse_time("delivery_time_start", s))
        .transpose()?;
    let parsed_end = end
        .as_deref()
        .map(|s| parse_time("delivery_time_end", s))
        .transpose()?;
    if let (Some(s), Some(e)) = (parsed_start, parsed_end)
        && s > e
    {
        return Err(Error::validation(
            "delivery_time_start must not be after delivery_time_end",
        ));
    }
    Ok((
        parsed_start.map(|t| t.format("%H:%M").to_string()),
        parsed_end.map(|t| t.format("%H:%M").to_string()),
    ))
}

/// Creates an order with its items in one transaction.
///
/// # Errors
/// Returns an error if:
/// - There are no items, or an item has a non-positive quantity, negative empties or a
///   discount outside 0-100
/// - The delivery window is malformed
/// - The customer is missing or inactive
/// - A product is missing or unavailable
#[instrument(skip(db, input), fields(customer_id = input.customer_id))]
pub async fn create_order<C>(db: &C, input: NewOrder) -> Result<OrderWithItems>
where
    C: ConnectionTrait + TransactionTrait,
{
    if input.items.is_empty() {
        return Err(Error::validation("an order needs at least one item"));
    }
    for item in &input.items {
        validate_item(item)?;
    }
    let (time_start, time_end) =
        validate_time_window(input.delivery_time_start, input.delivery_time_end)?;

    let txn = db.begin().await?;

    require_active_customer(&txn, input.customer_id).await?;

    let mut priced = Vec::with_capacity(input.items.len());
    for item in &input.items {
        let product = get_gas_product_by_id(&txn, item.gas_product_id)
            .await?
            .filter(|p| p.is_available)
            .ok_or_else(|| Error::not_found("gas product", item.gas_product_id))?;
        let line = price_line(item.quantity, product.unit_price, item.discount_percentage);
        priced.push((item, product.unit_price, line));
    }

    let total_amount = round_currency(priced.iter().map(|(_, _, line)| line.gross).sum());
    let discount_amount =
        round_currency(priced.iter().map(|(_, _, line)| line.discount_amount).sum());

    let now = chrono::Utc::now();
    let order = order::ActiveModel {
        order_number: Set(generate_order_number(now.date_naive())),
        customer_id: Set(input.customer_id),
        scheduled_date: Set(input.scheduled_date),
        delivery_time_start: Set(time_start),
        delivery_time_end: Set(time_end),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Unpaid),
        payment_method: Set(optional_text(input.payment_method)),
        is_urgent: Set(input.is_urgent),
        total_amount: Set(total_amount),
        discount_amount: Set(discount_amount),
        final_amount: Set(round_currency(total_amount - discount_amount)),
        delivery_notes: Set(optional_text(input.delivery_notes)),
        route_id: Set(None),
        driver_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        delivered_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (item, unit_price, line) in priced {
        let row = order_item::ActiveModel {
            order_id: Set(order.id),
            gas_product_id: Set(item.gas_product_id),
            quantity: Set(item.quantity),
            unit_price: Set(unit_price),
            discount_percentage: Set(item.discount_percentage),
            discount_amount: Set(line.discount_amount),
            subtotal: Set(line.subtotal),
            is_exchange: Set(item.is_exchange),
            empty_received: Set(item.empty_received),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(row);
    }

    txn.commit().await?;

    info!(
        order_id = order.id,
        order_number = %order.order_number,
        final_amount = order.final_amount,
        "Created order"
    );
    Ok(OrderWithItems { order, items })
}

/// Finds an order header by ID.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an order header or fails with [`Error::NotFound`].
pub async fn require_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| Error::not_found("order", order_id))
}

/// Loads the items of an order in insertion order.
pub async fn get_order_items<C>(db: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Total number of cylinders on an order.
pub async fn order_cylinder_count<C>(db: &C, order_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let items = get_order_items(db, order_id).await?;
    Ok(items.iter().map(|i| i64::from(i.quantity)).sum())
}

/// Loads an order with its items.
pub async fn get_order_with_items<C>(db: &C, order_id: i64) -> Result<OrderWithItems>
where
    C: ConnectionTrait,
{
    let order = require_order(db, order_id).await?;
    let items = get_order_items(db, order_id).await?;
    Ok(OrderWithItems { order, items })
}

/// Lists orders by scheduled day, urgent first.
pub async fn list_orders<C>(
    db: &C,
    filter: &OrderFilter,
    page: Pagination,
) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .apply_if(filter.status, |q, status| {
            q.filter(order::Column::Status.eq(status))
        })
        .apply_if(filter.customer_id, |q, id| {
            q.filter(order::Column::CustomerId.eq(id))
        })
        .apply_if(filter.route_id, |q, id| {
            q.filter(order::Column::RouteId.eq(id))
        })
        .apply_if(filter.date_from, |q, date| {
            q.filter(order::Column::ScheduledDate.gte(date))
        })
        .apply_if(filter.date_to, |q, date| {
            q.filter(order::Column::ScheduledDate.lte(date))
        })
        .apply_if(filter.is_urgent, |q, urgent| {
            q.filter(order::Column::IsUrgent.eq(urgent))
        })
        .order_by_asc(order::Column::ScheduledDate)
        .order_by_desc(order::Column::IsUrgent)
        .order_by_asc(order::Column::Id)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates header fields of a pending or confirmed order.
///
/// # Errors
/// Returns [`Error::Conflict`] once the order is on a route or finished.
#[instrument(skip(db, update))]
pub async fn update_order<C>(db: &C, order_id: i64, update: OrderUpdate) -> Result<order::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = require_order(db, order_id).await?;
    if !existing.status.is_editable() {
        return Err(Error::conflict(format!(
            "order {} can no longer be edited in status {:?}",
            existing.order_number, existing.status
        )));
    }

    let (time_start, time_end) = validate_time_window(
        update
            .delivery_time_start
            .or_else(|| existing.delivery_time_start.clone()),
        update
            .delivery_time_end
            .or_else(|| existing.delivery_time_end.clone()),
    )?;

    let mut order: order::ActiveModel = existing.into();
    if let Some(date) = update.scheduled_date {
        order.scheduled_date = Set(date);
    }
    order.delivery_time_start = Set(time_start);
    order.delivery_time_end = Set(time_end);
    if let Some(urgent) = update.is_urgent {
        order.is_urgent = Set(urgent);
    }
    if update.payment_method.is_some() {
        order.payment_method = Set(optional_text(update.payment_method));
    }
    if update.delivery_notes.is_some() {
        order.delivery_notes = Set(optional_text(update.delivery_notes));
    }
    order.updated_at = Set(chrono::Utc::now());

    order.update(db).await.map_err(Into::into)
}

/// Moves an order to `next`, validating the lifecycle.
///
/// Falling back to `confirmed` or being cancelled releases the order from its route
/// and driver; reaching `delivered` stamps `delivered_at`. Route bookkeeping is the
/// caller's responsibility.
pub(crate) async fn set_order_status<C>(
    db: &C,
    existing: order::Model,
    next: OrderStatus,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    if !existing.status.can_transition_to(next) {
        return Err(Error::InvalidStatusTransition {
            entity: "order",
            from: format!("{:?}", existing.status),
            to: format!("{next:?}"),
        });
    }

    let now = chrono::Utc::now();
    let mut order: order::ActiveModel = existing.into();
    order.status = Set(next);
    match next {
        OrderStatus::Confirmed | OrderStatus::Cancelled => {
            order.route_id = Set(None);
            order.driver_id = Set(None);
        }
        OrderStatus::Delivered => order.delivered_at = Set(Some(now)),
        OrderStatus::Pending | OrderStatus::Assigned | OrderStatus::InDelivery => {}
    }
    order.updated_at = Set(now);
    order.update(db).await.map_err(Into::into)
}

/// Applies a status change requested by the office.
///
/// Only confirming a pending order and cancelling are allowed here; the routing
/// statuses are reached through route and delivery operations.
///
/// # Errors
/// Returns [`Error::InvalidStatusTransition`] for any other change.
#[instrument(skip(db))]
pub async fn update_order_status<C>(
    db: &C,
    order_id: i64,
    next: OrderStatus,
) -> Result<order::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    match next {
        OrderStatus::Cancelled => cancel_order(db, order_id).await,
        OrderStatus::Confirmed => {
            let existing = require_order(db, order_id).await?;
            if existing.status != OrderStatus::Pending {
                return Err(Error::InvalidStatusTransition {
                    entity: "order",
                    from: format!("{:?}", existing.status),
                    to: format!("{next:?}"),
                });
            }
            set_order_status(db, existing, next).await
        }
        other => {
            let existing = require_order(db, order_id).await?;
            Err(Error::InvalidStatusTransition {
                entity: "order",
                from: format!("{:?}", existing.status),
                to: format!("{other:?}"),
            })
        }
    }
}

/// Cancels an order.
///
/// An order still on a route that is being planned is taken off that route first.
///
/// # Errors
/// Returns [`Error::Conflict`] if the order's route has already started, and
/// [`Error::InvalidStatusTransition`] for delivered or cancelled orders.
#[instrument(skip(db))]
pub async fn cancel_order<C>(db: &C, order_id: i64) -> Result<order::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing = require_order(&txn, order_id).await?;

    if let Some(route_id) = existing.route_id
        && !existing.status.is_terminal()
    {
        let planned_on = Route::find_by_id(route_id).one(&txn).await?;
        match planned_on {
            Some(r) if r.status.is_planning() => {
                route::detach_order(&txn, &r, order_id).await?;
            }
            Some(r) => {
                warn!(order_id, route_id, "Refusing to cancel order on active route");
                return Err(Error::conflict(format!(
                    "order is on route {} which is {:?}",
                    r.route_number, r.status
                )));
            }
            None => {}
        }
    }

    let cancelled = set_order_status(&txn, existing, OrderStatus::Cancelled).await?;
    txn.commit().await?;

    info!(order_id, "Cancelled order");
    Ok(cancelled)
}

/// Records a payment status change.
///
/// # Errors
/// Returns [`Error::InvalidStatusTransition`] when refunding an order that was not
/// paid, or when marking a refunded order paid again.
pub async fn update_payment_status<C>(
    db: &C,
    order_id: i64,
    payment_status: PaymentStatus,
    payment_method: Option<String>,
) -> Result<order::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = require_order(db, order_id).await?;
    let allowed = matches!(
        (existing.payment_status, payment_status),
        (PaymentStatus::Unpaid | PaymentStatus::Paid, PaymentStatus::Paid)
            | (PaymentStatus::Paid | PaymentStatus::Refunded, PaymentStatus::Refunded)
            | (PaymentStatus::Unpaid, PaymentStatus::Unpaid)
    );
    if !allowed {
        return Err(Error::InvalidStatusTransition {
            entity: "payment",
            from: format!("{:?}", existing.payment_status),
            to: format!("{payment_status:?}"),
        });
    }

    let mut order: order::ActiveModel = existing.into();
    order.payment_status = Set(payment_status);
    if payment_method.is_some() {
        order.payment_method = Set(optional_text(payment_method));
    }
    order.updated_at = Set(chrono::Utc::now());
    order.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn item(gas_product_id: i64, quantity: i32) -> NewOrderItem {
        NewOrderItem {
            gas_product_id,
            quantity,
            discount_percentage: 0.0,
            is_exchange: true,
            empty_received: 0,
        }
    }

    fn new_order(customer_id: i64, items: Vec<NewOrderItem>) -> NewOrder {
        NewOrder {
            customer_id,
            scheduled_date: test_date(),
            delivery_time_start: None,
            delivery_time_end: None,
            is_urgent: false,
            payment_method: None,
            delivery_notes: None,
            items,
        }
    }

    #[test]
    fn test_price_line() {
        let line = price_line(3, 720.0, 10.0);
        assert_eq!(line.gross, 2160.0);
        assert_eq!(line.discount_amount, 216.0);
        assert_eq!(line.subtotal, 1944.0);

        let undiscounted = price_line(1, 99.99, 0.0);
        assert_eq!(undiscounted.subtotal, 99.99);
    }

    #[test]
    fn test_order_number_format() {
        let date = Date::from_ymd_opt(2024, 1, 15).unwrap();
        let number = generate_order_number(date);
        assert!(number.starts_with("ORD-20240115-"));
        assert_eq!(number.len(), "ORD-20240115-".len() + 8);
    }

    #[test]
    fn test_time_window_validation() {
        let ok = validate_time_window(Some("08:00".to_string()), Some("12:30".to_string()));
        assert_eq!(
            ok.unwrap(),
            (Some("08:00".to_string()), Some("12:30".to_string()))
        );
        assert!(
            validate_time_window(Some("14:00".to_string()), Some("09:00".to_string())).is_err()
        );
        assert!(validate_time_window(Some("25:00".to_string()), None).is_err());
        assert_eq!(validate_time_window(None, None).unwrap(), (None, None));
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() -> Result<()> {
        // Rejected before any query is issued
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = create_order(&db, new_order(1, vec![item(1, -2)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity {
                field: "quantity",
                quantity: -2
            }
        ));

        let result = create_order(&db, new_order(1, vec![])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let mut discounted = item(1, 1);
        discounted.discount_percentage = 120.0;
        let result = create_order(&db, new_order(1, vec![discounted])).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_computes_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-1").await?;
        let small = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;
        let large = create_test_product(&db, "GAS-50", 50.0, 1500.0).await?;

        let mut discounted = item(large.id, 1);
        discounted.discount_percentage = 10.0;
        let created =
            create_order(&db, new_order(customer.id, vec![item(small.id, 2), discounted])).await?;

        assert_eq!(created.order.status, OrderStatus::Pending);
        assert_eq!(created.order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(created.order.total_amount, 2900.0);
        assert_eq!(created.order.discount_amount, 150.0);
        assert_eq!(created.order.final_amount, 2750.0);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[1].subtotal, 1350.0);

        let loaded = get_order_with_items(&db, created.order.id).await?;
        assert_eq!(loaded, created);
        assert_eq!(order_cylinder_count(&db, created.order.id).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_product_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-2").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;

        let result = create_order(
            &db,
            new_order(customer.id, vec![item(product.id, 1), item(999, 1)]),
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let orders = list_orders(&db, &OrderFilter::default(), Pagination::default()).await?;
        assert!(orders.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_customer_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-3").await?;
        let product = create_test_product(&db, "GAS-20", 20.0, 700.0).await?;
        crate::core::customer::deactivate_customer(&db, customer.id).await?;

        let result = create_order(&db, new_order(customer.id, vec![item(product.id, 1)])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "customer",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 2).await?;

        let confirmed = update_order_status(&db, order.id, OrderStatus::Confirmed).await?;
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let result = update_order_status(&db, order.id, OrderStatus::Delivered).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        let cancelled = update_order_status(&db, order.id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let result = cancel_order(&db, order.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_only_while_editable() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 1).await?;

        let updated = update_order(
            &db,
            order.id,
            OrderUpdate {
                is_urgent: Some(true),
                delivery_time_start: Some("09:00".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert!(updated.is_urgent);
        assert_eq!(updated.delivery_time_start.as_deref(), Some("09:00"));

        cancel_order(&db, order.id).await?;
        let result = update_order(&db, order.id, OrderUpdate::default()).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_status() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db, 1).await?;

        let result = update_payment_status(&db, order.id, PaymentStatus::Refunded, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        let paid =
            update_payment_status(&db, order.id, PaymentStatus::Paid, Some("cash".to_string()))
                .await?;
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.payment_method.as_deref(), Some("cash"));

        let refunded = update_payment_status(&db, order.id, PaymentStatus::Refunded, None).await?;
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_order(&db, 1).await?;
        create_test_order(&db, 1).await?;
        update_order_status(&db, first.id, OrderStatus::Confirmed).await?;

        let confirmed = list_orders(
            &db,
            &OrderFilter {
                status: Some(OrderStatus::Confirmed),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, first.id);

        let in_range = list_orders(
            &db,
            &OrderFilter {
                date_from: Some(test_date()),
                date_to: Some(test_date()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(in_range.len(), 2);
        Ok(())
    }
}
