//! Route business logic - Daily delivery runs and their stops.
//!
//! A route is planned by adding orders to it; every order gets one [`route_stop`]
//! (where and when) and one [`route_delivery`] (what happened there). Stops are kept
//! in a dense 1-based sequence. Planning operations are only allowed while the route
//! is `planned` or `optimized`; once started, drops are resolved through the delivery
//! module.

use crate::{
    core::{
        Pagination,
        customer::get_customer_by_id,
        driver::require_active_driver,
        order::{order_cylinder_count, require_order, set_order_status},
        optional_text, required_text,
        vehicle::require_active_vehicle,
    },
    entities::{
        DropStatus, Order, OrderStatus, Route, RouteDelivery, RouteStatus, RouteStop, order, route,
        route_delivery, route_stop,
    },
    errors::{Error, Result},
};
use sea_orm::{
    QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Note written on drops left unresolved by a cancelled route
pub const ROUTE_CANCELLED_NOTE: &str = "route cancelled";

/// Input for creating a route
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    /// Explicit route number; generated when absent
    pub route_number: Option<String>,
    /// Day the route runs
    pub route_date: Date,
    /// Delivery area
    pub area: Option<String>,
    /// Driver, if already known
    pub driver_id: Option<i64>,
    /// Vehicle, if already known
    pub vehicle_id: Option<i64>,
    /// Planned duration in minutes
    #[serde(default)]
    pub estimated_duration_minutes: i32,
}

/// Driver and vehicle to put on a route; absent values are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteAssignment {
    /// Driver to assign
    pub driver_id: Option<i64>,
    /// Vehicle to assign
    pub vehicle_id: Option<i64>,
}

/// An order to append to a route
#[derive(Debug, Clone, Deserialize)]
pub struct AddRouteOrder {
    /// Order to deliver
    pub order_id: i64,
    /// Stop latitude; defaults to the customer's
    pub latitude: Option<f64>,
    /// Stop longitude; defaults to the customer's
    pub longitude: Option<f64>,
    /// Leg length from the previous stop
    pub distance_from_previous_km: Option<f64>,
    /// Planned arrival
    pub estimated_arrival: Option<DateTimeUtc>,
}

/// One position of a manual stop plan
#[derive(Debug, Clone, Deserialize)]
pub struct StopPlan {
    /// Order at this position
    pub order_id: i64,
    /// Leg length from the previous stop
    pub distance_from_previous_km: Option<f64>,
    /// Planned arrival
    pub estimated_arrival: Option<DateTimeUtc>,
}

/// Optional filters for listing routes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteFilter {
    /// Only routes on this day
    pub route_date: Option<Date>,
    /// Only routes in this status
    pub status: Option<RouteStatus>,
    /// Only routes of this driver
    pub driver_id: Option<i64>,
}

/// A route with its stops and drops, both in sequence order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWithStops {
    /// Route header
    #[serde(flatten)]
    pub route: route::Model,
    /// Planned stops
    pub stops: Vec<route_stop::Model>,
    /// Drop outcomes
    pub deliveries: Vec<route_delivery::Model>,
}

/// Builds a route number such as `RT-20240115-1A2B3C`.
#[must_use]
pub fn generate_route_number(date: Date) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("RT-{}-{suffix}", date.format("%Y%m%d"))
}

fn validate_distance(distance: Option<f64>) -> Result<()> {
    match distance {
        Some(km) if !km.is_finite() || km < 0.0 => Err(Error::validation(format!(
            "distance_from_previous_km must not be negative, got {km}"
        ))),
        _ => Ok(()),
    }
}

fn transition_error(from: RouteStatus, to: RouteStatus) -> Error {
    Error::InvalidStatusTransition {
        entity: "route",
        from: format!("{from:?}"),
        to: format!("{to:?}"),
    }
}

fn require_planning(route: &route::Model) -> Result<()> {
    if route.status.is_planning() {
        Ok(())
    } else {
        Err(Error::conflict(format!(
            "route {} can no longer be planned in status {:?}",
            route.route_number, route.status
        )))
    }
}

/// Creates an empty route.
///
/// # Errors
/// Returns [`Error::NotFound`] for a missing or inactive driver or vehicle, and
/// [`Error::Conflict`] for a duplicate route number.
#[instrument(skip(db, input), fields(route_date = %input.route_date))]
pub async fn create_route<C>(db: &C, input: NewRoute) -> Result<route::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let route_number = match input.route_number {
        Some(number) => required_text("route_number", &number)?,
        None => generate_route_number(input.route_date),
    };
    if input.estimated_duration_minutes < 0 {
        return Err(Error::InvalidQuantity {
            field: "estimated_duration_minutes",
            quantity: i64::from(input.estimated_duration_minutes),
        });
    }
    if let Some(driver_id) = input.driver_id {
        require_active_driver(db, driver_id).await?;
    }
    if let Some(vehicle_id) = input.vehicle_id {
        require_active_vehicle(db, vehicle_id).await?;
    }

    let now = chrono::Utc::now();
    let route = route::ActiveModel {
        route_number: Set(route_number),
        route_date: Set(input.route_date),
        area: Set(optional_text(input.area)),
        driver_id: Set(input.driver_id),
        vehicle_id: Set(input.vehicle_id),
        status: Set(RouteStatus::Planned),
        total_stops: Set(0),
        completed_stops: Set(0),
        total_distance_km: Set(0.0),
        estimated_duration_minutes: Set(input.estimated_duration_minutes),
        optimization_score: Set(None),
        is_optimized: Set(false),
        started_at: Set(None),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = route.insert(db).await?;
    info!(route_id = created.id, route_number = %created.route_number, "Created route");
    Ok(created)
}

/// Loads a route header or fails with [`Error::NotFound`].
pub async fn require_route<C>(db: &C, route_id: i64) -> Result<route::Model>
where
    C: ConnectionTrait,
{
    Route::find_by_id(route_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("route", route_id))
}

/// Stops of a route in sequence order.
pub async fn get_route_stops<C>(db: &C, route_id: i64) -> Result<Vec<route_stop::Model>>
where
    C: ConnectionTrait,
{
    RouteStop::find()
        .filter(route_stop::Column::RouteId.eq(route_id))
        .order_by_asc(route_stop::Column::StopSequence)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Drops of a route in sequence order.
pub async fn get_route_deliveries<C>(db: &C, route_id: i64) -> Result<Vec<route_delivery::Model>>
where
    C: ConnectionTrait,
{
    RouteDelivery::find()
        .filter(route_delivery::Column::RouteId.eq(route_id))
        .order_by_asc(route_delivery::Column::Sequence)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the drop of an order on a route.
pub async fn find_drop<C>(db: &C, route_id: i64, order_id: i64) -> Result<route_delivery::Model>
where
    C: ConnectionTrait,
{
    RouteDelivery::find()
        .filter(route_delivery::Column::RouteId.eq(route_id))
        .filter(route_delivery::Column::OrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("route order", format!("{route_id}/{order_id}")))
}

/// Finds the stop of an order on a route.
pub async fn find_stop<C>(db: &C, route_id: i64, order_id: i64) -> Result<route_stop::Model>
where
    C: ConnectionTrait,
{
    RouteStop::find()
        .filter(route_stop::Column::RouteId.eq(route_id))
        .filter(route_stop::Column::OrderId.eq(order_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("route stop", format!("{route_id}/{order_id}")))
}

/// Loads a route with its stops and drops.
pub async fn get_route_with_stops<C>(db: &C, route_id: i64) -> Result<RouteWithStops>
where
    C: ConnectionTrait,
{
    let route = require_route(db, route_id).await?;
    let stops = get_route_stops(db, route_id).await?;
    let deliveries = get_route_deliveries(db, route_id).await?;
    Ok(RouteWithStops {
        route,
        stops,
        deliveries,
    })
}

/// Lists routes by day and number.
pub async fn list_routes<C>(
    db: &C,
    filter: &RouteFilter,
    page: Pagination,
) -> Result<Vec<route::Model>>
where
    C: ConnectionTrait,
{
    Route::find()
        .apply_if(filter.route_date, |q, date| {
            q.filter(route::Column::RouteDate.eq(date))
        })
        .apply_if(filter.status, |q, status| {
            q.filter(route::Column::Status.eq(status))
        })
        .apply_if(filter.driver_id, |q, id| {
            q.filter(route::Column::DriverId.eq(id))
        })
        .order_by_desc(route::Column::RouteDate)
        .order_by_asc(route::Column::RouteNumber)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Cylinders on all orders of a route whose drop is not failed.
async fn route_cylinder_count<C>(db: &C, route_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let mut total = 0;
    for drop in get_route_deliveries(db, route_id).await? {
        if drop.status != DropStatus::Failed {
            total += order_cylinder_count(db, drop.order_id).await?;
        }
    }
    Ok(total)
}

async fn ensure_capacity<C>(db: &C, vehicle_id: i64, cylinders: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let vehicle = require_active_vehicle(db, vehicle_id).await?;
    if cylinders > i64::from(vehicle.max_cylinders) {
        return Err(Error::conflict(format!(
            "vehicle {} carries at most {} cylinders, route needs {cylinders}",
            vehicle.plate_number, vehicle.max_cylinders
        )));
    }
    Ok(())
}

/// Recomputes `total_stops` and `total_distance_km` from the stops.
async fn refresh_route_totals<C>(db: &C, route: route::Model) -> Result<route::Model>
where
    C: ConnectionTrait,
{
    let stops = get_route_stops(db, route.id).await?;
    let distance: f64 = stops
        .iter()
        .filter_map(|s| s.distance_from_previous_km)
        .sum();

    let mut active: route::ActiveModel = route.into();
    active.total_stops = Set(i32::try_from(stops.len())?);
    active.total_distance_km = Set(distance);
    active.updated_at = Set(chrono::Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Writes a dense 1-based sequence for `stops` in the given order.
///
/// Sequences are unique per route, so every stop is first parked on a negative value
/// before the final numbers are written.
async fn write_stop_sequence<C>(db: &C, stops: Vec<route_stop::Model>) -> Result<()>
where
    C: ConnectionTrait,
{
    for (index, stop) in stops.iter().enumerate() {
        let parked = -i32::try_from(index + 1)?;
        RouteStop::update_many()
            .col_expr(route_stop::Column::StopSequence, Expr::value(parked))
            .filter(route_stop::Column::Id.eq(stop.id))
            .exec(db)
            .await?;
    }

    for (index, stop) in stops.into_iter().enumerate() {
        let sequence = i32::try_from(index + 1)?;
        let route_id = stop.route_id;
        let order_id = stop.order_id;
        let mut active: route_stop::ActiveModel = stop.into();
        active.stop_sequence = Set(sequence);
        active.update(db).await?;

        RouteDelivery::update_many()
            .col_expr(route_delivery::Column::Sequence, Expr::value(sequence))
            .filter(route_delivery::Column::RouteId.eq(route_id))
            .filter(route_delivery::Column::OrderId.eq(order_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

/// Removes an order's stop and drop from a planning route and closes the gap.
///
/// The order itself is not touched.
pub(crate) async fn detach_order<C>(
    db: &C,
    route: &route::Model,
    order_id: i64,
) -> Result<route::Model>
where
    C: ConnectionTrait,
{
    require_planning(route)?;
    let stop = find_stop(db, route.id, order_id).await?;
    let drop = find_drop(db, route.id, order_id).await?;

    stop.delete(db).await?;
    drop.delete(db).await?;

    let remaining = get_route_stops(db, route.id).await?;
    write_stop_sequence(db, remaining).await?;

    debug!(route_id = route.id, order_id, "Detached order from route");
    refresh_route_totals(db, route.clone()).await
}

/// Puts a driver and/or vehicle on a planning route.
///
/// The route's orders follow the new driver.
///
/// # Errors
/// Returns [`Error::Conflict`] if the route has started or the vehicle is too small
/// for the cylinders already planned.
#[instrument(skip(db))]
pub async fn assign_route<C>(
    db: &C,
    route_id: i64,
    assignment: RouteAssignment,
) -> Result<route::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    require_planning(&existing)?;

    if let Some(driver_id) = assignment.driver_id {
        require_active_driver(&txn, driver_id).await?;
    }
    if let Some(vehicle_id) = assignment.vehicle_id {
        let cylinders = route_cylinder_count(&txn, route_id).await?;
        ensure_capacity(&txn, vehicle_id, cylinders).await?;
    }

    let mut route: route::ActiveModel = existing.into();
    if let Some(driver_id) = assignment.driver_id {
        route.driver_id = Set(Some(driver_id));
        Order::update_many()
            .col_expr(order::Column::DriverId, Expr::value(Some(driver_id)))
            .filter(order::Column::RouteId.eq(route_id))
            .filter(order::Column::Status.eq(OrderStatus::Assigned))
            .exec(&txn)
            .await?;
    }
    if let Some(vehicle_id) = assignment.vehicle_id {
        route.vehicle_id = Set(Some(vehicle_id));
    }
    route.updated_at = Set(chrono::Utc::now());
    let updated = route.update(&txn).await?;

    txn.commit().await?;
    info!(
        route_id,
        driver_id = ?updated.driver_id,
        vehicle_id = ?updated.vehicle_id,
        "Assigned route"
    );
    Ok(updated)
}

/// Appends an order to a planning route.
///
/// # Errors
/// Returns an error if:
/// - The route has started ([`Error::Conflict`])
/// - The order is not pending/confirmed or is on another route ([`Error::Conflict`])
/// - The assigned vehicle cannot carry the extra cylinders ([`Error::Conflict`])
/// - The leg distance is negative
#[instrument(skip(db, input), fields(order_id = input.order_id))]
pub async fn add_order_to_route<C>(
    db: &C,
    route_id: i64,
    input: AddRouteOrder,
) -> Result<RouteWithStops>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_distance(input.distance_from_previous_km)?;

    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    require_planning(&existing)?;

    let order = require_order(&txn, input.order_id).await?;
    if order.route_id.is_some() {
        return Err(Error::conflict(format!(
            "order {} is already on a route",
            order.order_number
        )));
    }
    if !order.status.can_transition_to(OrderStatus::Assigned) {
        return Err(Error::conflict(format!(
            "order {} cannot be planned in status {:?}",
            order.order_number, order.status
        )));
    }

    if let Some(vehicle_id) = existing.vehicle_id {
        let planned = route_cylinder_count(&txn, route_id).await?;
        let extra = order_cylinder_count(&txn, order.id).await?;
        ensure_capacity(&txn, vehicle_id, planned + extra).await?;
    }

    let customer = get_customer_by_id(&txn, order.customer_id).await?;
    let latitude = input
        .latitude
        .or_else(|| customer.as_ref().and_then(|c| c.latitude));
    let longitude = input
        .longitude
        .or_else(|| customer.as_ref().and_then(|c| c.longitude));

    let sequence = i32::try_from(get_route_stops(&txn, route_id).await?.len() + 1)?;

    route_stop::ActiveModel {
        route_id: Set(route_id),
        order_id: Set(order.id),
        stop_sequence: Set(sequence),
        latitude: Set(latitude),
        longitude: Set(longitude),
        distance_from_previous_km: Set(input.distance_from_previous_km),
        estimated_arrival: Set(input.estimated_arrival),
        actual_arrival: Set(None),
        is_completed: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    route_delivery::ActiveModel {
        route_id: Set(route_id),
        order_id: Set(order.id),
        sequence: Set(sequence),
        status: Set(DropStatus::Pending),
        arrived_at: Set(None),
        delivered_at: Set(None),
        signature_url: Set(None),
        photo_url: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let order_id = order.id;
    let assigned = set_order_status(&txn, order, OrderStatus::Assigned).await?;
    let mut assigned: order::ActiveModel = assigned.into();
    assigned.route_id = Set(Some(route_id));
    assigned.driver_id = Set(existing.driver_id);
    assigned.update(&txn).await?;

    let route = refresh_route_totals(&txn, existing).await?;
    let stops = get_route_stops(&txn, route_id).await?;
    let deliveries = get_route_deliveries(&txn, route_id).await?;
    txn.commit().await?;

    info!(route_id, order_id, sequence, "Added order to route");
    Ok(RouteWithStops {
        route,
        stops,
        deliveries,
    })
}

/// Takes an order off a planning route; the order returns to `confirmed`.
#[instrument(skip(db))]
pub async fn remove_order_from_route<C>(
    db: &C,
    route_id: i64,
    order_id: i64,
) -> Result<RouteWithStops>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    let route = detach_order(&txn, &existing, order_id).await?;

    let order = require_order(&txn, order_id).await?;
    set_order_status(&txn, order, OrderStatus::Confirmed).await?;

    let stops = get_route_stops(&txn, route_id).await?;
    let deliveries = get_route_deliveries(&txn, route_id).await?;
    txn.commit().await?;

    info!(route_id, order_id, "Removed order from route");
    Ok(RouteWithStops {
        route,
        stops,
        deliveries,
    })
}

/// Applies a manual stop order.
///
/// `plan` must name every order on the route exactly once. The total distance becomes
/// the sum of the given legs; the route is marked as not optimized.
///
/// # Errors
/// Returns a validation error if the plan is not a permutation of the route's orders
/// or a leg is negative, and [`Error::Conflict`] if the route has started.
#[instrument(skip(db, plan), fields(stops = plan.len()))]
pub async fn resequence_route<C>(
    db: &C,
    route_id: i64,
    plan: Vec<StopPlan>,
) -> Result<RouteWithStops>
where
    C: ConnectionTrait + TransactionTrait,
{
    for leg in &plan {
        validate_distance(leg.distance_from_previous_km)?;
    }

    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    require_planning(&existing)?;

    let mut stops = get_route_stops(&txn, route_id).await?;
    let planned: HashSet<i64> = plan.iter().map(|p| p.order_id).collect();
    let current: HashSet<i64> = stops.iter().map(|s| s.order_id).collect();
    if planned.len() != plan.len() || planned != current {
        return Err(Error::validation(
            "stop plan must list every order on the route exactly once",
        ));
    }

    let mut ordered = Vec::with_capacity(plan.len());
    for leg in &plan {
        if let Some(index) = stops.iter().position(|s| s.order_id == leg.order_id) {
            let mut stop = stops.swap_remove(index);
            stop.distance_from_previous_km = leg.distance_from_previous_km;
            stop.estimated_arrival = leg.estimated_arrival;
            ordered.push(stop);
        }
    }
    write_stop_sequence(&txn, ordered.clone()).await?;
    for stop in ordered {
        RouteStop::update_many()
            .col_expr(
                route_stop::Column::DistanceFromPreviousKm,
                Expr::value(stop.distance_from_previous_km),
            )
            .col_expr(
                route_stop::Column::EstimatedArrival,
                Expr::value(stop.estimated_arrival),
            )
            .filter(route_stop::Column::Id.eq(stop.id))
            .exec(&txn)
            .await?;
    }

    let mut route: route::ActiveModel = refresh_route_totals(&txn, existing).await?.into();
    route.is_optimized = Set(false);
    route.optimization_score = Set(None);
    let route = route.update(&txn).await?;

    let stops = get_route_stops(&txn, route_id).await?;
    let deliveries = get_route_deliveries(&txn, route_id).await?;
    txn.commit().await?;

    info!(route_id, total_distance_km = route.total_distance_km, "Resequenced route");
    Ok(RouteWithStops {
        route,
        stops,
        deliveries,
    })
}

/// Starts a route: its orders move to `in_delivery`.
///
/// # Errors
/// Returns a validation error if the route has no driver, no vehicle or no stops, and
/// [`Error::InvalidStatusTransition`] if it is not being planned.
#[instrument(skip(db))]
pub async fn start_route<C>(db: &C, route_id: i64) -> Result<route::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    if !existing.status.can_transition_to(RouteStatus::InProgress) {
        return Err(transition_error(existing.status, RouteStatus::InProgress));
    }
    if existing.driver_id.is_none() || existing.vehicle_id.is_none() {
        return Err(Error::validation(
            "a route needs a driver and a vehicle before it starts",
        ));
    }
    if existing.total_stops == 0 {
        return Err(Error::validation("a route needs at least one stop"));
    }

    for drop in get_route_deliveries(&txn, route_id).await? {
        let order = require_order(&txn, drop.order_id).await?;
        set_order_status(&txn, order, OrderStatus::InDelivery).await?;
    }

    let now = chrono::Utc::now();
    let mut route: route::ActiveModel = existing.into();
    route.status = Set(RouteStatus::InProgress);
    route.started_at = Set(Some(now));
    route.updated_at = Set(now);
    let started = route.update(&txn).await?;

    txn.commit().await?;
    info!(route_id, "Started route");
    Ok(started)
}

/// Completes an in-progress route once every drop is resolved.
///
/// Returns `Ok(None)` when drops are still open or the route is not in progress.
pub(crate) async fn finish_route_if_done<C>(db: &C, route_id: i64) -> Result<Option<route::Model>>
where
    C: ConnectionTrait,
{
    let existing = require_route(db, route_id).await?;
    if existing.status != RouteStatus::InProgress {
        return Ok(None);
    }
    let drops = get_route_deliveries(db, route_id).await?;
    if !drops.iter().all(|d| d.status.is_resolved()) {
        return Ok(None);
    }

    let now = chrono::Utc::now();
    let mut route: route::ActiveModel = existing.into();
    route.status = Set(RouteStatus::Completed);
    route.completed_at = Set(Some(now));
    route.updated_at = Set(now);
    let completed = route.update(db).await?;
    info!(route_id, "Completed route");
    Ok(Some(completed))
}

/// Completes an in-progress route.
///
/// # Errors
/// Returns [`Error::Conflict`] while drops are unresolved.
#[instrument(skip(db))]
pub async fn complete_route<C>(db: &C, route_id: i64) -> Result<route::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = require_route(db, route_id).await?;
    if !existing.status.can_transition_to(RouteStatus::Completed) {
        return Err(transition_error(existing.status, RouteStatus::Completed));
    }
    finish_route_if_done(db, route_id).await?.ok_or_else(|| {
        Error::conflict(format!(
            "route {} still has unresolved drops",
            existing.route_number
        ))
    })
}

/// Cancels a route that has not finished.
///
/// Unresolved drops are marked failed and their orders go back to `confirmed`,
/// released from the route. Delivered drops are kept.
#[instrument(skip(db))]
pub async fn cancel_route<C>(db: &C, route_id: i64) -> Result<route::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing = require_route(&txn, route_id).await?;
    if !existing.status.can_transition_to(RouteStatus::Cancelled) {
        return Err(transition_error(existing.status, RouteStatus::Cancelled));
    }

    let mut released = 0_u32;
    for drop in get_route_deliveries(&txn, route_id).await? {
        if drop.status.is_resolved() {
            continue;
        }
        let order_id = drop.order_id;
        let mut active: route_delivery::ActiveModel = drop.into();
        active.status = Set(DropStatus::Failed);
        active.notes = Set(Some(ROUTE_CANCELLED_NOTE.to_string()));
        active.update(&txn).await?;

        let order = require_order(&txn, order_id).await?;
        if order.route_id == Some(route_id) {
            set_order_status(&txn, order, OrderStatus::Confirmed).await?;
            released += 1;
        }
    }

    let now = chrono::Utc::now();
    let mut route: route::ActiveModel = existing.into();
    route.status = Set(RouteStatus::Cancelled);
    route.updated_at = Set(now);
    let cancelled = route.update(&txn).await?;

    txn.commit().await?;
    info!(route_id, released, "Cancelled route");
    Ok(cancelled)
}
