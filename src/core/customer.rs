//! Customer business logic - Handles creating, looking up and maintaining customers.
//!
//! Customers are never hard-deleted: deactivation keeps their orders and delivery
//! history intact while blocking new orders.

use crate::{
    core::{Pagination, non_negative_amount, optional_text, required_text},
    entities::{Customer, CustomerType, customer},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating a customer
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    /// Business-facing code, unique
    pub customer_code: String,
    /// Customer or company name
    pub name: String,
    /// Person to ask for on delivery
    pub contact_name: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Delivery address
    pub address: String,
    /// Delivery area
    pub area: Option<String>,
    /// Latitude of the address
    pub latitude: Option<f64>,
    /// Longitude of the address
    pub longitude: Option<f64>,
    /// Account type, defaults to residential
    #[serde(default = "default_customer_type")]
    pub customer_type: CustomerType,
    /// Credit limit, defaults to zero
    #[serde(default)]
    pub credit_limit: f64,
    /// Recurring delivery plan
    #[serde(default)]
    pub is_subscription: bool,
}

const fn default_customer_type() -> CustomerType {
    CustomerType::Residential
}

/// Partial update of a customer; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerUpdate {
    /// New name
    pub name: Option<String>,
    /// New contact person
    pub contact_name: Option<String>,
    /// New phone number
    pub phone: Option<String>,
    /// New address
    pub address: Option<String>,
    /// New area
    pub area: Option<String>,
    /// New latitude
    pub latitude: Option<f64>,
    /// New longitude
    pub longitude: Option<f64>,
    /// New account type
    pub customer_type: Option<CustomerType>,
    /// New credit limit
    pub credit_limit: Option<f64>,
    /// New subscription flag
    pub is_subscription: Option<bool>,
}

/// Optional filters for listing customers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// Only customers in this area
    pub area: Option<String>,
    /// Only active (`true`) or inactive (`false`) customers
    pub is_active: Option<bool>,
    /// Case-sensitive substring of name or code
    pub search: Option<String>,
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<()> {
    if let Some(lat) = latitude
        && (!lat.is_finite() || !(-90.0..=90.0).contains(&lat))
    {
        return Err(Error::validation(format!("latitude out of range: {lat}")));
    }
    if let Some(lon) = longitude
        && (!lon.is_finite() || !(-180.0..=180.0).contains(&lon))
    {
        return Err(Error::validation(format!("longitude out of range: {lon}")));
    }
    Ok(())
}

/// Creates a new customer after validating the input.
///
/// # Errors
/// Returns an error if:
/// - The code, name or address is blank
/// - The credit limit is negative or not finite
/// - Coordinates are out of range
/// - The customer code already exists ([`Error::Conflict`])
#[instrument(skip(db, input), fields(code = %input.customer_code))]
pub async fn create_customer<C>(db: &C, input: NewCustomer) -> Result<customer::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let customer_code = required_text("customer_code", &input.customer_code)?;
    let name = required_text("name", &input.name)?;
    let address = required_text("address", &input.address)?;
    let credit_limit = non_negative_amount("credit_limit", input.credit_limit)?;
    validate_coordinates(input.latitude, input.longitude)?;

    let now = chrono::Utc::now();
    let customer = customer::ActiveModel {
        customer_code: Set(customer_code),
        name: Set(name),
        contact_name: Set(optional_text(input.contact_name)),
        phone: Set(optional_text(input.phone)),
        address: Set(address),
        area: Set(optional_text(input.area)),
        latitude: Set(input.latitude),
        longitude: Set(input.longitude),
        customer_type: Set(input.customer_type),
        credit_limit: Set(credit_limit),
        is_subscription: Set(input.is_subscription),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = customer.insert(db).await?;
    info!(customer_id = created.id, "Created customer");
    Ok(created)
}

/// Finds a customer by its unique ID, including inactive customers.
pub async fn get_customer_by_id<C>(db: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a customer by its business code.
pub async fn get_customer_by_code<C>(db: &C, customer_code: &str) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .filter(customer::Column::CustomerCode.eq(customer_code.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a customer that exists and is active.
///
/// # Errors
/// Returns [`Error::NotFound`] for missing or deactivated customers.
pub async fn require_active_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    match get_customer_by_id(db, customer_id).await? {
        Some(customer) if customer.is_active => Ok(customer),
        _ => Err(Error::not_found("customer", customer_id)),
    }
}

/// Lists customers ordered by code.
pub async fn list_customers<C>(
    db: &C,
    filter: &CustomerFilter,
    page: Pagination,
) -> Result<Vec<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find()
        .apply_if(filter.area.clone(), |q, area| {
            q.filter(customer::Column::Area.eq(area))
        })
        .apply_if(filter.is_active, |q, active| {
            q.filter(customer::Column::IsActive.eq(active))
        })
        .apply_if(filter.search.clone(), |q, term| {
            q.filter(
                Condition::any()
                    .add(customer::Column::Name.contains(&term))
                    .add(customer::Column::CustomerCode.contains(&term)),
            )
        })
        .order_by_asc(customer::Column::CustomerCode)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to a customer.
///
/// # Errors
/// Returns [`Error::NotFound`] if the customer does not exist, or a validation error
/// for blank text, negative credit limits and out-of-range coordinates.
#[instrument(skip(db, update))]
pub async fn update_customer<C>(
    db: &C,
    customer_id: i64,
    update: CustomerUpdate,
) -> Result<customer::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_customer_by_id(db, customer_id)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))?;

    validate_coordinates(
        update.latitude.or(existing.latitude),
        update.longitude.or(existing.longitude),
    )?;

    let mut customer: customer::ActiveModel = existing.into();
    if let Some(name) = update.name {
        customer.name = Set(required_text("name", &name)?);
    }
    if let Some(address) = update.address {
        customer.address = Set(required_text("address", &address)?);
    }
    if let Some(limit) = update.credit_limit {
        customer.credit_limit = Set(non_negative_amount("credit_limit", limit)?);
    }
    if update.contact_name.is_some() {
        customer.contact_name = Set(optional_text(update.contact_name));
    }
    if update.phone.is_some() {
        customer.phone = Set(optional_text(update.phone));
    }
    if update.area.is_some() {
        customer.area = Set(optional_text(update.area));
    }
    if update.latitude.is_some() {
        customer.latitude = Set(update.latitude);
    }
    if update.longitude.is_some() {
        customer.longitude = Set(update.longitude);
    }
    if let Some(customer_type) = update.customer_type {
        customer.customer_type = Set(customer_type);
    }
    if let Some(is_subscription) = update.is_subscription {
        customer.is_subscription = Set(is_subscription);
    }
    customer.updated_at = Set(chrono::Utc::now());

    customer.update(db).await.map_err(Into::into)
}

/// Marks a customer inactive. Deactivating an inactive customer is a no-op.
pub async fn deactivate_customer<C>(db: &C, customer_id: i64) -> Result<customer::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_customer_by_id(db, customer_id)
        .await?
        .ok_or_else(|| Error::not_found("customer", customer_id))?;

    if !existing.is_active {
        return Ok(existing);
    }

    let mut customer: customer::ActiveModel = existing.into();
    customer.is_active = Set(false);
    customer.updated_at = Set(chrono::Utc::now());
    let updated = customer.update(db).await?;
    info!(customer_id, "Deactivated customer");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_customer_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut input = new_customer_input("C-1");
        input.name = "  ".to_string();
        let result = create_customer(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let mut input = new_customer_input("C-1");
        input.credit_limit = -10.0;
        let result = create_customer(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidAmount {
                field: "credit_limit",
                ..
            }
        ));

        let mut input = new_customer_input("C-1");
        input.latitude = Some(123.0);
        let result = create_customer(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_customer_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let customer = create_test_customer(&db, " C-100 ").await?;
        assert_eq!(customer.customer_code, "C-100");
        assert!(customer.is_active);
        assert_eq!(customer.customer_type, CustomerType::Residential);

        let found = get_customer_by_code(&db, "C-100").await?.unwrap();
        assert_eq!(found, customer);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_customer_code_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_customer(&db, "C-200").await?;

        let result = create_test_customer(&db, "C-200").await;
        assert!(result.is_err());

        let all = list_customers(&db, &CustomerFilter::default(), Pagination::default()).await?;
        assert_eq!(all.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_customer_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let customer = create_test_customer(&db, "C-300").await?;

        let updated = update_customer(
            &db,
            customer.id,
            CustomerUpdate {
                phone: Some("0912-345-678".to_string()),
                credit_limit: Some(5000.0),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.phone.as_deref(), Some("0912-345-678"));
        assert_eq!(updated.credit_limit, 5000.0);
        assert_eq!(updated.name, customer.name);
        assert_eq!(updated.address, customer.address);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_customer_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_customer(&db, 999, CustomerUpdate::default()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_deactivate_and_filter() -> Result<()> {
        let db = setup_test_db().await?;
        let active = create_test_customer(&db, "C-401").await?;
        let retired = create_test_customer(&db, "C-402").await?;

        deactivate_customer(&db, retired.id).await?;

        let only_active = list_customers(
            &db,
            &CustomerFilter {
                is_active: Some(true),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(only_active.len(), 1);
        assert_eq!(only_active[0].id, active.id);

        let result = require_active_customer(&db, retired.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_customers_search_and_paging() -> Result<()> {
        let db = setup_test_db().await?;
        for code in ["C-501", "C-502", "C-503"] {
            create_test_customer(&db, code).await?;
        }

        let page = list_customers(
            &db,
            &CustomerFilter::default(),
            Pagination::new(Some(1), Some(1)),
        )
        .await?;
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].customer_code, "C-502");

        let found = list_customers(
            &db,
            &CustomerFilter {
                search: Some("503".to_string()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await?;
        assert_eq!(found.len(), 1);

        Ok(())
    }
}
