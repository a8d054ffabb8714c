//! HTTP API - axum routers, authentication and error mapping.
//!
//! `GET /health` is public. Everything else lives under `/api/v1` and requires a valid
//! `x-api-key` header; mutations are recorded in the audit log under the key's name.

pub mod api_keys;
pub mod audit_logs;
pub mod auth;
pub mod customers;
pub mod deliveries;
pub mod drivers;
pub mod error;
pub mod health;
pub mod orders;
pub mod predictions;
pub mod products;
pub mod routes;
pub mod state;
pub mod users;
pub mod vehicles;
pub mod webhooks;

use crate::{
    core::{Pagination, audit::record_audit},
    entities::AuditAction,
};
use auth::RequireApiKey;
use axum::Router;
use error::ApiResult;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Version prefix of all business endpoints
pub const API_PREFIX: &str = "/api/v1";

/// Builds the complete application router.
pub fn router(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .merge(customers::router())
        .merge(products::router())
        .merge(drivers::router())
        .merge(vehicles::router())
        .merge(users::router())
        .merge(orders::router())
        .merge(routes::router())
        .merge(deliveries::router())
        .merge(predictions::router())
        .merge(audit_logs::router())
        .merge(webhooks::router())
        .merge(api_keys::router());

    Router::new()
        .merge(health::router())
        .nest(API_PREFIX, v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Plain `skip`/`limit` query string
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    skip: Option<u64>,
    limit: Option<u64>,
}

impl PageQuery {
    /// Window described by the query.
    #[must_use]
    pub fn page(&self) -> Pagination {
        Pagination::new(self.skip, self.limit)
    }
}

/// Records a mutation made by the authenticated caller inside the mutation's transaction,
/// so the change and its audit entry commit or roll back together.
async fn audit(
    txn: &DatabaseTransaction,
    auth: &RequireApiKey,
    action: AuditAction,
    entity_type: &str,
    entity_id: i64,
    details: Option<serde_json::Value>,
) -> ApiResult<()> {
    record_audit(
        txn,
        auth.actor(),
        action,
        entity_type,
        entity_id,
        details,
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{api_key::install_api_key, customer::get_customer_by_code},
        errors::Result,
        test_utils::setup_test_db,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use sea_orm::ConnectionTrait;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const TEST_KEY: &str = "dh_router_test_key_0001";

    async fn test_state() -> Result<Arc<AppState>> {
        let db = setup_test_db().await?;
        install_api_key(&db, "router-tests", TEST_KEY, None).await?;
        Ok(Arc::new(AppState::new(db)))
    }

    async fn test_app() -> Result<Router> {
        Ok(router(test_state().await?))
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", TEST_KEY);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_is_public() -> Result<()> {
        let app = test_app().await?;
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_is_401() -> Result<()> {
        let app = test_app().await?;

        let req = Request::builder()
            .uri("/api/v1/customers")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let req = Request::builder()
            .uri("/api/v1/customers")
            .header("x-api-key", "dh_not_a_real_key")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_customer_crud_and_audit() -> Result<()> {
        let app = test_app().await?;

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/api/v1/customers",
                Some(json!({
                    "customer_code": "C-900",
                    "name": "Harbor Noodles",
                    "address": "12 Pier Rd",
                    "customer_type": "commercial",
                    "credit_limit": 5000.0
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["customer_type"], "commercial");
        let id = created["id"].as_i64().unwrap();

        let (status, fetched) =
            send(&app, request("GET", &format!("/api/v1/customers/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["customer_code"], "C-900");

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/v1/customers",
                Some(json!({
                    "customer_code": "C-900",
                    "name": "Copy",
                    "address": "Elsewhere"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, logs) = send(
            &app,
            request("GET", "/api/v1/audit-logs?entity_type=customer", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logs.as_array().unwrap().len(), 1);
        assert_eq!(logs[0]["actor"], "router-tests");
        assert_eq!(logs[0]["action"], "create");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_audit_write_rolls_back_mutation() -> Result<()> {
        let state = test_state().await?;
        let app = router(Arc::clone(&state));
        state
            .db
            .execute_unprepared("DROP TABLE audit_logs")
            .await?;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/customers",
                Some(json!({
                    "customer_code": "C-500",
                    "name": "Riverside Diner",
                    "address": "8 Quay St"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        assert!(get_customer_by_code(&state.db, "C-500").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_customer_is_404() -> Result<()> {
        let app = test_app().await?;
        let (status, body) = send(&app, request("GET", "/api/v1/customers/999", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_quantity_order_is_400() -> Result<()> {
        let app = test_app().await?;
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/orders",
                Some(json!({
                    "customer_id": 1,
                    "scheduled_date": "2024-01-15",
                    "items": [{ "gas_product_id": 1, "quantity": -3 }]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_quantity");
        Ok(())
    }

    #[tokio::test]
    async fn test_order_to_delivery_flow() -> Result<()> {
        let app = test_app().await?;

        let (_, customer) = send(
            &app,
            request(
                "POST",
                "/api/v1/customers",
                Some(json!({
                    "customer_code": "C-1",
                    "name": "Lin Family",
                    "address": "5 Lane 3"
                })),
            ),
        )
        .await;
        let (_, product) = send(
            &app,
            request(
                "POST",
                "/api/v1/products",
                Some(json!({
                    "sku": "GAS-20",
                    "name": "20kg cylinder",
                    "size_kg": 20.0,
                    "unit_price": 720.0
                })),
            ),
        )
        .await;
        let (_, driver) = send(
            &app,
            request(
                "POST",
                "/api/v1/drivers",
                Some(json!({ "employee_code": "D-1", "name": "Wang" })),
            ),
        )
        .await;
        let (_, vehicle) = send(
            &app,
            request(
                "POST",
                "/api/v1/vehicles",
                Some(json!({
                    "plate_number": "TRK-9",
                    "vehicle_type": "truck",
                    "max_cylinders": 40
                })),
            ),
        )
        .await;

        let (status, order) = send(
            &app,
            request(
                "POST",
                "/api/v1/orders",
                Some(json!({
                    "customer_id": customer["id"],
                    "scheduled_date": "2024-01-15",
                    "items": [{ "gas_product_id": product["id"], "quantity": 2 }]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["final_amount"], 1440.0);
        let order_id = order["id"].as_i64().unwrap();

        let (status, route) = send(
            &app,
            request(
                "POST",
                "/api/v1/routes",
                Some(json!({
                    "route_date": "2024-01-15",
                    "driver_id": driver["id"],
                    "vehicle_id": vehicle["id"]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let route_id = route["id"].as_i64().unwrap();

        let (status, planned) = send(
            &app,
            request(
                "POST",
                &format!("/api/v1/routes/{route_id}/orders"),
                Some(json!({ "order_id": order_id, "distance_from_previous_km": 4.2 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(planned["total_stops"], 1);

        let (status, started) = send(
            &app,
            request("POST", &format!("/api/v1/routes/{route_id}/start"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["status"], "in_progress");

        let (status, outcome) = send(
            &app,
            request(
                "POST",
                &format!("/api/v1/routes/{route_id}/orders/{order_id}/deliver"),
                Some(json!({ "recipient_name": "Mrs. Lin" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["delivery"]["status"], "delivered");
        assert_eq!(outcome["route"]["status"], "completed");

        let (_, inventory) = send(
            &app,
            request(
                "GET",
                &format!("/api/v1/customers/{}/inventory", customer["id"]),
                None,
            ),
        )
        .await;
        assert_eq!(inventory[0]["quantity_owned"], 2);

        let (status, _) = send(
            &app,
            request("POST", &format!("/api/v1/orders/{order_id}/cancel"), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        Ok(())
    }

    #[tokio::test]
    async fn test_webhook_is_accepted() -> Result<()> {
        let app = test_app().await?;
        let (status, log) = send(
            &app,
            request(
                "POST",
                "/api/v1/webhooks/payments",
                Some(json!({ "event_type": "payment.settled" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(log["status"], "received");
        assert_eq!(log["event_type"], "payment.settled");
        Ok(())
    }

    #[tokio::test]
    async fn test_issued_key_works_and_hash_is_hidden() -> Result<()> {
        let app = test_app().await?;
        let (status, issued) = send(
            &app,
            request("POST", "/api/v1/api-keys", Some(json!({ "name": "driver-app" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(issued.get("key_hash").is_none());
        let secret = issued["secret"].as_str().unwrap().to_string();

        let req = Request::builder()
            .uri("/api/v1/api-keys")
            .header("x-api-key", secret)
            .body(Body::empty())
            .unwrap();
        let (status, keys) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(keys.as_array().unwrap().len(), 2);
        Ok(())
    }
}
