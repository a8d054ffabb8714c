//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod api_key;
pub mod audit_log;
pub mod customer;
pub mod customer_inventory;
pub mod delivery;
pub mod delivery_history;
pub mod delivery_prediction;
pub mod driver;
pub mod gas_product;
pub mod order;
pub mod order_item;
pub mod route;
pub mod route_delivery;
pub mod route_stop;
pub mod user;
pub mod vehicle;
pub mod webhook_log;

// Re-export specific types to avoid conflicts
pub use api_key::{Entity as ApiKey, Model as ApiKeyModel};
pub use audit_log::{AuditAction, Entity as AuditLog, Model as AuditLogModel};
pub use customer::{CustomerType, Entity as Customer, Model as CustomerModel};
pub use customer_inventory::{Entity as CustomerInventory, Model as CustomerInventoryModel};
pub use delivery::{DeliveryStatus, Entity as Delivery, Model as DeliveryModel};
pub use delivery_history::{Entity as DeliveryHistory, Model as DeliveryHistoryModel};
pub use delivery_prediction::{Entity as DeliveryPrediction, Model as DeliveryPredictionModel};
pub use driver::{Entity as Driver, Model as DriverModel};
pub use gas_product::{Entity as GasProduct, Model as GasProductModel};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use route::{Entity as Route, Model as RouteModel, RouteStatus};
pub use route_delivery::{DropStatus, Entity as RouteDelivery, Model as RouteDeliveryModel};
pub use route_stop::{Entity as RouteStop, Model as RouteStopModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
pub use vehicle::{Entity as Vehicle, Model as VehicleModel, VehicleType};
pub use webhook_log::{Entity as WebhookLog, Model as WebhookLogModel, WebhookStatus};
