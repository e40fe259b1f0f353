pub mod errors;
pub mod inventory_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod rating_api;
pub mod review_api;
pub mod webhook_api;
