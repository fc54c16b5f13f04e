pub mod aggregation;
pub mod asset_service;
pub mod auth;
pub mod dashboard_service;
pub mod live;
pub mod notification_service;
pub mod order_service;
pub mod product_monitor;
pub mod product_service;
pub mod user_directory;
pub mod user_service;
