pub mod auth;
pub mod dashboard;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod users;
