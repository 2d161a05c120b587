pub mod actions;
pub mod auth;
pub mod client;
pub mod model;
pub mod query;
pub mod traits;
pub mod varsets;

pub use client::ServiceNowClient;
