pub mod api;
pub mod cache;
pub mod config;
pub mod observability;
pub mod query;
pub mod stats;
pub mod store;
