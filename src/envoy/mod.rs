pub mod client;
pub mod retry;

pub use client::{join_url, EnvoyClient, INVERTERS_PATH, PRODUCTION_PATH};
pub use retry::RetryPolicy;
