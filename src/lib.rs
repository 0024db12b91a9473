pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod mock;
pub mod pages;
pub mod params;
pub mod routes;
pub mod types;

pub use client::CloudflareClient;
pub use config::{AppConfig, ClientConfig};
pub use error::CloudflareError;
pub use params::QueryParams;
pub use routes::{AppState, build_app};
