//! HTTP implementation of the catalog client.

mod client;
mod status;

pub use client::HttpCatalogClient;
pub use status::{classify_status, classify_transport};
