//! PowerDNS HTTP API client: address handling, version negotiation, zone cache.

pub mod cache;
pub mod client;
pub mod id;
mod metadata;
mod summary;
pub mod types;
pub mod url;
