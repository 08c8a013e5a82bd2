//! Client layer between a declarative DNS resource model and the PowerDNS HTTP API.
//!
//! [`PowerDnsClient`] exposes zone, record set and zone metadata operations. It picks
//! the API dialect (legacy or `/api/vN`) on first use, always hands records back in
//! the flat per-value shape, and can serve zone reads from a TTL cache.

pub mod config;
pub mod error;
pub mod powerdns;
pub mod validation;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use powerdns::client::{ApiVersion, PowerDnsClient};
pub use powerdns::id::{decode_id, encode_id};
pub use powerdns::types::{
    ChangeType, Record, ResourceRecordSet, ServerInfo, ZoneInfo, ZoneKind, ZoneMetadata,
    ZoneSummary,
};
