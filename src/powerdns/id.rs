//! Composite identifiers for record sets and zone metadata.
//!
//! A record set is addressed by `name:::type`, a metadata entry by `zone:::kind`.
//! The separator cannot occur in a DNS name or a record type token.
use crate::error::{Error, Result};

pub const ID_SEPARATOR: &str = ":::";

pub fn encode_id(name: &str, rtype: &str) -> String {
    format!("{name}{ID_SEPARATOR}{rtype}")
}

/// Split an ID into its two parts; anything but exactly two parts is rejected.
pub fn decode_id(id: &str) -> Result<(&str, &str)> {
    let mut parts = id.split(ID_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(first), Some(second), None) => Ok((first, second)),
        _ => Err(Error::InvalidId(id.to_string())),
    }
}
