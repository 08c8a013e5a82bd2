use std::net::{IpAddr, SocketAddr};

use tracing::warn;

use crate::powerdns::types::ZoneKind;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name is empty")]
    EmptyName,
    #[error("'records' must not be empty")]
    EmptyRecords,
    #[error("'metadata' must not be empty")]
    EmptyMetadata,
    #[error("invalid master '{value}': {reason}")]
    InvalidMaster { value: String, reason: &'static str },
    #[error("masters attribute is supported only for Slave kind")]
    MastersRequireSlave,
}

/// Fully-qualified form of `name`: trimmed, with exactly one trailing dot.
pub fn normalize_fqdn(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(format!("{}.", trimmed))
}

/// Check `<ip>` / `<ip>:<port>` entries of a secondary zone's masters list.
pub fn validate_masters(kind: &ZoneKind, masters: &[String]) -> Result<(), ValidationError> {
    if masters.is_empty() {
        return Ok(());
    }
    if !kind.is_slave() {
        return Err(ValidationError::MastersRequireSlave);
    }
    masters.iter().try_for_each(|m| validate_master(m))
}

fn validate_master(value: &str) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidMaster {
        value: value.to_string(),
        reason,
    };

    // bare IPv4/IPv6, or bracketed "[v6]:port"
    if value.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return match addr.port() {
            0 => Err(invalid("port must be between 1 and 65535")),
            _ => Ok(()),
        };
    }

    match value.split(':').collect::<Vec<_>>()[..] {
        [ip, port] => {
            let port: u32 = port.parse().map_err(|_| invalid("port is not a number"))?;
            if !(1..=65535).contains(&port) {
                return Err(invalid("port must be between 1 and 65535"));
            }
            ip.parse::<IpAddr>()
                .map(|_| ())
                .map_err(|_| invalid("not a valid IP address"))
        }
        [_] => Err(invalid("not a valid IP address")),
        _ => Err(invalid("more than one colon in <ip>:<port> string")),
    }
}

/// A record set needs at least one value; blank values are suspicious but allowed.
pub fn validate_record_contents(contents: &[String]) -> Result<(), ValidationError> {
    if contents.is_empty() {
        return Err(ValidationError::EmptyRecords);
    }
    if contents.iter().any(|c| c.trim().is_empty()) {
        warn!("one or more values in 'records' contain empty '' value(s)");
    }
    Ok(())
}
