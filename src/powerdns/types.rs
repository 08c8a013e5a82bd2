use std::fmt;

use serde::{Deserialize, Serialize};

use super::id::encode_id;

/// Zone kind as reported by PowerDNS. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZoneKind {
    Native,
    Master,
    Slave,
    Other(String),
}

impl ZoneKind {
    pub fn as_str(&self) -> &str {
        match self {
            ZoneKind::Native => "Native",
            ZoneKind::Master => "Master",
            ZoneKind::Slave => "Slave",
            ZoneKind::Other(s) => s,
        }
    }

    pub fn is_slave(&self) -> bool {
        matches!(self, ZoneKind::Slave)
    }
}

impl From<String> for ZoneKind {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "native" => ZoneKind::Native,
            "master" => ZoneKind::Master,
            "slave" => ZoneKind::Slave,
            _ => ZoneKind::Other(s),
        }
    }
}

impl From<&str> for ZoneKind {
    fn from(s: &str) -> Self {
        ZoneKind::from(s.to_string())
    }
}

impl From<ZoneKind> for String {
    fn from(kind: ZoneKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Server-side zone state.
///
/// Empty fields are left out when serializing so a partially filled value can be
/// used as a PUT body (e.g. only `kind` set).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String, // "example.com."
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String, // "example.com."
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String, // "/api/v1/servers/localhost/zones/example.com."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ZoneKind>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dnssec: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub serial: u32,
    /// Flat records, only sent by legacy (v0) servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
    /// Record sets, sent by versioned (v1+) servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrsets: Option<Vec<ResourceRecordSet>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masters: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub soa_edit_api: String,
}

impl ZoneInfo {
    /// Reconcile both response shapes into the flat per-value view.
    ///
    /// Legacy records come first, as-is; every record nested in an RRSet becomes one
    /// flat record carrying the set's name, type and TTL.
    pub fn flattened_records(&self) -> Vec<Record> {
        let mut records = self.records.clone().unwrap_or_default();
        for rrset in self.rrsets.iter().flatten() {
            records.extend(rrset.records.iter().map(|rec| Record {
                name: rrset.name.clone(),
                rtype: rrset.rtype.clone(),
                content: rec.content.clone(),
                ttl: rrset.ttl,
                disabled: rec.disabled,
                set_ptr: false,
            }));
        }
        records
    }

    pub fn is_slave(&self) -> bool {
        self.kind.as_ref().is_some_and(ZoneKind::is_slave)
    }
}

/// One record value (the legacy v0 shape, also nested inside RRSets).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub name: String, // "www.example.com."
    #[serde(rename = "type", default)]
    pub rtype: String, // "A", "NS", ...
    pub content: String, // "192.0.2.1" or "ns1.example.net."
    #[serde(default)]
    pub ttl: u32,
    #[serde(default)]
    pub disabled: bool,
    #[serde(rename = "set-ptr", default)]
    pub set_ptr: bool,
}

impl Record {
    pub fn id(&self) -> String {
        encode_id(&self.name, &self.rtype)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Replace,
    Delete,
}

/// All values for one (name, type) under a single TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changetype: Option<ChangeType>,
    #[serde(default)]
    pub ttl: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,
}

impl ResourceRecordSet {
    /// Build a set whose records all share the set's name, type and TTL.
    pub fn new<I, S>(name: impl Into<String>, rtype: impl Into<String>, ttl: u32, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let rtype = rtype.into();
        let records = contents
            .into_iter()
            .map(|content| Record {
                name: name.clone(),
                rtype: rtype.clone(),
                content: content.into(),
                ttl,
                disabled: false,
                set_ptr: false,
            })
            .collect();
        Self {
            name,
            rtype,
            changetype: None,
            ttl,
            records,
        }
    }

    /// Mark every record to have its PTR created by the server (A/AAAA only).
    pub fn with_set_ptr(mut self, set_ptr: bool) -> Self {
        for rec in &mut self.records {
            rec.set_ptr = set_ptr;
        }
        self
    }

    pub fn id(&self) -> String {
        encode_id(&self.name, &self.rtype)
    }
}

// Used when patching a zone
#[derive(Debug, Serialize)]
pub(crate) struct ZonePatch<'a> {
    pub rrsets: &'a [ResourceRecordSet],
}

/// Per-zone metadata entry, e.g. `ALLOW-AXFR-FROM`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMetadata {
    pub kind: String,
    #[serde(default)]
    pub metadata: Vec<String>,
}

/// Answer of `GET /servers/{server_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "type", default)]
    pub server_type: String, // "Server"
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub daemon_type: String, // "authoritative"
    pub version: String,
    #[serde(default)]
    pub config_url: String,
    #[serde(default)]
    pub zones_url: String,
}

/// Read-only view of a zone: what a data source exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub name: String,
    pub kind: Option<ZoneKind>,
    pub account: String,
    pub serial: u32,
    pub soa_edit_api: String,
    pub nameservers: Vec<String>,
    pub masters: Vec<String>,
    pub soa: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_rrsets_into_flat_records() {
        let zone: ZoneInfo = serde_json::from_value(json!({
            "id": "a.",
            "name": "a.",
            "kind": "Native",
            "rrsets": [{
                "name": "a.",
                "type": "A",
                "ttl": 60,
                "records": [
                    {"content": "1.1.1.1", "disabled": false},
                    {"content": "2.2.2.2", "disabled": false}
                ]
            }]
        }))
        .unwrap();

        let records = zone.flattened_records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Record {
                name: "a.".into(),
                rtype: "A".into(),
                content: "1.1.1.1".into(),
                ttl: 60,
                ..Default::default()
            }
        );
        assert_eq!(records[1].content, "2.2.2.2");
        assert_eq!(records[1].ttl, 60);
    }

    #[test]
    fn legacy_records_are_kept_before_rrsets() {
        let zone = ZoneInfo {
            records: Some(vec![Record {
                name: "old.a.".into(),
                rtype: "TXT".into(),
                content: "\"v0\"".into(),
                ttl: 300,
                ..Default::default()
            }]),
            rrsets: Some(vec![ResourceRecordSet::new("new.a.", "A", 120, ["192.0.2.1"])]),
            ..Default::default()
        };

        let records = zone.flattened_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "old.a.");
        assert_eq!(records[1].name, "new.a.");
        assert_eq!(records[1].ttl, 120);
    }

    #[test]
    fn zone_without_records_flattens_to_nothing() {
        assert!(ZoneInfo::default().flattened_records().is_empty());
    }

    #[test]
    fn partial_zone_serializes_only_set_fields() {
        let zone = ZoneInfo {
            kind: Some(ZoneKind::Master),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&zone).unwrap(), json!({"kind": "Master"}));
    }

    #[test]
    fn zone_kind_parses_case_insensitively_and_keeps_unknown() {
        assert_eq!(ZoneKind::from("slave"), ZoneKind::Slave);
        assert_eq!(ZoneKind::from("NATIVE"), ZoneKind::Native);
        assert_eq!(
            ZoneKind::from("Producer"),
            ZoneKind::Other("Producer".into())
        );
        let kind: ZoneKind = serde_json::from_value(json!("Producer")).unwrap();
        assert_eq!(serde_json::to_value(kind).unwrap(), json!("Producer"));
    }

    #[test]
    fn rrset_patch_body_shape() {
        let mut rrset = ResourceRecordSet::new("www.a.", "A", 300, ["192.0.2.1"]).with_set_ptr(true);
        rrset.changetype = Some(ChangeType::Replace);
        let body = serde_json::to_value(ZonePatch {
            rrsets: std::slice::from_ref(&rrset),
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"rrsets": [{
                "name": "www.a.",
                "type": "A",
                "changetype": "REPLACE",
                "ttl": 300,
                "records": [{
                    "name": "www.a.",
                    "type": "A",
                    "content": "192.0.2.1",
                    "ttl": 300,
                    "disabled": false,
                    "set-ptr": true
                }]
            }]})
        );
    }
}
