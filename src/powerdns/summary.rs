use crate::error::Result;
use crate::powerdns::client::PowerDnsClient;
use crate::powerdns::types::{Record, ZoneSummary};

fn contents_of(records: &[Record], name: &str, rtype: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.name == name && r.rtype == rtype)
        .map(|r| r.content.clone())
        .collect()
}

impl PowerDnsClient {
    /// Read-only view of a zone: apex NS and SOA values plus its settings.
    ///
    /// Nameservers are left empty for secondary zones, masters are only reported
    /// for them. Reads the same (possibly cached) snapshot as [`Self::list_records`].
    pub async fn zone_summary(&self, name: &str) -> Result<ZoneSummary> {
        let zone = self.zone_snapshot(name).await?;
        let records = zone.flattened_records();
        let slave = zone.is_slave();

        let nameservers = if slave {
            Vec::new()
        } else {
            contents_of(&records, &zone.name, "NS")
        };
        let soa = contents_of(&records, &zone.name, "SOA").concat();
        let masters = if slave { zone.masters.clone() } else { Vec::new() };

        Ok(ZoneSummary {
            name: zone.name,
            kind: zone.kind,
            account: zone.account,
            serial: zone.serial,
            soa_edit_api: zone.soa_edit_api,
            nameservers,
            masters,
            soa,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_match_name_and_type_exactly() {
        let records = vec![
            Record {
                name: "a.".into(),
                rtype: "NS".into(),
                content: "ns1.a.".into(),
                ..Default::default()
            },
            Record {
                name: "sub.a.".into(),
                rtype: "NS".into(),
                content: "ns.elsewhere.".into(),
                ..Default::default()
            },
            Record {
                name: "a.".into(),
                rtype: "NS".into(),
                content: "ns2.a.".into(),
                ..Default::default()
            },
        ];
        assert_eq!(contents_of(&records, "a.", "NS"), vec!["ns1.a.", "ns2.a."]);
        assert!(contents_of(&records, "a.", "SOA").is_empty());
    }
}
