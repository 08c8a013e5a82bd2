//! Per-zone metadata (`/zones/{zone}/metadata/{kind}`), addressed by `zone:::kind` IDs.
use reqwest::{Method, StatusCode};

use crate::error::Result;
use crate::powerdns::client::PowerDnsClient;
use crate::powerdns::id::{decode_id, encode_id};
use crate::powerdns::types::ZoneMetadata;
use crate::validation::ValidationError;

impl PowerDnsClient {
    fn metadata_endpoint(&self, zone: &str, kind: &str) -> String {
        self.endpoint(&format!("zones/{zone}/metadata/{kind}"))
    }

    /// Replace all values of one metadata kind; returns the metadata ID.
    pub async fn update_zone_metadata(&self, zone: &str, metadata: &ZoneMetadata) -> Result<String> {
        if metadata.metadata.is_empty() {
            return Err(ValidationError::EmptyMetadata.into());
        }
        let id = encode_id(zone, &metadata.kind);
        let body = serde_json::to_vec(metadata)?;
        self.send(
            Method::PUT,
            &self.metadata_endpoint(zone, &metadata.kind),
            Some(body),
        )
        .await?
        .check(
            &[StatusCode::OK, StatusCode::NO_CONTENT],
            format!("error updating zone metadata {id}"),
            &id,
        )?;
        Ok(id)
    }

    pub async fn get_zone_metadata(&self, id: &str) -> Result<ZoneMetadata> {
        let (zone, kind) = decode_id(id)?;
        self.send(Method::GET, &self.metadata_endpoint(zone, kind), None)
            .await?
            .check(
                &[StatusCode::OK],
                format!("error getting zone metadata {id}"),
                id,
            )?
            .json()
    }

    /// A kind without values counts as absent.
    pub async fn zone_metadata_exists(&self, id: &str) -> Result<bool> {
        let (zone, kind) = decode_id(id)?;
        let res = self
            .send(Method::GET, &self.metadata_endpoint(zone, kind), None)
            .await?
            .check(
                &[StatusCode::OK, StatusCode::NOT_FOUND],
                format!("error getting zone metadata {id}"),
                id,
            )?;
        if res.status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let metadata: ZoneMetadata = res.json()?;
        Ok(!metadata.metadata.is_empty())
    }

    pub async fn delete_zone_metadata(&self, id: &str) -> Result<()> {
        let (zone, kind) = decode_id(id)?;
        self.send(Method::DELETE, &self.metadata_endpoint(zone, kind), None)
            .await?
            .check(
                &[StatusCode::OK, StatusCode::NO_CONTENT],
                format!("error deleting zone metadata {id}"),
                id,
            )?;
        Ok(())
    }
}
