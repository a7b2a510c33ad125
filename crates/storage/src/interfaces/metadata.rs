use async_trait::async_trait;
use eyre::eyre;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotscope_common::utils::http::get_json_from_url;
use std::collections::BTreeMap;
use tracing::trace;

/// Maps a slot index to the variable declared there.
pub type StorageLayout = BTreeMap<u64, LayoutEntry>;

/// A declared storage variable.
///
/// Deserializes from either `{ "type": "uint256", "label": "totalSupply" }` or a bare type
/// name such as `"uint256"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLayoutEntry")]
pub struct LayoutEntry {
    /// The declared type, either as written in source (`uint256`, `address payable`) or as a
    /// solc type identifier (`t_uint256`, `t_string_storage`)
    #[serde(rename = "type")]
    pub type_name: String,
    /// The variable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LayoutEntry {
    /// An entry declaring `type_name`, optionally naming the variable.
    pub fn new(type_name: &str, label: Option<&str>) -> Self {
        Self { type_name: type_name.to_string(), label: label.map(str::to_string) }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLayoutEntry {
    Name(String),
    Entry {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<RawLayoutEntry> for LayoutEntry {
    fn from(raw: RawLayoutEntry) -> Self {
        match raw {
            RawLayoutEntry::Name(type_name) => LayoutEntry { type_name, label: None },
            RawLayoutEntry::Entry { type_name, label } => LayoutEntry { type_name, label },
        }
    }
}

/// What the metadata source knows about a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    /// The contract name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The token symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Whether the source code is verified
    #[serde(default)]
    pub is_verified: bool,
    /// Declared types by slot index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_layout: Option<StorageLayout>,
}

/// A source of contract names, symbols, verification status and storage layouts.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Look up the metadata of `address` on `chain_id`. Unknown contracts yield `Ok(None)`.
    async fn get_metadata(
        &self,
        address: &str,
        chain_id: u64,
    ) -> eyre::Result<Option<ContractMetadata>>;
}

/// Reads metadata from a REST API serving `GET {base_url}/contracts/{address}?chainId={id}`.
#[derive(Debug, Clone)]
pub struct HttpMetadataSource {
    base_url: String,
    timeout: u64,
}

impl HttpMetadataSource {
    /// `timeout` is in seconds and applies to each attempt.
    pub fn new(base_url: &str, timeout: u64) -> Self {
        Self { base_url: base_url.trim_end_matches('/').to_string(), timeout }
    }

    fn url(&self, address: &str, chain_id: u64) -> String {
        format!("{}/contracts/{}?chainId={}", self.base_url, address, chain_id)
    }
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn get_metadata(
        &self,
        address: &str,
        chain_id: u64,
    ) -> eyre::Result<Option<ContractMetadata>> {
        let url = self.url(address, chain_id);
        trace!("fetching contract metadata from {}", url);

        let response = get_json_from_url(&url, self.timeout)
            .await
            .map_err(|e| eyre!("failed to fetch metadata from '{url}': {e}"))?;

        match response {
            Some(value) => parse_metadata_response(value),
            None => Ok(None),
        }
    }
}

/// Extracts [`ContractMetadata`] from a metadata API response.
///
/// Accepts the bare object or a `{ "success": bool, "data": {...} }` envelope. An envelope
/// with `success: false` or without data means the contract is unknown.
pub(crate) fn parse_metadata_response(value: Value) -> eyre::Result<Option<ContractMetadata>> {
    let value = match value.get("success").and_then(Value::as_bool) {
        Some(false) => return Ok(None),
        Some(true) => match value.get("data") {
            Some(Value::Null) | None => return Ok(None),
            Some(data) => data.clone(),
        },
        None => value,
    };

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| eyre!("failed to parse contract metadata: {e}"))
}

/// The metadata source used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

#[async_trait]
impl MetadataSource for NoMetadata {
    async fn get_metadata(
        &self,
        _address: &str,
        _chain_id: u64,
    ) -> eyre::Result<Option<ContractMetadata>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_metadata() {
        let metadata = parse_metadata_response(json!({
            "name": "Wrapped Ether",
            "symbol": "WETH",
            "isVerified": true
        }))
        .expect("failed to parse")
        .expect("metadata missing");

        assert_eq!(metadata.name.as_deref(), Some("Wrapped Ether"));
        assert_eq!(metadata.symbol.as_deref(), Some("WETH"));
        assert!(metadata.is_verified);
        assert!(metadata.storage_layout.is_none());
    }

    #[test]
    fn test_parse_enveloped_metadata_with_layout() {
        let metadata = parse_metadata_response(json!({
            "success": true,
            "data": {
                "name": "Token",
                "isVerified": true,
                "storageLayout": {
                    "0": { "type": "string", "label": "name" },
                    "2": "uint8"
                }
            }
        }))
        .expect("failed to parse")
        .expect("metadata missing");

        let layout = metadata.storage_layout.expect("layout missing");
        assert_eq!(layout.get(&0), Some(&LayoutEntry::new("string", Some("name"))));
        assert_eq!(layout.get(&2), Some(&LayoutEntry::new("uint8", None)));
        assert_eq!(layout.get(&1), None);
    }

    #[test]
    fn test_parse_unsuccessful_envelope() {
        assert_eq!(
            parse_metadata_response(json!({ "success": false, "error": "not found" }))
                .expect("failed to parse"),
            None
        );
        assert_eq!(
            parse_metadata_response(json!({ "success": true, "data": null }))
                .expect("failed to parse"),
            None
        );
    }

    #[test]
    fn test_parse_malformed_metadata() {
        assert!(parse_metadata_response(json!({ "isVerified": "maybe" })).is_err());
    }

    #[test]
    fn test_metadata_url() {
        let source = HttpMetadataSource::new("http://localhost:4000/", 5);
        assert_eq!(
            source.url("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 1),
            "http://localhost:4000/contracts/0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2?chainId=1"
        );
    }

    #[tokio::test]
    async fn test_no_metadata() {
        let metadata = NoMetadata.get_metadata("0x0", 1).await.expect("failed to get metadata");
        assert!(metadata.is_none());
    }
}
