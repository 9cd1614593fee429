//! Parsing of the metadata table of contents and of individual metadata statements.

use keyward_types::encoding;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MetadataFetchError;

/// Description stored for entries whose statement could not be obtained.
pub const UNKNOWN_AUTHENTICATOR: &str = "Unknown Authenticator";

/// What is known about one authenticator model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    /// Lowercase hyphenated AAGUID.
    pub aaguid: String,

    /// Human readable model name.
    pub description: Option<String>,

    /// Base64 DER roots that attestation chains of this model must anchor to.
    #[serde(default)]
    pub attestation_root_certificates: Vec<String>,

    /// The statement as published, if one was obtained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_statement: Option<Value>,
}

impl MetadataEntry {
    /// An entry that only records the model exists, without any roots.
    pub fn placeholder(aaguid: &str, description: Option<&str>) -> Self {
        Self {
            aaguid: aaguid.to_ascii_lowercase(),
            description: Some(description.unwrap_or(UNKNOWN_AUTHENTICATOR).to_owned()),
            attestation_root_certificates: Vec::new(),
            raw_statement: None,
        }
    }

    /// Build an entry from a metadata statement. The statement's description wins over the one
    /// listed in the table of contents.
    pub fn from_statement(
        aaguid: &str,
        description: Option<&str>,
        statement: Value,
    ) -> Result<Self, MetadataFetchError> {
        let parsed: StatementFields = serde_json::from_value(statement.clone())
            .map_err(|e| MetadataFetchError::InvalidStatement(e.to_string()))?;
        Ok(Self {
            aaguid: aaguid.to_ascii_lowercase(),
            description: parsed.description.or_else(|| description.map(str::to_owned)),
            attestation_root_certificates: parsed.attestation_root_certificates,
            raw_statement: Some(statement),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementFields {
    description: Option<String>,
    #[serde(default)]
    attestation_root_certificates: Vec<String>,
}

/// The decoded payload of the table of contents token.
#[derive(Debug, Deserialize)]
pub(crate) struct TableOfContents {
    #[serde(default)]
    pub entries: Vec<TocEntry>,
}

/// One line of the table of contents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TocEntry {
    pub aaguid: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub metadata_statement: Option<Value>,
}

impl TableOfContents {
    /// Read the payload of a `header.payload.signature` token. The signature is not checked.
    pub fn from_token(token: &[u8]) -> Result<Self, MetadataFetchError> {
        let token = std::str::from_utf8(token)
            .map_err(|_| MetadataFetchError::InvalidToken("not UTF-8".into()))?
            .trim();
        let parts: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = parts.as_slice() else {
            return Err(MetadataFetchError::InvalidToken(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        };

        let payload = encoding::try_from_base64(&encoding::normalize_base64url(payload))
            .ok_or_else(|| MetadataFetchError::InvalidToken("payload is not base64".into()))?;
        serde_json::from_slice(&payload)
            .map_err(|e| MetadataFetchError::InvalidToken(e.to_string()))
    }
}

/// Read a statement body, either plain JSON or base64 encoded JSON.
pub(crate) fn parse_statement(body: &[u8]) -> Result<Value, MetadataFetchError> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Ok(value);
    }

    let text = std::str::from_utf8(body)
        .map_err(|_| MetadataFetchError::InvalidStatement("not UTF-8".into()))?;
    let decoded = encoding::try_from_base64(&encoding::normalize_base64url(text))
        .ok_or_else(|| MetadataFetchError::InvalidStatement("neither JSON nor base64".into()))?;
    serde_json::from_slice(&decoded)
        .map_err(|e| MetadataFetchError::InvalidStatement(e.to_string()))
}
