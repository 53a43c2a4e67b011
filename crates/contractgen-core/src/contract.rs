//! Contract verification policy
//!
//! A response passes when its status is documented or is a recognised,
//! well-formed rejection, and a JSON content type actually carries JSON.
//! This is deliberately coarse: bodies are never validated against schemas.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::Operation;
use crate::plan::expected_status_codes;

/// Rejections accepted for any operation.
pub const COMMON_NEGATIVE_STATUS_CODES: [u16; 11] =
    [400, 401, 403, 404, 405, 409, 415, 422, 423, 429, 500];

/// Documented codes ∪ [`COMMON_NEGATIVE_STATUS_CODES`].
#[must_use]
pub fn allowed_status_codes(operation: &Operation) -> BTreeSet<u16> {
    expected_status_codes(operation)
        .into_iter()
        .chain(COMMON_NEGATIVE_STATUS_CODES)
        .collect()
}

/// The parts of a response the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    pub status: u16,
    pub content_type: Option<&'a str>,
    pub body: &'a str,
}

/// Why a single case failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractFailure {
    /// Status outside the allowed set
    UnexpectedStatus { actual: u16, allowed: Vec<u16> },
    /// Content type claims JSON but the body does not parse
    MalformedJson { message: String },
    /// No response: connect error, timeout, unsupported method
    Transport { message: String },
}

impl std::fmt::Display for ContractFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedStatus { actual, allowed } => {
                let allowed: Vec<String> = allowed.iter().map(u16::to_string).collect();
                write!(f, "status {actual} not in allowed set [{}]", allowed.join(", "))
            }
            Self::MalformedJson { message } => write!(f, "malformed JSON body: {message}"),
            Self::Transport { message } => write!(f, "request failed: {message}"),
        }
    }
}

/// Check one response against the allowed set.
///
/// The status check runs first; the JSON check only applies to responses
/// whose status is already acceptable.
///
/// # Errors
///
/// Returns the first contract violation found.
pub fn verify(allowed: &BTreeSet<u16>, response: &ResponseView<'_>) -> Result<(), ContractFailure> {
    if !allowed.contains(&response.status) {
        return Err(ContractFailure::UnexpectedStatus {
            actual: response.status,
            allowed: allowed.iter().copied().collect(),
        });
    }

    if response.content_type.is_some_and(is_json_content_type) {
        serde_json::from_str::<serde_json::Value>(response.body)
            .map_err(|e| ContractFailure::MalformedJson {
                message: e.to_string(),
            })?;
    }

    Ok(())
}

fn is_json_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("application/json")
}
