//! Dry run plan types and pre-flight validation
//!
//! Describes what `contractgen run` *would* send without touching the network.
//! Used for pre-flight validation and CI previews.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Config;
use crate::catalog::EndpointOperation;
use crate::contract::allowed_status_codes;
use crate::document::{HttpMethod, OpenApiDocument};
use crate::plan::{PlannedBody, plan_request};
use crate::report::InventorySummary;

// ── Plan types ──

/// Complete dry run plan: one entry per generated case, plus validations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DryRunPlan {
    pub cases: Vec<CasePlan>,
    pub inventory: InventorySummary,
    /// Config/document validation results
    pub validations: Vec<Validation>,
}

/// The request one generated case would send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CasePlan {
    pub title: String,
    /// Identity key, e.g. `delete /carts/{cartId}`
    pub operation: String,
    pub method: HttpMethod,
    /// Absolute URL including the query string
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// JSON body, when one is synthesized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    pub allowed_statuses: Vec<u16>,
}

impl CasePlan {
    #[must_use]
    pub fn new(doc: &OpenApiDocument, endpoint: &EndpointOperation<'_>, base_url: &str) -> Self {
        let request = plan_request(doc, endpoint);
        let body = match &request.body {
            PlannedBody::Json(map) => Some(serde_json::Value::Object(map.clone())),
            PlannedBody::None | PlannedBody::Multipart | PlannedBody::Form => None,
        };
        Self {
            title: endpoint.title(),
            operation: endpoint.key(),
            method: endpoint.method,
            url: request.url_with_query(base_url),
            content_type: request.body.content_type().map(str::to_string),
            body,
            allowed_statuses: allowed_status_codes(endpoint.operation).into_iter().collect(),
        }
    }
}

/// A validation check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub check: String,
    pub status: ValidationStatus,
    pub message: String,
}

impl Validation {
    fn new(check: &str, status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Status of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ── Config validation ──

/// Patterns that suggest a placeholder value rather than a real credential.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-token",
    "your_token",
    "YOUR_TOKEN",
    "your-api-key",
    "YOUR_API_KEY",
    "CHANGEME",
    "changeme",
    "placeholder",
    "replace-me",
    "REPLACE_ME",
];

/// Validate config and produce validation results.
#[must_use]
pub fn validate_config(config: &Config) -> Vec<Validation> {
    let mut checks = Vec::new();

    if config.spec.exists() {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Ok,
            format!("spec: {} (exists)", config.spec.display()),
        ));
    } else {
        checks.push(Validation::new(
            "spec",
            ValidationStatus::Error,
            format!("spec: {} (not found)", config.spec.display()),
        ));
    }

    if config.base_url.starts_with("http://") || config.base_url.starts_with("https://") {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Ok,
            format!("base_url: {}", config.base_url),
        ));
    } else {
        checks.push(Validation::new(
            "base_url",
            ValidationStatus::Warning,
            format!(
                "base_url: {} (missing http:// or https:// prefix)",
                config.base_url
            ),
        ));
    }

    let mut header_issues = Vec::new();
    for (key, value) in &config.headers {
        if value.contains('<') && value.contains('>') {
            header_issues.push(format!("{key}: contains '<...>' placeholder"));
        } else if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| value.contains(*p)) {
            header_issues.push(format!("{key}: contains '{pattern}', may be a placeholder"));
        }
    }
    if header_issues.is_empty() {
        checks.push(Validation::new(
            "headers",
            ValidationStatus::Ok,
            format!("headers: {} configured", config.headers.len()),
        ));
    } else {
        checks.extend(
            header_issues
                .into_iter()
                .map(|issue| Validation::new("headers", ValidationStatus::Warning, issue)),
        );
    }

    if config.timeout_secs == 0 {
        checks.push(Validation::new(
            "timeout_secs",
            ValidationStatus::Warning,
            "timeout_secs: 0 disables the request timeout",
        ));
    }

    checks
}

/// Check the catalog against the coverage set.
///
/// An empty catalog, fewer than `min_operations` entries, or nothing left
/// uncovered are errors. Stale coverage keys are warnings only.
#[must_use]
pub fn validate_inventory(inventory: &InventorySummary, min_operations: Option<usize>) -> Vec<Validation> {
    let mut checks = Vec::new();

    if inventory.total_operations == 0 {
        checks.push(Validation::new(
            "inventory",
            ValidationStatus::Error,
            "document declares no operations",
        ));
    } else {
        checks.push(Validation::new(
            "inventory",
            ValidationStatus::Ok,
            format!(
                "inventory: {} operations ({} covered, {} generated)",
                inventory.total_operations, inventory.covered, inventory.uncovered
            ),
        ));
    }

    if let Some(min) = min_operations.filter(|min| inventory.total_operations < *min) {
        checks.push(Validation::new(
            "inventory",
            ValidationStatus::Error,
            format!(
                "expected at least {min} operations, found {}",
                inventory.total_operations
            ),
        ));
    }

    if inventory.total_operations > 0 && inventory.uncovered == 0 {
        checks.push(Validation::new(
            "inventory",
            ValidationStatus::Error,
            "every operation is already covered; nothing to generate",
        ));
    }

    checks.extend(inventory.stale_coverage.iter().map(|key| {
        Validation::new(
            "coverage",
            ValidationStatus::Warning,
            format!("coverage entry matches no operation: {key}"),
        )
    }));

    checks
}

// ── Display helpers ──

impl DryRunPlan {
    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Dry run: {} contract cases planned\n", self.cases.len()));

        for case in &self.cases {
            lines.push(case.title.clone());
            lines.push(format!("  {} {}", case.method, case.url));
            if let Some(content_type) = &case.content_type {
                lines.push(format!("  Content-Type: {content_type}"));
            }
            if let Some(body) = &case.body {
                lines.push(format!("  Body: {body}"));
            }
            let allowed: Vec<String> = case.allowed_statuses.iter().map(u16::to_string).collect();
            lines.push(format!("  Allowed: {}", allowed.join(", ")));
            lines.push(String::new());
        }

        lines.push("Validation:".into());
        for v in &self.validations {
            lines.push(format!("  [{}] {}", v.status, v.message));
        }

        lines.join("\n")
    }

    /// Returns true if any validation has Error status.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Error)
    }

    /// Returns true if any validation has Warning status.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.validations
            .iter()
            .any(|v| v.status == ValidationStatus::Warning)
    }
}
