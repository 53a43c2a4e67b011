//! Run report: per-case outcomes, inventory summary and the final verdict

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::contract::ContractFailure;
use crate::document::HttpMethod;

/// Snapshot of the HTTP request actually sent, for reproduction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestSnapshot {
    pub method: String,
    /// Absolute URL including the query string
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Result of one generated contract case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CaseOutcome {
    /// Stable, human-readable case title
    pub title: String,
    /// Identity key, e.g. `get /products/{id}`
    pub operation: String,
    pub method: HttpMethod,
    /// Path template as documented
    pub path: String,
    pub operation_id: String,
    pub request: RequestSnapshot,
    /// Received status; absent when no response arrived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Documented codes plus the common negative codes, ascending
    pub allowed_statuses: Vec<u16>,
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ContractFailure>,
}

impl CaseOutcome {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Size of the documented surface and how much of it is generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InventorySummary {
    /// Operations declared in the document
    pub total_operations: usize,
    /// Operations skipped because hand-written tests cover them
    pub covered: usize,
    /// Operations that receive a generated case
    pub uncovered: usize,
    /// Coverage keys with no matching operation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_coverage: Vec<String>,
}

/// Machine-readable output of `contractgen run`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContractReport {
    pub base_url: String,
    pub inventory: InventorySummary,
    /// Run-level failures (empty catalog, too few operations, nothing uncovered)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inventory_errors: Vec<String>,
    pub cases: Vec<CaseOutcome>,
}

impl ContractReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.cases.iter().filter(|c| !c.passed())
    }

    /// PASS requires a sound inventory, at least one case, and every case passing.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let failed = self.total() - self.passed();
        let ok = self.inventory_errors.is_empty() && failed == 0 && !self.cases.is_empty();

        let reason = if ok {
            format!("All {} contract cases passed", self.total())
        } else {
            let mut parts = Vec::new();
            if !self.inventory_errors.is_empty() {
                parts.push(format!("inventory: {}", self.inventory_errors.join("; ")));
            }
            if self.cases.is_empty() {
                parts.push("no contract cases were generated".to_string());
            } else if failed > 0 {
                let transport = self
                    .failures()
                    .filter(|c| matches!(c.failure, Some(ContractFailure::Transport { .. })))
                    .count();
                parts.push(format!(
                    "{failed} of {} cases failed ({transport} transport)",
                    self.total()
                ));
            }
            parts.join("; ")
        };

        let status = if ok {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        Verdict {
            status,
            exit_code: status.exit_code(),
            reason,
        }
    }

    /// Format as human-readable terminal output.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "Contract run against {}: {} operations, {} covered, {} generated\n",
            self.base_url,
            self.inventory.total_operations,
            self.inventory.covered,
            self.inventory.uncovered,
        ));

        for case in &self.cases {
            let status = case
                .status_code
                .map_or_else(|| "---".to_string(), |s| s.to_string());
            let mark = if case.passed() { "PASS" } else { "FAIL" };
            lines.push(format!("  [{mark}] {status} {}", case.title));
            if let Some(failure) = &case.failure {
                lines.push(format!("         {} {}", case.request.method, case.request.url));
                lines.push(format!("         {failure}"));
            }
        }

        for stale in &self.inventory.stale_coverage {
            lines.push(format!("  [WARNING] coverage entry matches no operation: {stale}"));
        }
        for error in &self.inventory_errors {
            lines.push(format!("  [ERROR] {error}"));
        }

        let verdict = self.verdict();
        lines.push(String::new());
        lines.push(format!("{}: {}", verdict.status, verdict.reason));

        lines.join("\n")
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl VerdictStatus {
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Pass => 0,
            Self::Fail => 1,
        }
    }
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(ContractReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
