//! contractgen-core: OpenAPI model, request synthesis and contract verdicts
//!
//! Turns every documented operation that is not already covered by a
//! hand-written test into one planned request, and decides whether the
//! response honours the coarse status/content-type contract. No network I/O
//! happens here; see `contractgen-runner` for the HTTP side.

pub mod catalog;
pub mod config;
pub mod contract;
pub mod document;
pub mod dryrun;
pub mod generator;
pub mod plan;
pub mod report;
pub mod resolve;
pub mod synth;

pub use catalog::{CoverageSet, EndpointOperation, all_operations, operation_key, uncovered};
pub use config::{Config, ConfigError};
pub use contract::{
    COMMON_NEGATIVE_STATUS_CODES, ContractFailure, ResponseView, allowed_status_codes, verify,
};
pub use document::{DocumentError, HttpMethod, OpenApiDocument, Schema};
pub use dryrun::{CasePlan, DryRunPlan, Validation, ValidationStatus};
pub use generator::to_http_file;
pub use plan::{PlannedBody, RequestPlan, expected_status_codes, plan_request};
pub use report::{
    CaseOutcome, ContractReport, InventorySummary, RequestSnapshot, Verdict, VerdictStatus,
};
pub use synth::Synthesizer;
