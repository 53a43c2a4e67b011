//! Contract runner: one independent, stateless case per uncovered operation
//!
//! The document is loaded once and shared read-only; cases run on a rayon
//! pool in any order and report back in catalog order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use contractgen_core::dryrun::{validate_config, validate_inventory};
use contractgen_core::{
    CaseOutcome, CasePlan, Config, ContractFailure, ContractReport, CoverageSet, DocumentError,
    DryRunPlan, EndpointOperation, InventorySummary, OpenApiDocument, PlannedBody, RequestPlan,
    RequestSnapshot, ResponseView, ValidationStatus, all_operations, allowed_status_codes,
    plan_request, uncovered, verify,
};

use crate::client::{ClientError, HttpClient, ReqwestClient};

/// Generates and executes contract cases
pub struct ContractRunner<C = ReqwestClient> {
    document: Arc<OpenApiDocument>,
    base_url: String,
    headers: BTreeMap<String, String>,
    coverage: CoverageSet,
    /// Substring filter on the operation key
    filter: Option<String>,
    jobs: Option<usize>,
    min_operations: Option<usize>,
    client: C,
}

impl ContractRunner<ReqwestClient> {
    /// Load the document named by `config` and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be read/parsed or the HTTP client fails to build.
    pub fn from_config(config: &Config) -> Result<Self, RunnerError> {
        let document = Arc::new(OpenApiDocument::load(&config.spec)?);
        let client = ReqwestClient::new(config.timeout_secs)?;
        Ok(Self::new(document, &config.base_url, client)
            .with_headers(config.headers.clone())
            .with_coverage(config.coverage())
            .with_jobs(config.jobs)
            .with_min_operations(config.min_operations))
    }

    /// Dry run straight from `config`.
    ///
    /// Config problems that prevent loading the document (a missing spec
    /// file) are reported as validations with no cases instead of an error.
    ///
    /// # Errors
    ///
    /// Returns error if an existing document cannot be parsed or the HTTP client fails to build.
    pub fn dry_run(config: &Config, filter: Option<String>) -> Result<DryRunPlan, RunnerError> {
        let checks = validate_config(config);
        if checks.iter().any(|v| v.status == ValidationStatus::Error) {
            return Ok(DryRunPlan {
                validations: checks,
                ..DryRunPlan::default()
            });
        }
        Ok(Self::from_config(config)?.with_filter(filter).plan(config))
    }
}

impl<C: HttpClient> ContractRunner<C> {
    /// Runner with the default headers and the legacy coverage set.
    #[must_use]
    pub fn new(document: Arc<OpenApiDocument>, base_url: &str, client: C) -> Self {
        let defaults = Config::default();
        Self {
            document,
            base_url: base_url.to_string(),
            coverage: defaults.coverage(),
            headers: defaults.headers,
            filter: None,
            jobs: None,
            min_operations: None,
            client,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_coverage(mut self, coverage: CoverageSet) -> Self {
        self.coverage = coverage;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    #[must_use]
    pub fn with_min_operations(mut self, min_operations: Option<usize>) -> Self {
        self.min_operations = min_operations;
        self
    }

    /// Catalog summary plus the operations that get a case, after filtering.
    fn select(&self) -> (InventorySummary, Vec<EndpointOperation<'_>>) {
        let catalog = all_operations(&self.document);
        let remaining = uncovered(&catalog, &self.coverage);
        let stale = self.coverage.stale_entries(&catalog);
        for key in &stale {
            warn!("coverage entry matches no documented operation: {key}");
        }

        let inventory = InventorySummary {
            total_operations: catalog.len(),
            covered: catalog.len() - remaining.len(),
            uncovered: remaining.len(),
            stale_coverage: stale,
        };

        let selected = match &self.filter {
            Some(f) => remaining
                .into_iter()
                .filter(|ep| ep.key().contains(f.as_str()))
                .collect(),
            None => remaining,
        };
        (inventory, selected)
    }

    /// Dry run: plan every case and validate config and inventory.
    /// No HTTP requests are sent.
    #[must_use]
    pub fn plan(&self, config: &Config) -> DryRunPlan {
        let (inventory, selected) = self.select();
        let cases = selected
            .iter()
            .map(|ep| CasePlan::new(&self.document, ep, &self.base_url))
            .collect();

        let mut validations = validate_config(config);
        validations.extend(validate_inventory(&inventory, self.min_operations));

        DryRunPlan {
            cases,
            inventory,
            validations,
        }
    }

    /// Execute every selected case.
    ///
    /// Case failures are recorded in the report, never returned as `Err`.
    ///
    /// # Errors
    ///
    /// Returns error only if the worker pool cannot be created.
    pub fn run(&self) -> Result<ContractReport, RunnerError> {
        let (inventory, selected) = self.select();
        let inventory_errors: Vec<String> = validate_inventory(&inventory, self.min_operations)
            .into_iter()
            .filter(|v| v.status == ValidationStatus::Error)
            .map(|v| v.message)
            .collect();
        for error in &inventory_errors {
            warn!("inventory check failed: {error}");
        }

        info!(
            "running {} contract cases against {} ({} operations, {} covered)",
            selected.len(),
            self.base_url,
            inventory.total_operations,
            inventory.covered
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()
            .map_err(|e| RunnerError::Pool(e.to_string()))?;
        let cases: Vec<CaseOutcome> =
            pool.install(|| selected.par_iter().map(|ep| self.run_case(ep)).collect());

        let report = ContractReport {
            base_url: self.base_url.clone(),
            inventory,
            inventory_errors,
            cases,
        };
        info!(
            "{} of {} contract cases passed",
            report.passed(),
            report.total()
        );
        Ok(report)
    }

    fn run_case(&self, endpoint: &EndpointOperation<'_>) -> CaseOutcome {
        let plan = plan_request(&self.document, endpoint);
        let allowed = allowed_status_codes(endpoint.operation);
        let request = self.snapshot(&plan);
        debug!("{} {}", request.method, request.url);

        let start = Instant::now();
        let result = self.client.execute(&plan, &self.base_url, &self.headers);
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (status_code, failure) = match result {
            Ok(resp) => {
                let view = ResponseView {
                    status: resp.status,
                    content_type: resp.content_type(),
                    body: &resp.body,
                };
                (Some(resp.status), verify(&allowed, &view).err())
            }
            Err(e) => {
                warn!("{} {}: {e}", endpoint.method, endpoint.path);
                (
                    None,
                    Some(ContractFailure::Transport {
                        message: e.to_string(),
                    }),
                )
            }
        };

        CaseOutcome {
            title: endpoint.title(),
            operation: endpoint.key(),
            method: endpoint.method,
            path: endpoint.path.to_string(),
            operation_id: endpoint.operation_id(),
            request,
            status_code,
            allowed_statuses: allowed.into_iter().collect(),
            elapsed_ms,
            failure,
        }
    }

    fn snapshot(&self, plan: &RequestPlan) -> RequestSnapshot {
        let mut headers = self.headers.clone();
        // The transport picks the multipart boundary; a bare type cannot be replayed
        if !matches!(plan.body, PlannedBody::Multipart) {
            if let Some(content_type) = plan.body.content_type() {
                headers.insert("Content-Type".to_string(), content_type.to_string());
            }
        }
        let body = match &plan.body {
            PlannedBody::Json(map) => serde_json::to_string(map).ok(),
            PlannedBody::None | PlannedBody::Multipart | PlannedBody::Form => None,
        };
        RequestSnapshot {
            method: plan.method.to_string(),
            url: plan.url_with_query(&self.base_url),
            headers,
            body,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Worker pool error: {0}")]
    Pool(String),
}
