//! Operation catalog - flatten `paths` into addressable operations and
//! split them into covered / uncovered by the hand-maintained coverage set.

use indexmap::IndexSet;

use crate::document::{HttpMethod, OpenApiDocument, Operation, Parameter};

/// Operations already exercised by hand-written scenarios.
pub const LEGACY_COVERED_OPERATIONS: [&str; 6] = [
    "get /products",
    "get /products/{productId}",
    "get /products/{id}",
    "get /brands",
    "get /categories",
    "post /payment/check",
];

/// Identity key: lowercase method + space + path template, e.g. `get /products/{id}`.
#[must_use]
pub fn operation_key(method: HttpMethod, path: &str) -> String {
    format!("{} {path}", method.as_str())
}

/// One `(path, method, operation)` slot of the document. One endpoint → one contract case.
#[derive(Debug, Clone, Copy)]
pub struct EndpointOperation<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub operation: &'a Operation,
    /// Parameters declared on the path item itself
    pub path_parameters: &'a [Parameter],
}

impl<'a> EndpointOperation<'a> {
    #[must_use]
    pub fn key(&self) -> String {
        operation_key(self.method, self.path)
    }

    /// `operationId`, or `<method>-<path>` when the document has none.
    #[must_use]
    pub fn operation_id(&self) -> String {
        self.operation
            .operation_id
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.method.as_str(), self.path))
    }

    /// Human-readable case title; stable for a given document.
    #[must_use]
    pub fn title(&self) -> String {
        format!(
            "[contract] {} {} ({}) returns documented or supported negative status",
            self.method,
            self.path,
            self.operation_id()
        )
    }

    /// Operation parameters, then path-level ones not shadowed by `(name, in)`.
    pub fn parameters(&self) -> impl Iterator<Item = &'a Parameter> + 'a {
        let operation: &'a Operation = self.operation;
        let own: &'a [Parameter] = &operation.parameters;
        let shared: &'a [Parameter] = self.path_parameters;
        own.iter().chain(shared.iter().filter(move |inherited| {
            !own
                .iter()
                .any(|p| p.name == inherited.name && p.location == inherited.location)
        }))
    }
}

/// Every declared operation, in document path order then `[get, post, put, patch, delete]`.
#[must_use]
pub fn all_operations(doc: &OpenApiDocument) -> Vec<EndpointOperation<'_>> {
    doc.paths
        .iter()
        .flat_map(|(path, item)| {
            HttpMethod::ALL.into_iter().filter_map(move |method| {
                item.operation(method).map(|operation| EndpointOperation {
                    path: path.as_str(),
                    method,
                    operation,
                    path_parameters: &item.parameters,
                })
            })
        })
        .collect()
}

/// Fixed set of operation keys excluded from generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    keys: IndexSet<String>,
}

impl CoverageSet {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// The hand-tested operations of the practice-software-testing API.
    #[must_use]
    pub fn legacy() -> Self {
        Self::new(LEGACY_COVERED_OPERATIONS)
    }

    #[must_use]
    pub fn contains(&self, endpoint: &EndpointOperation<'_>) -> bool {
        self.keys.contains(&endpoint.key())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys that match nothing in `catalog`. Inert, but worth a warning.
    #[must_use]
    pub fn stale_entries(&self, catalog: &[EndpointOperation<'_>]) -> Vec<String> {
        self.keys
            .iter()
            .filter(|key| !catalog.iter().any(|ep| &ep.key() == *key))
            .cloned()
            .collect()
    }
}

/// Catalog entries not in the coverage set, in catalog order.
#[must_use]
pub fn uncovered<'a>(
    catalog: &[EndpointOperation<'a>],
    coverage: &CoverageSet,
) -> Vec<EndpointOperation<'a>> {
    catalog
        .iter()
        .filter(|ep| !coverage.contains(ep))
        .copied()
        .collect()
}
