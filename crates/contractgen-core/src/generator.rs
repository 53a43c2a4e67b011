//! HTTP file generator - converts failed cases to .http format

use crate::report::{CaseOutcome, RequestSnapshot};

/// Generate .http file content from the failed cases of a run.
///
/// URLs that start with `base_url` are rewritten to use the `{{base_url_var}}`
/// variable so the file can be pointed at another environment.
pub fn to_http_file(cases: &[CaseOutcome], base_url: &str, base_url_var: &str) -> String {
    let failed: Vec<&CaseOutcome> = cases.iter().filter(|c| !c.passed()).collect();
    let mut lines = Vec::new();

    lines.push(format!(
        "# Auto-generated contract reproductions ({} failures)",
        failed.len()
    ));
    lines.push(format!("@{base_url_var} = {}", base_url.trim_end_matches('/')));
    lines.push(String::new());

    for (idx, case) in failed.iter().enumerate() {
        let status = case
            .status_code
            .map_or_else(|| "no response".to_string(), |s| s.to_string());
        lines.push(format!("### [{idx}] {} {} - {status}", case.method, case.path));
        lines.push(format!("# {}", case.operation_id));
        if let Some(failure) = &case.failure {
            lines.push(format!("# {failure}"));
        }

        let request = RequestSnapshot {
            url: templated_url(&case.request.url, base_url, base_url_var),
            ..case.request.clone()
        };
        lines.push(request_to_http(&request, None));

        lines.push(String::new());
    }

    lines.join("\n")
}

/// Generate a single request as .http format
pub fn request_to_http(request: &RequestSnapshot, comment: Option<&str>) -> String {
    let mut lines = Vec::new();

    if let Some(c) = comment {
        lines.push(format!("### {c}"));
    }

    lines.push(format!("{} {}", request.method, request.url));

    for (key, value) in &request.headers {
        if !matches!(key.to_lowercase().as_str(), "host" | "content-length") {
            lines.push(format!("{key}: {value}"));
        }
    }

    if let Some(body) = &request.body {
        lines.push(String::new());
        lines.push(body.clone());
    }

    lines.join("\n")
}

fn templated_url(url: &str, base_url: &str, base_url_var: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match url.strip_prefix(base) {
        Some(rest) if !base.is_empty() => format!("{{{{{base_url_var}}}}}{rest}"),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::ContractFailure;
    use crate::document::HttpMethod;
    use std::collections::BTreeMap;

    fn failed_post() -> CaseOutcome {
        CaseOutcome {
            title: "[contract] POST /users/register (registerUser) returns documented or supported negative status".into(),
            operation: "post /users/register".into(),
            method: HttpMethod::Post,
            path: "/users/register".into(),
            operation_id: "registerUser".into(),
            request: RequestSnapshot {
                method: "POST".into(),
                url: "https://api.example.test/users/register".into(),
                headers: BTreeMap::from([
                    ("Accept".to_string(), "application/json".to_string()),
                    ("Content-Type".to_string(), "application/json".to_string()),
                ]),
                body: Some(r#"{"email":"api.1700000000000@example.test"}"#.into()),
            },
            status_code: Some(503),
            allowed_statuses: vec![201, 400, 401, 403, 404, 405, 409, 415, 422, 423, 429, 500],
            elapsed_ms: 40,
            failure: Some(ContractFailure::UnexpectedStatus {
                actual: 503,
                allowed: vec![201, 400, 401, 403, 404, 405, 409, 415, 422, 423, 429, 500],
            }),
        }
    }

    fn passed_get() -> CaseOutcome {
        CaseOutcome {
            title: "[contract] GET /invoices (getInvoices) returns documented or supported negative status".into(),
            operation: "get /invoices".into(),
            method: HttpMethod::Get,
            path: "/invoices".into(),
            operation_id: "getInvoices".into(),
            request: RequestSnapshot {
                method: "GET".into(),
                url: "https://api.example.test/invoices?page=1".into(),
                headers: BTreeMap::new(),
                body: None,
            },
            status_code: Some(401),
            allowed_statuses: vec![200, 401],
            elapsed_ms: 8,
            failure: None,
        }
    }

    fn timed_out_delete() -> CaseOutcome {
        CaseOutcome {
            title: "[contract] DELETE /carts/{cartId} (deleteCart) returns documented or supported negative status".into(),
            operation: "delete /carts/{cartId}".into(),
            method: HttpMethod::Delete,
            path: "/carts/{cartId}".into(),
            operation_id: "deleteCart".into(),
            request: RequestSnapshot {
                method: "DELETE".into(),
                url: "https://api.example.test/carts/non-existent-id".into(),
                headers: BTreeMap::from([("Host".to_string(), "api.example.test".to_string())]),
                body: None,
            },
            status_code: None,
            allowed_statuses: vec![204, 404],
            elapsed_ms: 45_000,
            failure: Some(ContractFailure::Transport {
                message: "operation timed out".into(),
            }),
        }
    }

    #[test]
    fn only_failed_cases_are_exported() {
        let output = to_http_file(&[passed_get(), failed_post()], "https://api.example.test/", "base_url");
        assert!(output.contains("(1 failures)"));
        assert!(!output.contains("/invoices"));
        assert!(output.contains("POST {{base_url}}/users/register"));
    }

    #[test]
    fn foreign_urls_stay_absolute() {
        assert_eq!(
            templated_url("http://other.test/x", "https://api.example.test", "base_url"),
            "http://other.test/x"
        );
        assert_eq!(templated_url("/x", "", "base_url"), "/x");
    }

    #[test]
    fn request_to_http_basic() {
        let request = RequestSnapshot {
            method: "GET".to_string(),
            url: "http://localhost/api".to_string(),
            headers: BTreeMap::new(),
            body: None,
        };

        let output = request_to_http(&request, Some("Test request"));

        assert_eq!(output, "### Test request\nGET http://localhost/api");
    }

    #[test]
    fn http_file_snapshot() {
        let output = to_http_file(
            &[failed_post(), passed_get(), timed_out_delete()],
            "https://api.example.test",
            "base_url",
        );
        insta::assert_snapshot!(output, @r#"
        # Auto-generated contract reproductions (2 failures)
        @base_url = https://api.example.test

        ### [0] POST /users/register - 503
        # registerUser
        # status 503 not in allowed set [201, 400, 401, 403, 404, 405, 409, 415, 422, 423, 429, 500]
        POST {{base_url}}/users/register
        Accept: application/json
        Content-Type: application/json

        {"email":"api.1700000000000@example.test"}

        ### [1] DELETE /carts/{cartId} - no response
        # deleteCart
        # request failed: operation timed out
        DELETE {{base_url}}/carts/non-existent-id
        "#);
    }
}
