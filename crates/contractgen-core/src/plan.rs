//! Request planning - concrete URL, query map and body for one endpoint
//!
//! Only path parameters and *required* query parameters are synthesized;
//! header/cookie and optional query parameters are left out on purpose.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::catalog::EndpointOperation;
use crate::document::{HttpMethod, OpenApiDocument, Operation, ParamLocation, Parameter, Schema};
use crate::synth::Synthesizer;

/// Path value for put/patch/delete without an example: guarantees a miss
/// instead of mutating a real record.
pub const NON_EXISTENT_ID: &str = "non-existent-id";
pub const INVOICE_NOT_FOUND: &str = "INV-NOT-FOUND";
pub const GENERIC_ID: &str = "1";
pub const QUERY_FALLBACK: &str = "sample";

const JSON_MEDIA_TYPE: &str = "application/json";
const MULTIPART_MEDIA_TYPE: &str = "multipart/form-data";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";

/// Payload to send with the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlannedBody {
    None,
    Json(Map<String, Value>),
    /// Empty multipart placeholder; uploads are not synthesized
    Multipart,
    /// Empty url-encoded form
    Form,
}

impl PlannedBody {
    /// Content type the transport will attach.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Json(_) => Some(JSON_MEDIA_TYPE),
            Self::Multipart => Some(MULTIPART_MEDIA_TYPE),
            Self::Form => Some(FORM_MEDIA_TYPE),
        }
    }
}

/// Fully planned request, independent of any base URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPlan {
    pub method: HttpMethod,
    /// Path template with every path parameter substituted
    pub path: String,
    pub query: IndexMap<String, Value>,
    pub body: PlannedBody,
}

impl RequestPlan {
    /// `base_url` joined with the planned path (no query string).
    #[must_use]
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }

    /// Full URL including the percent-encoded query string.
    #[must_use]
    pub fn url_with_query(&self, base_url: &str) -> String {
        let url = self.url(base_url);
        if self.query.is_empty() {
            return url;
        }
        let query: Vec<String> = self
            .query_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{url}?{}", query.join("&"))
    }

    /// Query parameters as wire strings.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .map(|(k, v)| (k.clone(), param_string(v)))
            .collect()
    }
}

/// Plan the single request for `endpoint`.
#[must_use]
pub fn plan_request(doc: &OpenApiDocument, endpoint: &EndpointOperation<'_>) -> RequestPlan {
    let (path, query) = build_url(endpoint.path, endpoint.parameters(), endpoint.method);
    RequestPlan {
        method: endpoint.method,
        path,
        query,
        body: build_body(&Synthesizer::new(doc), endpoint.operation),
    }
}

/// Substitute path parameters and collect required query parameters.
pub fn build_url<'p>(
    path_template: &str,
    parameters: impl IntoIterator<Item = &'p Parameter>,
    method: HttpMethod,
) -> (String, IndexMap<String, Value>) {
    let mut url = path_template.to_string();
    let mut query = IndexMap::new();

    for parameter in parameters {
        match parameter.location {
            ParamLocation::Path => {
                let placeholder = format!("{{{}}}", parameter.name);
                let value = path_value(parameter, method);
                url = url.replacen(&placeholder, &urlencoding::encode(&value), 1);
            }
            ParamLocation::Query if parameter.required => {
                query.insert(parameter.name.clone(), query_value(parameter));
            }
            _ => {}
        }
    }

    (url, query)
}

/// Pick the body from `requestBody.content`: JSON, then multipart, then form.
#[must_use]
pub fn build_body(synth: &Synthesizer<'_>, operation: &Operation) -> PlannedBody {
    let Some(content) = operation.request_body.as_ref().map(|rb| &rb.content) else {
        return PlannedBody::None;
    };

    if let Some(schema) = content.get(JSON_MEDIA_TYPE).and_then(|m| m.schema.as_ref()) {
        return PlannedBody::Json(synth.object(Some(schema)));
    }
    if content.contains_key(MULTIPART_MEDIA_TYPE) {
        return PlannedBody::Multipart;
    }
    if content.contains_key(FORM_MEDIA_TYPE) {
        return PlannedBody::Form;
    }
    PlannedBody::None
}

/// Numeric keys of `responses`, de-duplicated, in document order.
/// `default` and range keys such as `2XX` are skipped.
#[must_use]
pub fn expected_status_codes(operation: &Operation) -> Vec<u16> {
    let mut codes: Vec<u16> = Vec::new();
    for code in operation.responses.keys().filter_map(|k| k.trim().parse::<u16>().ok()) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

fn path_value(parameter: &Parameter, method: HttpMethod) -> String {
    if let Some(example) = &parameter.example {
        return param_string(example);
    }
    if method.is_destructive() {
        return NON_EXISTENT_ID.to_string();
    }
    if parameter.name.to_lowercase().contains("invoice_number") {
        return INVOICE_NOT_FOUND.to_string();
    }
    GENERIC_ID.to_string()
}

fn query_value(parameter: &Parameter) -> Value {
    if let Some(example) = &parameter.example {
        return match example {
            Value::String(_) | Value::Number(_) | Value::Bool(_) => example.clone(),
            other => Value::String(other.to_string()),
        };
    }
    // The declared type is read directly; a `$ref` schema falls back to text.
    match parameter.schema.as_ref().and_then(Schema::type_name) {
        Some("number") => json!(1),
        Some("boolean") => Value::Bool(true),
        _ => json!(QUERY_FALLBACK),
    }
}

/// Primitives as their plain text, everything else as JSON.
#[must_use]
pub fn param_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::all_operations;

    fn doc(value: Value) -> OpenApiDocument {
        serde_json::from_value(value).unwrap()
    }

    fn params(value: Value) -> Vec<Parameter> {
        serde_json::from_value(value).unwrap()
    }

    fn operation(value: Value) -> Operation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn path_param_defaults_to_generic_id_for_get() {
        let p = params(json!([{"name": "id", "in": "path", "required": true}]));
        let (url, query) = build_url("/products/{id}", &p, HttpMethod::Get);
        assert_eq!(url, "/products/1");
        assert!(query.is_empty());
    }

    #[test]
    fn destructive_methods_target_missing_resource() {
        let p = params(json!([{"name": "cartId", "in": "path", "required": true}]));
        for method in [HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete] {
            let (url, _) = build_url("/carts/{cartId}", &p, method);
            assert_eq!(url, "/carts/non-existent-id", "{method}");
        }
    }

    #[test]
    fn invoice_number_gets_not_found_sentinel() {
        let p = params(json!([{"name": "Invoice_Number", "in": "path"}]));
        let (url, _) = build_url("/invoices/{Invoice_Number}/download-pdf", &p, HttpMethod::Get);
        assert_eq!(url, "/invoices/INV-NOT-FOUND/download-pdf");

        // destructive rule is checked first
        let (url, _) = build_url("/invoices/{Invoice_Number}", &p, HttpMethod::Delete);
        assert_eq!(url, "/invoices/non-existent-id");
    }

    #[test]
    fn path_example_is_percent_encoded() {
        let p = params(json!([
            {"name": "slug", "in": "path", "example": "hand tools/saws"},
            {"name": "n", "in": "path", "example": 42},
            {"name": "obj", "in": "path", "example": {"a": 1}}
        ]));
        let (url, _) = build_url("/c/{slug}/{n}/{obj}", &p, HttpMethod::Delete);
        assert_eq!(url, "/c/hand%20tools%2Fsaws/42/%7B%22a%22%3A1%7D");
    }

    #[test]
    fn null_example_counts_as_absent() {
        let p = params(json!([
            {"name": "id", "in": "path", "example": null},
            {"name": "q", "in": "query", "required": true, "example": null, "schema": {"type": "integer"}}
        ]));
        let (url, query) = build_url("/products/{id}", &p, HttpMethod::Get);
        assert_eq!(url, "/products/1");
        assert_eq!(query["q"], json!(1));

        let (url, _) = build_url("/products/{id}", &p, HttpMethod::Delete);
        assert_eq!(url, "/products/non-existent-id");
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        let p = params(json!([{"name": "id", "in": "path"}]));
        let (url, _) = build_url("/a/{id}/b/{id}", &p, HttpMethod::Get);
        assert_eq!(url, "/a/1/b/{id}");
    }

    #[test]
    fn required_query_defaults_by_type() {
        let p = params(json!([
            {"name": "page", "in": "query", "required": true, "schema": {"type": "integer"}},
            {"name": "ratio", "in": "query", "required": true, "schema": {"type": "number"}},
            {"name": "rental", "in": "query", "required": true, "schema": {"type": "boolean"}},
            {"name": "q", "in": "query", "required": true, "schema": {"type": "string"}},
            {"name": "untyped", "in": "query", "required": true},
            {"name": "by_ref", "in": "query", "required": true,
             "schema": {"$ref": "#/components/schemas/Count"}}
        ]));
        let (_, query) = build_url("/search", &p, HttpMethod::Get);
        assert_eq!(query["page"], json!(1));
        assert_eq!(query["ratio"], json!(1));
        assert_eq!(query["rental"], json!(true));
        assert_eq!(query["q"], json!("sample"));
        assert_eq!(query["untyped"], json!("sample"));
        assert_eq!(query["by_ref"], json!("sample"));
    }

    #[test]
    fn query_example_wins() {
        let p = params(json!([
            {"name": "q", "in": "query", "required": true, "example": "pliers",
             "schema": {"type": "integer"}},
            {"name": "ids", "in": "query", "required": true, "example": [1, 2]}
        ]));
        let (_, query) = build_url("/search", &p, HttpMethod::Get);
        assert_eq!(query["q"], json!("pliers"));
        assert_eq!(query["ids"], json!("[1,2]"));
    }

    #[test]
    fn optional_query_header_cookie_are_ignored() {
        let p = params(json!([
            {"name": "page", "in": "query", "schema": {"type": "integer"}},
            {"name": "sort", "in": "query", "required": false, "example": "name"},
            {"name": "X-Trace", "in": "header", "required": true},
            {"name": "session", "in": "cookie", "required": true}
        ]));
        let (url, query) = build_url("/products", &p, HttpMethod::Get);
        assert_eq!(url, "/products");
        assert!(query.is_empty());
    }

    #[test]
    fn json_body_is_synthesized() {
        let d = OpenApiDocument::default();
        let op = operation(json!({
            "requestBody": {"content": {
                "application/json": {"schema": {
                    "type": "object",
                    "required": ["first_name"],
                    "properties": {"first_name": {"type": "string"}, "dob": {"type": "string"}}
                }},
                "multipart/form-data": {}
            }},
            "responses": {}
        }));
        assert_eq!(
            build_body(&Synthesizer::new(&d), &op),
            PlannedBody::Json(
                json!({"first_name": "sample-text"})
                    .as_object()
                    .cloned()
                    .unwrap()
            )
        );
    }

    #[test]
    fn multipart_and_form_placeholders() {
        let d = OpenApiDocument::default();
        let syn = Synthesizer::new(&d);

        let multipart = operation(json!({
            "requestBody": {"content": {"multipart/form-data": {"schema": {"type": "object"}}}},
            "responses": {}
        }));
        assert_eq!(build_body(&syn, &multipart), PlannedBody::Multipart);

        let form = operation(json!({
            "requestBody": {"content": {"application/x-www-form-urlencoded": {}}},
            "responses": {}
        }));
        assert_eq!(build_body(&syn, &form), PlannedBody::Form);
    }

    #[test]
    fn json_without_schema_falls_through() {
        let d = OpenApiDocument::default();
        let syn = Synthesizer::new(&d);
        let op = operation(json!({
            "requestBody": {"content": {"application/json": {}}},
            "responses": {}
        }));
        assert_eq!(build_body(&syn, &op), PlannedBody::None);

        let op = operation(json!({
            "requestBody": {"content": {"text/plain": {"schema": {"type": "string"}}}},
            "responses": {}
        }));
        assert_eq!(build_body(&syn, &op), PlannedBody::None);
        assert_eq!(build_body(&syn, &operation(json!({"responses": {}}))), PlannedBody::None);
    }

    #[test]
    fn expected_codes_skip_non_numeric_and_dedup() {
        let op = operation(json!({
            "responses": {"200": {}, "default": {}, "404": {}, "2XX": {}, " 200": {}}
        }));
        assert_eq!(expected_status_codes(&op), vec![200, 404]);
    }

    #[test]
    fn plan_for_endpoint_with_query_string() {
        let d = doc(json!({
            "paths": {"/products/search": {"get": {
                "parameters": [
                    {"name": "q", "in": "query", "required": true, "example": "claw hammer"}
                ],
                "responses": {"200": {}}
            }}}
        }));
        let ops = all_operations(&d);
        let plan = plan_request(&d, &ops[0]);
        assert_eq!(plan.path, "/products/search");
        assert_eq!(plan.body, PlannedBody::None);
        assert_eq!(
            plan.url_with_query("https://api.example.test/"),
            "https://api.example.test/products/search?q=claw%20hammer"
        );
        assert_eq!(plan.url("https://api.example.test"), "https://api.example.test/products/search");
    }

    #[test]
    fn plan_delete_cart() {
        let d = doc(json!({
            "paths": {"/carts/{cartId}": {"delete": {
                "parameters": [{"name": "cartId", "in": "path", "required": true,
                                "schema": {"type": "string"}}],
                "responses": {"204": {}, "404": {}}
            }}}
        }));
        let ops = all_operations(&d);
        let plan = plan_request(&d, &ops[0]);
        assert_eq!(plan.method, HttpMethod::Delete);
        assert_eq!(plan.path, "/carts/non-existent-id");
        assert!(plan.query_pairs().is_empty());
    }

    #[test]
    fn param_string_forms() {
        assert_eq!(param_string(&json!("x")), "x");
        assert_eq!(param_string(&json!(1.5)), "1.5");
        assert_eq!(param_string(&json!(false)), "false");
        assert_eq!(param_string(&json!(["a"])), r#"["a"]"#);
    }
}
