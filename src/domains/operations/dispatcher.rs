//! Operation dispatcher.
//!
//! Resolves an operation by name, validates its arguments, renders the
//! upstream call and runs it through the retry-aware executor. Both front ends
//! go through here, so an operation behaves the same wherever it is invoked.

use serde_json::{Map, Value};
use tracing::{error, info, instrument};

use super::catalog::{OperationSpec, OperationTable, PATH_ID, catalog};
use super::error::GatewayError;
use super::validator::{ValidatedArgs, validate};
use crate::domains::upstream::{Credential, RequestExecutor, UpstreamCallDescriptor, query_scalar};

/// Routes named operations to upstream calls.
#[derive(Clone)]
pub struct Dispatcher {
    table: &'static OperationTable,
    executor: RequestExecutor,
}

impl Dispatcher {
    /// Dispatcher over the built-in operation table.
    pub fn new(executor: RequestExecutor) -> Self {
        Self::with_table(catalog(), executor)
    }

    pub fn with_table(table: &'static OperationTable, executor: RequestExecutor) -> Self {
        Self { table, executor }
    }

    pub fn operations(&self) -> &'static OperationTable {
        self.table
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Exact-match lookup.
    pub fn resolve(&self, name: &str) -> Result<&'static OperationSpec, GatewayError> {
        self.table
            .resolve(name)
            .ok_or_else(|| GatewayError::UnknownOperation(name.to_string()))
    }

    /// Resolve and invoke an operation by name.
    pub async fn dispatch(
        &self,
        name: &str,
        credential: Credential,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        let operation = self.resolve(name)?;
        self.invoke(operation, credential, args).await
    }

    /// Validate, render and execute one operation.
    ///
    /// Validation failures never reach the network.
    #[instrument(skip_all, fields(operation = operation.name))]
    pub async fn invoke(
        &self,
        operation: &OperationSpec,
        credential: Credential,
        args: &Map<String, Value>,
    ) -> Result<Value, GatewayError> {
        let validated = validate(operation, args)
            .map_err(|e| GatewayError::validation(operation.name, e.to_string()))?;
        let descriptor = build_descriptor(operation, validated, credential)?;

        info!("{} -> {} {}", operation.name, descriptor.method, descriptor.path);

        self.executor.execute(&descriptor).await.map_err(|e| {
            let err = GatewayError::from(e);
            if let GatewayError::Internal(detail) = &err {
                error!("{} failed: {}", operation.name, detail);
            }
            err
        })
    }
}

/// Render the upstream call for validated arguments.
///
/// Arguments go to the JSON body for POST/PUT and to the query string
/// otherwise, renamed to their upstream names where declared.
pub fn build_descriptor(
    operation: &OperationSpec,
    args: ValidatedArgs,
    credential: Credential,
) -> Result<UpstreamCallDescriptor, GatewayError> {
    let path = match operation.id_field {
        Some(field) => {
            let id = args
                .id
                .as_ref()
                .and_then(render_identifier)
                .ok_or_else(|| {
                    GatewayError::validation(
                        operation.name,
                        format!("missing required field '{field}'"),
                    )
                })?;
            operation.path.replace(PATH_ID, &id)
        }
        None => operation.path.to_string(),
    };

    let wire_name = |name: String| match operation.field(&name) {
        Some(field) => field.wire_name().to_string(),
        None => name,
    };

    let mut descriptor = UpstreamCallDescriptor::new(operation.method, path, credential);
    if operation.args_in_body() {
        let body = args
            .params
            .into_iter()
            .map(|(name, value)| (wire_name(name), value))
            .collect();
        descriptor = descriptor.with_body(body);
    } else {
        for (name, value) in args.params {
            if let Some(rendered) = query_scalar(&value) {
                descriptor = descriptor.with_query(wire_name(name), rendered);
            }
        }
    }

    Ok(descriptor)
}

/// Render a path identifier, dropping a zero fractional part.
fn render_identifier(value: &Value) -> Option<String> {
    match value.as_f64() {
        Some(n) if value.is_f64() && n.fract() == 0.0 && n.abs() < 1e15 => {
            Some(format!("{}", n as i64))
        }
        _ => query_scalar(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::upstream::executor::tests::ScriptedTransport;
    use crate::domains::upstream::{HttpMethod, RetryPolicy, UpstreamError, UpstreamResponse};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn credential() -> Credential {
        Credential::new("secret").unwrap()
    }

    fn dispatcher(transport: &Arc<ScriptedTransport>) -> Dispatcher {
        Dispatcher::new(RequestExecutor::new(
            transport.clone(),
            RetryPolicy::new(3, Duration::from_millis(10)),
        ))
    }

    #[tokio::test]
    async fn test_create_deal_issues_single_post() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(UpstreamResponse::new(
            201,
            json!({"data": {"id": 99, "title": "X"}}),
        ))]));
        let body = assert_ok!(
            dispatcher(&transport)
                .dispatch(
                    "create_deal",
                    credential(),
                    &args(json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3})),
                )
                .await
        );
        assert_eq!(body["data"]["id"], 99);

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, HttpMethod::Post);
        assert_eq!(calls[0].path, "/deals");
        assert_eq!(
            calls[0].body,
            Some(args(json!({"title": "X", "pipeline_id": 1, "stage_id": 2, "owner_id": 3})))
        );
        assert!(calls[0].query.is_empty());
        assert_eq!(calls[0].credential.expose(), "secret");
    }

    #[tokio::test]
    async fn test_unknown_operation_makes_no_call() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = assert_err!(
            dispatcher(&transport)
                .dispatch("frobnicate", credential(), &Map::new())
                .await
        );
        assert!(matches!(err, GatewayError::UnknownOperation(name) if name == "frobnicate"));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_failure_makes_no_call() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let err = assert_err!(
            dispatcher(&transport)
                .dispatch("create_deal", credential(), &args(json!({"title": "X"})))
                .await
        );
        assert!(matches!(err, GatewayError::Validation { .. }));
        assert_eq!(err.http_status(), 400);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_list_arguments_go_to_query() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        assert_ok!(
            dispatcher(&transport)
                .dispatch(
                    "list_deals",
                    credential(),
                    &args(json!({"status": 2, "page": 1, "show": 50})),
                )
                .await
        );
        let call = &transport.calls()[0];
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(call.path, "/deals");
        assert_eq!(call.query["status"], "2");
        assert_eq!(call.query["page"], "1");
        assert_eq!(call.query["show"], "50");
        assert!(call.body.is_none());
    }

    #[tokio::test]
    async fn test_search_renames_query_argument() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        assert_ok!(
            dispatcher(&transport)
                .dispatch("search_persons", credential(), &args(json!({"query": "ana"})))
                .await
        );
        let call = &transport.calls()[0];
        assert_eq!(call.path, "/persons");
        assert_eq!(call.query.get("search").map(String::as_str), Some("ana"));
        assert!(!call.query.contains_key("query"));
    }

    #[tokio::test]
    async fn test_identifier_rendered_into_path() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let dispatcher = dispatcher(&transport);
        assert_ok!(
            dispatcher
                .dispatch("update_deal", credential(), &args(json!({"deal_id": 42, "value": 10.5})))
                .await
        );
        assert_ok!(
            dispatcher
                .dispatch("delete_note", credential(), &args(json!({"note_id": 7.0})))
                .await
        );

        let calls = transport.calls();
        assert_eq!(calls[0].method, HttpMethod::Put);
        assert_eq!(calls[0].path, "/deals/42");
        assert_eq!(calls[0].body, Some(args(json!({"value": 10.5}))));
        assert_eq!(calls[1].method, HttpMethod::Delete);
        assert_eq!(calls[1].path, "/notes/7");
        assert!(calls[1].query.is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_classified() {
        let transport = Arc::new(ScriptedTransport::always(Ok(UpstreamResponse::new(
            404,
            json!({"message": "Deal not found"}),
        ))));
        let err = assert_err!(
            dispatcher(&transport)
                .dispatch("get_deal", credential(), &args(json!({"deal_id": 1})))
                .await
        );
        assert!(matches!(err, GatewayError::NotFound { .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_retried_then_reported() {
        let transport = Arc::new(ScriptedTransport::always(Ok(UpstreamResponse::new(
            503,
            json!({"message": "maintenance"}),
        ))));
        let err = assert_err!(
            dispatcher(&transport)
                .dispatch("list_users", credential(), &Map::new())
                .await
        );
        assert_eq!(err.http_status(), 503);
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn test_malformed_response_is_internal() {
        let transport = Arc::new(ScriptedTransport::always(Err(
            UpstreamError::MalformedResponse("expected value".into()),
        )));
        let err = assert_err!(
            dispatcher(&transport)
                .dispatch("list_tags", credential(), &Map::new())
                .await
        );
        assert!(matches!(err, GatewayError::Internal(_)));
        assert_eq!(err.to_string(), "Internal error");
    }

    #[test]
    fn test_render_identifier() {
        assert_eq!(render_identifier(&json!(5)), Some("5".into()));
        assert_eq!(render_identifier(&json!(5.0)), Some("5".into()));
        assert_eq!(render_identifier(&json!(5.5)), Some("5.5".into()));
        assert_eq!(render_identifier(&json!("abc")), Some("abc".into()));
        assert_eq!(render_identifier(&json!(null)), None);
    }
}
