//! REST front end.
//!
//! Exposes every catalog operation as a resource route mirroring the upstream
//! API (`GET /deals`, `GET /deals/{id}`, `POST /deals`, `POST /deals/search`,
//! ...). Routes are generated from the operation table; each handler only
//! gathers arguments and a credential from the request and hands them to the
//! shared dispatcher.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{MethodFilter, MethodRouter, get, on},
};
use bytes::Bytes;
use serde_json::{Map, Number, Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{TransportError, TransportResult, config::RestConfig};
use crate::core::McpServer;
use crate::domains::operations::{
    Dispatcher, FieldKind, GatewayError, OperationKind, OperationSpec,
};
use crate::domains::upstream::{Credential, HttpMethod, resolve_credential};

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "x-token";
/// Legacy alias of [`TOKEN_HEADER`].
pub const LEGACY_TOKEN_HEADER: &str = "x-piperun-token";
/// Query parameter carrying the API token.
pub const TOKEN_QUERY: &str = "token";

/// State shared by the REST handlers.
#[derive(Clone)]
pub struct RestState {
    dispatcher: Dispatcher,
    default_credential: Option<Credential>,
}

impl RestState {
    pub fn new(dispatcher: Dispatcher, default_credential: Option<Credential>) -> Self {
        Self {
            dispatcher,
            default_credential,
        }
    }

    pub fn from_server(server: &McpServer) -> Self {
        Self::new(server.dispatcher().clone(), server.default_credential())
    }
}

/// REST transport handler.
pub struct RestTransport {
    config: RestConfig,
}

impl RestTransport {
    pub fn new(config: RestConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the REST server until it fails.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let state = RestState::from_server(&server);
        let app = router(state, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (REST, {} operations, CORS {})",
            addr,
            server.dispatcher().operations().len(),
            if self.config.enable_cors { "enabled" } else { "disabled" }
        );
        if server.default_credential().is_none() {
            warn!("No default API token - requests must send X-Token or ?token=");
        }

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the REST router for every operation in the state's table.
pub fn router(state: RestState, enable_cors: bool) -> Router {
    let mut routes: BTreeMap<String, MethodRouter<RestState>> = BTreeMap::new();

    for operation in state.dispatcher.operations().iter() {
        let filter = method_filter(operation.rest_method());
        let path = operation.rest_path();

        let route = if operation.id_field.is_some() {
            on(
                filter,
                move |State(state): State<RestState>,
                      Path(id): Path<String>,
                      Query(query): Query<Vec<(String, String)>>,
                      headers: HeaderMap,
                      body: Bytes| async move {
                    invoke(&state, operation, Some(id), query, &headers, &body).await
                },
            )
        } else {
            on(
                filter,
                move |State(state): State<RestState>,
                      Query(query): Query<Vec<(String, String)>>,
                      headers: HeaderMap,
                      body: Bytes| async move {
                    invoke(&state, operation, None, query, &headers, &body).await
                },
            )
        };

        let merged = match routes.remove(&path) {
            Some(existing) => existing.merge(route),
            None => route,
        };
        routes.insert(path, merged);
    }

    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check));
    for (path, route) in routes {
        app = app.route(&path, route);
    }

    let mut app = app
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    app
}

fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Delete => MethodFilter::DELETE,
    }
}

/// Gather arguments and credential, dispatch, and shape the response.
async fn invoke(
    state: &RestState,
    operation: &'static OperationSpec,
    id: Option<String>,
    query: Vec<(String, String)>,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let mut query_token = None;
    let mut args = Map::new();

    for (name, raw) in query {
        if name == TOKEN_QUERY {
            query_token = Some(raw);
            continue;
        }
        let kind = operation.field(&name).map(|f| f.kind);
        args.insert(name, coerce(kind, raw));
    }

    if !body.is_empty() {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => args.extend(fields),
            Ok(_) => {
                return error_response(GatewayError::validation(
                    operation.name,
                    "request body must be a JSON object",
                ));
            }
            Err(e) => {
                return error_response(GatewayError::validation(
                    operation.name,
                    format!("request body is not valid JSON: {e}"),
                ));
            }
        }
    }

    if let (Some(field), Some(id)) = (operation.id_field, id) {
        args.insert(field.to_string(), coerce(Some(FieldKind::Integer), id));
    }

    let credential = resolve_credential(
        None,
        header_value(headers, TOKEN_HEADER).or_else(|| header_value(headers, LEGACY_TOKEN_HEADER)),
        query_token.as_deref(),
        state.default_credential.as_ref(),
    );
    let Some(credential) = credential else {
        return error_response(GatewayError::MissingCredential);
    };

    match state.dispatcher.invoke(operation, credential, &args).await {
        Ok(payload) => success_response(operation, payload),
        Err(e) => error_response(e),
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Query strings carry text only; numeric fields are turned back into numbers.
fn coerce(kind: Option<FieldKind>, raw: String) -> Value {
    if !kind.is_some_and(|k| k.is_numeric()) {
        return Value::String(raw);
    }
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(raw),
    }
}

fn success_response(operation: &OperationSpec, payload: Value) -> Response {
    if operation.kind == OperationKind::Delete {
        let message = format!("{} deleted successfully", operation.entity.title());
        return (StatusCode::OK, Json(json!({"success": true, "message": message})))
            .into_response();
    }

    let status =
        StatusCode::from_u16(operation.rest_success_status()).unwrap_or(StatusCode::OK);
    (status, Json(payload)).into_response()
}

fn error_response(error: GatewayError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if let GatewayError::Internal(detail) = &error {
        warn!("Internal failure: {}", detail);
    }

    failure(status, error.to_string(), error.details())
}

/// `{success: false, error, details?}` envelope.
fn failure(status: StatusCode, message: String, details: Option<&Value>) -> Response {
    let mut body = json!({
        "success": false,
        "error": message,
    });
    if let Some(details) = details {
        body["details"] = details.clone();
    }
    (status, Json(body)).into_response()
}

/// Index of the available routes.
async fn index(State(state): State<RestState>) -> impl IntoResponse {
    let endpoints: Vec<Value> = state
        .dispatcher
        .operations()
        .iter()
        .map(|op| {
            json!({
                "method": op.rest_method().as_str(),
                "path": op.rest_path(),
                "operation": op.name,
                "description": op.description,
            })
        })
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "authentication": "X-Token header or token query parameter",
        "endpoints": endpoints,
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn method_not_allowed(method: Method, uri: Uri) -> impl IntoResponse {
    failure(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {} not allowed on {}", method, uri.path()),
        None,
    )
}

async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    let error = GatewayError::UnknownOperation(format!("{} {}", method, uri.path()));
    error_response(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_fields() {
        assert_eq!(coerce(Some(FieldKind::Integer), "42".into()), json!(42));
        assert_eq!(coerce(Some(FieldKind::Number), "1.5".into()), json!(1.5));
        assert_eq!(coerce(Some(FieldKind::Integer), "abc".into()), json!("abc"));
        assert_eq!(coerce(Some(FieldKind::Text), "42".into()), json!("42"));
        assert_eq!(coerce(None, "42".into()), json!("42"));
    }

    #[test]
    fn test_error_envelope() {
        let response = error_response(GatewayError::MissingCredential);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = error_response(GatewayError::Rejected {
            status: 422,
            body: json!({"message": "bad"}),
        });
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
