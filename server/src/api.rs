//! Router, handlers, and shared application state.

use crate::config::Config;
use crate::error::ApiError;
use crate::notify::{NotificationSink, NullSink, WebhookSink};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use keymint_engine::{
    resolve_hwid, AdminController, KeyEvent, KeyGenerator, LifecycleEngine,
};
use keymint_store::{JsonFileStore, KeyStore};
use keymint_types::{KeyId, LicenseRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

type DynStore = Box<dyn KeyStore>;

/// State shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<LifecycleEngine<DynStore>>,
    admin: Arc<AdminController<DynStore>>,
    sink: Arc<dyn NotificationSink>,
    admin_token: String,
}

impl AppState {
    /// Builds state over any store implementation.
    ///
    /// The engine and admin controller share one mutex-guarded store, so
    /// every read-modify-write sequence is a single critical section.
    #[must_use]
    pub fn new(
        store: DynStore,
        generator: KeyGenerator,
        lifetime_ms: i64,
        admin_token: String,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let store = Arc::new(Mutex::new(store));
        Self {
            engine: Arc::new(LifecycleEngine::new(
                store.clone(),
                generator.clone(),
                lifetime_ms,
            )),
            admin: Arc::new(AdminController::new(store, generator)),
            sink,
            admin_token,
        }
    }

    /// Builds production state: flat-file store plus webhook sink.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let store: DynStore = Box::new(JsonFileStore::load(&config.data_file));
        let sink: Arc<dyn NotificationSink> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookSink::new(url.clone())),
            None => Arc::new(NullSink),
        };
        Self::new(
            store,
            config.generator(),
            config.key_lifetime_ms,
            config.admin_token.clone(),
            sink,
        )
    }
}

/// Builds the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/keys", get(admin_keys))
        .route("/extend", post(admin_extend))
        .route("/reset-hwid", post(admin_reset_hwid))
        .route("/revoke", post(admin_revoke))
        .route("/generate-permanent", post(admin_generate_permanent))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/keys/issue", get(issue))
        .route("/keys/validate", get(validate))
        .route("/keys/validate-by-body", post(validate_by_body))
        .nest("/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the caller's HWID from query, `x-hwid` header, or UA+IP
/// fallback, in that order.
fn client_hwid(query_hwid: Option<&str>, headers: &HeaderMap, addr: SocketAddr) -> String {
    let header_hwid = headers.get("x-hwid").and_then(|v| v.to_str().ok());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    resolve_hwid(query_hwid, header_hwid, user_agent, &addr.ip().to_string())
}

// ── Key surface ──────────────────────────────────────────────────

#[derive(Deserialize)]
struct IssueParams {
    hwid: Option<String>,
}

async fn issue(
    State(state): State<AppState>,
    Query(params): Query<IssueParams>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<LicenseRecord>, ApiError> {
    let hwid = client_hwid(params.hwid.as_deref(), &headers, addr);
    let outcome = state.engine.issue(&hwid)?;
    state
        .sink
        .notify(outcome.event(), Some(&outcome.record), Some(&hwid));
    Ok(Json(outcome.record))
}

#[derive(Deserialize)]
struct ValidateParams {
    key: Option<String>,
    hwid: Option<String>,
}

async fn validate(
    State(state): State<AppState>,
    Query(params): Query<ValidateParams>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<LicenseRecord>, ApiError> {
    let hwid = client_hwid(params.hwid.as_deref(), &headers, addr);
    let key = params.key.unwrap_or_default();
    let record = state.engine.validate(&key, &hwid)?;
    state
        .sink
        .notify(KeyEvent::Validated, Some(&record), Some(&hwid));
    Ok(Json(record))
}

#[derive(Deserialize)]
struct ValidateBody {
    key: String,
    hwid: String,
}

#[derive(Serialize)]
struct ValidateOutcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<LicenseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Alternate contract: outcome flag in the body, 200 either way.
/// Storage failures still surface as 5xx.
async fn validate_by_body(
    State(state): State<AppState>,
    Json(body): Json<ValidateBody>,
) -> Result<Json<ValidateOutcome>, ApiError> {
    match state.engine.validate(&body.key, &body.hwid) {
        Ok(record) => {
            state
                .sink
                .notify(KeyEvent::Validated, Some(&record), Some(&body.hwid));
            Ok(Json(ValidateOutcome {
                success: true,
                record: Some(record),
                error: None,
            }))
        }
        Err(
            err @ (keymint_engine::EngineError::Persistence(_)
            | keymint_engine::EngineError::KeyGeneration(_)),
        ) => Err(err.into()),
        Err(err) => Ok(Json(ValidateOutcome {
            success: false,
            record: None,
            error: Some(err.to_string()),
        })),
    }
}

// ── Admin surface ────────────────────────────────────────────────

async fn admin_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    if presented != Some(state.admin_token.as_str()) {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

async fn admin_keys(State(state): State<AppState>) -> Json<Vec<LicenseRecord>> {
    Json(state.admin.list_all())
}

#[derive(Deserialize)]
struct ExtendBody {
    id: KeyId,
    hours: i64,
}

async fn admin_extend(
    State(state): State<AppState>,
    Json(body): Json<ExtendBody>,
) -> Result<Json<LicenseRecord>, ApiError> {
    let record = state.admin.extend(body.id, body.hours)?;
    state.sink.notify(KeyEvent::Extended, Some(&record), None);
    Ok(Json(record))
}

#[derive(Deserialize)]
struct IdBody {
    id: KeyId,
}

async fn admin_reset_hwid(
    State(state): State<AppState>,
    Json(body): Json<IdBody>,
) -> Result<Json<LicenseRecord>, ApiError> {
    let record = state.admin.reset_binding(body.id)?;
    state.sink.notify(KeyEvent::BindingReset, Some(&record), None);
    Ok(Json(record))
}

async fn admin_revoke(
    State(state): State<AppState>,
    Json(body): Json<IdBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.admin.revoke(body.id)?;
    state.sink.notify(KeyEvent::Revoked, None, None);
    Ok(Json(json!({ "success": true })))
}

async fn admin_generate_permanent(
    State(state): State<AppState>,
) -> Result<Json<LicenseRecord>, ApiError> {
    let record = state.admin.generate_permanent()?;
    state
        .sink
        .notify(KeyEvent::PermanentIssued, Some(&record), None);
    Ok(Json(record))
}
