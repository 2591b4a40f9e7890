//! HTTP surface for the keymint license service.
//!
//! Maps the lifecycle engine onto an axum router:
//! - `GET /keys/issue` — issue or reuse a key for the caller's HWID
//! - `GET /keys/validate` — validate a key, status codes carry the outcome
//! - `POST /keys/validate-by-body` — alternate contract, success flag in body
//! - `/admin/*` — privileged operations behind a shared-secret credential
//!
//! Key events are mirrored to a fire-and-forget webhook sink; sink
//! failures are logged and never affect the primary request. Rate
//! limiting and static file serving are left to a fronting proxy.

mod api;
mod config;
mod error;
mod notify;

pub use api::{build_router, AppState};
pub use config::{Config, KeyMode};
pub use error::ApiError;
pub use notify::{NotificationSink, NullSink, WebhookSink};
