//! Common routes: health, version, info.

use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct VersionBody {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct InfoBody {
    #[serde(flatten)]
    version: VersionBody,
    description: &'static str,
}

const VERSION: VersionBody = VersionBody {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
};

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn version() -> Json<VersionBody> {
    Json(VERSION)
}

async fn info() -> Json<InfoBody> {
    Json(InfoBody {
        version: VERSION,
        description: env!("CARGO_PKG_DESCRIPTION"),
    })
}

/// Common routes (no state): GET /health, GET /version, GET /info.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/info", get(info))
}
