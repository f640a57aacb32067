//! Manual cycle trigger: `POST /cycles/{kind}` runs one cycle of that
//! hazard kind immediately and returns its report.

use std::sync::Arc;

use axum::{
    extract::Path, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use serde::Serialize;
use tracing::{error, info};

use crate::models::HazardKind;
use crate::pipeline::Pipeline;

// ---

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router() -> Router<Arc<Pipeline>> {
    // ---
    Router::new().route("/cycles/{kind}", post(handler))
}

async fn handler(
    Path(kind): Path<String>,
    State(pipeline): State<Arc<Pipeline>>,
) -> impl IntoResponse {
    // ---
    let Some(kind) = HazardKind::parse(&kind) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown hazard kind '{}'", kind),
            }),
        )
            .into_response();
    };

    info!("POST /cycles/{} - manual trigger", kind);
    match pipeline.run_cycle(kind).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("Manual {} cycle failed: {}", kind, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
