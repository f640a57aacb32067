use std::sync::Arc;

use axum::Router;

use crate::pipeline::Pipeline;

mod cycles;
mod health;

// ---

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    // ---
    Router::new()
        .merge(cycles::router())
        .merge(health::router())
        .with_state(pipeline)
}
