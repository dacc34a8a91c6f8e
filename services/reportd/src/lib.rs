pub mod config;
pub mod prompts;
pub mod routes_finetune;
pub mod routes_report;
pub mod routes_samples;
pub mod state;
pub mod weather;

use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;

use state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/report/section", post(routes_report::generate_section))
        .route("/samples", post(routes_samples::store_sample))
        .route("/finetune/launch", post(routes_finetune::launch_finetune))
        .route("/finetune/status", post(routes_finetune::poll_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
