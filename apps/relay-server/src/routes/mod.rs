pub mod health;

use axum::Router;
use utoipa::OpenApi;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
}

#[derive(OpenApi)]
#[openapi(
    paths(health::health),
    components(schemas(health::HealthResponse)),
    tags((name = "Health", description = "Health check"))
)]
pub struct ApiDoc;
