mod docs;
mod error;
mod state;
mod util;

pub mod dispatch;
pub mod presence;
pub mod routes;
pub mod services;

pub use dispatch::{Dispatcher, ServerEvent};
pub use error::ApiError;
pub use presence::{ConnectionHandle, PresenceRegistry};
pub use state::AppState;
pub use util::CONNECTION_ID_HEADER;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/counterparts",
            get(routes::counterparts::list_counterparts),
        )
        .route(
            "/api/conversations/:counterpart_id/messages",
            get(routes::messages::get_messages),
        )
        .route(
            "/api/conversations/:counterpart_id/messages",
            post(routes::messages::send_message),
        )
        .route(
            "/api/messages/:message_id",
            put(routes::messages::update_message),
        )
        .route(
            "/api/messages/:message_id",
            delete(routes::messages::delete_message),
        )
        .route("/ws", get(routes::websocket::websocket_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            axum::http::HeaderName::from_static(CONNECTION_ID_HEADER),
        ])
}
