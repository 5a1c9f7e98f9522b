use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::counterparts::list_counterparts,
        crate::routes::messages::get_messages,
        crate::routes::messages::send_message,
        crate::routes::messages::update_message,
        crate::routes::messages::delete_message,
        crate::routes::websocket::websocket_handler
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::models::Counterpart,
            crate::routes::models::CounterpartsResponse,
            crate::routes::models::MessageView,
            crate::routes::models::MessagesResponse,
            crate::routes::models::MessageResponse,
            crate::routes::models::DeleteMessageResponse,
            crate::routes::models::SendMessageRequest,
            crate::routes::models::FilePayload,
            crate::routes::models::UpdateMessageRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Counterparts", description = "Roster with presence and last-message previews"),
        (name = "Messages", description = "Direct-message history and CRUD"),
        (name = "WebSocket", description = "Realtime event stream")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Bearer".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}
