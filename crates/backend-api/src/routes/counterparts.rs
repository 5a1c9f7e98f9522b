use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    routes::models::CounterpartsResponse, util::require_bearer, ApiError, AppState,
};

// The caller's roster: everyone they can message.
#[utoipa::path(
    get,
    path = "/api/counterparts",
    tag = "Counterparts",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Roster of counterparts", body = CounterpartsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to load roster", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_counterparts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CounterpartsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let counterparts = state.message_service().list_counterparts(&user).await?;
    Ok(Json(CounterpartsResponse { counterparts }))
}
