use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    routes::models::{
        DeleteMessageResponse, MessageResponse, MessagesResponse, SendMessageRequest,
        UpdateMessageRequest,
    },
    util::{origin_connection_id, require_bearer},
    ApiError, AppState,
};

// History with one counterpart
#[utoipa::path(
    get,
    path = "/api/conversations/{counterpart_id}/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("counterpart_id" = String, Path, description = "Counterpart public identifier")
    ),
    responses(
        (status = 200, description = "Messages in send order", body = MessagesResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Counterpart not found", body = crate::error::ErrorResponse),
        (status = 500, description = "Failed to fetch messages", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    Path(counterpart_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<MessagesResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let messages = state
        .message_service()
        .list_messages(&user, &counterpart_id)
        .await?;
    Ok(Json(MessagesResponse { messages }))
}

// Send a message to a counterpart
#[utoipa::path(
    post,
    path = "/api/conversations/{counterpart_id}/messages",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("counterpart_id" = String, Path, description = "Counterpart public identifier")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 400, description = "Empty or malformed payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Counterpart not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Attachment upload failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(counterpart_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let origin = origin_connection_id(&headers);

    let message = state
        .message_service()
        .send_message(&user, &counterpart_id, request, origin.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse { message })))
}

// Edit a message's text; only the sender may do this
#[utoipa::path(
    put,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("message_id" = String, Path, description = "Message public identifier")
    ),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Message updated", body = MessageResponse),
        (status = 400, description = "Edit would leave the message empty", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Only the sender may edit", body = crate::error::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateMessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let origin = origin_connection_id(&headers);

    let message = state
        .message_service()
        .edit_message(&user, &message_id, request.text.as_deref(), origin.as_deref())
        .await?;
    Ok(Json(MessageResponse { message }))
}

// Delete a message; only the sender may do this
#[utoipa::path(
    delete,
    path = "/api/messages/{message_id}",
    tag = "Messages",
    security(("bearerAuth" = [])),
    params(
        ("message_id" = String, Path, description = "Message public identifier")
    ),
    responses(
        (status = 200, description = "Message deleted", body = DeleteMessageResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Only the sender may delete", body = crate::error::ErrorResponse),
        (status = 404, description = "Message not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DeleteMessageResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let origin = origin_connection_id(&headers);

    let deleted = state
        .message_service()
        .delete_message(&user, &message_id, origin.as_deref())
        .await?;
    Ok(Json(deleted))
}
