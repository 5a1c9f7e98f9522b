#[derive(Debug)]
pub enum ServiceError {
    Validation(String),
    NotFound,
    Forbidden,
    Attachment(String),
    Conflict(String),
    Store(sqlx::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn attachment(msg: impl Into<String>) -> Self {
        Self::Attachment(msg.into())
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(err)
    }
}

impl From<ServiceError> for crate::ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => crate::ApiError::bad_request(msg),
            ServiceError::NotFound => crate::ApiError::not_found("Resource not found"),
            ServiceError::Forbidden => crate::ApiError::forbidden("Access denied"),
            ServiceError::Attachment(msg) => {
                tracing::error!("attachment upload failed: {}", msg);
                crate::ApiError::bad_gateway("Attachment upload failed")
            }
            ServiceError::Conflict(msg) => crate::ApiError::conflict(msg),
            ServiceError::Store(db_err) => {
                tracing::error!("storage error: {}", db_err);
                crate::ApiError::internal_server_error("Storage operation failed")
            }
        }
    }
}
