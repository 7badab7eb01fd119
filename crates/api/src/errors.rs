use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dnspulse_domain::DomainError;
use tracing::error;

pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("internal error: {}\n", self.0),
        )
            .into_response()
    }
}
