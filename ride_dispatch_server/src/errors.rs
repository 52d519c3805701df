use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use ride_dispatch_engine::{AccountApiError, DispatchApiError, PaymentGatewayError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    InvalidRequestBody(String),
    #[error("Access token invalid or not provided")]
    Unauthenticated,
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("not assigned to this ride")]
    AssignmentMismatch,
    #[error("The payment gateway failed. {0}")]
    UpstreamGatewayFailure(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) => StatusCode::BAD_REQUEST,
            Self::AssignmentMismatch => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UpstreamGatewayFailure(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "message": self.to_string() }).to_string())
    }
}

impl From<DispatchApiError> for ServerError {
    fn from(e: DispatchApiError) -> Self {
        match e {
            DispatchApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            DispatchApiError::RideNotFound(_) => Self::NoRecordFound("ride not found".to_string()),
            DispatchApiError::ChairNotFound(_) => Self::NoRecordFound("chair not found".to_string()),
            DispatchApiError::RideInProgress => Self::Conflict("ride already exists".to_string()),
            DispatchApiError::InvalidTransition(m) => Self::InvalidTransition(m),
            DispatchApiError::AssignmentMismatch(_, _) => Self::AssignmentMismatch,
            DispatchApiError::EvaluationOutOfRange => {
                Self::InvalidRequestBody("evaluation must be between 1 and 5".to_string())
            },
            DispatchApiError::PaymentTokenMissing => {
                Self::InvalidRequestBody("payment token not registered".to_string())
            },
            DispatchApiError::GatewayNotConfigured => {
                Self::BackendError("payment gateway URL is not configured".to_string())
            },
            DispatchApiError::Gateway(PaymentGatewayError::ChargeRejected(m)) => Self::UpstreamGatewayFailure(m),
            DispatchApiError::Gateway(PaymentGatewayError::Transport(m)) => {
                Self::BackendError(format!("payment gateway unreachable: {m}"))
            },
            DispatchApiError::AccountError(e) => e.into(),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AccountApiError::InvalidInvitation => Self::Conflict("This invitation code cannot be used.".to_string()),
            AccountApiError::InvalidChairRegisterToken => Self::Unauthenticated,
            AccountApiError::NotFound(m) => Self::NoRecordFound(m),
        }
    }
}
