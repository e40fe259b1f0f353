use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use game_store_engine::{
    payments::PaymentGatewayError,
    OrderFlowError,
    ReviewError,
    StoreError,
    WebhookError,
};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Invalid payment notification. {0}")]
    InvalidNotification(String),
    #[error("The payment provider could not be reached. {0}")]
    PaymentProviderError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::InvalidNotification(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentProviderError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("💻️ Request failed with an internal error. {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("The access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("The access token is invalid. {0}")]
    ValidationError(String),
}

impl From<StoreError> for ServerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => Self::NoRecordFound(format!("Order {id} does not exist")),
            StoreError::GameNotFound(id) => Self::NoRecordFound(format!("Game {id} does not exist")),
            StoreError::DuplicateReview(_) => Self::Conflict(e.to_string()),
            StoreError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::Configuration(_) => Self::ConfigurationError(e.to_string()),
            e => Self::PaymentProviderError(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::ValidationError(_) => Self::ValidationError(e.to_string()),
            OrderFlowError::GameNotFound(_) | OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InsufficientStock { .. } => Self::Conflict(e.to_string()),
            OrderFlowError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            OrderFlowError::PaymentProvider(e) => e.into(),
            OrderFlowError::StoreError(e) => e.into(),
        }
    }
}

impl From<WebhookError> for ServerError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::MalformedPayload(_) | WebhookError::InvalidSignature(_) => {
                Self::InvalidNotification(e.to_string())
            },
            WebhookError::StoreError(e) => e.into(),
        }
    }
}

impl From<ReviewError> for ServerError {
    fn from(e: ReviewError) -> Self {
        match e {
            ReviewError::ValidationError(_) => Self::ValidationError(e.to_string()),
            ReviewError::GameNotFound(_) | ReviewError::ReviewNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReviewError::DuplicateReview(_) => Self::Conflict(e.to_string()),
            ReviewError::StoreError(e) => e.into(),
        }
    }
}
