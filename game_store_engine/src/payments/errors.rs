use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("Could not reach the payment provider: {0}")]
    Transport(String),
    #[error("The payment provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("The payment provider sent an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Payment gateway is misconfigured: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PaymentGatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PaymentGatewayError::InvalidResponse(e.to_string())
        } else {
            PaymentGatewayError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No signature was provided")]
    Missing,
    #[error("The signature is malformed: {0}")]
    Malformed(String),
    #[error("The signature does not match the payload")]
    Invalid,
    #[error("The signature timestamp is outside the tolerance window ({age}s old)")]
    Expired { age: i64 },
}
