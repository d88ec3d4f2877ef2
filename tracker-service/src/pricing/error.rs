use service_core::error::AppError;
use thiserror::Error;

/// Failures while resolving a model's rates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// No provider catalog lists the model.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The (given or derived) provider does not list the exact model key.
    #[error("Invalid model {model} for provider {provider}")]
    InvalidModelForProvider { model: String, provider: String },
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::InvalidModel(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_pricing_errors_are_client_errors() {
        let err: AppError = PricingError::UnknownModel("llama-3".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "invalid_model");
        assert_eq!(err.to_string(), "Invalid model or provider: Unknown model: llama-3");
    }
}
