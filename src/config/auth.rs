//! Authentication configuration

use jsonwebtoken::Algorithm;
use serde::Deserialize;

use super::error::ValidationError;

/// JWT configuration, loaded from `JWT_SECRET_KEY` and `JWT_ALGORITHM`.
///
/// Tokens are issued by the external auth service and verified here with a
/// shared symmetric secret.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret shared with the auth service
    pub secret_key: String,

    /// JWT algorithm name (`HS256`, `HS384` or `HS512`)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl AuthConfig {
    /// Parse the configured algorithm into the `jsonwebtoken` type.
    pub fn jwt_algorithm(&self) -> Result<Algorithm, ValidationError> {
        match self.algorithm.as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            _ => Err(ValidationError::UnsupportedJwtAlgorithm),
        }
    }

    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("JWT_SECRET_KEY"));
        }
        self.jwt_algorithm()?;
        Ok(())
    }
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_algorithm(algorithm: &str) -> AuthConfig {
        AuthConfig {
            secret_key: "test-secret".to_string(),
            algorithm: algorithm.to_string(),
        }
    }

    #[test]
    fn hs256_is_supported() {
        let config = config_with_algorithm("HS256");
        assert_eq!(config.jwt_algorithm().unwrap(), Algorithm::HS256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn hs512_is_supported() {
        let config = config_with_algorithm("HS512");
        assert_eq!(config.jwt_algorithm().unwrap(), Algorithm::HS512);
    }

    #[test]
    fn asymmetric_algorithms_are_rejected() {
        let config = config_with_algorithm("RS256");
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = AuthConfig {
            secret_key: String::new(),
            algorithm: default_algorithm(),
        };
        assert!(config.validate().is_err());
    }
}
