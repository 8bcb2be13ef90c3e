//! Azure provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Missing environment variable '{0}'")]
    MissingEnvVar(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Azure API error (HTTP {status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Operation {status}: {code}: {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    CloudError(#[from] vmflow_cloud::CloudError),
}

impl AzureError {
    /// Build an API error from a failed ARM response body
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Envelope {
            error: Option<ErrorDetail>,
        }

        match serde_json::from_str::<Envelope>(body) {
            Ok(Envelope {
                error: Some(detail),
            }) => AzureError::Api {
                status,
                code: detail.code,
                message: detail.message,
            },
            _ => AzureError::Api {
                status,
                code: "Unknown".to_string(),
                message: if body.trim().is_empty() {
                    "empty response body".to_string()
                } else {
                    body.trim().to_string()
                },
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AzureError::Api { status: 404, .. })
    }
}

/// `error` object shared by ARM error bodies and operation status documents
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl From<AzureError> for vmflow_cloud::CloudError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::MissingEnvVar(_) | AzureError::AuthenticationFailed(_) => {
                vmflow_cloud::CloudError::AuthenticationFailed(err.to_string())
            }
            AzureError::Api { status: 404, .. } => {
                vmflow_cloud::CloudError::ResourceNotFound(err.to_string())
            }
            AzureError::Timeout(what) => vmflow_cloud::CloudError::Timeout(what),
            AzureError::CloudError(inner) => inner,
            other => vmflow_cloud::CloudError::ApiError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AzureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arm_error_body() {
        let body = r#"{"error":{"code":"ResourceGroupNotFound","message":"Resource group 'x' could not be found."}}"#;
        let err = AzureError::from_response(404, body);

        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Azure API error (HTTP 404): ResourceGroupNotFound: Resource group 'x' could not be found."
        );
    }

    #[test]
    fn test_from_unstructured_body() {
        let err = AzureError::from_response(502, "Bad Gateway\n");
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Azure API error (HTTP 502): Unknown: Bad Gateway");

        let empty = AzureError::from_response(500, "");
        assert!(empty.to_string().ends_with("empty response body"));
    }

    #[test]
    fn test_into_cloud_error() {
        let not_found: vmflow_cloud::CloudError = AzureError::from_response(404, "").into();
        assert!(matches!(
            not_found,
            vmflow_cloud::CloudError::ResourceNotFound(_)
        ));

        let auth: vmflow_cloud::CloudError =
            AzureError::MissingEnvVar("AZURE_TENANT_ID".to_string()).into();
        assert!(matches!(
            auth,
            vmflow_cloud::CloudError::AuthenticationFailed(_)
        ));
    }
}
