use crate::api::{ApiMessage, ErrorBody};
use reqwest::StatusCode;
use thiserror::Error;

/// Error code the API returns for an invalid or expired credential.
pub const AUTHENTICATION_ERROR_CODE: i64 = 10001;
/// Error code the API returns when deleting a deployment that is still aliased.
pub const ALIASED_DEPLOYMENT_ERROR_CODE: i64 = 8000035;

/// What a request was addressing, used to phrase "not found" hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Project {
        account_id: String,
        project_name: String,
    },
    Deployment {
        project_name: String,
        deployment_id: String,
    },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed ({status}): {body}")]
    Authentication { status: StatusCode, body: String },

    #[error("permission denied ({status}): {body}")]
    PermissionDenied { status: StatusCode, body: String },

    #[error("not found ({status}): {body}")]
    NotFound {
        status: StatusCode,
        body: String,
        resource: Resource,
    },

    #[error("rate limited ({status}): {body}")]
    RateLimited { status: StatusCode, body: String },

    #[error("aliased deployment cannot be deleted ({status}): {body}")]
    AliasedDeployment {
        status: StatusCode,
        body: String,
        forced: bool,
    },

    #[error("request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("invalid JSON in API response: {body}")]
    InvalidJson {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API returned unsuccessful response: {}", join_messages(.errors))]
    Unsuccessful { errors: Vec<ApiMessage> },

    #[error("API base URL cannot be extended with a path: {0}")]
    InvalidBaseUrl(String),

    #[error("network error when contacting Cloudflare API: {0}")]
    Network(#[from] reqwest::Error),
}

fn join_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_error(errors: &[ApiMessage], code: i64, needle: &str) -> bool {
    errors
        .iter()
        .any(|e| e.code == code && e.message.to_lowercase().contains(needle))
}

impl ApiError {
    /// Classify a non-success HTTP response.
    ///
    /// The aliased-deployment code wins over any status mapping, since the API
    /// reports it as a plain 400.
    pub fn from_response(
        status: StatusCode,
        body: String,
        resource: Resource,
        forced: bool,
    ) -> Self {
        let errors = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.errors)
            .unwrap_or_default();

        if has_error(&errors, ALIASED_DEPLOYMENT_ERROR_CODE, "aliased deployment") {
            return Self::AliasedDeployment {
                status,
                body,
                forced,
            };
        }

        match status {
            StatusCode::BAD_REQUEST
                if has_error(&errors, AUTHENTICATION_ERROR_CODE, "authenticate") =>
            {
                Self::Authentication { status, body }
            }
            StatusCode::FORBIDDEN => Self::PermissionDenied { status, body },
            StatusCode::NOT_FOUND => Self::NotFound {
                status,
                body,
                resource,
            },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { status, body },
            _ => Self::Status { status, body },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Authentication { status, .. }
            | Self::PermissionDenied { status, .. }
            | Self::NotFound { status, .. }
            | Self::RateLimited { status, .. }
            | Self::AliasedDeployment { status, .. }
            | Self::Status { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            Self::InvalidJson { .. } | Self::Unsuccessful { .. } | Self::InvalidBaseUrl(_) => None,
        }
    }

    /// Remediation text for failures the user can act on.
    pub fn hint(&self) -> Option<String> {
        let hint = match self {
            Self::Authentication { .. } => [
                "Authentication Error: Your API token or key may be invalid or expired.",
                "Please check that:",
                "1. Your API token is correct and has not expired",
                "2. The token has the necessary permissions (Pages:Read and Pages:Edit)",
                "3. There are no extra spaces or characters in your token",
                "4. Your account ID is correct",
            ]
            .join("\n"),
            Self::PermissionDenied { .. } => [
                "Permission Error: Your API token does not have permission to access this resource.",
                "Please ensure your token has the Pages:Read and Pages:Edit permissions.",
            ]
            .join("\n"),
            Self::NotFound { resource, .. } => match resource {
                Resource::Project {
                    account_id,
                    project_name,
                } => format!(
                    "Not Found Error: The project '{project_name}' was not found in account '{account_id}'.\n\
                     Please check that both the project name and account ID are correct."
                ),
                Resource::Deployment {
                    project_name,
                    deployment_id,
                } => format!(
                    "Not Found Error: Deployment '{deployment_id}' was not found in project '{project_name}'.\n\
                     It may already have been deleted."
                ),
            },
            Self::RateLimited { .. } => [
                "Rate Limit Error: You've exceeded Cloudflare's API rate limits.",
                "Please wait a few minutes before trying again or reduce the frequency of requests.",
            ]
            .join("\n"),
            Self::AliasedDeployment { forced: false, .. } => [
                "This is an aliased deployment (likely the production deployment).",
                "To delete it, rerun with the --force flag.",
            ]
            .join("\n"),
            Self::AliasedDeployment { forced: true, .. } => [
                "Failed to delete even with force flag. This might be the active production deployment.",
                "You may need to make another deployment the production deployment first.",
            ]
            .join("\n"),
            _ => return None,
        };
        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> Resource {
        Resource::Project {
            account_id: "acc".to_string(),
            project_name: "site".to_string(),
        }
    }

    #[test]
    fn test_authentication_requires_code_and_message() {
        let body = json!({
            "success": false,
            "errors": [{ "code": 10001, "message": "Unable to authenticate request" }]
        })
        .to_string();
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body, project(), false);
        assert!(matches!(err, ApiError::Authentication { .. }));
        assert!(err.hint().unwrap().contains("Pages:Read and Pages:Edit"));

        let body = json!({
            "success": false,
            "errors": [{ "code": 1000, "message": "Bad input" }]
        })
        .to_string();
        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body, project(), false);
        assert!(matches!(err, ApiError::Status { .. }));
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (StatusCode::FORBIDDEN, "Permission Error"),
            (StatusCode::NOT_FOUND, "project 'site' was not found in account 'acc'"),
            (StatusCode::TOO_MANY_REQUESTS, "Rate Limit Error"),
        ];

        for (status, expected) in cases {
            let err = ApiError::from_response(status, "{}".to_string(), project(), false);
            assert_eq!(err.status(), Some(status));
            let hint = err.hint().unwrap();
            assert!(hint.contains(expected), "{status}: {hint}");
        }
    }

    #[test]
    fn test_aliased_deployment_hint_depends_on_force() {
        let body = json!({
            "success": false,
            "errors": [{ "code": 8000035, "message": "Cannot delete aliased deployment" }]
        })
        .to_string();

        let err =
            ApiError::from_response(StatusCode::BAD_REQUEST, body.clone(), project(), false);
        assert!(matches!(err, ApiError::AliasedDeployment { forced: false, .. }));
        assert!(err.hint().unwrap().contains("--force"));

        let err = ApiError::from_response(StatusCode::BAD_REQUEST, body, project(), true);
        assert!(err.hint().unwrap().contains("even with force"));
    }

    #[test]
    fn test_non_json_body_falls_back_to_status() {
        let err = ApiError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>oops</html>".to_string(),
            project(),
            false,
        );
        assert!(matches!(err, ApiError::Status { .. }));
        assert!(err.to_string().contains("<html>oops</html>"));
    }

    #[test]
    fn test_deployment_not_found_hint() {
        let resource = Resource::Deployment {
            project_name: "site".to_string(),
            deployment_id: "dep1".to_string(),
        };
        let err = ApiError::from_response(StatusCode::NOT_FOUND, String::new(), resource, false);
        assert!(err.hint().unwrap().contains("Deployment 'dep1'"));
    }

    #[test]
    fn test_unsuccessful_lists_errors() {
        let err = ApiError::Unsuccessful {
            errors: vec![ApiMessage {
                code: 7003,
                message: "Could not route".to_string(),
            }],
        };
        assert_eq!(
            err.to_string(),
            "API returned unsuccessful response: [7003] Could not route"
        );
    }
}
