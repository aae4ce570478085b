//! Wire types for the Cloudflare v4 Pages deployment endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment environment used to filter list requests.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Preview,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard response envelope wrapping every v4 API result.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    pub result_info: Option<ResultInfo>,
}

/// Only the `errors` array of an error body, for classifying failures.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultInfo {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub count: Option<u32>,
    pub total_count: Option<u64>,
    pub total_pages: Option<u32>,
}

impl ResultInfo {
    /// Page count reported by the API; a missing value means a single page.
    pub fn total_pages(&self) -> u32 {
        self.total_pages.unwrap_or(1)
    }
}

/// One page of deployments plus its pagination info.
#[derive(Debug, Clone)]
pub struct DeploymentPage {
    pub deployments: Vec<Deployment>,
    pub result_info: Option<ResultInfo>,
}

impl DeploymentPage {
    pub fn total_pages(&self) -> u32 {
        self.result_info
            .as_ref()
            .map(ResultInfo::total_pages)
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_trigger: Option<DeploymentTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_stage: Option<Stage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTrigger {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TriggerMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Deployment {
    pub fn branch(&self) -> Option<&str> {
        self.deployment_trigger
            .as_ref()
            .and_then(|t| t.metadata.as_ref())
            .and_then(|m| m.branch.as_deref())
    }

    /// Status of the most recent build stage, e.g. `success` or `failure`.
    pub fn status(&self) -> Option<&str> {
        self.latest_stage.as_ref().and_then(|s| s.status.as_deref())
    }

    /// Aliased deployments are the ones currently serving a live hostname.
    pub fn is_aliased(&self) -> bool {
        self.aliases.as_ref().is_some_and(|a| !a.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deployment_ignores_unknown_fields() {
        let deployment: Deployment = serde_json::from_value(json!({
            "id": "deployment1",
            "name": "Test Deployment 1",
            "project_name": "test-project"
        }))
        .unwrap();

        assert_eq!(deployment.id, "deployment1");
        assert!(deployment.environment.is_none());
        assert!(!deployment.is_aliased());
    }

    #[test]
    fn test_deployment_accessors() {
        let deployment: Deployment = serde_json::from_value(json!({
            "id": "abc123",
            "environment": "production",
            "aliases": ["https://example.pages.dev"],
            "deployment_trigger": {
                "type": "ad_hoc",
                "metadata": { "branch": "main", "commit_hash": "deadbeef" }
            },
            "latest_stage": { "name": "deploy", "status": "success" }
        }))
        .unwrap();

        assert_eq!(deployment.branch(), Some("main"));
        assert_eq!(deployment.status(), Some("success"));
        assert!(deployment.is_aliased());
    }

    #[test]
    fn test_null_aliases_are_not_aliased() {
        let deployment: Deployment =
            serde_json::from_value(json!({ "id": "abc", "aliases": null })).unwrap();
        assert!(!deployment.is_aliased());
    }

    #[test]
    fn test_missing_total_pages_means_single_page() {
        let envelope: Envelope<Vec<Deployment>> = serde_json::from_value(json!({
            "success": true,
            "result": [],
            "result_info": { "page": 1 }
        }))
        .unwrap();

        assert_eq!(envelope.result_info.unwrap().total_pages(), 1);
    }
}
