//! Proposal header validation against a remote evaluation service.
//!
//! The draft file is posted as-is; the service answers with a verdict
//! and, when invalid, one issue per offending header field.

use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::config::ValidatorConfig;

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    interaction: &'a str,
    data: ExecuteData<'a>,
}

#[derive(Debug, Serialize)]
struct ExecuteData<'a> {
    hip_spec: &'a str,
    draft_hip: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    result: Verdict,
}

/// The service's answer for one file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub suggestion: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}. Suggestion: {}",
            self.field, self.issue, self.suggestion
        )
    }
}

pub struct Validator {
    client: reqwest::Client,
    endpoint: Url,
    interaction: String,
    hip_spec: String,
    token: String,
}

impl Validator {
    pub fn new(
        endpoint: &str,
        interaction: &str,
        hip_spec: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("validator endpoint is not a URL: {}", endpoint))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hip-search/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            interaction: interaction.to_string(),
            hip_spec: hip_spec.to_string(),
            token: token.to_string(),
        })
    }

    /// Build from config, reading the bearer token from the configured
    /// environment variable.
    pub fn from_config(config: &ValidatorConfig, timeout: Duration) -> Result<Self> {
        let token = std::env::var(&config.token_env).with_context(|| {
            format!(
                "{} is not set; export the validation service token",
                config.token_env
            )
        })?;
        if token.trim().is_empty() {
            bail!("{} is empty", config.token_env);
        }
        Self::new(
            &config.endpoint,
            &config.interaction,
            &config.hip_spec,
            token.trim(),
            timeout,
        )
    }

    pub async fn validate_file(&self, path: &Path) -> Result<Verdict> {
        let draft = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.validate_text(&draft).await
    }

    pub async fn validate_text(&self, draft: &str) -> Result<Verdict> {
        let body = ExecuteRequest {
            interaction: &self.interaction,
            data: ExecuteData {
                hip_spec: &self.hip_spec,
                draft_hip: draft,
            },
        };

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("API error {}: {}", status, text.trim());
        }

        let parsed: ExecuteResponse = resp
            .json()
            .await
            .context("Unexpected response from validation service")?;
        tracing::debug!(
            valid = parsed.result.is_valid,
            issues = parsed.result.issues.len(),
            "validation finished"
        );
        Ok(parsed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/execute/", addr)
    }

    async fn judge(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if auth != "Bearer secret" {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad token"})));
        }
        assert_eq!(body["interaction"], "Evaluate_HIP_Format");
        assert_eq!(body["data"]["hip_spec"], ".");

        let draft = body["data"]["draft_hip"].as_str().unwrap_or_default();
        let result = if draft.contains("title:") {
            json!({"is_valid": true})
        } else {
            json!({"is_valid": false, "issues": [
                {"field": "title", "issue": "missing", "suggestion": "add a title"}
            ]})
        };
        (StatusCode::OK, Json(json!({ "result": result })))
    }

    fn validator(endpoint: &str, token: &str, timeout: Duration) -> Validator {
        Validator::new(endpoint, "Evaluate_HIP_Format", ".", token, timeout).unwrap()
    }

    #[test]
    fn test_issue_display() {
        let issue = Issue {
            field: "status".to_string(),
            issue: "unknown value".to_string(),
            suggestion: "use Draft".to_string(),
        };
        assert_eq!(
            issue.to_string(),
            "status: unknown value. Suggestion: use Draft"
        );
    }

    #[tokio::test]
    async fn test_valid_and_invalid() {
        let endpoint = serve(Router::new().route("/execute/", post(judge))).await;
        let validator = validator(&endpoint, "secret", Duration::from_secs(5));

        let ok = validator.validate_text("---\ntitle: X\n---").await.unwrap();
        assert!(ok.is_valid);
        assert!(ok.issues.is_empty());

        let bad = validator.validate_text("---\n---").await.unwrap();
        assert!(!bad.is_valid);
        assert_eq!(bad.issues.len(), 1);
        assert_eq!(bad.issues[0].field, "title");
    }

    #[tokio::test]
    async fn test_api_error() {
        let endpoint = serve(Router::new().route("/execute/", post(judge))).await;
        let validator = validator(&endpoint, "wrong", Duration::from_secs(5));
        let err = validator.validate_text("x").await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_slow_service_times_out() {
        let slow = post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"result": {"is_valid": true}}))
        });
        let endpoint = serve(Router::new().route("/execute/", slow)).await;
        let validator = validator(&endpoint, "secret", Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = validator.validate_text("x").await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(err.to_string().contains("Failed to reach"));
    }

    #[tokio::test]
    async fn test_validate_file_reads_from_disk() {
        let endpoint = serve(Router::new().route("/execute/", post(judge))).await;
        let validator = validator(&endpoint, "secret", Duration::from_secs(5));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hip-1.md");
        std::fs::write(&path, "---\ntitle: X\n---\n").unwrap();
        assert!(validator.validate_file(&path).await.unwrap().is_valid);

        let err = validator
            .validate_file(&dir.path().join("absent.md"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("absent.md"));
    }

    #[test]
    fn test_missing_token_env() {
        let config = ValidatorConfig {
            token_env: "HIP_SEARCH_TEST_TOKEN_UNSET".to_string(),
            ..ValidatorConfig::default()
        };
        let err = Validator::from_config(&config, Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(err.to_string().contains("HIP_SEARCH_TEST_TOKEN_UNSET"));
    }
}
