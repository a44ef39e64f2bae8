//! REST gateway to the issue-tracking backend.
//!
//! `ApiGateway` is the seam between the session/workflow layer and the wire.
//! `HttpGateway` is the production implementation; tests use an in-memory
//! double.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::{
    AiSuggestion, Comment, Feedback, Issue, IssueDraft, IssueFilter, IssueUpdate, NewFeedback,
    StatsSummary, SummarizeRequest, TokenResponse, User,
};

#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse>;
    async fn current_user(&self, token: &str) -> Result<User>;

    async fn list_issues(&self, token: &str, filter: &IssueFilter) -> Result<Vec<Issue>>;
    async fn create_issue(&self, token: &str, draft: &IssueDraft) -> Result<Issue>;
    async fn get_issue(&self, token: &str, id: i64) -> Result<Issue>;
    async fn update_issue(&self, token: &str, id: i64, update: &IssueUpdate) -> Result<Issue>;
    async fn delete_issue(&self, token: &str, id: i64) -> Result<()>;

    async fn list_comments(&self, token: &str, issue_id: i64) -> Result<Vec<Comment>>;
    async fn add_comment(&self, token: &str, issue_id: i64, content: &str) -> Result<Comment>;
    async fn list_feedback(&self, token: &str, issue_id: i64) -> Result<Vec<Feedback>>;
    async fn add_feedback(&self, token: &str, feedback: &NewFeedback) -> Result<Feedback>;

    async fn summarize(&self, token: &str, request: &SummarizeRequest) -> Result<AiSuggestion>;
    async fn analyze_issue(&self, token: &str, issue_id: i64) -> Result<()>;

    async fn stats_summary(&self, token: &str) -> Result<StatsSummary>;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("issuedesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(HttpGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let builder = self.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success status into the matching `ClientError`, keeping the
    /// backend's `detail` message when it sent one.
    async fn check(path: &str, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });
        Err(ClientError::from_status(status.as_u16(), detail, path))
    }

    async fn send_json<T: DeserializeOwned>(path: &str, builder: RequestBuilder) -> Result<T> {
        let resp = Self::check(path, builder.send().await?).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to parse response from {}: {}", path, e)))
    }

    async fn send_empty(path: &str, builder: RequestBuilder) -> Result<()> {
        Self::check(path, builder.send().await?).await?;
        Ok(())
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let path = "/auth/login";
        let builder = self
            .request(Method::POST, path, None)
            .form(&[("username", username), ("password", password)]);
        Self::send_json(path, builder).await
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        let path = "/users/me";
        Self::send_json(path, self.request(Method::GET, path, Some(token))).await
    }

    async fn list_issues(&self, token: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let path = "/issues";
        let builder = self.request(Method::GET, path, Some(token)).query(filter);
        Self::send_json(path, builder).await
    }

    async fn create_issue(&self, token: &str, draft: &IssueDraft) -> Result<Issue> {
        let path = "/issues";
        let builder = self.request(Method::POST, path, Some(token)).json(draft);
        Self::send_json(path, builder).await
    }

    async fn get_issue(&self, token: &str, id: i64) -> Result<Issue> {
        let path = format!("/issues/{}", id);
        Self::send_json(&path, self.request(Method::GET, &path, Some(token))).await
    }

    async fn update_issue(&self, token: &str, id: i64, update: &IssueUpdate) -> Result<Issue> {
        let path = format!("/issues/{}", id);
        let builder = self.request(Method::PUT, &path, Some(token)).json(update);
        Self::send_json(&path, builder).await
    }

    async fn delete_issue(&self, token: &str, id: i64) -> Result<()> {
        let path = format!("/issues/{}", id);
        Self::send_empty(&path, self.request(Method::DELETE, &path, Some(token))).await
    }

    async fn list_comments(&self, token: &str, issue_id: i64) -> Result<Vec<Comment>> {
        let path = format!("/issues/{}/comments", issue_id);
        Self::send_json(&path, self.request(Method::GET, &path, Some(token))).await
    }

    async fn add_comment(&self, token: &str, issue_id: i64, content: &str) -> Result<Comment> {
        let path = format!("/issues/{}/comments", issue_id);
        let builder = self
            .request(Method::POST, &path, Some(token))
            .query(&[("content", content)]);
        Self::send_json(&path, builder).await
    }

    async fn list_feedback(&self, token: &str, issue_id: i64) -> Result<Vec<Feedback>> {
        let path = format!("/issues/{}/feedbacks", issue_id);
        Self::send_json(&path, self.request(Method::GET, &path, Some(token))).await
    }

    async fn add_feedback(&self, token: &str, feedback: &NewFeedback) -> Result<Feedback> {
        let path = "/issues/feedbacks";
        let builder = self.request(Method::POST, path, Some(token)).json(feedback);
        Self::send_json(path, builder).await
    }

    async fn summarize(&self, token: &str, request: &SummarizeRequest) -> Result<AiSuggestion> {
        let path = "/ai/summarize";
        let builder = self.request(Method::POST, path, Some(token)).json(request);
        Self::send_json(path, builder).await
    }

    async fn analyze_issue(&self, token: &str, issue_id: i64) -> Result<()> {
        // The response body is ignored; results surface on the next load.
        let path = format!("/ai/analyze/{}", issue_id);
        Self::send_empty(&path, self.request(Method::POST, &path, Some(token))).await
    }

    async fn stats_summary(&self, token: &str) -> Result<StatsSummary> {
        let path = "/issues/stats/summary";
        Self::send_json(path, self.request(Method::GET, path, Some(token))).await
    }
}
