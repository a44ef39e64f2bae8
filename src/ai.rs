//! AI augmentation side channel.
//!
//! Both calls are advisory. A suggestion only pre-fills a draft; a
//! re-analysis only changes what the next load of the issue returns.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiGateway;
use crate::error::{ClientError, Result};
use crate::models::{AiSuggestion, IssueDraft, SummarizeRequest};
use crate::session::SessionStore;

pub const SUMMARY_MAX_LENGTH: u32 = 200;

/// Ask for a category and tags for a draft that has not been filed yet.
pub async fn request_suggestion(
    session: &mut SessionStore,
    title: &str,
    description: &str,
) -> Result<AiSuggestion> {
    let (title, description) = (title.trim(), description.trim());
    if title.is_empty() || description.is_empty() {
        return Err(ClientError::validation(
            "Fill in the title and description first",
        ));
    }

    let token = session.bearer()?;
    let request = SummarizeRequest {
        text: format!("{}\n\n{}", title, description),
        max_length: SUMMARY_MAX_LENGTH,
    };
    let outcome = session.gateway().summarize(&token, &request).await;
    match session.observe(outcome) {
        Ok(suggestion) => {
            debug!(
                category = ?suggestion.category_suggestion,
                tags = suggestion.tags.len(),
                "ai suggestion received"
            );
            Ok(suggestion)
        }
        Err(e) => {
            warn!(error = %e, "ai suggestion failed");
            Err(e)
        }
    }
}

/// Pre-fill the draft's category from a suggestion. Returns whether the
/// draft changed. The draft stays editable and is never submitted here.
pub fn apply_suggestion(draft: &mut IssueDraft, suggestion: &AiSuggestion) -> bool {
    match suggestion.category() {
        Some(category) if category != draft.category => {
            draft.category = category;
            true
        }
        _ => false,
    }
}

/// A re-analysis running in the background.
pub struct ReanalysisHandle {
    issue_id: i64,
    task: JoinHandle<Result<()>>,
}

impl ReanalysisHandle {
    pub fn issue_id(&self) -> i64 {
        self.issue_id
    }

    /// Wait for the backend to accept the request. Optional.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Cancelled),
            Err(e) => Err(ClientError::Transport(format!("re-analysis task failed: {}", e))),
        }
    }
}

pub(crate) fn spawn_reanalysis(
    gateway: Arc<dyn ApiGateway>,
    token: String,
    issue_id: i64,
    scope: CancellationToken,
) -> ReanalysisHandle {
    let task = tokio::spawn(async move {
        let outcome = tokio::select! {
            biased;
            _ = scope.cancelled() => Err(ClientError::Cancelled),
            result = gateway.analyze_issue(&token, issue_id) => result,
        };
        match &outcome {
            Ok(()) => info!(issue = issue_id, "re-analysis requested"),
            Err(ClientError::Cancelled) => debug!(issue = issue_id, "re-analysis dropped with its view"),
            Err(e) => warn!(issue = issue_id, error = %e, "re-analysis failed"),
        }
        outcome
    });
    ReanalysisHandle { issue_id, task }
}
