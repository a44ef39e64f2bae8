//! Issue detail orchestration.
//!
//! An `IssueView` owns the snapshot of one issue plus its comments and
//! feedback for as long as the view is open. Every mutation is followed by a
//! full reload, so what the view holds is always what the server last said.
//! All requests are scoped to the view: once it is closed, outstanding
//! responses are dropped instead of applied.

use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::{self, ReanalysisHandle};
use crate::api::ApiGateway;
use crate::error::{ClientError, Result};
use crate::gate::Route;
use crate::models::{Comment, Feedback, Issue, IssueUpdate, NewFeedback};
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq)]
pub struct IssueSnapshot {
    pub issue: Issue,
    pub comments: Vec<Comment>,
    pub feedback: Vec<Feedback>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready(IssueSnapshot),
    /// The last load failed as a whole; nothing partial is kept.
    Failed(String),
    Deleted,
}

/// Which form is open. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialog {
    #[default]
    None,
    Updating,
    Commenting,
    GivingFeedback,
}

/// Input of the feedback form before validation.
#[derive(Debug, Clone, Default)]
pub struct FeedbackForm {
    pub rating: Option<u8>,
    pub is_satisfied: bool,
    pub content: Option<String>,
    pub improvement_suggestions: Option<String>,
}

/// Proof that the user confirmed deleting one specific issue. Single use.
#[derive(Debug)]
pub struct DeleteConfirmation {
    issue_id: i64,
}

/// Closes a view from outside, e.g. on navigation or Ctrl-C.
#[derive(Debug, Clone)]
pub struct ViewCloser(CancellationToken);

impl ViewCloser {
    pub fn close(&self) {
        self.0.cancel();
    }
}

pub struct IssueView {
    issue_id: i64,
    gateway: Arc<dyn ApiGateway>,
    scope: CancellationToken,
    state: ViewState,
    dialog: Dialog,
}

impl IssueView {
    pub fn open(session: &SessionStore, issue_id: i64) -> Self {
        IssueView {
            issue_id,
            gateway: session.gateway(),
            scope: CancellationToken::new(),
            state: ViewState::Loading,
            dialog: Dialog::None,
        }
    }

    pub fn issue_id(&self) -> i64 {
        self.issue_id
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn snapshot(&self) -> Option<&IssueSnapshot> {
        match &self.state {
            ViewState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn dialog(&self) -> Dialog {
        self.dialog
    }

    pub fn open_dialog(&mut self, dialog: Dialog) {
        self.dialog = dialog;
    }

    pub fn closer(&self) -> ViewCloser {
        ViewCloser(self.scope.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    pub fn close(&mut self) {
        self.scope.cancel();
        self.dialog = Dialog::None;
    }

    async fn scoped<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.scope.cancelled() => Err(ClientError::Cancelled),
            result = fut => result,
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Cancelled);
        }
        if self.state == ViewState::Deleted {
            return Err(ClientError::NotFound(format!(
                "Issue #{} was deleted",
                self.issue_id
            )));
        }
        Ok(())
    }

    /// Fetch the issue, its comments and its feedback. All three or nothing.
    pub async fn load(&mut self, session: &mut SessionStore) -> Result<&IssueSnapshot> {
        self.ensure_live()?;
        let token = session.bearer()?;
        let id = self.issue_id;
        let gw = &self.gateway;

        let fetched = self
            .scoped(async {
                tokio::try_join!(
                    gw.get_issue(&token, id),
                    gw.list_comments(&token, id),
                    gw.list_feedback(&token, id),
                )
            })
            .await;

        match session.observe(fetched) {
            Ok((issue, comments, feedback)) => {
                debug!(issue = id, comments = comments.len(), feedback = feedback.len(), "issue loaded");
                self.state = ViewState::Ready(IssueSnapshot {
                    issue,
                    comments,
                    feedback,
                });
                match &self.state {
                    ViewState::Ready(snapshot) => Ok(snapshot),
                    _ => unreachable!("state was just set to Ready"),
                }
            }
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(e) => {
                warn!(issue = id, error = %e, "failed to load issue");
                self.state = ViewState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Send a mutation, then reconcile. A failed mutation leaves the view as
    /// it was and keeps the dialog open. Once the server has accepted the
    /// mutation it is reported as done even if the reload fails; the view is
    /// then `Failed` until the next successful `load`.
    async fn mutate<T>(
        &mut self,
        session: &mut SessionStore,
        what: &'static str,
        outcome: Result<T>,
    ) -> Result<()> {
        match session.observe(outcome) {
            Ok(_) => {
                info!(issue = self.issue_id, "{} succeeded", what);
                self.dialog = Dialog::None;
                if let Err(e) = self.load(session).await {
                    debug!(issue = self.issue_id, error = %e, "reload after {} failed", what);
                }
                Ok(())
            }
            Err(ClientError::Cancelled) => Err(ClientError::Cancelled),
            Err(e) => {
                warn!(issue = self.issue_id, error = %e, "{} failed", what);
                Err(e)
            }
        }
    }

    pub async fn update(&mut self, session: &mut SessionStore, update: IssueUpdate) -> Result<()> {
        self.ensure_live()?;
        if update.is_empty() {
            return Err(ClientError::validation(
                "Nothing to update. Set at least one field",
            ));
        }
        let token = session.bearer()?;
        let outcome = self
            .scoped(self.gateway.update_issue(&token, self.issue_id, &update))
            .await;
        self.mutate(session, "update", outcome).await
    }

    pub async fn add_comment(&mut self, session: &mut SessionStore, content: &str) -> Result<()> {
        self.ensure_live()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::validation("Comment content is required"));
        }
        let token = session.bearer()?;
        let outcome = self
            .scoped(self.gateway.add_comment(&token, self.issue_id, content))
            .await;
        self.mutate(session, "comment", outcome).await
    }

    pub async fn add_feedback(&mut self, session: &mut SessionStore, form: FeedbackForm) -> Result<()> {
        self.ensure_live()?;
        let rating = form
            .rating
            .ok_or_else(|| ClientError::validation("Rating is required"))?;
        if !(1..=5).contains(&rating) {
            return Err(ClientError::validation(format!(
                "Rating must be between 1 and 5, got {}",
                rating
            )));
        }
        let feedback = NewFeedback {
            issue_id: self.issue_id,
            rating,
            is_satisfied: form.is_satisfied,
            content: non_blank(form.content),
            improvement_suggestions: non_blank(form.improvement_suggestions),
        };
        let token = session.bearer()?;
        let outcome = self
            .scoped(self.gateway.add_feedback(&token, &feedback))
            .await;
        self.mutate(session, "feedback", outcome).await
    }

    /// Record the user's intent to delete this issue. Call right before
    /// `delete`, after the user answered the prompt.
    pub fn confirm_delete(&self) -> DeleteConfirmation {
        DeleteConfirmation {
            issue_id: self.issue_id,
        }
    }

    /// Delete the issue. On success the view is finished and the caller
    /// should move to the returned route; no reload is attempted.
    pub async fn delete(
        &mut self,
        session: &mut SessionStore,
        confirmation: DeleteConfirmation,
    ) -> Result<Route> {
        self.ensure_live()?;
        if confirmation.issue_id != self.issue_id {
            return Err(ClientError::validation(format!(
                "Confirmation was given for issue #{}, not #{}",
                confirmation.issue_id, self.issue_id
            )));
        }
        let token = session.bearer()?;
        let outcome = self
            .scoped(self.gateway.delete_issue(&token, self.issue_id))
            .await;
        match session.observe(outcome) {
            Ok(()) => {
                info!(issue = self.issue_id, "issue deleted");
                self.state = ViewState::Deleted;
                self.dialog = Dialog::None;
                Ok(Route::Issues)
            }
            Err(e) => {
                if !matches!(e, ClientError::Cancelled) {
                    warn!(issue = self.issue_id, error = %e, "delete failed");
                }
                Err(e)
            }
        }
    }

    /// Ask the backend to recompute the AI fields. Returns at once; the new
    /// values show up on the next `load`.
    pub fn request_reanalysis(&self, session: &SessionStore) -> Result<ReanalysisHandle> {
        self.ensure_live()?;
        let token = session.bearer()?;
        Ok(ai::spawn_reanalysis(
            Arc::clone(&self.gateway),
            token,
            self.issue_id,
            self.scope.child_token(),
        ))
    }
}

impl Drop for IssueView {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
