pub mod auth;
pub mod comment;
pub mod create;
pub mod dashboard;
pub mod delete;
pub mod feedback;
pub mod list;
pub mod reanalyze;
pub mod show;
pub mod status;
pub mod update;

use anyhow::{bail, Result};
use std::io;

use crate::gate::{self, GateDecision, Route};
use crate::session::SessionStore;
use crate::workflow::{IssueView, ViewState};

/// Pass the auth gate for `route` or explain why not.
pub async fn enter(session: &mut SessionStore, route: Route) -> Result<()> {
    match gate::enter(session, route).await {
        GateDecision::Proceed(_) => Ok(()),
        GateDecision::Redirect { to: Route::Login, notice } => bail!(
            "{}. Run 'issuedesk login <username>'.",
            notice.unwrap_or("Not logged in")
        ),
        GateDecision::Redirect { to, .. } => bail!("Redirected to {}", to),
        GateDecision::Suspend => bail!("Session could not be resolved"),
    }
}

/// Gate, then open and load the detail view of one issue.
pub async fn open_issue(session: &mut SessionStore, id: i64) -> Result<IssueView> {
    enter(session, Route::IssueDetail(id)).await?;
    let mut view = IssueView::open(session, id);
    view.load(session).await?;
    Ok(view)
}

/// Read one line from stdin on the blocking pool so the runtime keeps
/// polling, and Ctrl-C can cancel a command waiting at a prompt.
pub(crate) async fn read_stdin_line() -> Result<String> {
    read_line_with(|buf| io::stdin().read_line(buf)).await
}

async fn read_line_with<F>(read: F) -> Result<String>
where
    F: FnOnce(&mut String) -> io::Result<usize> + Send + 'static,
{
    let line = tokio::task::spawn_blocking(move || {
        let mut input = String::new();
        read(&mut input).map(|_| input)
    })
    .await??;
    Ok(line)
}

/// After a mutation the server accepted, say so even if the reload failed.
pub(crate) fn report_reload(view: &IssueView) {
    if let ViewState::Failed(reason) = view.state() {
        eprintln!(
            "Warning: could not reload issue #{}: {}. Run 'issuedesk show {}' before retrying.",
            view.issue_id(),
            reason,
            view.issue_id()
        );
    }
}

/// Shorten to `max_chars` characters, ending in "..." when cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
