use anyhow::Result;

use crate::commands::open_issue;
use crate::session::SessionStore;

/// Queue a fresh AI analysis and wait until the backend has accepted it.
pub async fn run(session: &mut SessionStore, id: i64) -> Result<()> {
    let view = open_issue(session, id).await?;
    let handle = view.request_reanalysis(session)?;
    let accepted = handle.wait().await;
    session.observe(accepted)?;

    println!("Re-analysis requested for issue #{}.", id);
    println!("New AI fields show up in 'issuedesk show {}' once the backend finishes.", id);
    Ok(())
}
