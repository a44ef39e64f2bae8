use anyhow::Result;

use crate::commands::{open_issue, report_reload};
use crate::session::SessionStore;
use crate::workflow::Dialog;

pub async fn run(session: &mut SessionStore, issue_id: i64, content: &str) -> Result<()> {
    let mut view = open_issue(session, issue_id).await?;
    view.open_dialog(Dialog::Commenting);
    view.add_comment(session, content).await?;

    match view.snapshot() {
        Some(s) => println!("Added comment to issue #{} ({} total)", issue_id, s.comments.len()),
        None => println!("Added comment to issue #{}", issue_id),
    }
    report_reload(&view);
    Ok(())
}
