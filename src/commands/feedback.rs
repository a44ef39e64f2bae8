use anyhow::Result;

use crate::commands::{open_issue, report_reload};
use crate::session::SessionStore;
use crate::workflow::{Dialog, FeedbackForm};

pub async fn run(session: &mut SessionStore, issue_id: i64, form: FeedbackForm) -> Result<()> {
    let mut view = open_issue(session, issue_id).await?;
    view.open_dialog(Dialog::GivingFeedback);
    view.add_feedback(session, form).await?;

    println!("Recorded feedback for issue #{}", issue_id);
    report_reload(&view);
    Ok(())
}
