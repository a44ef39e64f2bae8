use anyhow::{bail, Result};

use crate::commands::{open_issue, report_reload};
use crate::models::{Category, IssueUpdate, Priority, Status};
use crate::session::SessionStore;
use crate::workflow::Dialog;

#[derive(Debug, Clone, Default)]
pub struct UpdateArgs<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub status: Option<&'a str>,
    pub department: Option<i64>,
    pub project: Option<i64>,
    pub assignee: Option<i64>,
}

pub fn build_update(args: &UpdateArgs<'_>) -> Result<IssueUpdate> {
    let update = IssueUpdate {
        title: args.title.map(str::to_string),
        description: args.description.map(str::to_string),
        category: args
            .category
            .map(str::parse::<Category>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        priority: args
            .priority
            .map(str::parse::<Priority>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        status: args
            .status
            .map(str::parse::<Status>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        department_id: args.department,
        project_id: args.project,
        assignee_id: args.assignee,
    };
    if update.is_empty() {
        bail!(
            "Nothing to update. Use --title, --description, --category, --priority, \
             --status, --department, --project, or --assignee"
        );
    }
    Ok(update)
}

pub async fn run(session: &mut SessionStore, id: i64, args: &UpdateArgs<'_>) -> Result<()> {
    let update = build_update(args)?;
    apply(session, id, update).await
}

/// Send an update through the detail view and print what the server kept.
pub(crate) async fn apply(session: &mut SessionStore, id: i64, update: IssueUpdate) -> Result<()> {
    let mut view = open_issue(session, id).await?;
    view.open_dialog(Dialog::Updating);
    view.update(session, update).await?;

    match view.snapshot() {
        Some(snapshot) => {
            let issue = &snapshot.issue;
            println!(
                "Updated issue #{}: {} [{}] {} {}",
                issue.id, issue.title, issue.status, issue.category, issue.priority
            );
        }
        None => println!("Updated issue #{}", id),
    }
    report_reload(&view);
    Ok(())
}
