use anyhow::Result;

use crate::commands::{enter, truncate};
use crate::gate::Route;
use crate::models::{Category, IssueFilter, Priority, Status};
use crate::session::SessionStore;

pub fn build_filter(
    status: Option<&str>,
    priority: Option<&str>,
    category: Option<&str>,
    search: Option<&str>,
    limit: Option<u32>,
) -> Result<IssueFilter> {
    Ok(IssueFilter {
        status: status.map(str::parse::<Status>).transpose().map_err(anyhow::Error::msg)?,
        priority: priority
            .map(str::parse::<Priority>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        category: category
            .map(str::parse::<Category>)
            .transpose()
            .map_err(anyhow::Error::msg)?,
        search: search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string),
        limit,
    })
}

pub async fn run(session: &mut SessionStore, filter: &IssueFilter) -> Result<()> {
    enter(session, Route::Issues).await?;

    let token = session.bearer()?;
    let outcome = session.gateway().list_issues(&token, filter).await;
    let issues = session.observe(outcome)?;

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    for issue in issues {
        let status_display = format!("[{}]", issue.status);
        let date = issue.created_at.format("%Y-%m-%d");
        let tags = issue.tags();
        let tags = if tags.is_empty() {
            "-".to_string()
        } else {
            tags.join(",")
        };
        println!(
            "#{:<4} {:13} {:<40} {:11} {:7} {:10} {}",
            issue.id,
            status_display,
            truncate(&issue.title, 40),
            issue.category,
            issue.priority,
            date,
            truncate(&tags, 30)
        );
    }

    Ok(())
}
