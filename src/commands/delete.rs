use anyhow::Result;
use std::io::{self, Write};

use crate::commands::{open_issue, read_stdin_line};
use crate::session::SessionStore;

pub async fn run(session: &mut SessionStore, id: i64, force: bool) -> Result<()> {
    // Load first so a missing issue fails before the prompt
    let mut view = open_issue(session, id).await?;
    let title = view
        .snapshot()
        .map(|s| s.issue.title.clone())
        .unwrap_or_default();

    if !force {
        print!("Delete issue #{} \"{}\"? This cannot be undone. [y/N] ", id, title);
        io::stdout().flush()?;

        let input = read_stdin_line().await?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let confirmation = view.confirm_delete();
    let next = view.delete(session, confirmation).await?;
    println!("Deleted issue #{}", id);
    tracing::debug!(route = %next, "navigating after delete");
    Ok(())
}

/// Internal function for testing without stdin interaction
#[cfg(test)]
pub async fn run_force(session: &mut SessionStore, id: i64) -> Result<()> {
    run(session, id, true).await
}
