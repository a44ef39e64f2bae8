use anyhow::Result;

use crate::commands::enter;
use crate::gate::Route;
use crate::session::SessionStore;

pub async fn run(session: &mut SessionStore) -> Result<()> {
    enter(session, Route::Dashboard).await?;

    let token = session.bearer()?;
    let outcome = session.gateway().stats_summary(&token).await;
    let stats = session.observe(outcome)?;

    if let Some(user) = session.user() {
        println!("Welcome, {}", user.display_name());
    }
    println!("Total issues:  {}", stats.total);
    println!("  Open:        {}", stats.open);
    println!("  In progress: {}", stats.in_progress);
    println!("  Resolved:    {}", stats.resolved);
    println!("  Closed:      {}", stats.closed);
    println!("Completion:    {:.1}%", stats.completion_rate);
    Ok(())
}
