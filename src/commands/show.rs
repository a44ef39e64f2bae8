use anyhow::Result;

use crate::commands::open_issue;
use crate::session::SessionStore;
use crate::workflow::IssueSnapshot;

pub async fn run(session: &mut SessionStore, id: i64) -> Result<()> {
    let view = open_issue(session, id).await?;
    if let Some(snapshot) = view.snapshot() {
        print_snapshot(snapshot);
    }
    Ok(())
}

pub fn print_snapshot(snapshot: &IssueSnapshot) {
    let issue = &snapshot.issue;

    println!("Issue #{}: {}", issue.id, issue.title);
    println!("Status: {}", issue.status);
    println!("Priority: {}", issue.priority);
    println!("Category: {}", issue.category);
    if let Some(dept) = issue.department_id {
        println!("Department: #{}", dept);
    }
    if let Some(project) = issue.project_id {
        println!("Project: #{}", project);
    }
    if let Some(assignee) = issue.assignee_id {
        println!("Assignee: #{}", assignee);
    }
    println!("Created: {}", issue.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(updated) = issue.updated_at {
        println!("Updated: {}", updated.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(resolved) = issue.resolved_at {
        println!("Resolved: {}", resolved.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(closed) = issue.closed_at {
        println!("Closed: {}", closed.format("%Y-%m-%d %H:%M:%S"));
    }

    println!("\nDescription:");
    for line in issue.description.lines() {
        println!("  {}", line);
    }

    // AI fields stay empty until the backend has analyzed the issue
    println!("\nAI summary: {}", issue.ai_summary.as_deref().unwrap_or("(none yet)"));
    let tags = issue.tags();
    if tags.is_empty() {
        println!("AI tags: (none yet)");
    } else {
        println!("AI tags: {}", tags.join(", "));
    }
    println!(
        "AI suggested category: {}",
        issue.ai_category_suggestion.as_deref().unwrap_or("(none yet)")
    );

    if !snapshot.comments.is_empty() {
        println!("\nComments:");
        for comment in &snapshot.comments {
            let author = if comment.is_system {
                "system".to_string()
            } else {
                format!("user #{}", comment.author_id)
            };
            println!(
                "  [{}] {}: {}",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                author,
                comment.content
            );
        }
    }

    if !snapshot.feedback.is_empty() {
        println!("\nFeedback:");
        for fb in &snapshot.feedback {
            let stars = "*".repeat(fb.rating as usize);
            let satisfied = if fb.is_satisfied { "satisfied" } else { "not satisfied" };
            println!(
                "  [{}] user #{} {:5} {}",
                fb.created_at.format("%Y-%m-%d %H:%M"),
                fb.author_id,
                stars,
                satisfied
            );
            if let Some(content) = &fb.content {
                println!("    {}", content);
            }
            if let Some(suggestions) = &fb.improvement_suggestions {
                println!("    Suggestions: {}", suggestions);
            }
        }
    }
}
