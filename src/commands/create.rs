use anyhow::Result;

use crate::ai;
use crate::commands::enter;
use crate::draft;
use crate::gate::Route;
use crate::models::{Category, IssueDraft, Priority};
use crate::session::SessionStore;

/// Field values from the command line, before parsing.
#[derive(Debug, Clone, Default)]
pub struct CreateArgs<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub department: Option<i64>,
    pub project: Option<i64>,
    pub assignee: Option<i64>,
}

pub fn build_draft(args: &CreateArgs<'_>) -> Result<IssueDraft> {
    let category = match args.category {
        Some(c) => c.parse::<Category>().map_err(anyhow::Error::msg)?,
        None => Category::default(),
    };
    let priority = match args.priority {
        Some(p) => p.parse::<Priority>().map_err(anyhow::Error::msg)?,
        None => Priority::default(),
    };
    Ok(IssueDraft {
        title: args.title.to_string(),
        description: args.description.to_string(),
        category,
        priority,
        department_id: args.department,
        project_id: args.project,
        assignee_id: args.assignee,
    })
}

pub async fn run(session: &mut SessionStore, args: &CreateArgs<'_>, ai_suggest: bool) -> Result<()> {
    enter(session, Route::IssueCreate).await?;
    let mut issue_draft = build_draft(args)?;

    // An explicit --category always wins over the suggestion
    if ai_suggest {
        match ai::request_suggestion(session, &issue_draft.title, &issue_draft.description).await {
            Ok(suggestion) => {
                if args.category.is_none() && ai::apply_suggestion(&mut issue_draft, &suggestion) {
                    println!("AI suggested category: {}", issue_draft.category);
                }
                if !suggestion.tags.is_empty() {
                    println!("AI suggested tags: {}", suggestion.tags.join(", "));
                }
            }
            Err(e) => eprintln!("Warning: AI suggestion unavailable: {}", e),
        }
    }

    let issue = draft::create(session, issue_draft).await?;
    println!("Created issue #{}", issue.id);
    println!("AI analysis will be available shortly. Run 'issuedesk show {}'.", issue.id);
    Ok(())
}

/// Show what the AI would suggest for a draft without filing anything.
pub async fn suggest(session: &mut SessionStore, title: &str, description: &str) -> Result<()> {
    enter(session, Route::IssueCreate).await?;
    let suggestion = ai::request_suggestion(session, title, description).await?;

    if let Some(summary) = &suggestion.summary {
        println!("Summary: {}", summary);
    }
    match (suggestion.category(), &suggestion.category_suggestion) {
        (Some(category), _) => println!("Category: {}", category),
        (None, Some(raw)) => println!("Category: {} (not a known category)", raw),
        (None, None) => println!("Category: (none)"),
    }
    if suggestion.tags.is_empty() {
        println!("Tags: (none)");
    } else {
        println!("Tags: {}", suggestion.tags.join(", "));
    }
    Ok(())
}
