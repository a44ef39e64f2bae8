use tracing::{info, warn};

use crate::error::{ClientError, Result};
use crate::models::{Issue, IssueDraft};
use crate::session::SessionStore;

pub const MIN_TITLE_CHARS: usize = 5;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Local checks on a draft. Lengths are counted in characters after trimming.
pub fn validate(draft: &IssueDraft) -> Result<()> {
    let title = draft.title.trim().chars().count();
    if title == 0 {
        return Err(ClientError::validation("Title is required"));
    }
    if title < MIN_TITLE_CHARS {
        return Err(ClientError::validation(format!(
            "Title must be at least {} characters",
            MIN_TITLE_CHARS
        )));
    }
    if title > MAX_TITLE_CHARS {
        return Err(ClientError::validation(format!(
            "Title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }

    let description = draft.description.trim().chars().count();
    if description == 0 {
        return Err(ClientError::validation("Description is required"));
    }
    if description < MIN_DESCRIPTION_CHARS {
        return Err(ClientError::validation(format!(
            "Description must be at least {} characters",
            MIN_DESCRIPTION_CHARS
        )));
    }
    Ok(())
}

/// File a new issue. Nothing is sent unless the draft validates.
pub async fn create(session: &mut SessionStore, mut draft: IssueDraft) -> Result<Issue> {
    validate(&draft)?;
    draft.title = draft.title.trim().to_string();
    draft.description = draft.description.trim().to_string();

    let token = session.bearer()?;
    let outcome = session.gateway().create_issue(&token, &draft).await;
    match session.observe(outcome) {
        Ok(issue) => {
            info!(issue = issue.id, "issue created; ai analysis pending");
            Ok(issue)
        }
        Err(e) => {
            warn!(error = %e, "create failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai;
    use crate::api::ApiGateway;
    use crate::db::Database;
    use crate::models::{Category, Priority};
    use crate::testing::FakeBackend;
    use crate::workflow::IssueView;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn draft(title: &str, description: &str) -> IssueDraft {
        IssueDraft {
            title: title.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    async fn logged_in(backend: &Arc<FakeBackend>) -> SessionStore {
        let gateway: Arc<dyn ApiGateway> = backend.clone();
        let mut session = SessionStore::new(gateway, Database::open_in_memory().unwrap());
        session.login("admin", "admin123").await.unwrap();
        session
    }

    #[test]
    fn test_defaults_match_form() {
        let d = IssueDraft::default();
        assert_eq!(d.category, Category::Other);
        assert_eq!(d.priority, Priority::Medium);
    }

    #[test]
    fn test_boundaries() {
        assert!(validate(&draft("Four", "long enough description")).is_err());
        assert!(validate(&draft("Fives", "long enough description")).is_ok());
        assert!(validate(&draft("Fives", "nine char")).is_err());
        assert!(validate(&draft("Fives", "ten chars!")).is_ok());
        assert!(validate(&draft(&"x".repeat(201), "long enough description")).is_err());
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let err = validate(&draft("   ab   ", "long enough description")).unwrap_err();
        assert!(err.to_string().contains("at least 5"));
    }

    #[test]
    fn test_multibyte_counted_as_chars() {
        assert!(validate(&draft("网络故障了", "办公室网络从九点开始中断")).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_request() {
        let backend = Arc::new(FakeBackend::new());
        let mut session = logged_in(&backend).await;
        let calls = backend.call_count();

        assert!(create(&mut session, draft("Hi", "Office network down since 9am")).await.is_err());
        assert!(create(&mut session, draft("Network outage", "short")).await.is_err());
        assert_eq!(backend.call_count(), calls);
    }

    #[tokio::test]
    async fn test_create_then_read_back() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_next_id(101);
        let mut session = logged_in(&backend).await;

        let created = create(
            &mut session,
            IssueDraft {
                title: "Network outage".into(),
                description: "Office network down since 9am".into(),
                category: Category::Bug,
                priority: Priority::Urgent,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, 101);
        assert!(!created.has_ai_fields());

        let mut view = IssueView::open(&session, created.id);
        let issue = &view.load(&mut session).await.unwrap().issue;
        assert_eq!(issue.title, "Network outage");
        assert_eq!(issue.description, "Office network down since 9am");
        assert_eq!(issue.category, Category::Bug);
        assert_eq!(issue.priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn test_failed_suggestion_does_not_block_create() {
        let backend = Arc::new(FakeBackend::new());
        backend.fail("summarize");
        let mut session = logged_in(&backend).await;
        let d = draft("Network outage", "Office network down since 9am");

        assert!(ai::request_suggestion(&mut session, &d.title, &d.description).await.is_err());
        assert!(session.is_authenticated());
        let created = create(&mut session, d).await.unwrap();
        assert_eq!(created.title, "Network outage");
    }

    proptest! {
        #[test]
        fn prop_short_titles_rejected(title in "[a-zA-Z]{1,4}") {
            prop_assert!(validate(&draft(&title, "a perfectly fine description")).is_err());
        }

        #[test]
        fn prop_short_descriptions_rejected(desc in "[a-zA-Z]{1,9}") {
            prop_assert!(validate(&draft("Valid title", &desc)).is_err());
        }

        #[test]
        fn prop_valid_drafts_accepted(
            title in "[a-zA-Z0-9]{5,60}",
            desc in "[a-zA-Z0-9]{10,200}"
        ) {
            prop_assert!(validate(&draft(&title, &desc)).is_ok());
        }
    }
}
