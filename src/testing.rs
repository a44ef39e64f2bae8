//! In-memory backend double for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::ApiGateway;
use crate::error::{ClientError, Result};
use crate::models::{
    AiSuggestion, Category, Comment, Feedback, Issue, IssueDraft, IssueFilter, IssueUpdate,
    NewFeedback, Priority, StatsSummary, Status, SummarizeRequest, TokenResponse, User,
};

#[derive(Default)]
struct State {
    users: HashMap<String, (String, User)>,
    tokens: HashMap<String, String>,
    issues: HashMap<i64, Issue>,
    comments: Vec<Comment>,
    feedback: Vec<Feedback>,
    next_id: i64,
    calls: Vec<String>,
    failing: HashSet<&'static str>,
    fail_after: HashMap<&'static str, usize>,
    pending_analysis: HashSet<i64>,
    stats: Option<StatsSummary>,
    delay: Option<Duration>,
}

pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = FakeBackend {
            state: Mutex::new(State {
                next_id: 100,
                ..Default::default()
            }),
        };
        backend.add_user("admin", "admin123", "admin");
        backend
    }

    pub fn add_user(&self, username: &str, password: &str, role: &str) {
        let mut state = self.state.lock().unwrap();
        let id = state.users.len() as i64 + 1;
        let user = User {
            id,
            username: username.to_string(),
            email: Some(format!("{}@example.com", username)),
            full_name: None,
            role: role.to_string(),
            department_id: None,
            is_active: true,
        };
        state
            .users
            .insert(username.to_string(), (password.to_string(), user));
    }

    /// Seed an issue directly, bypassing the call log.
    pub fn seed_issue(&self, title: &str, description: &str) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.issues.insert(
            id,
            Issue {
                id,
                title: title.to_string(),
                description: description.to_string(),
                category: Category::Bug,
                priority: Priority::Medium,
                status: Status::Open,
                department_id: None,
                project_id: None,
                assignee_id: None,
                creator_id: Some(1),
                ai_summary: None,
                ai_tags: None,
                ai_category_suggestion: None,
                created_at: Utc::now(),
                updated_at: None,
                resolved_at: None,
                closed_at: None,
            },
        );
        id
    }

    pub fn set_next_id(&self, next: i64) {
        self.state.lock().unwrap().next_id = next - 1;
    }

    pub fn set_stats(&self, stats: StatsSummary) {
        self.state.lock().unwrap().stats = Some(stats);
    }

    /// Make every call to `op` fail with a 500.
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// Let `op` succeed `calls` more times, then fail like `fail`.
    pub fn fail_after(&self, op: &'static str, calls: usize) {
        self.state.lock().unwrap().fail_after.insert(op, calls);
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }

    /// Every subsequent call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn revoke_all_tokens(&self) {
        self.state.lock().unwrap().tokens.clear();
    }

    /// Let the server finish the AI work queued by `analyze_issue`.
    pub fn complete_analysis(&self) {
        let mut state = self.state.lock().unwrap();
        let pending: Vec<i64> = state.pending_analysis.drain().collect();
        for id in pending {
            if let Some(issue) = state.issues.get_mut(&id) {
                issue.ai_summary = Some(format!("Summary of {}", issue.title));
                issue.ai_tags = Some("network,infra".to_string());
                issue.ai_category_suggestion = Some("bug".to_string());
            }
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn issue(&self, id: i64) -> Option<Issue> {
        self.state.lock().unwrap().issues.get(&id).cloned()
    }

    async fn enter(&self, op: &'static str, token: Option<&str>) -> Result<User> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(op.to_string());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.fail_after.get_mut(op) {
            if *remaining == 0 {
                state.fail_after.remove(op);
                state.failing.insert(op);
            } else {
                *remaining -= 1;
            }
        }
        if state.failing.contains(op) {
            return Err(ClientError::Server {
                status: 500,
                detail: format!("{} unavailable", op),
            });
        }
        match token {
            None => Ok(User {
                id: 0,
                username: String::new(),
                email: None,
                full_name: None,
                role: String::new(),
                department_id: None,
                is_active: true,
            }),
            Some(token) => {
                let username = state
                    .tokens
                    .get(token)
                    .ok_or_else(|| ClientError::Auth("Could not validate credentials".into()))?;
                Ok(state.users[username].1.clone())
            }
        }
    }

    fn not_found(id: i64) -> ClientError {
        ClientError::NotFound(format!("Issue #{} not found", id))
    }
}

// Server-side filtering as the backend applies it.
fn matches_filter(filter: &IssueFilter, issue: &Issue) -> bool {
    if filter.status.is_some_and(|s| s != issue.status) {
        return false;
    }
    if filter.priority.is_some_and(|p| p != issue.priority) {
        return false;
    }
    if filter.category.is_some_and(|c| c != issue.category) {
        return false;
    }
    match filter.search.as_deref() {
        Some(term) if !term.is_empty() => {
            issue.title.contains(term)
                || issue.description.contains(term)
                || issue.ai_tags.as_deref().is_some_and(|t| t.contains(term))
        }
        _ => true,
    }
}

#[async_trait]
impl ApiGateway for FakeBackend {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.enter("login", None).await?;
        let mut state = self.state.lock().unwrap();
        match state.users.get(username) {
            Some((pw, _)) if pw == password => {
                let token = format!("token-{}-{}", username, state.tokens.len() + 1);
                state.tokens.insert(token.clone(), username.to_string());
                Ok(TokenResponse {
                    access_token: token,
                    token_type: Some("bearer".into()),
                })
            }
            _ => Err(ClientError::Auth("Incorrect username or password".into())),
        }
    }

    async fn current_user(&self, token: &str) -> Result<User> {
        self.enter("current_user", Some(token)).await
    }

    async fn list_issues(&self, token: &str, filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.enter("list_issues", Some(token)).await?;
        let state = self.state.lock().unwrap();
        let mut issues: Vec<Issue> = state
            .issues
            .values()
            .filter(|i| matches_filter(filter, i))
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = filter.limit {
            issues.truncate(limit as usize);
        }
        Ok(issues)
    }

    async fn create_issue(&self, token: &str, draft: &IssueDraft) -> Result<Issue> {
        let user = self.enter("create_issue", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let issue = Issue {
            id: state.next_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category,
            priority: draft.priority,
            status: Status::Open,
            department_id: draft.department_id,
            project_id: draft.project_id,
            assignee_id: draft.assignee_id,
            creator_id: Some(user.id),
            ai_summary: None,
            ai_tags: None,
            ai_category_suggestion: None,
            created_at: Utc::now(),
            updated_at: None,
            resolved_at: None,
            closed_at: None,
        };
        state.issues.insert(issue.id, issue.clone());
        Ok(issue)
    }

    async fn get_issue(&self, token: &str, id: i64) -> Result<Issue> {
        self.enter("get_issue", Some(token)).await?;
        let state = self.state.lock().unwrap();
        state.issues.get(&id).cloned().ok_or_else(|| Self::not_found(id))
    }

    async fn update_issue(&self, token: &str, id: i64, update: &IssueUpdate) -> Result<Issue> {
        self.enter("update_issue", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        let issue = state.issues.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        if let Some(title) = &update.title {
            issue.title = title.clone();
        }
        if let Some(description) = &update.description {
            issue.description = description.clone();
        }
        if let Some(category) = update.category {
            issue.category = category;
        }
        if let Some(priority) = update.priority {
            issue.priority = priority;
        }
        if let Some(status) = update.status {
            issue.status = status;
        }
        if update.department_id.is_some() {
            issue.department_id = update.department_id;
        }
        if update.project_id.is_some() {
            issue.project_id = update.project_id;
        }
        if update.assignee_id.is_some() {
            issue.assignee_id = update.assignee_id;
        }
        issue.updated_at = Some(Utc::now());
        Ok(issue.clone())
    }

    async fn delete_issue(&self, token: &str, id: i64) -> Result<()> {
        self.enter("delete_issue", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        state.issues.remove(&id).ok_or_else(|| Self::not_found(id))?;
        state.comments.retain(|c| c.issue_id != id);
        state.feedback.retain(|f| f.issue_id != id);
        Ok(())
    }

    async fn list_comments(&self, token: &str, issue_id: i64) -> Result<Vec<Comment>> {
        self.enter("list_comments", Some(token)).await?;
        let state = self.state.lock().unwrap();
        if !state.issues.contains_key(&issue_id) {
            return Err(Self::not_found(issue_id));
        }
        Ok(state
            .comments
            .iter()
            .filter(|c| c.issue_id == issue_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, token: &str, issue_id: i64, content: &str) -> Result<Comment> {
        let user = self.enter("add_comment", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(&issue_id) {
            return Err(Self::not_found(issue_id));
        }
        let comment = Comment {
            id: state.comments.len() as i64 + 1,
            issue_id,
            author_id: user.id,
            content: content.to_string(),
            is_system: false,
            created_at: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_feedback(&self, token: &str, issue_id: i64) -> Result<Vec<Feedback>> {
        self.enter("list_feedback", Some(token)).await?;
        let state = self.state.lock().unwrap();
        if !state.issues.contains_key(&issue_id) {
            return Err(Self::not_found(issue_id));
        }
        Ok(state
            .feedback
            .iter()
            .filter(|f| f.issue_id == issue_id)
            .cloned()
            .collect())
    }

    async fn add_feedback(&self, token: &str, new: &NewFeedback) -> Result<Feedback> {
        let user = self.enter("add_feedback", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(&new.issue_id) {
            return Err(Self::not_found(new.issue_id));
        }
        let feedback = Feedback {
            id: state.feedback.len() as i64 + 1,
            issue_id: new.issue_id,
            author_id: user.id,
            rating: new.rating,
            is_satisfied: new.is_satisfied,
            content: new.content.clone(),
            improvement_suggestions: new.improvement_suggestions.clone(),
            created_at: Utc::now(),
        };
        state.feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn summarize(&self, token: &str, request: &SummarizeRequest) -> Result<AiSuggestion> {
        self.enter("summarize", Some(token)).await?;
        let text = request.text.to_lowercase();
        let category = if text.contains("down") || text.contains("error") {
            "bug"
        } else {
            "question"
        };
        Ok(AiSuggestion {
            summary: Some(request.text.chars().take(request.max_length as usize).collect()),
            category_suggestion: Some(category.to_string()),
            tags: vec!["network".to_string(), "outage".to_string()],
        })
    }

    async fn analyze_issue(&self, token: &str, issue_id: i64) -> Result<()> {
        self.enter("analyze_issue", Some(token)).await?;
        let mut state = self.state.lock().unwrap();
        if !state.issues.contains_key(&issue_id) {
            return Err(Self::not_found(issue_id));
        }
        state.pending_analysis.insert(issue_id);
        Ok(())
    }

    async fn stats_summary(&self, token: &str) -> Result<StatsSummary> {
        self.enter("stats_summary", Some(token)).await?;
        let state = self.state.lock().unwrap();
        if let Some(stats) = &state.stats {
            return Ok(stats.clone());
        }
        let count = |s: Status| state.issues.values().filter(|i| i.status == s).count() as u64;
        let total = state.issues.len() as u64;
        let closed = count(Status::Closed);
        Ok(StatsSummary {
            total,
            open: count(Status::Open),
            in_progress: count(Status::InProgress),
            resolved: count(Status::Resolved),
            closed,
            completion_rate: if total > 0 {
                (closed as f64 / total as f64 * 10000.0).round() / 100.0
            } else {
                0.0
            },
        })
    }
}
