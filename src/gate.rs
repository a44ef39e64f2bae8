//! Navigation gate in front of protected views.

use std::fmt;
use tracing::warn;

use crate::session::{SessionState, SessionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Issues,
    IssueCreate,
    IssueDetail(i64),
}

impl Route {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Dashboard => write!(f, "/"),
            Route::Issues => write!(f, "/issues"),
            Route::IssueCreate => write!(f, "/issues/create"),
            Route::IssueDetail(id) => write!(f, "/issues/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(Route),
    /// Session not resolved yet; nothing may render.
    Suspend,
    /// The requested destination is dropped, not remembered.
    Redirect { to: Route, notice: Option<&'static str> },
}

/// Decide from the current state alone.
pub fn check(state: &SessionState, route: Route) -> GateDecision {
    match (state, route.is_protected()) {
        (SessionState::Authenticated(_), false) => GateDecision::Redirect {
            to: Route::Dashboard,
            notice: None,
        },
        (_, false) => GateDecision::Proceed(route),
        (SessionState::Unresolved, true) => GateDecision::Suspend,
        (SessionState::Anonymous, true) => GateDecision::Redirect {
            to: Route::Login,
            notice: Some("Please log in first"),
        },
        (SessionState::Authenticated(_), true) => GateDecision::Proceed(route),
    }
}

/// Enter a route, waiting out startup resolution if it has not run yet.
pub async fn enter(session: &mut SessionStore, route: Route) -> GateDecision {
    let decision = match check(session.state(), route) {
        GateDecision::Suspend => check(session.resolve().await, route),
        other => other,
    };
    if let GateDecision::Redirect { to: Route::Login, .. } = decision {
        warn!(requested = %route, "not logged in; redirecting to login");
    }
    decision
}
