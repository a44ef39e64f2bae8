use anyhow::Result;

use crate::commands::update::apply;
use crate::models::{IssueUpdate, Status};
use crate::session::SessionStore;

pub async fn close(session: &mut SessionStore, id: i64) -> Result<()> {
    set(session, id, Status::Closed).await
}

pub async fn reopen(session: &mut SessionStore, id: i64) -> Result<()> {
    set(session, id, Status::Open).await
}

async fn set(session: &mut SessionStore, id: i64, status: Status) -> Result<()> {
    let update = IssueUpdate {
        status: Some(status),
        ..Default::default()
    };
    apply(session, id, update).await
}
