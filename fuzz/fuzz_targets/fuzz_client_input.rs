#![no_main]

//! Fuzz target for everything the client parses or measures locally.
//!
//! Draft validation counts characters after trimming, timestamps come from
//! the backend in more than one shape, and list output truncates titles.
//! None of these may panic on arbitrary Unicode.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use issuedesk::commands::truncate;
use issuedesk::draft;
use issuedesk::models::{timestamp, Category, Issue, IssueDraft, Priority, Status};

#[derive(Arbitrary, Debug)]
struct ClientInput {
    title: String,
    description: String,
    timestamp: String,
    wire_value: String,
    tags: Option<String>,
    width: u8,
}

fuzz_target!(|input: ClientInput| {
    let d = IssueDraft {
        title: input.title.clone(),
        description: input.description.clone(),
        ..Default::default()
    };
    let _ = draft::validate(&d);

    let _ = timestamp::parse(&input.timestamp);

    let _ = input.wire_value.parse::<Category>();
    let _ = input.wire_value.parse::<Priority>();
    let _ = input.wire_value.parse::<Status>();

    let width = usize::from(input.width);
    let shortened = truncate(&input.title, width);
    assert!(shortened.chars().count() <= width.max(3) || shortened == input.title);

    let _ = issuedesk::models::split_tags(input.tags.as_deref());

    // Server payloads with fuzzed strings must round-trip through serde
    let raw = serde_json::json!({
        "id": 1,
        "title": input.title,
        "description": input.description,
        "category": "bug",
        "priority": "medium",
        "status": "open",
        "ai_tags": input.tags,
        "created_at": "2024-01-15T09:30:00",
    });
    if let Ok(issue) = serde_json::from_value::<Issue>(raw) {
        let _ = issue.tags();
        let _ = serde_json::to_string(&issue);
    }
});
