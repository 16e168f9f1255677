//! Job state snapshots across runs

use anyhow::Result;
use kodegen_tools_crawlstate::{JobConfig, JobState};
use serde_json::json;

mod common;
use common::create_test_dir;

#[test]
fn state_round_trips_through_the_job_directory() -> Result<()> {
    let dir = create_test_dir()?;
    let config = JobConfig::new().with_jobdir(dir.path().join("job"));

    let mut first = JobState::from_config(&config)?;
    first.open()?;
    assert!(first.is_empty());
    first.insert("pages_done", 42);
    first.close()?;

    let mut second = JobState::from_config(&config)?;
    second.open()?;
    assert_eq!(second.len(), 1);
    assert_eq!(second.get("pages_done"), Some(&json!(42)));
    Ok(())
}

#[test]
fn close_overwrites_the_previous_snapshot() -> Result<()> {
    let dir = create_test_dir()?;
    let config = JobConfig::new().with_jobdir(dir.path().join("job"));

    let mut first = JobState::from_config(&config)?;
    first.open()?;
    first.insert("cursor", json!({"page": 1, "offset": 10}));
    first.insert("stale", true);
    first.close()?;

    let mut second = JobState::from_config(&config)?;
    second.open()?;
    second.remove("stale");
    second.insert("cursor", json!({"page": 2, "offset": 0}));
    second.close()?;

    let mut third = JobState::from_config(&config)?;
    third.open()?;
    assert_eq!(third.len(), 1);
    assert_eq!(third.get("cursor"), Some(&json!({"page": 2, "offset": 0})));
    Ok(())
}

#[test]
fn nested_values_survive_the_snapshot() -> Result<()> {
    let dir = create_test_dir()?;
    let config = JobConfig::new().with_jobdir(dir.path().join("job"));

    let mut first = JobState::from_config(&config)?;
    first.open()?;
    first.insert(
        "domains",
        json!({"example.com": {"crawled": 12, "errors": ["timeout"]}, "other.org": 3}),
    );
    first.insert("verbose", false);
    first.insert("label", "nightly");
    first.close()?;

    let mut second = JobState::from_config(&config)?;
    second.open()?;
    assert_eq!(second.get("label"), Some(&json!("nightly")));
    assert_eq!(
        second.get("domains"),
        Some(&json!({"example.com": {"crawled": 12, "errors": ["timeout"]}, "other.org": 3}))
    );
    Ok(())
}
