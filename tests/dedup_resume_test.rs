//! Dedup filter persistence across filter instances

use anyhow::Result;
use kodegen_tools_crawlstate::{DedupFilter, DiskPersister, JobConfig, Persister, SEEN_LOG_KEY};

mod common;
use common::{UrlFingerprinter, create_test_dir, req};

fn filter_on(jobdir: &std::path::Path) -> Result<DedupFilter> {
    let config = JobConfig::new().with_jobdir(jobdir);
    Ok(DedupFilter::from_config(&config)?.with_fingerprinter(Box::new(UrlFingerprinter)))
}

#[test]
fn duplicates_survive_filter_restart() -> Result<()> {
    let dir = create_test_dir()?;
    let jobdir = dir.path().join("job");

    let mut first = filter_on(&jobdir)?;
    assert!(!first.seen(&req("https://example.com/x"))?);
    assert!(first.seen(&req("https://example.com/x"))?);
    first.close("finished")?;

    let mut second = filter_on(&jobdir)?;
    assert!(second.seen(&req("https://example.com/x"))?);
    assert!(!second.seen(&req("https://example.com/y"))?);
    second.close("finished")?;
    Ok(())
}

#[test]
fn every_prior_fingerprint_reloads_as_duplicate() -> Result<()> {
    let dir = create_test_dir()?;
    let jobdir = dir.path().join("job");
    let urls: Vec<String> = (0..25)
        .map(|n| format!("https://example.com/page/{n}"))
        .collect();

    let mut first = filter_on(&jobdir)?;
    for url in &urls {
        assert!(!first.seen(&req(url))?);
    }
    first.close("shutdown")?;

    let mut second = filter_on(&jobdir)?;
    assert_eq!(second.fingerprint_count(), urls.len());
    for url in &urls {
        assert!(second.seen(&req(url))?);
    }
    assert!(!second.seen(&req("https://example.com/fresh"))?);
    Ok(())
}

#[test]
fn dedup_log_is_newline_separated_fingerprints() -> Result<()> {
    let dir = create_test_dir()?;
    let jobdir = dir.path().join("job");

    let mut filter = filter_on(&jobdir)?;
    filter.seen(&req("a"))?;
    filter.seen(&req("b"))?;
    filter.close("finished")?;

    let persister = DiskPersister::new(&jobdir)?;
    let log = persister.get(SEEN_LOG_KEY, b"")?;
    assert_eq!(log, b"a\nb\n".to_vec());
    Ok(())
}

#[test]
fn default_fingerprinter_round_trips_through_the_log() -> Result<()> {
    let dir = create_test_dir()?;
    let jobdir = dir.path().join("job");
    let config = JobConfig::new().with_jobdir(&jobdir);

    let mut first = DedupFilter::from_config(&config)?;
    assert!(!first.seen(&req("https://example.com/a"))?);
    first.close("finished")?;

    let mut second = DedupFilter::from_config(&config)?;
    // Equivalent URL spellings hit the fingerprint recorded by the first run.
    assert!(second.seen(&req("https://EXAMPLE.com:443/a#section"))?);
    Ok(())
}

#[test]
fn filter_without_persister_is_ephemeral() -> Result<()> {
    let config = JobConfig::new();
    let mut filter =
        DedupFilter::from_config(&config)?.with_fingerprinter(Box::new(UrlFingerprinter));

    assert!(!filter.seen(&req("https://example.com/x"))?);
    assert!(filter.seen(&req("https://example.com/x"))?);
    filter.close("finished")?;

    let mut fresh =
        DedupFilter::from_config(&config)?.with_fingerprinter(Box::new(UrlFingerprinter));
    assert!(!fresh.seen(&req("https://example.com/x"))?);
    Ok(())
}
