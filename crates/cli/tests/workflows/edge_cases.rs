//! Edge cases: missing sources, bad state, unknown jobs, locking

use crate::common::TestEnv;
use anyhow::Result;
use shelf_cli::{ConfigError, JobLock, ShelfError};
use shelf_core::list_entries;
use std::fs;
use std::path::PathBuf;

#[test]
fn test_partial_source_loss() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/keep.txt", "still here")?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents", "Pictures"])]);

    let outcome = coordinator.backup("docs")?;

    assert_eq!(outcome.skipped(), &[env.home.join("Pictures")]);
    let record = outcome.record().expect("archive written despite missing source");
    let entries = list_entries(&record.path)?;
    assert!(entries.contains(&PathBuf::from("Documents/keep.txt")));
    assert!(entries.iter().all(|e| !e.starts_with("Pictures")));
    Ok(())
}

#[test]
fn test_all_sources_missing() -> Result<()> {
    let env = TestEnv::new()?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents", "Pictures"])]);

    let err = coordinator.backup("docs").unwrap_err();

    match err {
        ShelfError::NoSources { job, skipped } => {
            assert_eq!(job, "docs");
            assert_eq!(skipped.len(), 2);
        }
        other => panic!("expected NoSources, got {other:?}"),
    }
    assert!(env.backup_files()?.is_empty());
    Ok(())
}

#[test]
fn test_source_appearing_later_is_archived() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents", "Pictures"])]);

    coordinator.backup("docs")?;
    env.write("Pictures/cat.jpg", "meow")?;

    let outcome = coordinator.backup("docs")?;
    assert_eq!(outcome.record().map(|r| r.version), Some(2));
    assert!(outcome.skipped().is_empty());
    Ok(())
}

#[test]
fn test_malformed_state_triggers_rearchive() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents"])]);

    coordinator.backup("docs")?;
    fs::write(env.backups.join(".docs.hash"), "not a digest\n")?;

    let outcome = coordinator.backup("docs")?;
    assert_eq!(outcome.record().map(|r| r.version), Some(2));

    // The state file is repaired, so the next run is a no-op again
    assert!(!coordinator.backup("docs")?.is_created());
    Ok(())
}

#[test]
fn test_unknown_job() -> Result<()> {
    let env = TestEnv::new()?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents"])]);

    let err = coordinator.backup("photos").unwrap_err();
    assert!(matches!(err, ShelfError::JobNotFound(_)));
    assert_eq!(err.to_string(), "No job named 'photos' in config");

    let err = coordinator.restore("photos", None, None).unwrap_err();
    assert!(matches!(err, ShelfError::JobNotFound(_)));
    Ok(())
}

#[test]
fn test_unsupported_method_rejected_before_any_write() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    let mut job = env.job("docs", &["Documents"]);
    job.method = "zip".to_string();
    let coordinator = env.coordinator(vec![job]);

    let err = coordinator.backup("docs").unwrap_err();
    assert!(matches!(
        err,
        ShelfError::Config(ConfigError::UnsupportedMethod { .. })
    ));
    assert!(!env.backups.exists());
    Ok(())
}

#[test]
fn test_jobs_sharing_destination_are_independent() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("db/a", "1")?;
    env.write("db2/a", "2")?;
    let coordinator = env.coordinator(vec![env.job("db", &["db"]), env.job("db2", &["db2"])]);

    coordinator.backup("db")?;
    coordinator.backup("db2")?;
    env.write("db/a", "changed")?;
    let outcome = coordinator.backup("db")?;

    assert_eq!(outcome.record().map(|r| r.version), Some(2));
    assert_eq!(
        env.backup_files()?,
        vec![".db.hash", ".db2.hash", "db-1.tar.gz", "db-2.tar.gz", "db2-1.tar.gz"]
    );
    assert!(!coordinator.backup("db2")?.is_created());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_concurrent_invocation_is_refused() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    fs::create_dir_all(&env.backups)?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents"])]);

    let held = JobLock::acquire(&env.backups, "docs")?;

    let err = coordinator.backup("docs").unwrap_err();
    assert!(matches!(err, ShelfError::Locked { holder_pid: Some(_), .. }));
    assert!(coordinator.list("docs")?.is_empty());

    drop(held);
    assert!(coordinator.backup("docs")?.is_created());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinks_archived_as_links() -> Result<()> {
    use std::os::unix::fs::symlink;

    let env = TestEnv::new()?;
    let real = env.write("real/data.txt", "data")?;
    let other = env.write("real/other.txt", "other")?;
    env.write("Documents/a.txt", "a")?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents"])]);
    coordinator.backup("docs")?;

    // A new link is a change
    symlink(&real, env.home.join("Documents/link.txt"))?;
    let outcome = coordinator.backup("docs")?;
    assert_eq!(outcome.record().map(|r| r.version), Some(2));

    // Edits behind the link are not
    fs::write(&real, "edited")?;
    assert!(!coordinator.backup("docs")?.is_created());

    // Retargeting the link is
    fs::remove_file(env.home.join("Documents/link.txt"))?;
    symlink(&other, env.home.join("Documents/link.txt"))?;
    let outcome = coordinator.backup("docs")?;
    assert_eq!(outcome.record().map(|r| r.version), Some(3));

    let target = env.home.join("out");
    coordinator.restore("docs", None, Some(&target))?;
    assert_eq!(fs::read_link(target.join("Documents/link.txt"))?, other);
    Ok(())
}

#[test]
fn test_new_empty_directory_is_backed_up() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    let coordinator = env.coordinator(vec![env.job("docs", &["Documents"])]);
    coordinator.backup("docs")?;

    fs::create_dir(env.home.join("Documents/empty"))?;
    let outcome = coordinator.backup("docs")?;

    let record = outcome.record().expect("empty directory triggers an archive");
    assert_eq!(record.version, 2);
    assert!(list_entries(&record.path)?.contains(&PathBuf::from("Documents/empty")));
    Ok(())
}

#[test]
fn test_move_between_same_named_sources_is_backed_up() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("a/data/f.txt", "payload")?;
    fs::create_dir_all(env.home.join("b/data"))?;
    let coordinator = env.coordinator(vec![env.job("data", &["a/data", "b/data"])]);
    coordinator.backup("data")?;

    fs::rename(env.home.join("a/data/f.txt"), env.home.join("b/data/f.txt"))?;
    let outcome = coordinator.backup("data")?;
    assert_eq!(outcome.record().map(|r| r.version), Some(2));

    // Latest now rebuilds the moved layout
    let target = env.home.join("out");
    coordinator.restore("data", None, Some(&target))?;
    assert_eq!(fs::read_to_string(target.join("b/data/f.txt"))?, "payload");
    assert!(!target.join("a/data/f.txt").exists());
    Ok(())
}
