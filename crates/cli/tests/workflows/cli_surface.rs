//! Drive the `shelf` binary end to end

use crate::common::TestEnv;
use crate::shelf;
use anyhow::Result;
use std::fs;

#[test]
fn test_cli_backup_then_skip() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    env.write_config(&[env.job("docs", &["Documents"])])?;

    let result = shelf!(&env.home, "backup", "docs").assert_success()?;
    assert!(result.contains_stdout("Backup created:"));
    assert!(result.contains_stdout("(version 1)"));

    let result = shelf!(&env.home, "backup", "--job", "docs").assert_success()?;
    assert!(result.contains_stdout("No changes since last backup, skipped"));

    assert!(env.backups.join("docs-1.tar.gz").is_file());
    assert!(!env.backups.join("docs-2.tar.gz").exists());
    Ok(())
}

#[test]
fn test_cli_reports_skipped_sources() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    env.write_config(&[env.job("docs", &["Documents", "Missing"])])?;

    let result = shelf!(&env.home, "backup", "docs").assert_success()?;
    assert!(result.contains_stdout("Source not found, skipped"));
    assert!(result.contains_stdout("Missing"));
    Ok(())
}

#[test]
fn test_cli_restore_into_target() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "first")?;
    let config = env.write_config(&[env.job("docs", &["Documents"])])?;
    let config = config.to_string_lossy().into_owned();

    shelf!(&env.home, "--config", &config, "backup", "docs").assert_success()?;
    env.write("Documents/a.txt", "second")?;
    shelf!(&env.home, "--config", &config, "backup", "docs").assert_success()?;

    let target = env.home.join("restored");
    let target_arg = target.to_string_lossy().into_owned();
    let result = shelf!(
        &env.home, "restore", "docs", "--version", "1", "--target", &target_arg, "--no-lock"
    )
    .assert_success()?;

    assert!(result.contains_stdout("Restored version 1 for job 'docs'"));
    assert_eq!(fs::read_to_string(target.join("Documents/a.txt"))?, "first");
    Ok(())
}

#[test]
fn test_cli_list_and_jobs() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    env.write_config(&[env.job("docs", &["Documents"]), env.job("music", &["Music"])])?;

    shelf!(&env.home, "backup", "docs").assert_success()?;

    let result = shelf!(&env.home, "list", "docs").assert_success()?;
    assert!(result.contains_stdout("v1"));
    assert!(result.contains_stdout("docs-1.tar.gz"));

    let result = shelf!(&env.home, "jobs").assert_success()?;
    assert!(result.contains_stdout("docs"));
    assert!(result.contains_stdout("music"));
    Ok(())
}

#[test]
fn test_cli_errors_exit_non_zero() -> Result<()> {
    let env = TestEnv::new()?;
    env.write_config(&[env.job("docs", &["Documents"])])?;

    let result = shelf!(&env.home, "backup", "photos").assert_failure()?;
    assert!(result.contains_stderr("No job named 'photos'"));

    let result = shelf!(&env.home, "restore", "docs").assert_failure()?;
    assert!(result.contains_stderr("No backups found"));

    Ok(())
}

#[test]
fn test_cli_missing_config() -> Result<()> {
    let env = TestEnv::new()?;

    let result = shelf!(&env.home, "backup", "docs").assert_failure()?;
    assert!(result.contains_stderr("Config file not found"));

    let result = shelf!(&env.home, "config", "path").assert_success()?;
    assert!(result.contains_stdout("jobs.toml"));
    assert!(result.contains_stdout("not found"));
    Ok(())
}

#[test]
fn test_cli_config_example_is_usable() -> Result<()> {
    let env = TestEnv::new()?;

    let result = shelf!(&env.home, "config", "example").assert_success()?;
    let path = env.home.join("example.toml");
    fs::write(&path, &result.stdout)?;
    let path_arg = path.to_string_lossy().into_owned();

    let result = shelf!(&env.home, "--config", &path_arg, "jobs").assert_success()?;
    assert!(result.contains_stdout("documents"));
    assert!(result.contains_stdout("dotfiles"));
    Ok(())
}

#[test]
fn test_cli_env_config_override() -> Result<()> {
    let env = TestEnv::new()?;
    env.write("Documents/a.txt", "a")?;
    let config = env.write_config(&[env.job("docs", &["Documents"])])?;
    let moved = env.home.join("elsewhere.toml");
    fs::rename(&config, &moved)?;

    shelf!(&env.home, "backup", "docs")
        .env("SHELF_CONFIG", &moved.to_string_lossy())
        .assert_success()?;
    assert!(env.backups.join("docs-1.tar.gz").is_file());
    Ok(())
}
