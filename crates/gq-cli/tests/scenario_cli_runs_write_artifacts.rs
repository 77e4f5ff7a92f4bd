//! End-to-end CLI runs against the reference config.
//!
//! - `gq backtest` writes the artifact set plus a verifiable audit trail.
//! - `gq walk-forward` honours a layered override of the window sizes.
//! - Unused-key policy `fail` refuses a config carrying another mode's keys.
//! - `gq beta` reports unit beta for a series against itself.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

fn default_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("gq-config")
        .join("config")
        .join("default.yaml")
}

fn only_run_dir(exports: &Path) -> PathBuf {
    let dirs: Vec<PathBuf> = std::fs::read_dir(exports)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1, "expected one run dir, got {dirs:?}");
    dirs.into_iter().next().unwrap()
}

#[allow(deprecated)]
#[test]
fn backtest_writes_artifacts_and_verifiable_audit() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let data = tmp.path().join("bars.csv");
    gq_testkit::write_bars_csv(&data, &gq_testkit::mixed_regimes(4, 300))?;
    let exports = tmp.path().join("exports");

    Command::cargo_bin("gq")?
        .arg("backtest")
        .arg("--config")
        .arg(default_config())
        .arg("--data")
        .arg(&data)
        .arg("--exports")
        .arg(&exports)
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=BACKTEST"))
        .stdout(predicate::str::contains("bars_processed="))
        .stdout(predicate::str::contains("config_hash="));

    let run_dir = only_run_dir(&exports);
    for f in [
        "trades.csv",
        "rejected_trades.csv",
        "equity_curve.csv",
        "metrics.json",
        "manifest.json",
        "audit.jsonl",
    ] {
        assert!(run_dir.join(f).is_file(), "missing {f}");
    }

    Command::cargo_bin("gq")?
        .arg("audit-verify")
        .arg(run_dir.join("audit.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("audit_valid=true"));

    Ok(())
}

#[allow(deprecated)]
#[test]
fn walk_forward_uses_layered_window_override() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let data = tmp.path().join("bars.csv");
    gq_testkit::write_bars_csv(&data, &gq_testkit::random_walk(6, 700, 2000.0, 0.004))?;
    let overrides = tmp.path().join("small_windows.yaml");
    std::fs::write(
        &overrides,
        "walk_forward:\n  is_window: 300\n  oos_window: 200\n  parallel: false\n",
    )?;
    let exports = tmp.path().join("exports");

    Command::cargo_bin("gq")?
        .arg("walk-forward")
        .arg("--config")
        .arg(default_config())
        .arg("--config")
        .arg(&overrides)
        .arg("--data")
        .arg(&data)
        .arg("--exports")
        .arg(&exports)
        .arg("--no-audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=WALK_FORWARD"))
        .stdout(predicate::str::contains("windows=2"))
        .stdout(predicate::str::contains("finite_mean_wfe="));

    let run_dir = only_run_dir(&exports);
    assert!(run_dir.join("walk_forward.json").is_file());
    assert!(run_dir.join("windows.csv").is_file());
    assert!(!run_dir.join("audit.jsonl").exists());
    Ok(())
}

#[allow(deprecated)]
#[test]
fn unused_keys_fail_policy_rejects_other_mode_sections() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let data = tmp.path().join("bars.csv");
    gq_testkit::write_bars_csv(&data, &gq_testkit::random_walk(1, 50, 100.0, 0.01))?;

    Command::cargo_bin("gq")?
        .arg("backtest")
        .arg("--config")
        .arg(default_config())
        .arg("--data")
        .arg(&data)
        .arg("--exports")
        .arg(tmp.path().join("exports"))
        .arg("--unused-keys")
        .arg("fail")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNUSED_KEYS"));
    Ok(())
}

#[allow(deprecated)]
#[test]
fn missing_bar_file_fails_before_any_export() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let exports = tmp.path().join("exports");

    Command::cargo_bin("gq")?
        .arg("backtest")
        .arg("--config")
        .arg(default_config())
        .arg("--data")
        .arg(tmp.path().join("nope.csv"))
        .arg("--exports")
        .arg(&exports)
        .assert()
        .failure()
        .stderr(predicate::str::contains("read bar file failed"));

    assert!(!exports.exists());
    Ok(())
}

#[allow(deprecated)]
#[test]
fn config_hash_is_stable_across_invocations() -> anyhow::Result<()> {
    let run = || -> anyhow::Result<String> {
        let out = Command::cargo_bin("gq")?
            .arg("config-hash")
            .arg(default_config())
            .output()?;
        assert!(out.status.success());
        let stdout = String::from_utf8(out.stdout)?;
        Ok(stdout
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    };
    let a = run()?;
    assert!(a.starts_with("config_hash="));
    assert_eq!(a.len(), "config_hash=".len() + 64);
    assert_eq!(a, run()?);
    Ok(())
}

#[allow(deprecated)]
#[test]
fn beta_of_a_series_against_itself_is_one() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let data = tmp.path().join("bars.csv");
    gq_testkit::write_bars_csv(&data, &gq_testkit::random_walk(8, 120, 100.0, 0.01))?;

    Command::cargo_bin("gq")?
        .arg("beta")
        .arg("--asset")
        .arg(&data)
        .arg("--benchmark")
        .arg(&data)
        .arg("--window")
        .arg("30")
        .assert()
        .success()
        .stdout(predicate::str::contains("beta=1.000000 window=30 returns=119"));
    Ok(())
}
