use gq_backtest::BacktestConfig;
use gq_config::{
    backtest_config, load_layered_yaml, load_layered_yaml_from_strings, walk_forward_config,
};
use gq_execution::OutcomeModel;

const BASE_YAML: &str = include_str!("../config/default.yaml");

#[test]
fn default_profile_matches_reference_config() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).expect("load");
    let cfg = backtest_config(&loaded).expect("backtest config");
    assert_eq!(cfg, BacktestConfig::test_defaults());

    let wf = walk_forward_config(&loaded).expect("walk forward");
    assert_eq!(wf.is_window, 1000);
    assert_eq!(wf.oos_window, 250);
    assert!(wf.parallel);
}

#[test]
fn missing_key_fails_instead_of_defaulting() {
    let without_tp = BASE_YAML.replace("  tp_atr_mult: 2.0\n", "");
    let loaded = load_layered_yaml_from_strings(&[without_tp.as_str()]).expect("load");
    let err = backtest_config(&loaded).expect_err("tp_atr_mult is required");
    let msg = format!("{:#}", err);
    assert!(msg.contains("CONFIG_INVALID_SECTION /sizing"), "{}", msg);
    assert!(msg.contains("tp_atr_mult"), "{}", msg);
}

#[test]
fn missing_section_is_named() {
    let loaded =
        load_layered_yaml_from_strings(&["run: {symbol: X, starting_equity: 1.0}"]).unwrap();
    let err = backtest_config(&loaded).expect_err("features missing");
    assert!(format!("{:#}", err).contains("CONFIG_MISSING_SECTION /features"));
}

#[test]
fn unknown_field_inside_section_is_rejected() {
    let overlay = "gate:\n  vol_pct_ceiling: 0.9\n  typo_field: 1\n";
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, overlay]).unwrap();
    assert!(backtest_config(&loaded).is_err());
}

#[test]
fn out_of_range_value_is_rejected_after_parse() {
    let overlay = "sizing:\n  risk_fraction: 1.5\n";
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, overlay]).unwrap();
    let err = backtest_config(&loaded).expect_err("risk fraction above 1");
    assert!(format!("{:#}", err).contains("CONFIG_INVALID_VALUE"));
}

#[test]
fn seeded_draw_outcome_parses() {
    let overlay = r#"
execution:
  outcome:
    seeded_draw:
      take_profit_weight: 0.5
      stop_loss_weight: 0.3
      flat_weight: 0.2
"#;
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, overlay]).unwrap();
    // Objects merge, so forward_scan survives next to seeded_draw: two variants.
    assert!(backtest_config(&loaded).is_err());

    let replaced = BASE_YAML.replace(
        "    forward_scan:\n      max_hold_bars: 20\n",
        concat!(
            "    seeded_draw:\n",
            "      take_profit_weight: 0.5\n",
            "      stop_loss_weight: 0.3\n",
            "      flat_weight: 0.2\n",
        ),
    );
    let loaded = load_layered_yaml_from_strings(&[replaced.as_str()]).unwrap();
    let cfg = backtest_config(&loaded).expect("seeded draw config");
    assert_eq!(
        cfg.execution.outcome,
        OutcomeModel::SeededDraw {
            take_profit_weight: 0.5,
            stop_loss_weight: 0.3,
            flat_weight: 0.2,
        }
    );
}

#[test]
fn layered_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let over = dir.path().join("override.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&over, "run:\n  symbol: EURUSD\n").unwrap();

    let loaded = load_layered_yaml(&[&base, &over]).expect("load");
    let cfg = backtest_config(&loaded).expect("config");
    assert_eq!(cfg.symbol, "EURUSD");
    assert_eq!(cfg.starting_equity, 100_000.0);
}
