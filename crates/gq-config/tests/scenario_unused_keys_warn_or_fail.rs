use gq_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

const BASE_YAML: &str = include_str!("../config/default.yaml");

#[test]
fn reference_profile_is_clean_for_walk_forward() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::WalkForward, &loaded.config_json, UnusedKeyPolicy::Fail)
            .expect("clean");
    assert!(report.is_clean());
}

#[test]
fn walk_forward_section_is_unused_in_backtest_mode() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Backtest, &loaded.config_json, UnusedKeyPolicy::Warn)
            .expect("warn never errors");
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/walk_forward/is_window".to_string(),
            "/walk_forward/oos_window".to_string(),
            "/walk_forward/parallel".to_string(),
        ]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let overlay = "reporting:\n  chart: true\n";
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML, overlay]).unwrap();
    let err = report_unused_keys(
        ConfigMode::WalkForward,
        &loaded.config_json,
        UnusedKeyPolicy::Fail,
    )
    .expect_err("unused key");
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("/reporting/chart"));
}
