//! # Configuration Tests
//!
//! Defaults, partial JSON overrides and validation failures.

use pretty_assertions::assert_eq;
use rigel_core::common::error::ConfigError;
use rigel_core::config::*;
use rstest::rstest;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.system.num_cores, 1);
    assert_eq!(config.system.threads_per_core, 1);
    assert_eq!(config.pipeline.issue_width, 2);
    assert_eq!(config.pipeline.bypass, BypassPolicy::Full);
    assert!(config.pipeline.multi_cycle_alu);
    assert!(!config.pipeline.non_blocking_memory);
    assert_eq!(config.registers.scalar_regs, 32);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = Config::from_json(
        r#"{
            "system": { "num_cores": 2, "threads_per_core": 4 },
            "pipeline": { "thread_switch": "SwitchOnMiss", "non_blocking_memory": true }
        }"#,
    )
    .unwrap();
    assert_eq!(config.system.num_cores, 2);
    assert_eq!(config.total_threads(), 8);
    assert_eq!(config.pipeline.thread_switch, ThreadSwitchPolicy::SwitchOnMiss);
    assert!(config.pipeline.non_blocking_memory);
    assert_eq!(config.pipeline.issue_width, 2);
    assert_eq!(config.general.max_cycles, GeneralConfig::default().max_cycles);
}

#[test]
fn test_malformed_json_is_a_parse_error() {
    let err = Config::from_json("{ \"system\": ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[rstest]
#[case(r#"{ "pipeline": { "issue_width": 3 } }"#, "pipeline.issue_width")]
#[case(r#"{ "pipeline": { "issue_width": 0 } }"#, "pipeline.issue_width")]
#[case(r#"{ "system": { "num_cores": 0 } }"#, "system.num_cores")]
#[case(r#"{ "registers": { "scalar_regs": 64 } }"#, "registers.scalar_regs")]
#[case(r#"{ "memory": { "line_bytes": 24 } }"#, "memory.line_bytes")]
#[case(r#"{ "pipeline": { "vector_lanes_per_cycle": 5 } }"#, "pipeline.vector_lanes_per_cycle")]
fn test_invalid_values_are_rejected(#[case] json: &str, #[case] field: &str) {
    let err = Config::from_json(json).unwrap_err();
    assert!(
        err.to_string().contains(field),
        "error `{err}` does not name `{field}`"
    );
}

#[test]
fn test_cluster_of_groups_cores() {
    let mut config = Config::default();
    config.system.num_cores = 16;
    config.system.cores_per_cluster = 8;
    assert_eq!(config.cluster_of(0), 0);
    assert_eq!(config.cluster_of(7), 0);
    assert_eq!(config.cluster_of(8), 1);
}
