//! # Statistics Report Tests

use pretty_assertions::assert_eq;
use rigel_core::config::Config;
use rigel_core::stats::{SimStats, Stat};
use serde_json::Value;

use crate::common::harness::TestContext;

#[test]
fn test_json_report_after_run() {
    let mut ctx = TestContext::new(".word 0x100 3\nldw r1, r0, 0x100\naddi r2, r1, 1\nhlt\n");
    ctx.run();

    let json: Value = serde_json::from_str(&ctx.sim.stats().to_json().unwrap()).unwrap();
    let counters = &json["counters"];
    assert_eq!(counters["sim.cycles"].as_u64(), Some(ctx.sim.cycle()));
    assert_eq!(counters["sim.insts"].as_u64(), Some(3));
    assert_eq!(counters["mix.load"].as_u64(), Some(1));
    assert!(json["mem_stall"].get("l1d_pending").is_some());
    assert!(json["mem_stall"].get("no_stall").is_none());

    let ipc = json["ipc"].as_f64().unwrap();
    assert!(ipc > 0.0 && ipc <= 2.0);
    assert!(!json["mem_histogram"].as_object().unwrap().is_empty());
}

#[test]
fn test_histogram_follows_configured_line_size() {
    let mut config = Config::default();
    config.memory.line_bytes = 64;
    let mut ctx = TestContext::with_config(
        ".word 0x104 1 2\n\
         ldw r1, r0, 0x104\n\
         ldw r2, r0, 0x13c\n\
         stw r1, r0, 0x140\n\
         hlt\n",
        config,
    );
    ctx.run();

    let histogram = ctx.sim.stats().mem_histogram();
    assert_eq!(histogram.get(&0x100), Some(&2));
    assert_eq!(histogram.get(&0x140), Some(&1));
    assert_eq!(histogram.len(), 2);
}

#[test]
fn test_report_names_are_unique() {
    let mut names: Vec<&str> = Stat::ALL.iter().map(|s| s.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), Stat::COUNT);
}

#[test]
fn test_sections_render_selected_counters() {
    let mut stats = SimStats::default();
    stats.add(Stat::BranchMispredict, 4);
    let text = stats.render_sections(&["branch".to_string(), "summary".to_string()]);
    assert!(text.contains("branch.mispredicted"));
    assert!(text.contains("sim.ipc"));
    assert!(!text.contains("stall.reg_dependency"));
    assert!(!text.contains("mem.stall."));

    let all = stats.render_sections(&[]);
    for stat in Stat::ALL {
        assert!(all.contains(stat.name()), "missing {}", stat.name());
    }
}

#[test]
fn test_ipc_is_zero_before_any_cycle() {
    let stats = SimStats::default();
    assert_eq!(stats.ipc(), 0.0);
}
