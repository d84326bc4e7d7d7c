// End-to-end tests for cache lifecycle: statistics, eviction, expiry and timers

use crate::common::harness::ShelterTestHarness;
use shelter::config::ShelterConfig;
use shelter::state::Feature;
use std::time::Duration;

const ENV: &str = "A=1\nB=2\nC=3";

#[test]
fn test_reshelter_hits_extmark_cache() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", ENV);
    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.parsed.entries, 1);
    assert_eq!(stats.extmarks.entries, 1);
    assert_eq!(stats.masks.entries, 3);

    harness.reshelter(buffer);
    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.extmarks.hits, 1);
    assert_eq!(stats.extmarks.entries, 1);
}

#[test]
fn test_edit_clears_caches() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", ENV);
    harness.edit(buffer, "A=1");

    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.parsed.entries, 1);
    assert_eq!(stats.masks.entries, 1);
    assert_eq!(harness.screen(buffer), "A=*");
}

#[test]
fn test_closing_buffer_evicts_its_entries() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", ENV);
    let other = harness.open("/project/.env.local", "X=9");

    harness.close(buffer);
    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.parsed.entries, 1);
    assert_eq!(stats.extmarks.entries, 1);
    assert!(harness.shelter().is_sheltered(other));
}

#[test]
fn test_cleanup_timer_expires_caches() {
    let mut harness = ShelterTestHarness::new();
    harness.open("/project/.env", ENV);
    assert_eq!(harness.active_timers().len(), 1);

    harness.advance_time(Duration::from_secs(301));
    harness.fire_timers();

    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.parsed.entries, 0);
    assert_eq!(stats.parsed.expirations, 1);
    assert_eq!(stats.masks.expirations, 3);
}

#[test]
fn test_ttl_checked_lazily_without_timer() {
    let mut harness =
        ShelterTestHarness::with_json_config(r#"{ "cache": { "cleanup_interval_secs": null, "ttl_secs": 10 } }"#);
    assert!(harness.active_timers().is_empty());
    let buffer = harness.open("/project/.env", ENV);

    harness.advance_time(Duration::from_secs(11));
    harness.reshelter(buffer);

    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.extmarks.hits, 0);
    assert_eq!(stats.extmarks.expirations, 1);
    assert_eq!(harness.screen(buffer), "A=*\nB=*\nC=*");
}

#[test]
fn test_shutdown_stops_timer_and_is_idempotent() {
    let mut harness = ShelterTestHarness::new();
    harness.open("/project/.env", ENV);

    harness.shutdown();
    assert!(harness.active_timers().is_empty());
    assert_eq!(harness.shelter().cache_stats().parsed.entries, 0);

    harness.shutdown();
    assert!(harness.active_timers().is_empty());
}

#[test]
fn test_reconfigure_replaces_timer_and_recomputes() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", ENV);
    let old_timers = harness.active_timers();

    let config = ShelterConfig::from_json_str(r##"{ "mask": { "mask_char": "#" } }"##).unwrap();
    harness.reconfigure(config);

    let new_timers = harness.active_timers();
    assert_eq!(new_timers.len(), 1);
    assert_ne!(new_timers, old_timers);
    assert_eq!(harness.screen(buffer), "A=#\nB=#\nC=#");
}

#[test]
fn test_memory_ceiling_keeps_caches_small() {
    let mut harness = ShelterTestHarness::with_json_config(r#"{ "cache": { "max_memory_bytes": 1 } }"#);
    let buffer = harness.open("/project/.env", ENV);

    let stats = harness.shelter().cache_stats();
    assert_eq!(stats.parsed.entries, 0);
    assert!(stats.parsed.evictions >= 1);
    // Caching is an optimisation only; output is unaffected
    assert_eq!(harness.screen(buffer), "A=*\nB=*\nC=*");
}

/// A previewed value that moves on its line is still fully covered
#[test]
fn test_preview_masks_follow_moved_value() {
    let mut harness = ShelterTestHarness::new();
    let shelter = harness.shelter_mut();

    let first = shelter.mask_lines(Feature::Files, &["KEY=secret1"], Some("/p/.env"));
    assert_eq!(first, vec!["KEY=*******"]);

    let moved = shelter.mask_lines(Feature::Files, &["export KEY=secret1"], Some("/p/.env"));
    assert_eq!(moved, vec!["export KEY=*******"]);

    let spaced = shelter.mask_lines(Feature::Files, &["KEY =  secret1"], Some("/p/.env"));
    assert_eq!(spaced, vec!["KEY =  *******"]);
}
