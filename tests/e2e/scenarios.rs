// End-to-end checks of the reference masking scenarios

use crate::common::harness::ShelterTestHarness;
use shelter::state::Feature;

#[test]
fn test_partial_mask_keeps_start_and_end() {
    let mut harness = ShelterTestHarness::with_json_config(
        r#"{ "mask": { "partial_mode": { "show_start": 3, "show_end": 3, "min_mask": 3 } } }"#,
    );
    let buffer = harness.open("/project/.env", "JWT_SECRET=my-super-secret-key");

    // 19 characters: 3 shown at each end, 13 masked
    assert_eq!(harness.screen(buffer), "JWT_SECRET=my-*************key");
    assert_eq!(
        harness.shelter().mask_value(
            "my-super-secret-key",
            Feature::Completion,
            Some("JWT_SECRET"),
            Some(".env")
        ),
        "my-*************key"
    );
}

#[test]
fn test_quoted_partial_mask_preserves_quotes() {
    let mut harness = ShelterTestHarness::with_json_config(
        r#"{ "mask": { "partial_mode": { "show_start": 3, "show_end": 3, "min_mask": 3 } } }"#,
    );
    let buffer = harness.open("/project/.env", r#"AUTH_TOKEN="bearer 1234567890""#);

    assert_eq!(harness.screen(buffer), r#"AUTH_TOKEN="bea***********890""#);
}

#[test]
fn test_backslash_continuation_masks_each_line() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "LONG_VAR=part1\\\npart2");

    assert_eq!(harness.screen_line(buffer, 1), "LONG_VAR=*****\\");
    assert_eq!(harness.screen_line(buffer, 2), "*****");
}

#[test]
fn test_inline_comment_pair_masked_independently() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "TEST_VAR=value   # KEY2=secret2");
    assert_eq!(harness.screen(buffer), "TEST_VAR=*****   # KEY2=*******");

    let mut harness = ShelterTestHarness::with_json_config(r#"{ "mask": { "skip_comments": true } }"#);
    let buffer = harness.open("/project/.env", "TEST_VAR=value   # KEY2=secret2");
    assert_eq!(harness.screen(buffer), "TEST_VAR=*****   # KEY2=secret2");
}

#[test]
fn test_key_patterns_override_default_mode() {
    let mut harness = ShelterTestHarness::with_json_config(
        r#"{ "mask": {
            "patterns": { "*_TOKEN": "full", "*_PUBLIC_*": "none" },
            "default_mode": "none"
        } }"#,
    );
    let buffer = harness.open(
        "/project/.env",
        "API_TOKEN=abc\nMY_PUBLIC_URL=http://x\nOTHER=value",
    );

    assert_eq!(
        harness.screen(buffer),
        "API_TOKEN=***\nMY_PUBLIC_URL=http://x\nOTHER=value"
    );
}
