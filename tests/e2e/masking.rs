// End-to-end tests for how sheltered env files look and that their text never changes

use crate::common::fixtures::TestFixture;
use crate::common::harness::ShelterTestHarness;

const SAMPLE_ENV: &str = r#"# Database settings
DB_HOST=localhost
DB_PASSWORD="hunter2 hunter2"
export API_TOKEN='abc123'
EMPTY=
MULTI="line one
line two"
# example: OLD_KEY=legacy
"#;

#[test]
fn test_sample_env_file_rendering() {
    let fixture = TestFixture::new(".env", SAMPLE_ENV).unwrap();
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open(&fixture.path, &fixture.read_content().unwrap());

    insta::assert_snapshot!(harness.screen(buffer), @r#"
    # Database settings
    DB_HOST=*********
    DB_PASSWORD="***************"
    export API_TOKEN='******'
    EMPTY=
    MULTI="********
    ********"
    # example: OLD_KEY=******
    "#);
}

/// Masking is display-only: neither the buffer nor the file on disk changes
#[test]
fn test_sheltering_never_mutates_text() {
    let fixture = TestFixture::new(".env.local", SAMPLE_ENV).unwrap();
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open(&fixture.path, &fixture.read_content().unwrap());
    let before = harness.buffer_text(buffer);

    harness.reshelter(buffer);
    harness.set_cursor(buffer, 2);
    harness.reveal_current_line(buffer);
    harness.move_cursor(buffer, 5);
    harness.unshelter(buffer);

    assert_eq!(harness.buffer_text(buffer), before);
    assert_eq!(fixture.read_content().unwrap(), SAMPLE_ENV);
    assert_eq!(harness.screen(buffer), before);
}

/// Same content and config always give byte-identical overlays, cached or not
#[test]
fn test_overlays_are_idempotent() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", SAMPLE_ENV);
    let first = harness.overlays(buffer).to_vec();
    assert!(!first.is_empty());

    harness.reshelter(buffer);
    assert_eq!(harness.overlays(buffer), first.as_slice());

    harness.shelter_mut().clear_caches();
    harness.reshelter(buffer);
    assert_eq!(harness.overlays(buffer), first.as_slice());
}

#[test]
fn test_non_env_files_are_left_alone() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/src/main.rs", "const KEY=value;");

    assert!(harness.overlays(buffer).is_empty());
    assert!(!harness.shelter().is_sheltered(buffer));
    assert_eq!(harness.completion_enabled(buffer), None);
}

#[test]
fn test_custom_env_file_patterns() {
    let mut harness = ShelterTestHarness::with_json_config(r#"{ "env_file_patterns": ["*.secrets"] }"#);
    let secrets = harness.open("/project/prod.secrets", "KEY=value");
    let env = harness.open("/project/.env", "KEY=value");

    assert_eq!(harness.screen(secrets), "KEY=*****");
    assert_eq!(harness.screen(env), "KEY=value");
}

#[test]
fn test_fixed_mask_length() {
    let mut harness = ShelterTestHarness::with_json_config(r##"{ "mask": { "mask_length": 4, "mask_char": "#" } }"##);
    let buffer = harness.open("/project/.env", "SHORT=ab\nLONG=abcdefgh");

    assert_eq!(harness.screen_line(buffer, 1), "SHORT=##");
    assert_eq!(harness.screen_line(buffer, 2), "LONG=####    ");
}

#[test]
fn test_source_patterns() {
    let mut harness = ShelterTestHarness::with_json_config(r#"{ "mask": { "sources": { ".env.example": "none" } } }"#);
    let example = harness.open("/project/.env.example", "KEY=placeholder");
    let real = harness.open("/project/.env", "KEY=placeholder");

    assert_eq!(harness.screen(example), "KEY=placeholder");
    assert_eq!(harness.screen(real), "KEY=***********");
}

#[test]
fn test_unterminated_quote_masks_to_end_of_file() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "KEY=\"abc\ndef");

    harness.assert_screen_not_contains(buffer, "abc");
    harness.assert_screen_not_contains(buffer, "def");
}

#[test]
fn test_malformed_lines_are_skipped() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "not an assignment\n=novalue\nGOOD=yes");

    assert_eq!(
        harness.screen(buffer),
        "not an assignment\n=novalue\nGOOD=***"
    );
}

#[test]
fn test_duplicate_keys_each_masked() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "KEY=first\nKEY=second-value");

    assert_eq!(harness.screen(buffer), "KEY=*****\nKEY=************");
}
