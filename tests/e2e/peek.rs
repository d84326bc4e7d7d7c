// End-to-end tests for revealing the cursor line

use crate::common::harness::ShelterTestHarness;
use shelter::state::Feature;

#[test]
fn test_reveal_current_line_until_cursor_moves() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "A=alpha\nB=bravo");

    harness.set_cursor(buffer, 2);
    assert!(harness.reveal_current_line(buffer));
    assert_eq!(harness.screen(buffer), "A=*****\nB=bravo");

    // Moving within the revealed line keeps it visible
    harness.move_cursor(buffer, 2);
    assert_eq!(harness.screen(buffer), "A=*****\nB=bravo");

    harness.move_cursor(buffer, 1);
    assert_eq!(harness.screen(buffer), "A=*****\nB=*****");
}

#[test]
fn test_reveal_covers_whole_multi_line_value() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "CERT=\"abc\ndef\"\nK=v");

    harness.set_cursor(buffer, 2);
    assert!(harness.reveal_current_line(buffer));
    assert_eq!(harness.screen(buffer), "CERT=\"abc\ndef\"\nK=*");

    harness.move_cursor(buffer, 1);
    assert_eq!(harness.screen(buffer), "CERT=\"abc\ndef\"\nK=*");

    harness.leave(buffer);
    assert_eq!(harness.screen(buffer), "CERT=\"***\n***\"\nK=*");
}

#[test]
fn test_reveal_requires_peek_feature() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "A=alpha");

    harness.toggle_feature(Feature::Peek);
    assert!(!harness.reveal_current_line(buffer));
    assert_eq!(harness.screen(buffer), "A=*****");
}

#[test]
fn test_disabling_peek_hides_revealed_line() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/.env", "A=alpha");

    assert!(harness.reveal_current_line(buffer));
    assert_eq!(harness.screen(buffer), "A=alpha");

    harness.toggle_feature(Feature::Peek);
    assert_eq!(harness.screen(buffer), "A=*****");
}

#[test]
fn test_reveal_in_unsheltered_buffer_does_nothing() {
    let mut harness = ShelterTestHarness::new();
    let buffer = harness.open("/project/notes.txt", "A=alpha");
    assert!(!harness.reveal_current_line(buffer));
}
