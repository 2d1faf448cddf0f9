use super::*;

#[test]
fn test_wrap_text() {
    let lines = wrap_text("This is a test string that is too long to fit", 20);
    assert!(lines.iter().all(|l| display_width(l) <= 20));
    assert_eq!(lines.join(" "), "This is a test string that is too long to fit");

    let lines = wrap_text("short", 20);
    assert_eq!(lines, vec!["short"]);

    // Hard split of a single over-long word
    let lines = wrap_text(&"x".repeat(25), 10);
    assert!(lines.iter().all(|l| display_width(l) <= 10));
}

#[test]
fn test_wrap_text_preserves_line_breaks() {
    let lines = wrap_text("first\nsecond", 20);
    assert_eq!(lines, vec!["first", "second"]);
}

#[test]
fn test_fit_width_pads_short_text() {
    assert_eq!(fit_width("abc", 6), "abc   ");
    assert_eq!(fit_width("", 3), "   ");
}

#[test]
fn test_fit_width_truncates_with_ellipsis() {
    let out = fit_width("a long title that overflows", 10);
    assert_eq!(display_width(&out), 10);
    assert!(out.ends_with('…'));
}

#[test]
fn test_short_id() {
    assert_eq!(short_id("0d2ce1dd-9a99-4c3a-8b47-1ea4d71a0e3c"), "0d2ce1dd");
    assert_eq!(short_id("abc"), "abc");
}

#[test]
fn test_categorize_timestamp() {
    let now = chrono::Utc::now();
    assert_eq!(categorize_timestamp(now, now), DateGroup::Today);
    assert_eq!(
        categorize_timestamp(now, now - chrono::Duration::days(1)),
        DateGroup::Yesterday
    );
    assert_eq!(
        categorize_timestamp(now, now - chrono::Duration::days(5)),
        DateGroup::Last7Days
    );
    assert_eq!(
        categorize_timestamp(now, now - chrono::Duration::days(20)),
        DateGroup::Last30Days
    );
    assert_eq!(
        categorize_timestamp(now, now - chrono::Duration::days(90)),
        DateGroup::Older
    );
    // A timestamp slightly in the future still reads as today
    assert_eq!(
        categorize_timestamp(now, now + chrono::Duration::hours(1)),
        DateGroup::Today
    );
}

#[test]
fn test_date_range_cycle() {
    let mut range = DateRange::All;
    range = range.next();
    assert_eq!(range, DateRange::Today);
    range = range.next();
    assert_eq!(range, DateRange::Last7Days);
    range = range.next();
    assert_eq!(range, DateRange::Last30Days);
    range = range.next();
    assert_eq!(range, DateRange::All);
}

#[test]
fn test_date_range_since() {
    let now = chrono::Utc::now();
    assert_eq!(DateRange::All.since(now), None);

    let today = DateRange::Today.since(now).unwrap();
    assert!(today <= now);
    assert!(now - today < chrono::Duration::days(1));

    let week = DateRange::Last7Days.since(now).unwrap();
    assert_eq!(week, now - chrono::Duration::days(7));
}
