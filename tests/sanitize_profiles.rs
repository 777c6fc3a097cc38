use rich_note::chip::{ChipPayload, chip_html};
use rich_note::sanitize::{Profile, sanitize};

#[test]
fn test_external_paste_strips_event_handlers_and_style() {
    let input = "<p onclick=\"steal()\" style=\"color:red\" class=\"x\">hi</p>";
    assert_eq!(sanitize(input, &Profile::external_paste()), "<p>hi</p>");
}

#[test]
fn test_external_paste_keeps_links_and_basic_formatting() {
    let input = "<p><a href=\"https://example.com\" title=\"t\">link</a> <b>bold</b></p>";
    assert_eq!(sanitize(input, &Profile::external_paste()), input);
}

#[test]
fn test_script_and_style_content_never_leaks() {
    for tag in ["script", "style", "iframe", "noscript"] {
        let input = format!("before<{tag}>secret()</{tag}>after");
        let out = sanitize(&input, &Profile::save());
        assert_eq!(out, "beforeafter", "tag {tag}");
    }
}

#[test]
fn test_unterminated_tag_degrades_to_text_once() {
    assert_eq!(sanitize("a <b", &Profile::external_paste()), "a &lt;b");
}

#[test]
fn test_unknown_wrappers_unwrap_preserving_content() {
    let input = "<article><section><p>kept <b>text</b></p></section></article>";
    assert_eq!(
        sanitize(input, &Profile::external_paste()),
        "<p>kept <b>text</b></p>"
    );
}

#[test]
fn test_save_profile_round_trips_every_chip_kind() {
    let payloads = [
        ChipPayload::PullRequest {
            number: 42,
            title: "Fix bug".to_string(),
            url: "https://x/pull/42".to_string(),
            state: Some("merged".to_string()),
            source_id: None,
        },
        ChipPayload::Task {
            id: "T-9".to_string(),
            title: "Ship it".to_string(),
            author: "casey".to_string(),
            epic: "perf".to_string(),
        },
        ChipPayload::DocumentReference {
            title: "Runbook".to_string(),
            icon_src: Some("https://x/icon.png".to_string()),
        },
    ];
    for payload in payloads {
        let html = chip_html(&payload);
        let cleaned = sanitize(&html, &Profile::save());
        assert_eq!(cleaned, sanitize(&cleaned, &Profile::save()));
        assert!(cleaned.contains("contenteditable=\"false\""));
        assert!(cleaned.contains("data-type="));
        assert!(cleaned.contains("data-source-id="));
    }
}

#[test]
fn test_external_paste_downgrades_chips_to_plain_links() {
    let html = chip_html(&ChipPayload::Task {
        id: "T-1".to_string(),
        title: "x".to_string(),
        author: "a".to_string(),
        epic: "e".to_string(),
    });
    let out = sanitize(&html, &Profile::external_paste());
    assert!(!out.contains("data-type"));
    assert!(!out.contains("contenteditable"));
    // The label text survives.
    assert!(out.contains("T-1"));
}

#[test]
fn test_plain_text_passes_through_unchanged() {
    assert_eq!(
        sanitize("just words, no markup", &Profile::save()),
        "just words, no markup"
    );
}

#[test]
fn test_attribute_names_are_case_insensitive() {
    let input = "<p ONCLICK=\"x()\">hi</p>";
    assert_eq!(sanitize(input, &Profile::external_paste()), "<p>hi</p>");
}
