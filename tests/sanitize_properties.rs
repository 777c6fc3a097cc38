use proptest::prelude::*;
use rich_note::sanitize::{Profile, sanitize};

// Strategy for markup-ish fragments: nested known/unknown/dangerous tags
// around short text runs.
fn fragment_strategy() -> impl Strategy<Value = String> {
    "[a-z ]{0,8}".prop_recursive(3, 24, 4, |inner| {
        (
            prop::sample::select(vec![
                "b", "i", "p", "span", "em", "article", "font", "script", "style", "marquee",
            ]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, children)| format!("<{tag}>{}</{tag}>", children.concat()))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(proptest_config::cases()))]

    #[test]
    fn test_sanitize_is_idempotent_per_profile(html in fragment_strategy()) {
        for profile in [Profile::save(), Profile::external_paste()] {
            let once = sanitize(&html, &profile);
            let twice = sanitize(&once, &profile);
            prop_assert_eq!(&once, &twice, "profile {}", profile.name());
        }
    }

    #[test]
    fn test_sanitize_never_emits_disallowed_tags(html in fragment_strategy()) {
        let out = sanitize(&html, &Profile::external_paste());
        for tag in ["<script", "<style", "<article", "<font", "<marquee", "<iframe"] {
            prop_assert!(!out.contains(tag), "found {tag} in {out}");
        }
    }

    #[test]
    fn test_sanitize_never_panics_on_arbitrary_input(html in "\\PC{0,64}") {
        let _ = sanitize(&html, &Profile::save());
        let _ = sanitize(&html, &Profile::external_paste());
    }

    #[test]
    fn test_external_output_is_a_subset_of_save_output_tags(html in fragment_strategy()) {
        // Everything the strict profile keeps, the save profile keeps too.
        let external = sanitize(&html, &Profile::external_paste());
        let resaved = sanitize(&external, &Profile::save());
        prop_assert_eq!(external, resaved);
    }
}
