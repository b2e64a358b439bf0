//! High-resolution URL rewriting.
//!
//! An ordered table of `(predicate, transform)` rules. The first rule whose
//! predicate matches is applied; URLs no rule matches pass through. Every
//! transform is a pure function of the URL string and idempotent.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

struct RewriteRule {
    name: &'static str,
    matches: fn(&str) -> bool,
    transform: fn(&str) -> Option<String>,
}

const RULES: &[RewriteRule] = &[
    RewriteRule {
        name: "pinterest-originals",
        matches: is_pinterest_thumbnail,
        transform: pinterest_originals,
    },
    RewriteRule {
        name: "unsplash-full-size",
        matches: is_unsplash,
        transform: unsplash_full_size,
    },
];

/// Unsplash query parameters that only select a resized rendition.
const UNSPLASH_SIZING_PARAMS: &[&str] = &["w", "h", "fit", "crop", "q", "dpr", "auto", "fm", "cs"];

const UNSPLASH_HOST: &str = "images.unsplash.com";

/// Rewrites `url` to a higher-resolution variant when a rule applies.
pub fn rewrite_high_res(url: &str) -> String {
    for rule in RULES {
        if (rule.matches)(url) {
            return match (rule.transform)(url) {
                Some(rewritten) => {
                    tracing::debug!(rule = rule.name, from = url, to = %rewritten, "Rewrote image URL");
                    rewritten
                }
                None => url.to_string(),
            };
        }
    }
    url.to_string()
}

fn pinterest_thumbnail_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i)(https?://i\.pinimg\.com/)\d+x\d*/").ok())
        .as_ref()
}

fn is_pinterest_thumbnail(url: &str) -> bool {
    pinterest_thumbnail_re().is_some_and(|re| re.is_match(url))
}

fn pinterest_originals(url: &str) -> Option<String> {
    let re = pinterest_thumbnail_re()?;
    Some(re.replace(url, "${1}originals/").into_owned())
}

fn is_unsplash(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.eq_ignore_ascii_case(UNSPLASH_HOST)))
        .unwrap_or(false)
}

fn unsplash_full_size(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = pairs
        .iter()
        .filter(|(k, _)| !UNSPLASH_SIZING_PARAMS.contains(&k.as_str()))
        .collect();

    // Nothing to strip: hand back the input untouched.
    if kept.len() == pairs.len() {
        return None;
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pinterest_thumbnail_becomes_original() {
        assert_eq!(
            rewrite_high_res("https://i.pinimg.com/736x/0f/3a/9c/0f3a9c.jpg"),
            "https://i.pinimg.com/originals/0f/3a/9c/0f3a9c.jpg"
        );
        assert_eq!(
            rewrite_high_res("https://i.pinimg.com/236x350/ab/cd.png"),
            "https://i.pinimg.com/originals/ab/cd.png"
        );
    }

    #[test]
    fn test_pinterest_original_is_untouched() {
        let url = "https://i.pinimg.com/originals/0f/3a/9c/0f3a9c.jpg";
        assert_eq!(rewrite_high_res(url), url);
    }

    #[test]
    fn test_unsplash_sizing_params_are_stripped() {
        assert_eq!(
            rewrite_high_res("https://images.unsplash.com/photo-1?w=400&q=80&fm=jpg&ixid=abc"),
            "https://images.unsplash.com/photo-1?ixid=abc"
        );
        assert_eq!(
            rewrite_high_res("https://images.unsplash.com/photo-2?auto=format&fit=crop&w=800"),
            "https://images.unsplash.com/photo-2"
        );
    }

    #[test]
    fn test_unsplash_without_sizing_params_is_untouched() {
        let url = "https://images.unsplash.com/photo-3?ixlib=rb-4.0.3";
        assert_eq!(rewrite_high_res(url), url);
    }

    #[test]
    fn test_other_hosts_pass_through() {
        let url = "https://cdn.example.com/736x/image.jpg?w=400";
        assert_eq!(rewrite_high_res(url), url);
        assert_eq!(rewrite_high_res("not a url"), "not a url");
    }

    fn arb_image_url() -> impl Strategy<Value = String> {
        let pinterest = ("[0-9]{2,4}", "[0-9]{0,4}", "[a-z0-9/]{1,20}")
            .prop_map(|(w, h, rest)| format!("https://i.pinimg.com/{}x{}/{}.jpg", w, h, rest));
        let unsplash = proptest::collection::vec(
            (
                prop_oneof![Just("w"), Just("q"), Just("fm"), Just("ixid"), Just("dpr"), Just("s")],
                "[a-z0-9]{1,6}",
            ),
            0..5,
        )
        .prop_map(|params| {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("https://images.unsplash.com/photo-9?{}", query.join("&"))
        });
        prop_oneof![pinterest, unsplash, "https?://[a-z]{1,8}\\.com/[a-z0-9]{0,10}"]
    }

    proptest! {
        #[test]
        fn rewrite_is_idempotent(url in arb_image_url()) {
            let once = rewrite_high_res(&url);
            prop_assert_eq!(rewrite_high_res(&once), once.clone());
        }

        #[test]
        fn rewrite_is_deterministic(url in arb_image_url()) {
            prop_assert_eq!(rewrite_high_res(&url), rewrite_high_res(&url));
        }
    }
}
