//! Content filter for hover candidates.

const LOGO_MARKER: &str = "logo";

/// Returns true when the candidate looks like a site logo or icon.
///
/// Matches the case-insensitive substring "logo" in the resolved URL, the
/// hovered element's class attribute, or its id attribute.
pub fn is_logo(url: &str, class: Option<&str>, id: Option<&str>) -> bool {
    [Some(url), class, id]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(LOGO_MARKER))
}
