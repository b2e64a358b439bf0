//! Candidate URL resolution for hovered page elements.
//!
//! Page inspection goes through the `CandidateResolver` capability trait.
//! `ElementSnapshot` is a synthetic element tree that implements it, used by
//! the command-line front end and the tests.

use serde::{Deserialize, Serialize};

/// Position of an element relative to the hovered element, as child indices.
/// The empty path is the hovered element itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementPath(pub Vec<usize>);

impl ElementPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ElementPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<hovered>");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "<hovered>/{}", parts.join("/"))
    }
}

/// A resolved hover candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    /// Class attribute of the hovered element.
    pub class: Option<String>,
    /// Id attribute of the hovered element.
    pub id: Option<String>,
    /// Element that receives the highlight.
    pub highlight: ElementPath,
}

/// Read access to a hovered element and its subtree.
pub trait CandidateResolver {
    fn is_image(&self) -> bool;
    fn image_source(&self) -> Option<&str>;
    fn class_attr(&self) -> Option<&str>;
    fn id_attr(&self) -> Option<&str>;
    /// Computed `background-image` style value, if any.
    fn background_image(&self) -> Option<&str>;
    /// First image element below this one, depth-first in document order.
    fn first_descendant_image(&self) -> Option<(ElementPath, &Self)>;

    /// Resolves the candidate URL for this element.
    ///
    /// An image element resolves to its own source or nothing. Any other
    /// element tries the first descendant image source, then the computed
    /// background image.
    fn resolve_candidate(&self) -> Option<Candidate>
    where
        Self: Sized,
    {
        let descendant = self.first_descendant_image();
        let highlight = if self.is_image() {
            ElementPath::root()
        } else {
            descendant
                .as_ref()
                .map(|(path, _)| path.clone())
                .unwrap_or_default()
        };

        // An image element answers with its own source or not at all.
        let url = if self.is_image() {
            non_empty(self.image_source())?
        } else {
            descendant
                .as_ref()
                .and_then(|(_, img)| non_empty(img.image_source()))
                .or_else(|| self.background_image().and_then(parse_css_url))?
        };

        Some(Candidate {
            url,
            class: self.class_attr().map(str::to_string),
            id: self.id_attr().map(str::to_string),
            highlight,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Extracts the URL from a CSS `url(...)` value.
///
/// Accepts double-quoted, single-quoted, and bare forms. `none` and any
/// other value yield `None`.
pub fn parse_css_url(value: &str) -> Option<String> {
    let inner = value
        .trim()
        .strip_prefix("url(")?
        .strip_suffix(')')?
        .trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| inner.strip_prefix(*q).and_then(|s| s.strip_suffix(*q)))
        .unwrap_or(inner);
    non_empty(Some(unquoted))
}

/// Synthetic page element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub children: Vec<ElementSnapshot>,
}

impl ElementSnapshot {
    pub fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn image(src: &str) -> Self {
        Self {
            tag: "img".to_string(),
            src: Some(src.to_string()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_background(mut self, value: &str) -> Self {
        self.background_image = Some(value.to_string());
        self
    }

    pub fn with_child(mut self, child: ElementSnapshot) -> Self {
        self.children.push(child);
        self
    }

    fn find_image(&self, path: &mut Vec<usize>) -> Option<&ElementSnapshot> {
        for (index, child) in self.children.iter().enumerate() {
            path.push(index);
            if child.is_image() {
                return Some(child);
            }
            if let Some(found) = child.find_image(path) {
                return Some(found);
            }
            path.pop();
        }
        None
    }
}

impl CandidateResolver for ElementSnapshot {
    fn is_image(&self) -> bool {
        self.tag.eq_ignore_ascii_case("img")
    }

    fn image_source(&self) -> Option<&str> {
        self.src.as_deref()
    }

    fn class_attr(&self) -> Option<&str> {
        self.class.as_deref()
    }

    fn id_attr(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn background_image(&self) -> Option<&str> {
        self.background_image.as_deref()
    }

    fn first_descendant_image(&self) -> Option<(ElementPath, &Self)> {
        let mut path = Vec::new();
        let found = self.find_image(&mut path)?;
        Some((ElementPath(path), found))
    }
}
