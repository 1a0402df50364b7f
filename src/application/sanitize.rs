use std::collections::{HashMap, HashSet};

use ammonia::Builder as AmmoniaBuilder;

/// Sanitiser for CMS rich-text fields rendered unescaped.
pub(crate) fn build_rich_text_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "p",
        "br",
        "hr",
        "ul",
        "ol",
        "li",
        "a",
        "strong",
        "em",
        "u",
        "s",
        "code",
        "pre",
        "blockquote",
        "table",
        "thead",
        "tbody",
        "tr",
        "th",
        "td",
        "img",
        "figure",
        "figcaption",
        "div",
        "span",
    ]);
    builder.tags(tags);

    builder.generic_attributes(HashSet::from(["class"]));

    // `rel` is owned by ammonia's link_rel so it is not listed here.
    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", HashSet::from(["href", "target"])),
        ("img", HashSet::from(["src", "alt", "width", "height"])),
    ]);
    builder.tag_attributes(tag_attributes);

    builder
}

/// Sanitise one rich-text fragment; blank input yields `None`.
pub(crate) fn sanitize_fragment(builder: &AmmoniaBuilder<'static>, html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let cleaned = builder.clean(html).to_string();
    if cleaned.trim().is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
