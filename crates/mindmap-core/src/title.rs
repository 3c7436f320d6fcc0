//! Heading text derived from the embedding page.

use url::Url;

/// Query parameter carrying the assignment id.
pub const ASSIGNMENT_PARAM: &str = "assignmentId";

/// Assignment id used when the page URL has none.
pub const DEFAULT_ASSIGNMENT_ID: &str = "defaultAssignment";

/// Heading used when the assignment id has no suffix.
pub const DEFAULT_TITLE: &str = "Mindmap Generator";

/// Path segment after which the referrer path names the parent page.
pub const DEFAULT_ANCHOR_SEGMENT: &str = "allgemeinbildung";

/// The `assignmentId` query parameter of `page_url`, or the default.
///
/// An empty parameter counts as missing.
pub fn assignment_id(page_url: &str) -> String {
    Url::parse(page_url)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(name, _)| name == ASSIGNMENT_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_ASSIGNMENT_ID.to_string())
}

/// The assignment id without its `assignment`, `assignment_` or `assignment-` prefix.
pub fn assignment_suffix(assignment_id: &str) -> &str {
    match assignment_id.strip_prefix("assignment") {
        Some(rest) => rest.strip_prefix(['_', '-']).unwrap_or(rest),
        None => assignment_id,
    }
}

/// Heading for the mindmap of an assignment.
pub fn mindmap_title(assignment_id: &str) -> String {
    match assignment_suffix(assignment_id) {
        "" => DEFAULT_TITLE.to_string(),
        suffix => format!("Mindmap: {suffix}"),
    }
}

/// Human-readable title of the page that embedded the mindmap.
///
/// Takes the referrer path segments after `anchor`, turns `-`, `_` and `+`
/// into spaces, percent-decodes and capitalises each word, and joins the
/// segments with ` - `. Returns an empty string when there is nothing to use.
pub fn parent_page_title(referrer: Option<&str>, anchor: &str) -> String {
    let Some(referrer) = referrer.filter(|r| !r.is_empty()) else {
        log::warn!("No referrer found. Cannot retrieve parent page title.");
        return String::new();
    };

    let url = match Url::parse(referrer) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Error parsing referrer URL: {e}");
            return String::new();
        }
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let Some(index) = segments.iter().position(|s| *s == anchor) else {
        log::warn!("Segment '{anchor}' not found in referrer URL path.");
        return String::new();
    };

    let relevant = &segments[index + 1..];
    if relevant.is_empty() {
        log::warn!("No path segments found after the target segment.");
        return String::new();
    }

    let mut formatted = Vec::with_capacity(relevant.len());
    for segment in relevant {
        let spaced = segment.replace(['-', '_', '+'], " ");
        match urlencoding::decode(&spaced) {
            Ok(decoded) => formatted.push(capitalize_words(&decoded)),
            Err(e) => {
                log::error!("Error decoding referrer segment '{segment}': {e}");
                return String::new();
            }
        }
    }
    formatted.join(" - ")
}

fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start && c.is_alphanumeric() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}
