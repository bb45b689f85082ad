//! Bounded metadata extraction from fetched HTML
//!
//! Deliberately not an HTML parse: a single forward pass over the
//! (possibly truncated) body finds the first `<title>` region and the
//! first `description` meta tag. Tolerant of malformed markup at the
//! cost of occasionally missing legitimate metadata.

/// Substitute title when the page has none.
pub const PLACEHOLDER_TITLE: &str = "Link Preview";

/// Display caps, in characters.
pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Extract, clean, and escape the title and description from a body
/// prefix. Both outputs are safe to embed in HTML.
pub fn extract_metadata(body: &str) -> (String, String) {
    let title = find_title(body)
        .map(|raw| clean(&raw, MAX_TITLE_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());

    let description = find_description(body)
        .map(|raw| clean(&raw, MAX_DESCRIPTION_CHARS))
        .unwrap_or_default();

    (title, description)
}

/// First `<title>…</title>` region, raw.
fn find_title(body: &str) -> Option<String> {
    let open = find_ci(body, "<title", 0)?;
    let content_start = body[open..].find('>').map(|i| open + i + 1)?;
    let content_end = find_ci(body, "</title", content_start)?;
    Some(body[content_start..content_end].to_string())
}

/// `content` attribute of the first `description` meta tag, raw.
fn find_description(body: &str) -> Option<String> {
    let name = find_ci(body, "name=\"description\"", 0)
        .or_else(|| find_ci(body, "name='description'", 0))?;

    let content = find_ci(body, "content=", name)?;
    let rest = &body[content + "content=".len()..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(value[..end].to_string())
}

/// Decode entities, collapse whitespace, truncate to `max_chars` with a
/// trailing ellipsis marker, and escape for HTML output.
fn clean(raw: &str, max_chars: usize) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    let normalized = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = truncate_chars(&normalized, max_chars);
    html_escape::encode_text(&truncated).into_owned()
}

/// Truncate on a character boundary, marking the cut with `...`.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

/// ASCII-case-insensitive substring search starting at `from`.
///
/// Needles are ASCII, so every match index lands on a character
/// boundary of the haystack.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if from > hay.len() || pat.is_empty() {
        return None;
    }
    hay[from..]
        .windows(pat.len())
        .position(|window| window.eq_ignore_ascii_case(pat))
        .map(|i| from + i)
}
