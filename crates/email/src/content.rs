//! Shared email content helpers
//!
//! Acceptance-link construction and HTML-to-plain-text conversion, used by the
//! invitation composer and by the mock service when inspecting captured mail.

use std::sync::LazyLock;

use regex::Regex;

/// Frontend route that accepts an invitation
pub const ACCEPT_INVITATION_PATH: &str = "/accept-invitation";

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

static NON_TEXT_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("valid block regex")
});

static LINE_BREAK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|table|title)\s*>|<hr\b[^>]*>")
        .expect("valid line break regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static INLINE_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid whitespace regex"));

/// Build the acceptance link for an invitation token.
///
/// A single trailing slash on `base_url` is dropped; the token is
/// percent-encoded into the `token` query parameter.
pub fn accept_invitation_url(base_url: &str, token: &str) -> String {
    let base_url = base_url.strip_suffix('/').unwrap_or(base_url);
    format!(
        "{}{}?token={}",
        base_url,
        ACCEPT_INVITATION_PATH,
        urlencoding::encode(token)
    )
}

/// Convert rendered HTML into a plain-text body.
///
/// Tags, comments and script/style blocks are removed, common entities are
/// decoded except `&lt;` and `&gt;` (so escaped text never turns back into
/// markup), runs of inline whitespace collapse to one space and blank lines
/// collapse to a single empty line.
pub fn strip_tags(html: &str) -> String {
    let text = COMMENT_RE.replace_all(html, "");
    let text = NON_TEXT_BLOCK_RE.replace_all(&text, "");
    let text = LINE_BREAK_TAG_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_entities(&text);

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = INLINE_SPACE_RE.replace_all(line, " ").trim().to_string();
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    while lines.last().is_some_and(|last| last.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

fn decode_entities(text: &str) -> String {
    // &lt; and &gt; stay encoded; &amp; last so "&amp;quot;" stays "&quot;"
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
        .replace("&amp;", "&")
}
