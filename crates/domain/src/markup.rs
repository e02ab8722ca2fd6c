//! Markup cleanup for catalog descriptions

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Suffix appended to any shortened text
pub const ELLIPSIS: &str = "...";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Valid regex"));

static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("Valid regex")
});

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Valid regex"));

/// Turn an HTML fragment into a single line of plain text.
///
/// Tags become a single space, entities are decoded, and whitespace runs
/// collapse to one space.
pub fn strip_markup(html: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_PATTERN
        .replace_all(&decoded, " ")
        .trim()
        .to_string()
}

/// Decode named and numeric character references. Unknown ones stay literal.
pub fn decode_entities(text: &str) -> String {
    ENTITY_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            decode_entity(body)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(body: &str) -> Option<char> {
    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "euro" => '\u{20ac}',
        "pound" => '\u{a3}',
        "yen" => '\u{a5}',
        "cent" => '\u{a2}',
        "deg" => '\u{b0}',
        "times" => '\u{d7}',
        "rarr" => '\u{2192}',
        _ => return None,
    };
    Some(c)
}

/// Length of `text` in UTF-16 code units, the unit Telegram counts captions in
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Shorten `text` to at most `limit` UTF-16 code units, ending in [`ELLIPSIS`].
///
/// Text already within the limit is returned unchanged. Otherwise the result
/// is exactly `limit` units long, or one short when the cut would land inside
/// a surrogate pair.
pub fn truncate_utf16(text: &str, limit: usize) -> String {
    if utf16_len(text) <= limit {
        return text.to_string();
    }

    let (budget, suffix) = match limit.checked_sub(utf16_len(ELLIPSIS)) {
        Some(budget) => (budget, ELLIPSIS),
        None => (limit, ""),
    };

    let mut truncated = String::with_capacity(text.len().min(limit * 4));
    let mut units = 0;
    for c in text.chars() {
        if units + c.len_utf16() > budget {
            break;
        }
        units += c.len_utf16();
        truncated.push(c);
    }
    truncated.push_str(suffix);
    truncated
}

/// Short excerpt for descriptions, counted in chars. Drops trailing
/// whitespace before the ellipsis.
pub fn excerpt(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let ellipsis_len = ELLIPSIS.chars().count();
    let kept: String = text
        .chars()
        .take(limit.saturating_sub(ellipsis_len))
        .collect();
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
