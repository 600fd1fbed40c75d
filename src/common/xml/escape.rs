use std::borrow::Cow;

use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape XML special characters for use in text content and attribute values.
///
/// Characters XML 1.0 does not allow are written in the `_xHHHH_` form
/// (see [`encode_invalid_xml_chars`]).
///
/// ```
/// use statusdeck::common::xml::escape_xml;
/// assert_eq!(escape_xml("R&D <team>"), "R&amp;D &lt;team&gt;");
/// assert_eq!(escape_xml("a\u{1}b"), "a_x0001_b");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(
        &encode_invalid_xml_chars(s),
        &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"],
    )
}

/// Characters that may not appear in an XML 1.0 document, not even as a
/// character reference.
#[inline]
fn is_invalid_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// Replace characters XML 1.0 forbids with Office's `_xHHHH_` escape.
///
/// Tab, line feed and carriage return are allowed and kept.
pub fn encode_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_invalid_xml_char) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        if is_invalid_xml_char(ch) {
            out.push_str(&format!("_x{:04X}_", u32::from(ch)));
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}

/// Unescape the five predefined entities and numeric character references.
///
/// Unknown or malformed references are left unchanged.
///
/// ```
/// use statusdeck::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("tab&#x9;here"), "tab\there");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let named = XML_UNESCAPER.replace_all(s, &["\u{0}&", "<", ">", "\"", "'"]);
    decode_char_refs(&named)
}

/// Decode `&#NN;` and `&#xHH;` references.
///
/// A literal ampersand produced by `&amp;` arrives here prefixed with NUL so
/// that `&amp;#65;` stays the text "&#65;" instead of decoding twice.
fn decode_char_refs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('&') {
        let (before, tail) = rest.split_at(pos);
        match before.strip_suffix('\u{0}') {
            Some(before) => {
                out.push_str(before);
                out.push('&');
                rest = &tail[1..];
                continue;
            },
            None => out.push_str(before),
        }

        match parse_char_ref(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }

    out.push_str(rest);
    out
}

/// Parse a character reference at the start of `s`, returning the character
/// and the number of bytes consumed.
fn parse_char_ref(s: &str) -> Option<(char, usize)> {
    let body = s.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => atoi_simd::parse::<u32>(digits.as_bytes()).ok()?,
    };
    char::from_u32(code).map(|ch| (ch, 2 + end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_specials() {
        assert_eq!(
            escape_xml(r#"<a href="x">Tom's & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&apos;s &amp; Jerry&apos;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_invalid_chars_are_encoded() {
        assert_eq!(escape_xml("bad\u{1}ctl"), "bad_x0001_ctl");
        assert_eq!(escape_xml("a\u{b}<b>\u{1f}"), "a_x000B_&lt;b&gt;_x001F_");
        assert_eq!(escape_xml("\u{ffff}"), "_xFFFF_");
        assert!(matches!(encode_invalid_xml_chars("tab\there\r\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_named_entities() {
        assert_eq!(unescape_xml("&quot;hello&apos;"), "\"hello'");
        assert_eq!(unescape_xml("&amp;lt;"), "&lt;");
        assert_eq!(unescape_xml("a & b"), "a & b");
        assert_eq!(unescape_xml("&amp"), "&amp");
    }

    #[test]
    fn test_unescape_char_refs() {
        assert_eq!(unescape_xml("&#65;&#x42;"), "AB");
        assert_eq!(unescape_xml("&amp;#65;"), "&#65;");
        assert_eq!(unescape_xml("&#xZZ;"), "&#xZZ;");
        assert_eq!(unescape_xml("&#1114112;"), "&#1114112;");
    }

    #[test]
    fn test_escape_then_unescape_is_identity() {
        let original = "Sprint 3: <done> & \"reviewed\" 'ok' &#9;";
        assert_eq!(unescape_xml(&escape_xml(original)), original);
    }
}
