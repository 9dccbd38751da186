// SPDX-License-Identifier: GPL-3.0-or-later

//! Atomic sand-value types and their anchored matchers.
//!
//! Each variant of [AtomicType] corresponds to exactly one of the closed set
//! of value types a SAND header grammar may require for an attribute. A
//! matcher never backtracks past a disallowed character: it consumes a
//! maximal valid prefix of the input and stops, returning `None` only when
//! no prefix at all can be recognized as belonging to the type.

use core::fmt;

/// One of the atomic sand-value types defined by the SAND header grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtomicType {
    /// `"…"` with `\"` escapes permitted inside.
    QuotedString,
    /// `"scheme:…"` or a quoted tail without scheme.
    QuotedUri,
    /// `"urn:…"` with a URI-safe / percent-escaped tail.
    QuotedUrn,
    /// One or more decimal digits.
    Int,
    /// `<digits>-<digits?>` or `-<digits>`.
    ByteRange,
    /// `YYYYMMDDTHHMMSS[.ffffff]Z`.
    DateTime,
    /// `[]` or `[int(,int)*]`.
    List,
}

impl AtomicType {
    /// The name used in diagnostics, e.g. `"Wrong or missing INT specification."`.
    pub fn name(self) -> &'static str {
        match self {
            AtomicType::QuotedString => "QUOTEDSTRING",
            AtomicType::QuotedUri => "QUOTEDURI",
            AtomicType::QuotedUrn => "QUOTEDURN",
            AtomicType::Int => "INT",
            AtomicType::ByteRange => "BYTERANGE",
            AtomicType::DateTime => "DATETIME",
            AtomicType::List => "LIST",
        }
    }

    /// Match the longest valid prefix of `input` for this type, anchored at
    /// the start of `input`. Returns the matched prefix, or `None` if no
    /// prefix at all is valid.
    pub fn match_prefix<'a>(self, input: &'a str) -> Option<&'a str> {
        match self {
            AtomicType::QuotedString => match_quoted_string(input),
            AtomicType::QuotedUri => match_quoted_uri(input),
            AtomicType::QuotedUrn => match_quoted_urn(input),
            AtomicType::Int => match_int(input),
            AtomicType::ByteRange => match_byte_range(input),
            AtomicType::DateTime => match_date_time(input),
            AtomicType::List => match_list(input),
        }
    }
}

impl fmt::Display for AtomicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_uri_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '.' | '-'
                | '_'
                | '~'
                | ':'
                | '/'
                | '?'
                | '#'
                | '['
                | ']'
                | '@'
                | '!'
                | '$'
                | '&'
                | '\''
                | '('
                | ')'
                | '*'
                | '+'
                | ','
                | ';'
                | '='
        )
}

/// Length, in bytes, of the maximal run of `uri_allowed` chars and `%HH`
/// escapes starting at the front of `s`. Stops (without failing) at the
/// first char that is neither — the caller decides whether that's a
/// terminator (closing quote) or an error.
fn uri_tail_run_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 < bytes.len()
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit()
            {
                i += 3;
                continue;
            }
            break;
        }
        let c = s[i..].chars().next().unwrap();
        if is_uri_allowed(c) {
            i += c.len_utf8();
        } else {
            break;
        }
    }
    i
}

fn match_quoted_string(input: &str) -> Option<&str> {
    let mut chars = input.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(&input[..i + c.len_utf8()]),
            _ => {}
        }
    }
    None
}

fn match_quoted_uri(input: &str) -> Option<&str> {
    if !input.starts_with('"') {
        return None;
    }
    let body = &input[1..];
    // Closing quote is the first literal '"' in the body: none of
    // uri_allowed, the scheme charset, or %HH escapes include '"'.
    let close = body.find('"')?;
    let candidate = &body[..close];

    if let Some(colon) = candidate.find(':') {
        let scheme = &candidate[..colon];
        let tail = &candidate[colon + 1..];
        let scheme_ok = {
            let mut cs = scheme.chars();
            match cs.next() {
                Some(first) if first.is_ascii_alphabetic() => cs
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')),
                _ => false,
            }
        };
        if scheme_ok && !tail.is_empty() && uri_tail_run_len(tail) == tail.len() {
            return Some(&input[..1 + close + 1]);
        }
    }
    if !candidate.is_empty() && uri_tail_run_len(candidate) == candidate.len() {
        return Some(&input[..1 + close + 1]);
    }
    None
}

fn match_quoted_urn(input: &str) -> Option<&str> {
    if !input.starts_with('"') {
        return None;
    }
    let body = &input[1..];
    let close = body.find('"')?;
    let candidate = &body[..close];
    let tail = candidate.strip_prefix("urn:")?;
    if !tail.is_empty() && uri_tail_run_len(tail) == tail.len() {
        Some(&input[..1 + close + 1])
    } else {
        None
    }
}

fn match_int(input: &str) -> Option<&str> {
    let len = input
        .as_bytes()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if len == 0 { None } else { Some(&input[..len]) }
}

fn digit_run_len(s: &str) -> usize {
    s.as_bytes().iter().take_while(|b| b.is_ascii_digit()).count()
}

fn match_byte_range(input: &str) -> Option<&str> {
    let left_len = digit_run_len(input);
    if input.as_bytes().get(left_len) != Some(&b'-') {
        return None;
    }
    let rest = &input[left_len + 1..];
    let right_len = digit_run_len(rest);
    if left_len == 0 && right_len == 0 {
        return None;
    }
    Some(&input[..left_len + 1 + right_len])
}

/// Split a matched BYTERANGE into its (optional) left/right endpoints.
pub fn byte_range_endpoints(matched: &str) -> (Option<u64>, Option<u64>) {
    let dash = matched.find('-').expect("matched BYTERANGE always has '-'");
    let left = matched[..dash].parse::<u64>().ok();
    let right = matched[dash + 1..].parse::<u64>().ok();
    (left, right)
}

fn match_date_time(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    let digits = |range: std::ops::Range<usize>| -> bool {
        range.end <= bytes.len() && bytes[range].iter().all(|b| b.is_ascii_digit())
    };
    if !digits(0..8) {
        return None;
    }
    if bytes.get(8) != Some(&b'T') {
        return None;
    }
    if !digits(9..15) {
        return None;
    }
    let mut pos = 15;
    if bytes.get(pos) == Some(&b'.') {
        let frac_start = pos + 1;
        let frac_len = digit_run_len(&input[frac_start..]).min(6);
        if frac_len == 0 {
            return None;
        }
        pos = frac_start + frac_len;
    }
    if bytes.get(pos) != Some(&b'Z') {
        return None;
    }
    Some(&input[..pos + 1])
}

/// Recovery matcher used only once the strict DATETIME matcher has failed:
/// a maximal run of digits, `-`, `T`, `:`, `.` and `Z`, so that a malformed
/// timestamp is skipped as one span instead of re-triggering unrelated
/// attribute-name errors on its trailing characters.
pub fn match_date_time_recovery(input: &str) -> Option<&str> {
    let len = input
        .chars()
        .take_while(|&c| c.is_ascii_digit() || matches!(c, '-' | 'T' | ':' | '.' | 'Z'))
        .count();
    if len == 0 { None } else { Some(&input[..len]) }
}

fn match_list(input: &str) -> Option<&str> {
    if !input.starts_with('[') {
        return None;
    }
    let rest = &input[1..];
    if let Some(r) = rest.strip_prefix(']') {
        let _ = r;
        return Some(&input[..2]);
    }
    let mut pos = 0usize;
    loop {
        let n = digit_run_len(&rest[pos..]);
        if n == 0 {
            return None;
        }
        pos += n;
        match rest.as_bytes().get(pos) {
            Some(b']') => return Some(&input[..1 + pos + 1]),
            Some(b',') => pos += 1,
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_string() {
        assert_eq!(match_quoted_string(r#""hello""#), Some(r#""hello""#));
        assert_eq!(
            match_quoted_string(r#""he said \"hi\"" rest"#),
            Some(r#""he said \"hi\"""#)
        );
        assert_eq!(match_quoted_string("no quotes"), None);
        assert_eq!(match_quoted_string("\"unterminated"), None);
    }

    #[test]
    fn test_quoted_uri_with_scheme() {
        assert_eq!(
            match_quoted_uri(r#""http://x/y","#),
            Some(r#""http://x/y""#)
        );
        assert_eq!(
            match_quoted_uri(r#""http://example.com/r%C3%A9sum%C3%A9""#),
            Some(r#""http://example.com/r%C3%A9sum%C3%A9""#)
        );
    }

    #[test]
    fn test_quoted_uri_without_scheme() {
        assert_eq!(match_quoted_uri(r#""/a/b/c""#), Some(r#""/a/b/c""#));
    }

    #[test]
    fn test_quoted_uri_bad_scheme_falls_back() {
        // "1bad:tail" is not a valid scheme (must start with a letter),
        // but the whole candidate including ':' is valid uri_allowed text,
        // so the no-scheme alternative still matches.
        assert_eq!(match_quoted_uri(r#""1bad:tail""#), Some(r#""1bad:tail""#));
    }

    #[test]
    fn test_quoted_uri_rejects_invalid_tail() {
        assert_eq!(match_quoted_uri(r#""http://a b""#), None);
    }

    #[test]
    fn test_quoted_urn() {
        assert_eq!(
            match_quoted_urn(r#""urn:mpeg:dash:sand:allocation:weighted:2016""#),
            Some(r#""urn:mpeg:dash:sand:allocation:weighted:2016""#)
        );
        assert_eq!(match_quoted_urn(r#""not-a-urn""#), None);
    }

    #[test]
    fn test_int() {
        assert_eq!(match_int("123abc"), Some("123"));
        assert_eq!(match_int("abc"), None);
    }

    #[test]
    fn test_byte_range_forms() {
        assert_eq!(match_byte_range("100-200"), Some("100-200"));
        assert_eq!(match_byte_range("100-"), Some("100-"));
        assert_eq!(match_byte_range("-200"), Some("-200"));
        assert_eq!(match_byte_range("-"), None);
        assert_eq!(match_byte_range("abc"), None);
    }

    #[test]
    fn test_byte_range_endpoints() {
        assert_eq!(byte_range_endpoints("100-200"), (Some(100), Some(200)));
        assert_eq!(byte_range_endpoints("100-"), (Some(100), None));
        assert_eq!(byte_range_endpoints("-200"), (None, Some(200)));
    }

    #[test]
    fn test_date_time_strict() {
        assert_eq!(
            match_date_time("20160601T120000Z"),
            Some("20160601T120000Z")
        );
        assert_eq!(
            match_date_time("20160601T120000.123Z"),
            Some("20160601T120000.123Z")
        );
        assert_eq!(match_date_time("2016-06-01T12:00:00Z"), None);
    }

    #[test]
    fn test_date_time_recovery() {
        assert_eq!(
            match_date_time_recovery("2016-06-01T12:00:00Z,next=1"),
            Some("2016-06-01T12:00:00Z")
        );
        assert_eq!(match_date_time_recovery("not-a-date-at-all-oops"), None);
    }

    #[test]
    fn test_list() {
        assert_eq!(match_list("[]"), Some("[]"));
        assert_eq!(match_list("[1,2,12]"), Some("[1,2,12]"));
        assert_eq!(match_list("[1,2"), None);
        assert_eq!(match_list("[1,]"), None);
    }
}
