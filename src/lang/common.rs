//! Helpers shared by the target emitters.
//!
//! String-literal decoding, regex backslash handling, and flag translation
//! are identical across targets except for the per-target flag table, so
//! they live here.

use crate::error::{generic, Result};

/// Decode a JavaScript string literal (including its quotes) to its value.
///
/// Handles the standard single-character escapes, `\xNN`, `\uNNNN`, and
/// `\u{...}`. An unknown escape contributes the escaped character itself,
/// matching ECMAScript semantics (`"\d"` is `"d"`).
pub fn js_string_value(literal: &str) -> String {
    let inner = if literal.len() >= 2 {
        &literal[1..literal.len() - 1]
    } else {
        literal
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('v') => out.push('\u{000B}'),
            Some('0') => out.push('\0'),
            Some('x') => {
                let hi = chars.next();
                let lo = chars.next();
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    let code = format!("{hi}{lo}");
                    if let Ok(b) = u8::from_str_radix(&code, 16) {
                        out.push(b as char);
                    }
                }
            }
            Some('u') => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut code = String::new();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        code.push(c);
                    }
                    if let Some(c) = u32::from_str_radix(&code, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(c);
                    }
                } else {
                    let code: String = chars.by_ref().take(4).collect();
                    if let Some(c) = u32::from_str_radix(&code, 16)
                        .ok()
                        .and_then(char::from_u32)
                    {
                        out.push(c);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Double every unescaped backslash in a regex source, leaving already
/// escaped backslash pairs alone. Applied globally.
pub fn double_escape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'\\') {
            chars.next();
        }
        out.push_str("\\\\");
    }
    out
}

/// Translate a JavaScript flag string through a per-target flag table.
/// Untranslatable flags are dropped; the result is deduplicated and sorted
/// ascending so emission is stable.
pub fn translate_flags(flags: &str, table: impl Fn(char) -> Option<char>) -> String {
    let mut out: Vec<char> = flags.chars().filter_map(table).collect();
    out.sort_unstable();
    out.dedup();
    out.into_iter().collect()
}

/// The flag set BSON regular expressions accept unchanged.
pub const BSON_REGEX_FLAGS: &[char] = &['i', 'm', 'x', 's', 'l', 'u'];

/// Validate a BSONRegExp flag string, listing every offending letter.
pub fn validate_bson_regex_flags(flags: &str) -> Result<()> {
    let bad: String = flags.chars().filter(|c| !BSON_REGEX_FLAGS.contains(c)).collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(generic(format!("unsupported BSONRegExp flags: {bad}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_value_plain() {
        assert_eq!(js_string_value("'return 1'"), "return 1");
        assert_eq!(js_string_value("\"abc\""), "abc");
    }

    #[test]
    fn test_string_value_escapes() {
        assert_eq!(js_string_value(r"'it\'s'"), "it's");
        assert_eq!(js_string_value(r#""a\\d""#), r"a\d");
        assert_eq!(js_string_value(r#""a\nb""#), "a\nb");
        assert_eq!(js_string_value(r#""A""#), "A");
        assert_eq!(js_string_value(r#""\u{1F600}""#), "\u{1F600}");
    }

    #[test]
    fn test_string_value_unknown_escape_drops_backslash() {
        assert_eq!(js_string_value(r#""\d""#), "d");
    }

    #[test]
    fn test_double_escape_is_global() {
        assert_eq!(double_escape(r"a\d\w"), r"a\\d\\w");
    }

    #[test]
    fn test_double_escape_leaves_escaped_pairs() {
        assert_eq!(double_escape(r"a\\d"), r"a\\d");
        assert_eq!(double_escape(r"\\\d"), r"\\\\d");
    }

    #[test]
    fn test_translate_flags_sorted_deduped() {
        let table = |c| match c {
            'i' => Some('i'),
            'g' => Some('s'),
            _ => None,
        };
        assert_eq!(translate_flags("gi", table), "is");
        assert_eq!(translate_flags("gig", table), "is");
        assert_eq!(translate_flags("y", table), "");
    }

    #[test]
    fn test_bson_flags_accepted() {
        assert!(validate_bson_regex_flags("imxslu").is_ok());
        assert!(validate_bson_regex_flags("").is_ok());
    }

    #[test]
    fn test_bson_flags_rejected_lists_offenders() {
        let err = validate_bson_regex_flags("igk").unwrap_err();
        assert!(err.to_string().contains("gk"), "got: {err}");
    }
}
