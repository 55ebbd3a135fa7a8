//! Partial redaction of contact identifiers for anonymous viewers.
//!
//! Two reveal rules exist. `Narrow` keeps two leading and two trailing
//! characters everywhere. `Wide` keeps three and three, except for five
//! character handles which keep two and two. Which one a deployment uses is
//! a product decision, so it is configurable.

use serde::{Deserialize, Serialize};

/// Replaces the hidden middle of an identifier.
pub const MASK: &str = "**";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskRule {
    #[default]
    Narrow,
    Wide,
}

impl MaskRule {
    fn email_window(self) -> (usize, usize) {
        match self {
            MaskRule::Narrow => (2, 2),
            MaskRule::Wide => (3, 3),
        }
    }

    fn handle_window(self, len: usize) -> (usize, usize) {
        match self {
            MaskRule::Narrow => (2, 2),
            MaskRule::Wide if len == 5 => (2, 2),
            MaskRule::Wide => (3, 3),
        }
    }
}

/// Masks an email local part or a numeric/alphanumeric handle.
///
/// Total over all strings. Short identifiers (local part of at most 2 chars,
/// handles of at most 3 chars) come back unchanged; anything longer always
/// has at least one character hidden.
pub fn mask(identifier: &str, rule: MaskRule) -> String {
    match identifier.split_once('@') {
        Some((local, domain)) => {
            if local.chars().count() <= 2 {
                return identifier.to_string();
            }
            let (prefix, suffix) = rule.email_window();
            format!("{}@{}", redact(local, prefix, suffix), domain)
        }
        None => {
            let len = identifier.chars().count();
            if len <= 3 {
                return identifier.to_string();
            }
            let (prefix, suffix) = rule.handle_window(len);
            redact(identifier, prefix, suffix)
        }
    }
}

fn redact(value: &str, prefix: usize, suffix: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let (prefix, suffix) = clamp_window(chars.len(), prefix, suffix);

    let head: String = chars[..prefix].iter().collect();
    let tail: String = chars[chars.len() - suffix..].iter().collect();
    format!("{}{}{}", head, MASK, tail)
}

/// Shrinks the reveal windows until at least one char stays hidden.
fn clamp_window(len: usize, mut prefix: usize, mut suffix: usize) -> (usize, usize) {
    while prefix + suffix >= len && prefix + suffix > 0 {
        if suffix >= prefix {
            suffix -= 1;
        } else {
            prefix -= 1;
        }
    }
    (prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_handles() {
        assert_eq!(mask("123456", MaskRule::Narrow), "12**56");
        assert_eq!(mask("12345", MaskRule::Narrow), "12**45");
        assert_eq!(mask("1234", MaskRule::Narrow), "12**4");
        assert_eq!(mask("123", MaskRule::Narrow), "123");
        assert_eq!(mask("", MaskRule::Narrow), "");
    }

    #[test]
    fn wide_handles() {
        assert_eq!(mask("12345", MaskRule::Wide), "12**45");
        assert_eq!(mask("123456", MaskRule::Wide), "123**56");
        assert_eq!(mask("1234567890", MaskRule::Wide), "123**890");
        assert_eq!(mask("wxid_abcdef", MaskRule::Wide), "wxi**def");
    }

    #[test]
    fn emails_keep_domain() {
        assert_eq!(mask("alice@example.com", MaskRule::Narrow), "al**ce@example.com");
        assert_eq!(mask("alice@example.com", MaskRule::Wide), "al**ce@example.com");
        assert_eq!(mask("alexander@qq.com", MaskRule::Wide), "ale**der@qq.com");
        assert_eq!(mask("abc@qq.com", MaskRule::Narrow), "a**c@qq.com");
        assert_eq!(mask("ab@qq.com", MaskRule::Narrow), "ab@qq.com");
    }

    #[test]
    fn long_handles_never_fully_revealed() {
        for rule in [MaskRule::Narrow, MaskRule::Wide] {
            for len in 4..24 {
                let original: String = "abcdefghijklmnopqrstuvwxyz".chars().take(len).collect();
                let masked = mask(&original, rule);
                let revealed = masked.chars().count() - MASK.len();
                assert!(masked.contains(MASK), "{masked}");
                assert!(revealed < len, "{original} -> {masked}");
            }
        }
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(mask("张三李四王五", MaskRule::Narrow), "张三**王五");
    }
}
