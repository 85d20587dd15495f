/// Maps a raw input value to a canonical dialable number.
pub trait Normalizer: Send + Sync {
    /// `None` when nothing dialable is left after cleanup.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Best-effort cleanup into a `+<digits>` form.
///
/// Keeps ASCII digits and a `+` that precedes every digit. Digits from other
/// scripts (Arabic-Indic, fullwidth, ...) are dropped like any other
/// punctuation. A `00` prefix is rewritten to `+` and a bare digit string gets
/// a `+` prepended. No country defaults are applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialableNormalizer;

impl Normalizer for DialableNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let mut cleaned = String::with_capacity(raw.len() + 1);
        for ch in raw.chars() {
            if ch.is_ascii_digit() || (ch == '+' && cleaned.is_empty()) {
                cleaned.push(ch);
            }
        }

        let canonical = if cleaned.starts_with('+') {
            cleaned
        } else if let Some(rest) = cleaned.strip_prefix("00") {
            format!("+{rest}")
        } else {
            cleaned.insert(0, '+');
            cleaned
        };

        // A lone `+` carries no digits to dial.
        (canonical.len() > 1).then_some(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        DialableNormalizer.normalize(raw)
    }

    #[test]
    fn test_keeps_international_form() {
        assert_eq!(norm("+1234567890").as_deref(), Some("+1234567890"));
        assert_eq!(norm(" +1 (234) 567-890 ").as_deref(), Some("+1234567890"));
    }

    #[test]
    fn test_double_zero_prefix_becomes_plus() {
        assert_eq!(norm("0044123456789").as_deref(), Some("+44123456789"));
        assert_eq!(norm("00 44 123").as_deref(), Some("+44123"));
    }

    #[test]
    fn test_bare_digits_get_plus() {
        assert_eq!(norm("5511987654321").as_deref(), Some("+5511987654321"));
        assert_eq!(norm("0").as_deref(), Some("+0"));
    }

    #[test]
    fn test_plus_after_digits_is_dropped() {
        assert_eq!(norm("12+34").as_deref(), Some("+1234"));
        assert_eq!(norm("++12").as_deref(), Some("+12"));
    }

    #[test]
    fn test_non_ascii_digits_are_dropped() {
        assert_eq!(norm("\u{0661}\u{0662}"), None);
        assert_eq!(norm("+\u{FF11}44").as_deref(), Some("+44"));
    }

    #[test]
    fn test_nothing_dialable() {
        assert_eq!(norm(""), None);
        assert_eq!(norm("bad"), None);
        assert_eq!(norm("+"), None);
        assert_eq!(norm("00"), None);
        assert_eq!(norm("0 0 "), None);
        assert_eq!(norm("+00"), Some("+00".to_string()));
        assert_eq!(norm(" - () "), None);
    }
}
