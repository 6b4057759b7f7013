//! Masked-logging helper
//!
//! Per the relay's masked-logging rule, phone numbers, chat ids, and message
//! ids must never reach logs unredacted: only the last few characters are
//! shown, with the structural separators (`@`, `.`, `+`) that let a reader
//! still recognise the shape of the value left in place.

/// Mask all but the last `keep` characters of `s`. Every other character is
/// replaced with `*`, except `@`, `.`, and `+`, which are always left as-is
/// wherever they occur.
#[must_use]
pub fn mask_tail(s: &str, keep: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    let total = chars.len();
    let keep_from = total.saturating_sub(keep);

    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i >= keep_from || matches!(c, '@' | '.' | '+') { *c } else { '*' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_all_but_last_n_characters() {
        assert_eq!(mask_tail("15551234567", 4), "*******4567");
    }

    #[test]
    fn preserves_at_and_dot_separators_in_a_chat_id() {
        assert_eq!(mask_tail("15551234567@c.us", 4), "***********@c.us");
    }

    #[test]
    fn preserves_leading_plus_in_a_phone_number() {
        assert_eq!(mask_tail("+15551234567", 4), "+*******4567");
    }

    #[test]
    fn short_strings_are_fully_kept() {
        assert_eq!(mask_tail("123", 4), "123");
    }

    #[test]
    fn empty_string_masks_to_empty() {
        assert_eq!(mask_tail("", 4), "");
    }
}
