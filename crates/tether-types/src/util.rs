//! UTF-8 safe string truncation used for log and event previews.

/// Largest char boundary that is `<= max_bytes`.
fn boundary_at_or_before(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    (0..=max_bytes)
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}

/// Borrow at most `max_bytes` of `s` without splitting a code point.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    &s[..boundary_at_or_before(s, max_bytes)]
}

/// Truncate `s` in place to at most `max_bytes` without splitting a code point.
pub fn truncate_string(s: &mut String, max_bytes: usize) {
    let end = boundary_at_or_before(s, max_bytes);
    s.truncate(end);
}

/// Shorten `s` for display, appending `...` when anything was cut.
pub fn preview(s: &str, max_bytes: usize) -> String {
    let cut = truncate_str(s, max_bytes);
    if cut.len() == s.len() {
        s.to_string()
    } else {
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn ascii_is_cut_at_limit() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn multibyte_never_split() {
        let s = "\u{1F600}\u{1F601}";
        assert_eq!(truncate_str(s, 5), "\u{1F600}");
        assert_eq!(truncate_str("caf\u{00e9}", 4), "caf");
    }

    #[test]
    fn truncate_string_in_place() {
        let mut s = String::from("\u{4e16}\u{754c}");
        truncate_string(&mut s, 4);
        assert_eq!(s, "\u{4e16}");
    }

    #[test]
    fn preview_marks_cut() {
        assert_eq!(preview("hello world", 5), "hello...");
        assert_eq!(preview("hi", 5), "hi");
    }
}
