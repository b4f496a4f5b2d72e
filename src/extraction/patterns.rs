//! Statement-boundary matching shared by the regex extractors.
use regex::Regex;

/// A captured identifier together with its byte offset in the scanned text.
pub(crate) type Located = (usize, String);

/// Collects capture group 1 of every statement matched by `re`.
///
/// `re` must start with a boundary alternative such as `(?:^|;)` and end by
/// consuming a single-byte terminator (`;`). Each search resumes on that
/// terminator, so it can open the next statement on the same line:
/// `import a; import b;` yields both names.
pub(crate) fn boundary_captures(re: &Regex, text: &str) -> Vec<Located> {
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        if let Some(name) = caps.get(1) {
            found.push((name.start(), name.as_str().to_string()));
        }
        pos = whole.end().saturating_sub(1).max(whole.start() + 1);
    }
    found
}

/// Collects capture group 1 of every non-overlapping match of `re`.
pub(crate) fn all_captures(re: &Regex, text: &str) -> Vec<Located> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.start(), m.as_str().to_string()))
        .collect()
}

/// Merges located matches of several patterns into source order.
pub(crate) fn in_source_order(mut found: Vec<Located>) -> Vec<String> {
    found.sort_by_key(|(offset, _)| *offset);
    found.into_iter().map(|(_, name)| name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_re() -> Regex {
        Regex::new(r"(?:^|;)\s*import\s+([^;\s]+)\s*;").unwrap()
    }

    #[test]
    fn test_terminator_opens_next_statement() {
        let found = boundary_captures(&statement_re(), "import a.B; import c.D;");
        let names: Vec<_> = found.into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a.B", "c.D"]);
    }

    #[test]
    fn test_start_anchor_only_at_text_start() {
        // Without a preceding terminator the second import is not a statement start.
        let found = boundary_captures(&statement_re(), "import a.B; x = import c.D;");
        let names: Vec<_> = found.into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a.B"]);
    }

    #[test]
    fn test_in_source_order_merges_by_offset() {
        let merged = in_source_order(vec![
            (10, "late".to_string()),
            (2, "early".to_string()),
            (5, "middle".to_string()),
        ]);
        assert_eq!(merged, vec!["early", "middle", "late"]);
    }
}
