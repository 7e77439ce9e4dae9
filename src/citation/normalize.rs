//! Whitespace normalization with a position map back to the source text.
//!
//! All offsets are character (Unicode scalar value) offsets, not bytes.
//! A character counts as whitespace when [`char::is_whitespace`] says so,
//! on both the document side and the snippet side.

/// Whitespace-normalized view of a text plus its index map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Text with every whitespace run collapsed to one space, ends trimmed
    pub text: String,
    /// `index_map[i]` is the source offset of normalized character `i`
    pub index_map: Vec<usize>,
}

impl Normalized {
    /// Number of characters in the normalized text
    pub fn len(&self) -> usize {
        self.index_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_map.is_empty()
    }

    /// Map a normalized range `[start, end)` back to source offsets.
    ///
    /// An `end` equal to the normalized length has no map entry and resolves
    /// to `source_len`. Returns `None` when `start` is not a mapped position.
    pub fn source_range(&self, start: usize, end: usize, source_len: usize) -> Option<(usize, usize)> {
        let source_start = *self.index_map.get(start)?;
        let source_end = if end < self.index_map.len() {
            self.index_map[end]
        } else {
            source_len
        };
        Some((source_start, source_end))
    }
}

/// Collapse whitespace runs to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize whitespace while recording where each output character came from.
///
/// Leading whitespace is dropped without a map entry. Each later whitespace
/// run emits one space mapped to the first character of the run. A trailing
/// run leaves one injected space behind, which is removed together with its
/// map entry at the end.
pub fn normalize_with_map(text: &str) -> Normalized {
    let mut normalized = String::with_capacity(text.len());
    let mut index_map = Vec::with_capacity(text.len());
    let mut in_whitespace = false;
    let mut leading = true;

    for (offset, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if leading || in_whitespace {
                continue;
            }
            normalized.push(' ');
            index_map.push(offset);
            in_whitespace = true;
        } else {
            leading = false;
            in_whitespace = false;
            normalized.push(ch);
            index_map.push(offset);
        }
    }

    if in_whitespace {
        normalized.pop();
        index_map.pop();
    }

    Normalized {
        text: normalized,
        index_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_internal_runs() {
        let n = normalize_with_map("a  \n\tb");
        assert_eq!(n.text, "a b");
        assert_eq!(n.index_map, vec![0, 1, 5]);
    }

    #[test]
    fn test_strips_leading_and_trailing() {
        let n = normalize_with_map("  \n hello world \n ");
        assert_eq!(n.text, "hello world");
        assert_eq!(n.index_map, vec![4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_empty_and_whitespace_only() {
        assert!(normalize_with_map("").is_empty());

        let n = normalize_with_map(" \t\n ");
        assert_eq!(n.text, "");
        assert!(n.index_map.is_empty());
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let n = normalize_with_map("héllo  wörld");
        assert_eq!(n.text, "héllo wörld");
        // 'w' is the 8th char (offset 7) even though it sits at byte 8
        assert_eq!(n.index_map[6], 7);
        assert_eq!(n.len(), n.text.chars().count());
    }

    #[test]
    fn test_already_normalized_is_identity() {
        let n = normalize_with_map("one two three");
        assert_eq!(n.text, "one two three");
        assert_eq!(n.index_map, (0..13).collect::<Vec<_>>());
    }

    #[test]
    fn test_source_range_at_end_uses_source_len() {
        let n = normalize_with_map("ab  cd\n");
        assert_eq!(n.text, "ab cd");
        assert_eq!(n.source_range(0, 2, 7), Some((0, 2)));
        assert_eq!(n.source_range(3, 5, 7), Some((4, 7)));
        assert_eq!(n.source_range(5, 5, 7), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\n b\tc  "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
