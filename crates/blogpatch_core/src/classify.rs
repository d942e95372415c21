//! Operation classification.
//!
//! A single-pass, two-pointer common prefix/suffix diff. Editor input is almost
//! always one localized insertion, deletion or replacement near the cursor, so
//! this stays O(n) instead of running a general LCS diff. Anything it cannot
//! express as one positional edit becomes [`Classification::Fallback`] and the
//! caller sends the full document instead.

use crate::document::{Field, FieldShape};
use crate::operation::{EditOperation, OperationKind, TextEdit};
use crate::paragraph::{ParagraphChange, classify_paragraphs};

/// Outcome of classifying one string change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The change is expressible as a single positional edit.
    Edit(TextEdit),
    /// Send full state instead.
    Fallback,
}

/// Outcome of classifying a field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldClassification {
    /// Unstamped operations, in transmission order.
    Operations(Vec<EditOperation>),
    /// Send full state instead.
    Fallback,
}

/// Classify the change from `old` to `new`.
///
/// Offsets in the returned edit are character offsets into `old`.
pub fn classify(old: Option<&str>, new: Option<&str>) -> Classification {
    let new = match new {
        Some(n) if !n.is_empty() => n,
        _ => return Classification::Edit(TextEdit::remove()),
    };
    let old = match old {
        Some(o) if !o.is_empty() => o,
        _ => return Classification::Edit(TextEdit::tail_append(new)),
    };

    let o: Vec<char> = old.chars().collect();
    let n: Vec<char> = new.chars().collect();
    let (o_len, n_len) = (o.len(), n.len());

    // Common prefix. No mismatch in the shared range means the edit is at the tail.
    let Some(p) = o.iter().zip(&n).position(|(a, b)| a != b) else {
        let edit = if n_len > o_len {
            TextEdit::tail_append(collect(&n[o_len..]))
        } else {
            TextEdit::tail_subtract(n_len)
        };
        return Classification::Edit(edit);
    };

    // Common suffix. No mismatch means one string is a suffix of the other.
    let Some(back) = o
        .iter()
        .rev()
        .zip(n.iter().rev())
        .position(|(a, b)| a != b)
    else {
        let edit = if n_len > o_len {
            TextEdit::head_append(collect(&n[..n_len - o_len]))
        } else {
            TextEdit::head_subtract(o_len - n_len)
        };
        return Classification::Edit(edit);
    };

    let o_end = o_len - back;
    let n_end = n_len - back;

    let edit = if p > o_end {
        // Prefix and suffix matches overlap (repeated characters around the
        // edit point). Resolve as a pure insertion or deletion at `p`.
        if n_end > o_end {
            let end = n_end + (p - o_end);
            n.get(p..end)
                .map(|inserted| TextEdit::replace(p, p, collect(inserted)))
        } else {
            Some(TextEdit::replace(p, p + (o_end - n_end), ""))
        }
    } else if p < n_end {
        n.get(p..n_end)
            .map(|inserted| TextEdit::replace(p, o_end, collect(inserted)))
    } else {
        Some(TextEdit::replace(p, p + (o_end - n_end), ""))
    };

    match edit {
        Some(edit) if edit.index_end.is_some_and(|end| end <= o_len) => {
            Classification::Edit(edit)
        }
        _ => Classification::Fallback,
    }
}

/// Classify a change of a text field into the operations to transmit.
///
/// Status and span-list fields are sent whole by the session and never reach
/// here; asking for them yields a fallback.
pub fn classify_field(field: Field, old: &str, new: &str) -> FieldClassification {
    match field.shape() {
        FieldShape::Plain => match classify(Some(old), Some(new)) {
            Classification::Edit(edit) => {
                FieldClassification::Operations(vec![EditOperation::from_text_edit(field, edit, None)])
            }
            Classification::Fallback => FieldClassification::Fallback,
        },
        FieldShape::Paragraph => match classify_paragraphs(old, new) {
            ParagraphChange::Whole(edit) => {
                FieldClassification::Operations(vec![EditOperation::from_text_edit(field, edit, None)])
            }
            ParagraphChange::Paragraphs(edits) => FieldClassification::Operations(
                edits
                    .into_iter()
                    .map(|p| EditOperation::from_text_edit(field, p.edit, Some(p.paragraph_no)))
                    .collect(),
            ),
            ParagraphChange::SplitAppend { paragraph_no } => {
                let mut op = EditOperation::whole(field, OperationKind::ParagraphSplitAppend, None);
                op.paragraph_no = Some(paragraph_no);
                FieldClassification::Operations(vec![op])
            }
            ParagraphChange::SplitSubtract { paragraph_no } => {
                let mut op =
                    EditOperation::whole(field, OperationKind::ParagraphSplitSubtract, None);
                op.paragraph_no = Some(paragraph_no);
                FieldClassification::Operations(vec![op])
            }
            ParagraphChange::Fallback => FieldClassification::Fallback,
        },
        FieldShape::Status | FieldShape::SpanList => FieldClassification::Fallback,
    }
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperateTypeCode;

    fn edit(old: &str, new: &str) -> TextEdit {
        match classify(Some(old), Some(new)) {
            Classification::Edit(edit) => edit,
            Classification::Fallback => panic!("unexpected fallback for {:?} -> {:?}", old, new),
        }
    }

    #[test]
    fn test_middle_insert_resolves_overlap() {
        // "hello " prefix and " world" suffix overlap on the space.
        let e = edit("hello world", "hello there world");
        assert_eq!(e, TextEdit::replace(6, 6, "there "));
        assert_eq!(e.apply("hello world").unwrap(), "hello there world");
    }

    #[test]
    fn test_tail_growth() {
        assert_eq!(edit("abc", "abcdef"), TextEdit::tail_append("def"));
    }

    #[test]
    fn test_tail_shrink() {
        assert_eq!(edit("abcdef", "abc"), TextEdit::tail_subtract(3));
    }

    #[test]
    fn test_head_shrink() {
        assert_eq!(edit("xxhello", "hello"), TextEdit::head_subtract(2));
    }

    #[test]
    fn test_head_growth() {
        assert_eq!(edit("hello", ">> hello"), TextEdit::head_append(">> "));
    }

    #[test]
    fn test_full_removal() {
        let e = edit("text", "");
        assert_eq!(e.kind, OperationKind::Remove);
        assert_eq!(e.content_change, None);
        assert_eq!(classify(Some("text"), None), Classification::Edit(TextEdit::remove()));
    }

    #[test]
    fn test_initial_population() {
        assert_eq!(
            classify(None, Some("first")),
            Classification::Edit(TextEdit::tail_append("first"))
        );
        assert_eq!(edit("", "first"), TextEdit::tail_append("first"));
    }

    #[test]
    fn test_repeated_pattern_growth_is_tail_append() {
        // The whole old string is a prefix of the new one, so the tail rule wins
        // before any suffix comparison happens.
        assert_eq!(edit("abab", "ababab"), TextEdit::tail_append("ab"));
    }

    #[test]
    fn test_overlap_insertion() {
        let e = edit("xaay", "xaaay");
        assert_eq!(e, TextEdit::replace(3, 3, "a"));
        assert_eq!(e.apply("xaay").unwrap(), "xaaay");
    }

    #[test]
    fn test_overlap_deletion() {
        let e = edit("xaaay", "xaay");
        assert_eq!(e, TextEdit::replace(3, 4, ""));
        assert_eq!(e.apply("xaaay").unwrap(), "xaay");
    }

    #[test]
    fn test_middle_replace() {
        let e = edit("the cat sat", "the dog sat");
        assert_eq!(e, TextEdit::replace(4, 7, "dog"));
    }

    #[test]
    fn test_middle_deletion() {
        let e = edit("one two three", "one three");
        assert_eq!(e.apply("one two three").unwrap(), "one three");
        assert_eq!(e.content_change.as_deref(), Some(""));
    }

    #[test]
    fn test_offsets_count_characters() {
        let e = edit("你好世界", "你好，世界");
        assert_eq!(e, TextEdit::replace(2, 2, "，"));
        assert_eq!(e.apply("你好世界").unwrap(), "你好，世界");
    }

    #[test]
    fn test_round_trip_small_alphabet() {
        // Every pair of strings over {a, b} up to length 4.
        let mut words = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..4 {
            let mut next = Vec::new();
            for w in &frontier {
                for c in ['a', 'b'] {
                    next.push(format!("{}{}", w, c));
                }
            }
            words.extend(next.iter().cloned());
            frontier = next;
        }

        for old in &words {
            for new in &words {
                if old == new {
                    continue;
                }
                let e = edit(old, new);
                assert_eq!(&e.apply(old).unwrap(), new, "{:?} -> {:?} via {:?}", old, new, e);
            }
        }
    }

    #[test]
    fn test_classify_field_plain_uses_non_paragraph_codes() {
        let FieldClassification::Operations(ops) = classify_field(Field::Title, "abc", "abcd")
        else {
            panic!("expected operations");
        };
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operate_type_code, OperateTypeCode::NonParaTailAppend);
        assert_eq!(ops[0].paragraph_no, None);
    }

    #[test]
    fn test_classify_field_rejects_non_text() {
        assert_eq!(
            classify_field(Field::Status, "0", "1"),
            FieldClassification::Fallback
        );
    }
}
