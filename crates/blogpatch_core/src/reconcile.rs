//! Sensitive-span reconciliation.
//!
//! Spans flagged during review point at character ranges of the title,
//! description or content. After an edit some of those ranges no longer cover
//! the text they were flagged for. Spans are never shifted: each one is either
//! kept as-is or dropped, and the reviewer re-flags what still matters.

use log::debug;

use crate::document::{EditableDocument, SpanKind, char_len};
use crate::operation::{EditOperation, OperationKind};
use crate::paragraph::{PARAGRAPH_DELIMITER, placement};

/// What an edit means for the spans of the edited field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanEffect {
    /// Every offset moved; drop all spans of the field.
    InvalidateAll,
    /// Offsets from this character onward moved; drop spans reaching it.
    InvalidateFrom(usize),
    /// Nothing before the tail moved.
    Preserve,
}

/// Work out the effect of `op` on span offsets.
///
/// `content` is the edited field's value after the operation was applied;
/// paragraph operations are translated to whole-field offsets against it.
pub fn span_effect(op: &EditOperation, content: &str) -> SpanEffect {
    let kind = op.kind();
    let Some(no) = op.paragraph_no else {
        return match kind {
            OperationKind::Remove | OperationKind::HeadAppend | OperationKind::HeadSubtract => {
                SpanEffect::InvalidateAll
            }
            OperationKind::TailSubtract | OperationKind::Replace => {
                SpanEffect::InvalidateFrom(op.index_start.unwrap_or(0))
            }
            _ => SpanEffect::Preserve,
        };
    };

    match kind {
        OperationKind::ParagraphSplitAppend => return SpanEffect::Preserve,
        OperationKind::ParagraphSplitSubtract => {
            return SpanEffect::InvalidateFrom(char_len(content));
        }
        _ => {}
    }

    let Some(at) = placement(content, no) else {
        return SpanEffect::InvalidateAll;
    };

    match kind {
        OperationKind::Remove | OperationKind::HeadAppend | OperationKind::HeadSubtract => {
            SpanEffect::InvalidateAll
        }
        OperationKind::TailSubtract | OperationKind::Replace => {
            SpanEffect::InvalidateFrom(at.base + op.index_start.unwrap_or(0))
        }
        OperationKind::TailAppend if at.is_last => SpanEffect::Preserve,
        OperationKind::TailAppend => {
            let paragraph_len = content
                .split(PARAGRAPH_DELIMITER)
                .nth(no - 1)
                .map(char_len)
                .unwrap_or(0);
            let appended = op.content_change.as_deref().map(char_len).unwrap_or(0);
            SpanEffect::InvalidateFrom(at.base + paragraph_len.saturating_sub(appended))
        }
        _ => SpanEffect::Preserve,
    }
}

/// Reconcile the span list of `doc` with an operation already applied to it.
///
/// Returns whether the span list changed. Does nothing unless the document is
/// under sensitive-content review.
pub fn reconcile(op: &EditOperation, doc: &mut EditableDocument) -> bool {
    if !doc.is_under_review() {
        return false;
    }
    let Some(span_kind) = op.field.span_kind() else {
        return false;
    };

    let before = doc.sensitive_content_list.len();
    let effect = span_effect(op, doc.text(op.field).unwrap_or_default());

    match effect {
        SpanEffect::InvalidateAll => doc
            .sensitive_content_list
            .retain(|span| span.kind != span_kind),
        SpanEffect::InvalidateFrom(at) => doc
            .sensitive_content_list
            .retain(|span| span.kind != span_kind || span.end_index <= at),
        SpanEffect::Preserve => {}
    }

    prune_spans(doc);

    let changed = doc.sensitive_content_list.len() != before;
    if changed {
        debug!(
            "[blogpatch] {:?} on {} dropped {} sensitive span(s)",
            op.kind(),
            op.field,
            before - doc.sensitive_content_list.len()
        );
    }
    changed
}

/// Drop spans that are empty or reach past the end of their field.
///
/// Returns whether any span was dropped. Does nothing unless the document is
/// under sensitive-content review.
pub fn prune_malformed(doc: &mut EditableDocument) -> bool {
    if !doc.is_under_review() {
        return false;
    }
    let before = doc.sensitive_content_list.len();
    prune_spans(doc);
    doc.sensitive_content_list.len() != before
}

fn prune_spans(doc: &mut EditableDocument) {
    let title_len = doc.span_field_len(SpanKind::Title);
    let description_len = doc.span_field_len(SpanKind::Description);
    let content_len = doc.span_field_len(SpanKind::Content);
    doc.sensitive_content_list.retain(|span| {
        span.fits(match span.kind {
            SpanKind::Title => title_len,
            SpanKind::Description => description_len,
            SpanKind::Content => content_len,
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Field, STATUS_NORMAL, SensitiveSpan};
    use crate::operation::TextEdit;
    use crate::test_utils::reviewed_document;

    fn title_op(edit: TextEdit) -> EditOperation {
        EditOperation::from_text_edit(Field::Title, edit, None)
    }

    #[test]
    fn test_head_append_drops_only_matching_kind() {
        let mut doc = reviewed_document();
        doc.title = format!(">> {}", doc.title);

        assert!(reconcile(&title_op(TextEdit::head_append(">> ")), &mut doc));
        assert!(doc
            .sensitive_content_list
            .iter()
            .all(|s| s.kind != SpanKind::Title));
        assert!(doc
            .sensitive_content_list
            .iter()
            .any(|s| s.kind == SpanKind::Description));
    }

    #[test]
    fn test_replace_keeps_spans_before_edit() {
        let mut doc = reviewed_document();
        doc.title = "bad word here and worse".to_string();
        doc.sensitive_content_list = vec![
            SensitiveSpan::new(0, 3, SpanKind::Title),
            SensitiveSpan::new(18, 23, SpanKind::Title),
        ];

        let changed = reconcile(&title_op(TextEdit::replace(9, 13, "there")), &mut doc);
        assert!(changed);
        assert_eq!(
            doc.sensitive_content_list,
            vec![SensitiveSpan::new(0, 3, SpanKind::Title)]
        );
    }

    #[test]
    fn test_span_ending_at_edit_start_survives() {
        let mut doc = reviewed_document();
        doc.title = "abcdef".to_string();
        doc.sensitive_content_list = vec![SensitiveSpan::new(1, 3, SpanKind::Title)];

        assert!(!reconcile(&title_op(TextEdit::tail_subtract(3)), &mut doc));
        assert_eq!(doc.sensitive_content_list.len(), 1);
    }

    #[test]
    fn test_tail_append_preserves() {
        let mut doc = reviewed_document();
        let before = doc.sensitive_content_list.clone();
        doc.title.push_str(" more");
        assert!(!reconcile(&title_op(TextEdit::tail_append(" more")), &mut doc));
        assert_eq!(doc.sensitive_content_list, before);
    }

    #[test]
    fn test_not_under_review_is_noop() {
        let mut doc = reviewed_document();
        doc.status = STATUS_NORMAL;
        let before = doc.sensitive_content_list.clone();
        doc.title = String::new();
        assert!(!reconcile(&title_op(TextEdit::remove()), &mut doc));
        assert_eq!(doc.sensitive_content_list, before);
    }

    #[test]
    fn test_link_edits_never_reconcile() {
        let mut doc = reviewed_document();
        let op = EditOperation::from_text_edit(Field::Link, TextEdit::remove(), None);
        assert!(!reconcile(&op, &mut doc));
    }

    #[test]
    fn test_out_of_range_spans_are_pruned() {
        let mut doc = reviewed_document();
        doc.description = "short".to_string();
        doc.sensitive_content_list = vec![
            SensitiveSpan::new(0, 5, SpanKind::Description),
            SensitiveSpan::new(2, 40, SpanKind::Description),
            SensitiveSpan::new(4, 4, SpanKind::Description),
        ];
        doc.title.push('!');

        assert!(reconcile(&title_op(TextEdit::tail_append("!")), &mut doc));
        assert_eq!(
            doc.sensitive_content_list,
            vec![SensitiveSpan::new(0, 5, SpanKind::Description)]
        );
    }

    #[test]
    fn test_paragraph_offsets_are_absolute() {
        // "second!" starts at 7, "third" at 16.
        let content = "first\n\nsecond!\n\nthird";
        let op = EditOperation::from_text_edit(Field::Content, TextEdit::tail_append("!"), Some(2));
        assert_eq!(span_effect(&op, content), SpanEffect::InvalidateFrom(13));

        let op = EditOperation::from_text_edit(Field::Content, TextEdit::replace(1, 2, "X"), Some(2));
        assert_eq!(span_effect(&op, content), SpanEffect::InvalidateFrom(8));

        let op = EditOperation::from_text_edit(Field::Content, TextEdit::tail_append("d"), Some(3));
        assert_eq!(span_effect(&op, content), SpanEffect::Preserve);

        let op = EditOperation::from_text_edit(Field::Content, TextEdit::head_append("x"), Some(1));
        assert_eq!(span_effect(&op, content), SpanEffect::InvalidateAll);
    }

    #[test]
    fn test_paragraph_head_edits_drop_every_content_span() {
        let mut doc = reviewed_document();
        doc.content = "first\n\n>second".to_string();
        doc.sensitive_content_list = vec![
            SensitiveSpan::new(0, 5, SpanKind::Content),
            SensitiveSpan::new(2, 7, SpanKind::Description),
        ];
        let op = EditOperation::from_text_edit(Field::Content, TextEdit::head_append(">"), Some(2));

        assert!(reconcile(&op, &mut doc));
        assert_eq!(
            doc.sensitive_content_list,
            vec![SensitiveSpan::new(2, 7, SpanKind::Description)]
        );

        doc.content = "first\n\nsecond".to_string();
        doc.sensitive_content_list = vec![SensitiveSpan::new(0, 5, SpanKind::Content)];
        for edit in [TextEdit::head_subtract(1), TextEdit::remove()] {
            let op = EditOperation::from_text_edit(Field::Content, edit, Some(2));
            assert_eq!(span_effect(&op, &doc.content), SpanEffect::InvalidateAll);
        }
    }

    #[test]
    fn test_content_edit_in_middle_paragraph() {
        let mut doc = reviewed_document();
        doc.content = "first\n\nsecond!\n\nthird".to_string();
        doc.sensitive_content_list = vec![
            SensitiveSpan::new(0, 5, SpanKind::Content),
            SensitiveSpan::new(16, 21, SpanKind::Content),
            SensitiveSpan::new(0, 3, SpanKind::Title),
        ];
        let op = EditOperation::from_text_edit(Field::Content, TextEdit::tail_append("!"), Some(2));

        assert!(reconcile(&op, &mut doc));
        assert_eq!(
            doc.sensitive_content_list,
            vec![
                SensitiveSpan::new(0, 5, SpanKind::Content),
                SensitiveSpan::new(0, 3, SpanKind::Title),
            ]
        );
    }

    #[test]
    fn test_prune_malformed_only_under_review() {
        let mut doc = reviewed_document();
        doc.title = "ab".to_string();
        assert!(prune_malformed(&mut doc));
        assert!(doc
            .sensitive_content_list
            .iter()
            .all(|s| s.kind != SpanKind::Title));

        let mut doc = reviewed_document();
        doc.status = STATUS_NORMAL;
        doc.title = "ab".to_string();
        assert!(!prune_malformed(&mut doc));
    }
}
