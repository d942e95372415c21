//! Paragraph decomposition of the content field.
//!
//! Long bodies are diffed one paragraph at a time so an operation only carries
//! the edited paragraph's offsets. Paragraphs are separated by
//! [`PARAGRAPH_DELIMITER`]; splitting and re-joining is lossless.

use crate::classify::{Classification, classify};
use crate::document::char_len;
use crate::error::{PatchError, Result};
use crate::operation::{EditOperation, OperationKind, TextEdit};

/// Separator between paragraphs of the content field.
pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// Length of [`PARAGRAPH_DELIMITER`] in characters.
const DELIMITER_LEN: usize = 2;

/// A character-level edit localized to one paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphEdit {
    /// 1-based paragraph ordinal.
    pub paragraph_no: usize,
    pub edit: TextEdit,
}

/// How the content field changed, paragraph-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphChange {
    /// The whole field was cleared or populated from empty.
    Whole(TextEdit),
    /// Same paragraph count; one edit per changed paragraph, in order.
    Paragraphs(Vec<ParagraphEdit>),
    /// A trailing delimiter opened a new empty paragraph.
    SplitAppend { paragraph_no: usize },
    /// A trailing empty paragraph was merged away.
    SplitSubtract { paragraph_no: usize },
    /// The paragraph structure changed in a way no single operation describes.
    Fallback,
}

/// Split content into paragraphs. Always yields at least one (possibly empty)
/// paragraph.
pub fn split_paragraphs(content: &str) -> Vec<&str> {
    content.split(PARAGRAPH_DELIMITER).collect()
}

/// Classify a content change paragraph by paragraph.
pub fn classify_paragraphs(old: &str, new: &str) -> ParagraphChange {
    if new.is_empty() {
        return ParagraphChange::Whole(TextEdit::remove());
    }
    if old.is_empty() {
        return ParagraphChange::Whole(TextEdit::tail_append(new));
    }

    let old_paras = split_paragraphs(old);
    let new_paras = split_paragraphs(new);
    let (old_count, new_count) = (old_paras.len(), new_paras.len());

    if old_count == new_count {
        let mut edits = Vec::new();
        for (i, (o, n)) in old_paras.iter().zip(&new_paras).enumerate() {
            if o == n {
                continue;
            }
            match classify(Some(o), Some(n)) {
                Classification::Edit(edit) => edits.push(ParagraphEdit {
                    paragraph_no: i + 1,
                    edit,
                }),
                Classification::Fallback => return ParagraphChange::Fallback,
            }
        }
        return ParagraphChange::Paragraphs(edits);
    }

    if new_count == old_count + 1
        && new_paras[..old_count] == old_paras[..]
        && new_paras[old_count].is_empty()
    {
        return ParagraphChange::SplitAppend {
            paragraph_no: new_count,
        };
    }

    if old_count == new_count + 1
        && old_paras[..new_count] == new_paras[..]
        && old_paras[new_count].is_empty()
    {
        return ParagraphChange::SplitSubtract {
            paragraph_no: old_count,
        };
    }

    ParagraphChange::Fallback
}

/// Where a paragraph sits inside the whole content field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphPlacement {
    /// Character offset of the paragraph's first character.
    pub base: usize,
    /// Whether it is the final paragraph.
    pub is_last: bool,
}

/// Locate paragraph `paragraph_no` (1-based) in `content`.
pub fn placement(content: &str, paragraph_no: usize) -> Option<ParagraphPlacement> {
    let paras = split_paragraphs(content);
    if paragraph_no == 0 || paragraph_no > paras.len() {
        return None;
    }
    let base = paras[..paragraph_no - 1]
        .iter()
        .map(|p| char_len(p) + DELIMITER_LEN)
        .sum();
    Some(ParagraphPlacement {
        base,
        is_last: paragraph_no == paras.len(),
    })
}

/// Apply a content-field operation to `content`.
pub fn apply_paragraph_operation(content: &str, op: &EditOperation) -> Result<String> {
    match (op.kind(), op.paragraph_no) {
        (OperationKind::ParagraphSplitAppend, Some(no)) => {
            let count = split_paragraphs(content).len();
            if no != count + 1 {
                return Err(PatchError::InvalidOperation(format!(
                    "split append at paragraph {} but content has {} paragraphs",
                    no, count
                )));
            }
            Ok(format!("{}{}", content, PARAGRAPH_DELIMITER))
        }
        (OperationKind::ParagraphSplitSubtract, Some(no)) => {
            let count = split_paragraphs(content).len();
            match content.strip_suffix(PARAGRAPH_DELIMITER) {
                Some(rest) if no == count => Ok(rest.to_string()),
                _ => Err(PatchError::InvalidOperation(format!(
                    "split subtract at paragraph {} does not match a trailing empty paragraph",
                    no
                ))),
            }
        }
        (_, None) => op.text_edit().apply(content),
        (_, Some(no)) => {
            let mut paras: Vec<String> = split_paragraphs(content)
                .into_iter()
                .map(String::from)
                .collect();
            let target = no
                .checked_sub(1)
                .and_then(|i| paras.get_mut(i))
                .ok_or_else(|| {
                    PatchError::InvalidOperation(format!("paragraph {} does not exist", no))
                })?;
            *target = op.text_edit().apply(target)?;
            Ok(paras.join(PARAGRAPH_DELIMITER))
        }
    }
}
