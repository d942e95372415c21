//! Edit operations and their wire format.
//!
//! An [`EditOperation`] describes one localized change to one field. It is
//! serialized as a JSON text frame on the operation channel:
//!
//! ```text
//! { "id": 7, "field": "content", "operateTypeCode": 15, "contentChange": "x",
//!   "indexStart": 3, "indexEnd": 5, "paraNo": 2, "version": 12 }
//! ```
//!
//! Plain-text fields and the paragraph-structured content field use disjoint
//! code ranges so a receiver knows whether `paraNo` addresses a paragraph.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::document::Field;
use crate::error::{PatchError, Result};
use crate::text::split_at_char;

/// Shape-independent operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    TailAppend,
    TailSubtract,
    HeadAppend,
    HeadSubtract,
    Replace,
    Remove,
    ParagraphSplitAppend,
    ParagraphSplitSubtract,
    Status,
    SensitiveContentList,
}

/// Numeric operation code as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum OperateTypeCode {
    NonParaTailAppend = 1,
    NonParaTailSubtract = 2,
    NonParaHeadAppend = 3,
    NonParaHeadSubtract = 4,
    NonParaReplace = 5,
    NonParaRemove = 6,
    ParaTailAppend = 11,
    ParaTailSubtract = 12,
    ParaHeadAppend = 13,
    ParaHeadSubtract = 14,
    ParaReplace = 15,
    ParaRemove = 16,
    ParaSplitAppend = 17,
    ParaSplitSubtract = 18,
    Status = -1,
    SensitiveContentList = -2,
}

impl OperateTypeCode {
    /// Pick the code for `kind`, in its paragraph variant when `paragraph` is
    /// set. Paragraph split kinds are always paragraph codes; status and span
    /// list kinds have a single code.
    pub fn new(kind: OperationKind, paragraph: bool) -> Self {
        use OperateTypeCode::*;
        match (kind, paragraph) {
            (OperationKind::TailAppend, false) => NonParaTailAppend,
            (OperationKind::TailSubtract, false) => NonParaTailSubtract,
            (OperationKind::HeadAppend, false) => NonParaHeadAppend,
            (OperationKind::HeadSubtract, false) => NonParaHeadSubtract,
            (OperationKind::Replace, false) => NonParaReplace,
            (OperationKind::Remove, false) => NonParaRemove,
            (OperationKind::TailAppend, true) => ParaTailAppend,
            (OperationKind::TailSubtract, true) => ParaTailSubtract,
            (OperationKind::HeadAppend, true) => ParaHeadAppend,
            (OperationKind::HeadSubtract, true) => ParaHeadSubtract,
            (OperationKind::Replace, true) => ParaReplace,
            (OperationKind::Remove, true) => ParaRemove,
            (OperationKind::ParagraphSplitAppend, _) => ParaSplitAppend,
            (OperationKind::ParagraphSplitSubtract, _) => ParaSplitSubtract,
            (OperationKind::Status, _) => Status,
            (OperationKind::SensitiveContentList, _) => SensitiveContentList,
        }
    }

    pub fn kind(&self) -> OperationKind {
        use OperateTypeCode::*;
        match self {
            NonParaTailAppend | ParaTailAppend => OperationKind::TailAppend,
            NonParaTailSubtract | ParaTailSubtract => OperationKind::TailSubtract,
            NonParaHeadAppend | ParaHeadAppend => OperationKind::HeadAppend,
            NonParaHeadSubtract | ParaHeadSubtract => OperationKind::HeadSubtract,
            NonParaReplace | ParaReplace => OperationKind::Replace,
            NonParaRemove | ParaRemove => OperationKind::Remove,
            ParaSplitAppend => OperationKind::ParagraphSplitAppend,
            ParaSplitSubtract => OperationKind::ParagraphSplitSubtract,
            Status => OperationKind::Status,
            SensitiveContentList => OperationKind::SensitiveContentList,
        }
    }

    pub fn is_paragraph(&self) -> bool {
        (*self as i32) >= 11
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<OperateTypeCode> for i32 {
    fn from(code: OperateTypeCode) -> Self {
        code as i32
    }
}

impl TryFrom<i32> for OperateTypeCode {
    type Error = PatchError;

    fn try_from(code: i32) -> std::result::Result<Self, Self::Error> {
        use OperateTypeCode::*;
        Ok(match code {
            1 => NonParaTailAppend,
            2 => NonParaTailSubtract,
            3 => NonParaHeadAppend,
            4 => NonParaHeadSubtract,
            5 => NonParaReplace,
            6 => NonParaRemove,
            11 => ParaTailAppend,
            12 => ParaTailSubtract,
            13 => ParaHeadAppend,
            14 => ParaHeadSubtract,
            15 => ParaReplace,
            16 => ParaRemove,
            17 => ParaSplitAppend,
            18 => ParaSplitSubtract,
            -1 => Status,
            -2 => SensitiveContentList,
            other => return Err(PatchError::UnknownOperateType(other)),
        })
    }
}

impl fmt::Display for OperateTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

/// A classified character-level edit of one string, before it is bound to a
/// field and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub kind: OperationKind,
    pub content_change: Option<String>,
    pub index_start: Option<usize>,
    pub index_end: Option<usize>,
}

impl TextEdit {
    pub fn tail_append(change: impl Into<String>) -> Self {
        Self::with(OperationKind::TailAppend, Some(change.into()), None, None)
    }

    pub fn tail_subtract(index_start: usize) -> Self {
        Self::with(OperationKind::TailSubtract, None, Some(index_start), None)
    }

    pub fn head_append(change: impl Into<String>) -> Self {
        Self::with(OperationKind::HeadAppend, Some(change.into()), None, None)
    }

    pub fn head_subtract(index_start: usize) -> Self {
        Self::with(OperationKind::HeadSubtract, None, Some(index_start), None)
    }

    pub fn replace(index_start: usize, index_end: usize, change: impl Into<String>) -> Self {
        Self::with(
            OperationKind::Replace,
            Some(change.into()),
            Some(index_start),
            Some(index_end),
        )
    }

    pub fn remove() -> Self {
        Self::with(OperationKind::Remove, None, None, None)
    }

    fn with(
        kind: OperationKind,
        content_change: Option<String>,
        index_start: Option<usize>,
        index_end: Option<usize>,
    ) -> Self {
        Self {
            kind,
            content_change,
            index_start,
            index_end,
        }
    }

    /// Apply this edit to `old`, reproducing the new string.
    pub fn apply(&self, old: &str) -> Result<String> {
        apply_kind(
            self.kind,
            old,
            self.content_change.as_deref(),
            self.index_start,
            self.index_end,
        )
    }
}

/// One detected field mutation, stamped for transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/", rename = "OperationMessage")]
#[serde(rename_all = "camelCase")]
pub struct EditOperation {
    #[ts(type = "number | null")]
    pub id: Option<i64>,
    pub field: Field,
    #[ts(type = "number")]
    pub operate_type_code: OperateTypeCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub content_change: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub index_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub index_end: Option<usize>,
    /// 1-based paragraph ordinal, content field only.
    #[serde(default, rename = "paraNo", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub paragraph_no: Option<usize>,
    #[ts(type = "number")]
    pub version: i64,
}

impl EditOperation {
    /// Bind a classified text edit to a field.
    pub fn from_text_edit(field: Field, edit: TextEdit, paragraph_no: Option<usize>) -> Self {
        let paragraph = field.shape() == crate::document::FieldShape::Paragraph;
        Self {
            id: None,
            field,
            operate_type_code: OperateTypeCode::new(edit.kind, paragraph),
            content_change: edit.content_change,
            index_start: edit.index_start,
            index_end: edit.index_end,
            paragraph_no,
            version: 0,
        }
    }

    /// A whole-value operation (status, span list, paragraph split).
    pub fn whole(field: Field, kind: OperationKind, content_change: Option<String>) -> Self {
        Self {
            id: None,
            field,
            operate_type_code: OperateTypeCode::new(kind, true),
            content_change,
            index_start: None,
            index_end: None,
            paragraph_no: None,
            version: 0,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.operate_type_code.kind()
    }

    /// The character-level part of this operation.
    pub fn text_edit(&self) -> TextEdit {
        TextEdit {
            kind: self.kind(),
            content_change: self.content_change.clone(),
            index_start: self.index_start,
            index_end: self.index_end,
        }
    }

    /// Serialize as the JSON text frame sent on the channel.
    pub fn to_message(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a JSON text frame.
    pub fn from_message(message: &str) -> Result<Self> {
        Ok(serde_json::from_str(message)?)
    }
}

fn apply_kind(
    kind: OperationKind,
    old: &str,
    change: Option<&str>,
    index_start: Option<usize>,
    index_end: Option<usize>,
) -> Result<String> {
    let missing = |what: &str| PatchError::InvalidOperation(format!("{:?} without {}", kind, what));
    let out_of_range =
        |at: usize| PatchError::InvalidOperation(format!("{:?} index {} out of range", kind, at));

    match kind {
        OperationKind::TailAppend => Ok(format!("{}{}", old, change.unwrap_or_default())),
        OperationKind::HeadAppend => Ok(format!("{}{}", change.unwrap_or_default(), old)),
        OperationKind::TailSubtract => {
            let at = index_start.ok_or_else(|| missing("indexStart"))?;
            let (head, _) = split_at_char(old, at).ok_or_else(|| out_of_range(at))?;
            Ok(head.to_string())
        }
        OperationKind::HeadSubtract => {
            let at = index_start.ok_or_else(|| missing("indexStart"))?;
            let (_, tail) = split_at_char(old, at).ok_or_else(|| out_of_range(at))?;
            Ok(tail.to_string())
        }
        OperationKind::Replace => {
            let start = index_start.ok_or_else(|| missing("indexStart"))?;
            let end = index_end.ok_or_else(|| missing("indexEnd"))?;
            let (head, rest) = split_at_char(old, start).ok_or_else(|| out_of_range(start))?;
            let removed = end
                .checked_sub(start)
                .ok_or_else(|| out_of_range(end))?;
            let (_, tail) = split_at_char(rest, removed).ok_or_else(|| out_of_range(end))?;
            Ok(format!("{}{}{}", head, change.unwrap_or_default(), tail))
        }
        OperationKind::Remove => Ok(String::new()),
        other => Err(PatchError::InvalidOperation(format!(
            "{:?} is not a character-level edit",
            other
        ))),
    }
}
