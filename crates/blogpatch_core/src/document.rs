//! The editable blog document and its fields.
//!
//! [`EditableDocument`] is the "blog edit row" exchanged with the server on full
//! push/pull. Each independently diffed part of it is a [`Field`]; the
//! sensitive-span annotations are [`SensitiveSpan`] records pointing into the
//! title, description or content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::PatchError;

/// Status code: published and visible.
pub const STATUS_NORMAL: i32 = 0;
/// Status code: hidden from the public reader.
pub const STATUS_HIDDEN: i32 = 1;
/// Status code: under sensitive-content review. Span bookkeeping is only
/// maintained while a document carries this status.
pub const STATUS_SENSITIVE_FILTER: i32 = 2;

/// One named, independently diffed unit of document state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Blog title (plain text).
    Title,
    /// Short description (plain text).
    Description,
    /// Markdown body, split into paragraphs for diffing.
    Content,
    /// External link (plain text).
    Link,
    /// Status code.
    Status,
    /// The sensitive-span list itself.
    SensitiveContentList,
}

/// How a field is compared when it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Single string, character-level diff.
    Plain,
    /// Paragraph-structured string, diffs localized per paragraph.
    Paragraph,
    /// Enumerated value sent whole.
    Status,
    /// Structural list sent whole.
    SpanList,
}

impl Field {
    /// Every tracked field, in watch registration order.
    pub const ALL: [Field; 6] = [
        Field::Description,
        Field::Status,
        Field::SensitiveContentList,
        Field::Link,
        Field::Title,
        Field::Content,
    ];

    /// The wire name of this field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Content => "content",
            Field::Link => "link",
            Field::Status => "status",
            Field::SensitiveContentList => "sensitiveContentList",
        }
    }

    pub fn shape(&self) -> FieldShape {
        match self {
            Field::Title | Field::Description | Field::Link => FieldShape::Plain,
            Field::Content => FieldShape::Paragraph,
            Field::Status => FieldShape::Status,
            Field::SensitiveContentList => FieldShape::SpanList,
        }
    }

    /// The span kind annotating this field, if spans can point into it.
    pub fn span_kind(&self) -> Option<SpanKind> {
        match self {
            Field::Title => Some(SpanKind::Title),
            Field::Description => Some(SpanKind::Description),
            Field::Content => Some(SpanKind::Content),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Field::Title),
            "description" => Ok(Field::Description),
            "content" => Ok(Field::Content),
            "link" => Ok(Field::Link),
            "status" => Ok(Field::Status),
            "sensitiveContentList" | "sensitive-content-list" | "spans" => {
                Ok(Field::SensitiveContentList)
            }
            other => Err(PatchError::UnknownField(other.to_string())),
        }
    }
}

/// Which text field a sensitive span annotates. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SpanKind {
    Title = 1,
    Description = 2,
    Content = 3,
}

impl SpanKind {
    pub fn field(&self) -> Field {
        match self {
            SpanKind::Title => Field::Title,
            SpanKind::Description => Field::Description,
            SpanKind::Content => Field::Content,
        }
    }
}

impl From<SpanKind> for u8 {
    fn from(kind: SpanKind) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for SpanKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(SpanKind::Title),
            2 => Ok(SpanKind::Description),
            3 => Ok(SpanKind::Content),
            other => Err(format!("unknown sensitive span type {}", other)),
        }
    }
}

/// A character range flagged for content review.
///
/// `[start_index, end_index)` are character offsets into the field named by
/// `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SensitiveSpan {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(rename = "type")]
    #[ts(type = "number")]
    pub kind: SpanKind,
}

impl SensitiveSpan {
    pub fn new(start_index: usize, end_index: usize, kind: SpanKind) -> Self {
        Self {
            start_index,
            end_index,
            kind,
        }
    }

    /// Whether the span still describes a non-empty range within a field of
    /// `field_len` characters.
    pub fn fits(&self, field_len: usize) -> bool {
        self.start_index < self.end_index && self.end_index <= field_len
    }
}

/// The value of one field, as delivered to watchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Status(i32),
    Spans(Vec<SensitiveSpan>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

/// The full blog edit row.
///
/// This is the unit of full-state push and pull. Field values are mutated by the
/// edit session; `version` only moves forward except when a pull overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct EditableDocument {
    /// Document id, present once persisted.
    #[serde(default)]
    #[ts(type = "number | null")]
    pub id: Option<i64>,
    /// Owner of the document.
    #[serde(default, alias = "ownerId")]
    #[ts(type = "number | null")]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub link: String,
    #[serde(default)]
    pub status: i32,
    #[serde(default, deserialize_with = "nullable_spans")]
    pub sensitive_content_list: Vec<SensitiveSpan>,
    #[serde(default)]
    #[ts(type = "number")]
    pub version: i64,
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_spans<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<SensitiveSpan>, D::Error> {
    Ok(Option::<Vec<SensitiveSpan>>::deserialize(deserializer)?.unwrap_or_default())
}

impl EditableDocument {
    /// Create an unsaved document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether span bookkeeping applies to this document right now.
    pub fn is_under_review(&self) -> bool {
        self.status == STATUS_SENSITIVE_FILTER
    }

    /// Borrow a text field. Returns `None` for status and the span list.
    pub fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Title => Some(&self.title),
            Field::Description => Some(&self.description),
            Field::Content => Some(&self.content),
            Field::Link => Some(&self.link),
            Field::Status | Field::SensitiveContentList => None,
        }
    }

    /// Snapshot the current value of a field.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Status => FieldValue::Status(self.status),
            Field::SensitiveContentList => FieldValue::Spans(self.sensitive_content_list.clone()),
            text => FieldValue::Text(self.text(text).unwrap_or_default().to_string()),
        }
    }

    /// Assign a field value. The value's variant must match the field's shape.
    pub fn set_value(&mut self, field: Field, value: FieldValue) -> crate::error::Result<()> {
        match (field, value) {
            (Field::Title, FieldValue::Text(s)) => self.title = s,
            (Field::Description, FieldValue::Text(s)) => self.description = s,
            (Field::Content, FieldValue::Text(s)) => self.content = s,
            (Field::Link, FieldValue::Text(s)) => self.link = s,
            (Field::Status, FieldValue::Status(code)) => self.status = code,
            (Field::SensitiveContentList, FieldValue::Spans(spans)) => {
                self.sensitive_content_list = spans
            }
            (field, value) => {
                return Err(PatchError::InvalidOperation(format!(
                    "cannot assign {:?} to field '{}'",
                    value, field
                )));
            }
        }
        Ok(())
    }

    /// Length in characters of the field a span kind points into.
    pub fn span_field_len(&self, kind: SpanKind) -> usize {
        char_len(self.text(kind.field()).unwrap_or_default())
    }
}

/// Length of a string in characters (the unit of every offset on the wire).
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}
