//! Receiving side: rebuild a document from the operation stream.
//!
//! A [`DocumentReplica`] applies operations in version order. Operations of one
//! cycle share a version, so an operation must carry either the version of the
//! cycle just applied or exactly the next one. Anything else means a frame was
//! lost and the replica needs a fresh snapshot. Within a cycle each field and
//! paragraph is edited at most once, so a repeat is rejected as a duplicate.

use log::debug;

use crate::document::{EditableDocument, Field, FieldShape, SensitiveSpan};
use crate::error::{PatchError, Result};
use crate::operation::{EditOperation, OperationKind};
use crate::paragraph::apply_paragraph_operation;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentReplica {
    doc: EditableDocument,
    /// The cycle of the last operation applied since the last snapshot.
    open_cycle: Option<OpenCycle>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenCycle {
    version: i64,
    /// `(field, paraNo)` of every operation applied in this cycle.
    applied: Vec<(Field, Option<usize>)>,
}

impl OpenCycle {
    fn contains(&self, op: &EditOperation) -> bool {
        self.applied.contains(&(op.field, op.paragraph_no))
    }
}

impl DocumentReplica {
    pub fn new(doc: EditableDocument) -> Self {
        Self {
            doc,
            open_cycle: None,
        }
    }

    pub fn document(&self) -> &EditableDocument {
        &self.doc
    }

    pub fn into_document(self) -> EditableDocument {
        self.doc
    }

    pub fn version(&self) -> i64 {
        self.doc.version
    }

    /// Parse and apply one text frame.
    pub fn apply_message(&mut self, message: &str) -> Result<EditOperation> {
        let op = EditOperation::from_message(message)?;
        self.apply(&op)?;
        Ok(op)
    }

    /// Apply one operation. On error the replica is left unchanged.
    pub fn apply(&mut self, op: &EditOperation) -> Result<()> {
        let expected = self.doc.version + 1;
        let cycle = self
            .open_cycle
            .as_ref()
            .filter(|cycle| cycle.version == op.version);
        match cycle {
            Some(cycle) if cycle.contains(op) => {
                return Err(PatchError::DuplicateOperation {
                    field: op.field.to_string(),
                    version: op.version,
                });
            }
            Some(_) => {}
            None if op.version == expected => {}
            None => {
                return Err(PatchError::VersionGap {
                    expected,
                    actual: op.version,
                });
            }
        }

        let change = op.content_change.as_deref().unwrap_or_default();
        match (op.field.shape(), op.kind()) {
            (FieldShape::Status, OperationKind::Status) => {
                self.doc.status = change.trim().parse().map_err(|_| {
                    PatchError::InvalidOperation(format!("invalid status code '{}'", change))
                })?;
            }
            (FieldShape::SpanList, OperationKind::SensitiveContentList) => {
                let spans: Vec<SensitiveSpan> = serde_json::from_str(change)?;
                self.doc.sensitive_content_list = spans;
            }
            (FieldShape::Paragraph, _) => {
                let current = self.doc.content.as_str();
                self.doc.content = apply_paragraph_operation(current, op)?;
            }
            (FieldShape::Plain, kind)
                if op.paragraph_no.is_none() && !op.operate_type_code.is_paragraph() =>
            {
                let current = self.doc.text(op.field).unwrap_or_default();
                let updated = op.text_edit().apply(current)?;
                self.doc.set_value(op.field, updated.into())?;
                debug!("[blogpatch] replica applied {:?} to {}", kind, op.field);
            }
            (_, kind) => {
                return Err(PatchError::InvalidOperation(format!(
                    "{:?} cannot be applied to field '{}'",
                    kind, op.field
                )));
            }
        }

        self.doc.version = op.version;
        match &mut self.open_cycle {
            Some(cycle) if cycle.version == op.version => {
                cycle.applied.push((op.field, op.paragraph_no));
            }
            open => {
                *open = Some(OpenCycle {
                    version: op.version,
                    applied: vec![(op.field, op.paragraph_no)],
                });
            }
        }
        Ok(())
    }

    /// Replace state with a full-state snapshot (a full push or a pull).
    pub fn apply_snapshot(&mut self, row: EditableDocument) {
        self.doc = row;
        self.open_cycle = None;
    }
}
