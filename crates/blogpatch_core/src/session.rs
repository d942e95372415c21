//! The edit session: watches fields, derives operations, dispatches them.
//!
//! An [`EditSession`] owns the working [`EditableDocument`] and runs one sync
//! cycle per settled field change:
//!
//! ```text
//! set_field ─► gate ─► classify ─► reconcile spans ─► dispatch
//!                                                       ├─ operations over the channel   (Success)
//!                                                       └─ full push of the whole row    (Warning)
//! ```
//!
//! Every cycle takes `&mut self`, so cycles never interleave. The version is
//! stamped at the start of a cycle and committed only after the hand-off to a
//! transport succeeded.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::classify::{FieldClassification, classify_field};
use crate::document::{EditableDocument, Field, FieldShape, FieldValue, SensitiveSpan};
use crate::error::{PatchError, Result};
use crate::gate::{GateDecision, SyncGate};
use crate::operation::{EditOperation, OperationKind};
use crate::reconcile::{prune_malformed, reconcile};
use crate::transport::{DocumentApi, OperationChannel};
use crate::watch::{FieldCallback, FieldWatchers, SubscriptionId};

/// Outcome indicator of the most recent transmission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum TransmissionStatus {
    /// Nothing sent yet.
    #[default]
    Unset,
    /// Incremental operations were handed to the channel.
    Success,
    /// The whole row was pushed instead.
    Warning,
    /// The last attempt failed.
    Danger,
}

/// What one settled change resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The gate rejected the change; nothing was sent.
    Gated(GateDecision),
    /// Operations were sent over the channel.
    Incremental { version: i64, operations: usize },
    /// The whole row was pushed.
    FullPush { version: i64 },
    /// The channel was unavailable; the change will go out with the next full
    /// push.
    Dropped,
}

impl DispatchOutcome {
    /// Version committed by this cycle, if any.
    pub fn version(&self) -> Option<i64> {
        match self {
            DispatchOutcome::Incremental { version, .. } | DispatchOutcome::FullPush { version } => {
                Some(*version)
            }
            DispatchOutcome::Gated(_) | DispatchOutcome::Dropped => None,
        }
    }
}

enum Plan {
    Send(Vec<EditOperation>),
    Push,
}

/// A live editing session over one document.
pub struct EditSession<C: OperationChannel, A: DocumentApi> {
    doc: EditableDocument,
    /// Last settled value of every field.
    baseline: EditableDocument,
    gate: Arc<SyncGate>,
    channel: C,
    api: A,
    watchers: FieldWatchers,
    status: TransmissionStatus,
    resync_pending: bool,
    blog_id: Option<i64>,
}

impl<C: OperationChannel, A: DocumentApi> EditSession<C, A> {
    /// Start a session from an already-loaded document.
    pub fn new(doc: EditableDocument, channel: C, api: A) -> Self {
        Self {
            gate: Arc::new(SyncGate::new(doc.version)),
            baseline: doc.clone(),
            blog_id: doc.id,
            doc,
            channel,
            api,
            watchers: FieldWatchers::new(),
            status: TransmissionStatus::Unset,
            resync_pending: false,
        }
    }

    /// Pull and edit a specific blog instead of the caller's default draft.
    pub fn with_blog_id(mut self, blog_id: Option<i64>) -> Self {
        self.blog_id = blog_id;
        self
    }

    pub fn document(&self) -> &EditableDocument {
        &self.doc
    }

    /// Shared handle to the gate, for toggling composition from input code.
    pub fn gate(&self) -> Arc<SyncGate> {
        Arc::clone(&self.gate)
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn status(&self) -> TransmissionStatus {
        self.status
    }

    pub fn version(&self) -> i64 {
        self.doc.version
    }

    /// Whether the next accepted change will be sent as a full push.
    pub fn is_resync_pending(&self) -> bool {
        self.resync_pending
    }

    /// Watch settled changes of `field`.
    pub fn on_field_settled(&self, field: Field, callback: FieldCallback) -> SubscriptionId {
        self.watchers.on_field_settled(field, callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.watchers.unsubscribe(id)
    }

    /// Assign a new value to `field` and, unless composition is in progress,
    /// sync it.
    pub async fn set_field(&mut self, field: Field, value: FieldValue) -> Result<DispatchOutcome> {
        let current = self.doc.value(field);
        if current == value {
            return Ok(DispatchOutcome::Gated(GateDecision::Unchanged));
        }
        if self.gate.is_pulling() {
            warn!("[blogpatch] edit to {} dropped during pull", field);
            return Ok(DispatchOutcome::Gated(GateDecision::Pulling));
        }

        self.doc.set_value(field, value)?;

        if self.gate.is_composing() {
            return Ok(DispatchOutcome::Gated(GateDecision::Composing));
        }
        self.settle(field).await
    }

    pub async fn set_text(
        &mut self,
        field: Field,
        text: impl Into<String>,
    ) -> Result<DispatchOutcome> {
        self.set_field(field, FieldValue::Text(text.into())).await
    }

    pub async fn set_status(&mut self, status: i32) -> Result<DispatchOutcome> {
        self.set_field(Field::Status, FieldValue::Status(status)).await
    }

    pub async fn set_spans(&mut self, spans: Vec<SensitiveSpan>) -> Result<DispatchOutcome> {
        self.set_field(Field::SensitiveContentList, FieldValue::Spans(spans))
            .await
    }

    pub fn begin_composition(&self) {
        self.gate.set_composing(true);
    }

    /// End composition and settle every field changed while it was active,
    /// one change per field.
    pub async fn end_composition(&mut self) -> Result<Vec<DispatchOutcome>> {
        self.gate.set_composing(false);
        let mut outcomes = Vec::new();
        for field in Field::ALL {
            if self.doc.value(field) != self.baseline.value(field) {
                outcomes.push(self.settle(field).await?);
            }
        }
        Ok(outcomes)
    }

    /// Replace local state with the authoritative row.
    ///
    /// Watchers are not notified and nothing is dispatched. The pulling flag is
    /// cleared whether or not the fetch succeeds.
    pub async fn pull(&mut self) -> Result<()> {
        let gate = Arc::clone(&self.gate);
        let _pulling = gate.begin_pull();

        let row = self.api.pull_echo(self.blog_id).await?;
        info!(
            "[blogpatch] pulled blog {:?} at version {}",
            row.id, row.version
        );

        gate.reset(row.version);
        if self.blog_id.is_none() {
            self.blog_id = row.id;
        }
        self.baseline = row.clone();
        self.doc = row;
        self.resync_pending = false;
        Ok(())
    }

    /// Push the whole row now as its own cycle.
    pub async fn push_all(&mut self) -> Result<DispatchOutcome> {
        let version = self.gate.next_version();
        self.full_push(version).await
    }

    async fn settle(&mut self, field: Field) -> Result<DispatchOutcome> {
        let old = self.baseline.value(field);
        let new = self.doc.value(field);
        let decision = self.gate.check(&old, &new);
        if !decision.is_accepted() {
            return Ok(DispatchOutcome::Gated(decision));
        }

        self.baseline.set_value(field, new.clone())?;
        self.watchers.emit(field, &old, &new);

        let (outcome, spans_changed) = self.dispatch(field, &old, &new).await?;
        if !spans_changed {
            return Ok(outcome);
        }

        match self.settle_spans().await {
            // The follow-up resynced what the main cycle dropped.
            Ok(follow_up) if outcome == DispatchOutcome::Dropped => Ok(follow_up),
            Ok(_) => Ok(outcome),
            Err(e) => {
                warn!(
                    "[blogpatch] span list follow-up after {} failed: {}",
                    field, e
                );
                Ok(outcome)
            }
        }
    }

    /// Follow-up cycle sending the span list pruned by reconciliation.
    async fn settle_spans(&mut self) -> Result<DispatchOutcome> {
        let field = Field::SensitiveContentList;
        let old = self.baseline.value(field);
        let new = self.doc.value(field);
        self.baseline.set_value(field, new.clone())?;
        self.watchers.emit(field, &old, &new);
        let (outcome, _) = self.dispatch(field, &old, &new).await?;
        Ok(outcome)
    }

    /// Run one cycle for an accepted change. Returns the outcome and whether
    /// the span list changed and still needs its own cycle.
    async fn dispatch(
        &mut self,
        field: Field,
        old: &FieldValue,
        new: &FieldValue,
    ) -> Result<(DispatchOutcome, bool)> {
        let version = self.gate.next_version();

        if self.resync_pending {
            debug!("[blogpatch] resync pending, pushing {} as full state", field);
            return Ok((self.full_push(version).await?, false));
        }

        let plan = match (field.shape(), new) {
            (FieldShape::Status, FieldValue::Status(code)) => Plan::Send(vec![EditOperation::whole(
                field,
                OperationKind::Status,
                Some(code.to_string()),
            )]),
            (FieldShape::SpanList, FieldValue::Spans(spans)) => {
                Plan::Send(vec![EditOperation::whole(
                    field,
                    OperationKind::SensitiveContentList,
                    Some(serde_json::to_string(spans)?),
                )])
            }
            (_, FieldValue::Text(new_text)) => {
                let old_text = old.as_text().unwrap_or_default();
                match classify_field(field, old_text, new_text) {
                    FieldClassification::Operations(ops) => Plan::Send(ops),
                    FieldClassification::Fallback => Plan::Push,
                }
            }
            (_, value) => {
                return Err(PatchError::InvalidOperation(format!(
                    "cannot sync {:?} as field '{}'",
                    value, field
                )));
            }
        };

        match plan {
            Plan::Push => {
                warn!("[blogpatch] {} change not expressible as an operation, pushing full state", field);
                Ok((self.full_push(version).await?, false))
            }
            Plan::Send(mut ops) => {
                let mut spans_changed = false;
                for op in &mut ops {
                    op.id = self.doc.id;
                    op.version = version;
                    spans_changed |= reconcile(op, &mut self.doc);
                    debug!(
                        "[blogpatch] {} {} v{} {:?}..{:?} para {:?}",
                        op.field,
                        op.operate_type_code,
                        op.version,
                        op.index_start,
                        op.index_end,
                        op.paragraph_no
                    );
                }
                let outcome = self.send_operations(&ops, version)?;
                Ok((outcome, spans_changed))
            }
        }
    }

    fn send_operations(&mut self, ops: &[EditOperation], version: i64) -> Result<DispatchOutcome> {
        for op in ops {
            match self.channel.send(op.to_message()?) {
                Ok(()) => {}
                Err(PatchError::ChannelUnavailable) => {
                    warn!(
                        "[blogpatch] channel unavailable, dropped {} v{}; next change resyncs",
                        op.field, version
                    );
                    self.status = TransmissionStatus::Danger;
                    self.resync_pending = true;
                    return Ok(DispatchOutcome::Dropped);
                }
                Err(e) => {
                    self.status = TransmissionStatus::Danger;
                    self.resync_pending = true;
                    return Err(e);
                }
            }
        }
        self.commit(version);
        self.status = TransmissionStatus::Success;
        Ok(DispatchOutcome::Incremental {
            version,
            operations: ops.len(),
        })
    }

    /// Push the working row at `version`. Malformed spans are pruned from the
    /// pushed copy and only written back once the push succeeded.
    async fn full_push(&mut self, version: i64) -> Result<DispatchOutcome> {
        let mut row = self.doc.clone();
        row.version = version;
        prune_malformed(&mut row);

        if let Err(e) = self.api.push_all(&row).await {
            warn!("[blogpatch] full push v{} failed: {}", version, e);
            self.status = TransmissionStatus::Danger;
            self.resync_pending = true;
            return Err(e);
        }

        info!("[blogpatch] pushed full state at version {}", version);
        self.commit(version);
        self.doc.sensitive_content_list = row.sensitive_content_list;
        self.baseline.sensitive_content_list = self.doc.sensitive_content_list.clone();
        self.status = TransmissionStatus::Warning;
        self.resync_pending = false;
        Ok(DispatchOutcome::FullPush { version })
    }

    fn commit(&mut self, version: i64) {
        if self.gate.commit(version) {
            self.doc.version = version;
            self.baseline.version = version;
        }
    }
}
