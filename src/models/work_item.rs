//! The work item entity and its local edit tracking.

use serde_json::Value;
use tracing::warn;

use super::{FieldMap, FieldValue, Relation, WorkItemChange};
use crate::api::{Expand, UpdateOptions, WorkItemClient};
use crate::error::{Result, TfsError};

pub const FIELD_ID: &str = "System.Id";
pub const FIELD_WORK_ITEM_TYPE: &str = "System.WorkItemType";
pub const FIELD_REV: &str = "System.Rev";
pub const FIELD_TITLE: &str = "System.Title";
pub const FIELD_DESCRIPTION: &str = "System.Description";
pub const FIELD_ASSIGNED_TO: &str = "System.AssignedTo";
pub const FIELD_STATE: &str = "System.State";
pub const FIELD_HISTORY: &str = "System.History";

/// Keys dropped from the field map on ingestion; they live on the entity itself.
pub(crate) const SYNTHETIC_FIELDS: [&str; 2] = [FIELD_ID, FIELD_WORK_ITEM_TYPE];

/// Outcome of [`WorkItem::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// Pending edits were written and the confirmed fields refreshed.
    Success,
    /// There was nothing to write.
    Empty,
    /// The server produced no usable response; nothing changed locally.
    Failed,
    /// The call raised an error; nothing changed locally.
    Exception,
}

impl CommitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Outcome of [`WorkItem::add_relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRelationsResult {
    Success,
    Failed,
    Exception,
}

/// Built-in work item types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkItemType {
    Requirement,
    Task,
    ChangeRequest,
    Bug,
}

impl WorkItemType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requirement => "Requirement",
            Self::Task => "Task",
            Self::ChangeRequest => "Change request",
            Self::Bug => "Bug",
        }
    }
}

impl std::fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A work item addressed either by id or by an already fetched entity.
#[derive(Debug, Clone, Copy)]
pub enum WorkItemRef<'a> {
    Id(i32),
    Item(&'a WorkItem),
}

impl WorkItemRef<'_> {
    pub fn id(&self) -> i32 {
        match self {
            Self::Id(id) => *id,
            Self::Item(item) => item.id(),
        }
    }
}

impl From<i32> for WorkItemRef<'_> {
    fn from(id: i32) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a WorkItem> for WorkItemRef<'a> {
    fn from(item: &'a WorkItem) -> Self {
        Self::Item(item)
    }
}

/// A work item as last confirmed by the server, plus uncommitted local edits.
///
/// Instances only come from server payloads (fetch, create, update). Reads through
/// [`WorkItem::get`] see pending edits first and confirmed values second; writes
/// through [`WorkItem::set`] stay local until [`WorkItem::commit`].
///
/// A `WorkItem` is plain owned state: mutation needs `&mut self`, so sharing one
/// between tasks requires the caller's own synchronization.
#[derive(Debug, Clone)]
pub struct WorkItem {
    id: i32,
    url: String,
    rev: Option<i32>,
    type_name: Option<String>,
    fields: FieldMap,
    pending_edits: FieldMap,
    relations: Vec<Relation>,
}

impl WorkItem {
    pub(crate) fn from_parts(
        id: i32,
        url: String,
        rev: Option<i32>,
        type_name: Option<String>,
        fields: FieldMap,
        relations: Vec<Relation>,
    ) -> Self {
        Self {
            id,
            url,
            rev,
            type_name,
            fields,
            pending_edits: FieldMap::new(),
            relations,
        }
    }

    /// Parses a work item from a server payload.
    pub fn from_json(payload: Value) -> Result<Self> {
        Self::try_from(payload)
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current server revision, taken from `System.Rev` with the payload's `rev`
    /// as a fallback.
    pub fn revision(&self) -> Option<i32> {
        self.fields
            .get(FIELD_REV)
            .and_then(FieldValue::as_i64)
            .and_then(|rev| i32::try_from(rev).ok())
            .or(self.rev)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Effective value of a field: the pending edit if any, else the confirmed value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.pending_edits
            .get(name)
            .or_else(|| self.fields.get(name))
    }

    /// Records a local edit. Nothing is sent until [`WorkItem::commit`].
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        if name.is_empty() {
            return Err(TfsError::validation("field name can't be empty"));
        }
        let value = value.into();
        if value.is_empty() {
            return Err(TfsError::validation(format!(
                "value of field '{name}' can't be empty"
            )));
        }

        self.pending_edits.insert(name.to_string(), value);
        Ok(())
    }

    pub fn title(&self) -> Option<&str> {
        self.get(FIELD_TITLE).and_then(FieldValue::as_str)
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.set(FIELD_TITLE, title.into())
    }

    pub fn description(&self) -> Option<&str> {
        self.get(FIELD_DESCRIPTION).and_then(FieldValue::as_str)
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.set(FIELD_DESCRIPTION, description.into())
    }

    /// Display name of the assignee.
    pub fn assigned_to(&self) -> Option<String> {
        self.get(FIELD_ASSIGNED_TO).map(FieldValue::display_text)
    }

    pub fn state(&self) -> Option<&str> {
        self.get(FIELD_STATE).and_then(FieldValue::as_str)
    }

    /// Names of the confirmed fields.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Full effective field map: confirmed values overlaid with pending edits.
    pub fn fields(&self) -> FieldMap {
        let mut merged = self.fields.clone();
        for (name, value) in &self.pending_edits {
            merged.insert(name.clone(), value.clone());
        }
        merged
    }

    /// Fields as last confirmed by the server.
    pub fn confirmed_fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Local edits not yet committed.
    pub fn pending_edits(&self) -> &FieldMap {
        &self.pending_edits
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending_edits.is_empty()
    }

    /// Drops all pending edits.
    pub fn discard_changes(&mut self) {
        self.pending_edits.clear();
    }

    /// Drops the pending edit of one field and returns it.
    pub fn discard_change(&mut self, name: &str) -> Option<FieldValue> {
        self.pending_edits.shift_remove(name)
    }

    /// Relations in server order. Positions matter for removal.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Writes pending edits to the server.
    ///
    /// Errors are reported through [`CommitResult`] rather than returned, so this
    /// can be polled freely. On success the confirmed fields are replaced by the
    /// server's and the pending edits cleared, together. There is no revision
    /// guard: the last writer wins.
    pub async fn commit(&mut self, client: &WorkItemClient) -> CommitResult {
        if self.pending_edits.is_empty() {
            return CommitResult::Empty;
        }

        let options = UpdateOptions {
            expand: Expand::Fields,
            ..UpdateOptions::default()
        };

        match client
            .update_workitem_fields(self.id, &self.pending_edits, &options)
            .await
        {
            Ok(updated) => {
                self.fields = updated.fields;
                self.rev = updated.rev;
                self.pending_edits.clear();
                CommitResult::Success
            }
            Err(err) if err.is_unusable_response() => {
                warn!(work_item = self.id, error = %err, "commit returned no usable response");
                CommitResult::Failed
            }
            Err(err) => {
                warn!(work_item = self.id, error = %err, "commit failed");
                CommitResult::Exception
            }
        }
    }

    /// Links this work item to `destination` and refreshes its relations.
    pub async fn add_relation<'a>(
        &mut self,
        client: &WorkItemClient,
        destination: impl Into<WorkItemRef<'a>>,
        relation_name: &str,
        attributes: Option<Value>,
    ) -> UpdateRelationsResult {
        match client
            .add_relation(
                self.id,
                destination,
                relation_name,
                attributes,
                &UpdateOptions::default(),
            )
            .await
        {
            Ok(updated) => {
                self.relations = updated.relations;
                UpdateRelationsResult::Success
            }
            Err(err) if err.is_unusable_response() => {
                warn!(work_item = self.id, error = %err, "add relation returned no usable response");
                UpdateRelationsResult::Failed
            }
            Err(err) => {
                warn!(work_item = self.id, error = %err, "add relation failed");
                UpdateRelationsResult::Exception
            }
        }
    }

    /// Revision history of this work item.
    pub async fn changes(
        &self,
        client: &WorkItemClient,
        skip: u32,
        top: Option<u32>,
    ) -> Result<Vec<WorkItemChange>> {
        client.get_workitem_changes(self.id, skip, top).await
    }
}
