//! Revision history of a work item.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{IdentityRef, Relation};

/// One revision as reported by the work item updates endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItemChange {
    pub id: i32,
    pub work_item_id: i32,
    pub rev: i32,
    pub revised_by: Option<IdentityRef>,
    pub revised_date: Option<DateTime<Utc>>,
    pub url: String,
    pub field_changes: Vec<FieldChange>,
    pub relation_changes: Option<RelationChanges>,
}

impl WorkItemChange {
    /// Looks up the change of a single field in this revision.
    pub fn field(&self, name: &str) -> Option<&FieldChange> {
        self.field_changes.iter().find(|change| change.name == name)
    }
}

/// Old and new value of one field in a revision.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub name: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Relations touched by a revision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationChanges {
    pub added: Vec<Relation>,
    pub removed: Vec<Relation>,
    pub updated: Vec<Relation>,
}

impl RelationChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}
