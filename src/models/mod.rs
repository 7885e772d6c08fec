//! Data models for work items, relations, queries and projects.

mod field;
mod history;
mod project;
mod relation;
mod wiql;
mod work_item;

pub use field::{FieldMap, FieldValue, IdentityRef};
pub use history::{FieldChange, RelationChanges, WorkItemChange};
pub use project::{Project, Team};
pub use relation::{Relation, RelationType, parse_destination_id};
pub use wiql::WiqlResult;
pub use work_item::{
    CommitResult, FIELD_ASSIGNED_TO, FIELD_DESCRIPTION, FIELD_HISTORY, FIELD_ID, FIELD_REV,
    FIELD_STATE, FIELD_TITLE, FIELD_WORK_ITEM_TYPE, UpdateRelationsResult, WorkItem,
    WorkItemRef, WorkItemType,
};
pub(crate) use work_item::SYNTHETIC_FIELDS;
