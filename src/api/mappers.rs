//! Mapping of server JSON payloads onto the domain models.
//!
//! Payload structs mirror the wire shapes and are private to this module; every
//! decoding failure surfaces as [`TfsError::ResponseShape`] tagged with the client
//! operation that received the payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Result, TfsError};
use crate::models::{
    FIELD_WORK_ITEM_TYPE, FieldChange, FieldMap, FieldValue, IdentityRef, Relation,
    RelationChanges, SYNTHETIC_FIELDS, WiqlResult, WorkItem, WorkItemChange,
};

#[derive(Debug, Deserialize)]
struct WorkItemPayload {
    id: i32,
    #[serde(default)]
    url: String,
    #[serde(default)]
    rev: Option<i32>,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    relations: Option<Vec<RelationPayload>>,
}

#[derive(Debug, Deserialize)]
struct RelationPayload {
    rel: String,
    url: String,
    #[serde(default)]
    attributes: Option<Value>,
}

impl From<RelationPayload> for Relation {
    fn from(payload: RelationPayload) -> Self {
        Relation::new(payload.rel, payload.url, payload.attributes)
    }
}

/// `{count, value}` envelope of list endpoints.
#[derive(Debug, Deserialize)]
struct ListPayload<T> {
    count: Option<usize>,
    value: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WiqlPayload {
    #[serde(default)]
    work_items: Option<Vec<WorkItemLink>>,
}

#[derive(Debug, Deserialize)]
struct WorkItemLink {
    id: i32,
}

#[derive(Debug, Deserialize)]
struct SavedQueryPayload {
    #[serde(default)]
    wiql: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePayload {
    id: i32,
    work_item_id: i32,
    rev: i32,
    #[serde(default)]
    revised_by: Option<IdentityRef>,
    #[serde(default)]
    revised_date: Option<DateTime<Utc>>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    fields: Option<Map<String, Value>>,
    #[serde(default)]
    relations: Option<RelationChangesPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldChangePayload {
    #[serde(default)]
    old_value: Option<Value>,
    #[serde(default)]
    new_value: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RelationChangesPayload {
    #[serde(default)]
    added: Vec<RelationPayload>,
    #[serde(default)]
    removed: Vec<RelationPayload>,
    #[serde(default)]
    updated: Vec<RelationPayload>,
}

#[derive(Debug, Deserialize)]
struct TeamMemberPayload {
    identity: IdentityRef,
}

/// Parses a JSON value into `T`, attributing failures to `operation`.
fn decode<T: DeserializeOwned>(operation: &str, payload: Value) -> Result<T> {
    if payload.is_null() {
        return Err(TfsError::response_shape(operation, "empty response body"));
    }
    serde_json::from_value(payload).map_err(|e| TfsError::response_shape(operation, e.to_string()))
}

impl TryFrom<Value> for WorkItem {
    type Error = TfsError;

    fn try_from(payload: Value) -> Result<Self> {
        parse_work_item("work item payload", payload)
    }
}

/// Converts a work item payload, lifting `System.Id` / `System.WorkItemType` out of
/// the field map.
pub(crate) fn parse_work_item(operation: &str, payload: Value) -> Result<WorkItem> {
    let payload: WorkItemPayload = decode(operation, payload)?;

    let type_name = payload
        .fields
        .get(FIELD_WORK_ITEM_TYPE)
        .and_then(Value::as_str)
        .map(str::to_string);

    let fields: FieldMap = payload
        .fields
        .into_iter()
        .filter(|(name, _)| !SYNTHETIC_FIELDS.contains(&name.as_str()))
        .map(|(name, value)| (name, FieldValue::from_json(value)))
        .collect();

    let relations = payload
        .relations
        .unwrap_or_default()
        .into_iter()
        .map(Relation::from)
        .collect();

    Ok(WorkItem::from_parts(
        payload.id,
        payload.url,
        payload.rev,
        type_name,
        fields,
        relations,
    ))
}

/// Items and `count` of a `{count, value}` envelope. A missing `value` is an error.
pub(crate) fn parse_list<T: DeserializeOwned>(
    operation: &str,
    payload: Value,
) -> Result<(Option<usize>, Vec<T>)> {
    let list: ListPayload<T> = decode(operation, payload)?;
    let items = list
        .value
        .ok_or_else(|| TfsError::response_shape(operation, "missing 'value'"))?;
    Ok((list.count, items))
}

/// Work items of a batch response, in server order.
pub(crate) fn parse_work_item_list(operation: &str, payload: Value) -> Result<Vec<WorkItem>> {
    let (_, items) = parse_list::<Value>(operation, payload)?;
    items
        .into_iter()
        .map(|item| parse_work_item(operation, item))
        .collect()
}

/// Ids of a WIQL response. A response without `workItems` matched nothing.
pub(crate) fn parse_wiql(operation: &str, payload: Value) -> Result<WiqlResult> {
    let wiql: WiqlPayload = decode(operation, payload)?;
    let ids = wiql
        .work_items
        .unwrap_or_default()
        .into_iter()
        .map(|link| link.id)
        .collect();
    Ok(WiqlResult::new(ids))
}

/// Query text of a saved query fetched with `$expand=wiql`.
pub(crate) fn parse_saved_query(operation: &str, payload: Value) -> Result<String> {
    let query: SavedQueryPayload = decode(operation, payload)?;
    query
        .wiql
        .filter(|text| !text.is_empty())
        .ok_or_else(|| TfsError::response_shape(operation, "missing 'wiql'"))
}

impl From<UpdatePayload> for WorkItemChange {
    fn from(update: UpdatePayload) -> Self {
        let field_changes = update
            .fields
            .unwrap_or_default()
            .into_iter()
            .map(|(name, change)| {
                let change: FieldChangePayload =
                    serde_json::from_value(change).unwrap_or(FieldChangePayload {
                        old_value: None,
                        new_value: None,
                    });
                FieldChange {
                    name,
                    old_value: change.old_value,
                    new_value: change.new_value,
                }
            })
            .collect();

        let relation_changes = update.relations.map(|relations| RelationChanges {
            added: relations.added.into_iter().map(Relation::from).collect(),
            removed: relations.removed.into_iter().map(Relation::from).collect(),
            updated: relations.updated.into_iter().map(Relation::from).collect(),
        });

        WorkItemChange {
            id: update.id,
            work_item_id: update.work_item_id,
            rev: update.rev,
            revised_by: update.revised_by,
            revised_date: update.revised_date,
            url: update.url,
            field_changes,
            relation_changes,
        }
    }
}

/// Revisions of an updates response.
pub(crate) fn parse_changes(operation: &str, payload: Value) -> Result<Vec<WorkItemChange>> {
    let (_, updates) = parse_list::<UpdatePayload>(operation, payload)?;
    Ok(updates.into_iter().map(WorkItemChange::from).collect())
}

/// Members of a team page, read from `value[].identity`.
pub(crate) fn parse_team_members(
    operation: &str,
    payload: Value,
) -> Result<(Option<usize>, Vec<IdentityRef>)> {
    let (count, members) = parse_list::<TeamMemberPayload>(operation, payload)?;
    Ok((
        count,
        members.into_iter().map(|member| member.identity).collect(),
    ))
}

/// Decodes a single object response such as a project or team.
pub(crate) fn parse_object<T: DeserializeOwned>(operation: &str, payload: Value) -> Result<T> {
    decode(operation, payload)
}
