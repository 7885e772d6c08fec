//! Work item tracking client.
//!
//! Creation, copy, field updates, relation changes, batched fetches, WIQL queries
//! and revision history, all scoped to the project of the [`Connection`].

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

use super::connection::Connection;
use super::mappers;
use super::patch::{
    JSON_PATCH_CONTENT_TYPE, PatchOperation, build_field_patch, build_relation_add_patch,
    build_relation_remove_patch, find_relation_index,
};
use super::traits::{QueryParams, Transport};
use crate::config::ClientSettings;
use crate::error::{Result, TfsError};
use crate::models::{
    FIELD_REV, FieldMap, Relation, WiqlResult, WorkItem, WorkItemChange, WorkItemRef,
};

/// Fields never carried over by [`WorkItemClient::copy_workitem`].
///
/// These are computed or stamped by the server and would be rejected on create.
pub const COPY_IGNORED_FIELDS: &[&str] = &[
    "System.Id",
    "System.TeamProject",
    "System.AreaId",
    "System.AreaLevel1",
    "System.AreaLevel2",
    "System.AreaLevel3",
    "System.AreaLevel4",
    "System.AreaLevel5",
    "System.AreaLevel6",
    "System.AreaLevel7",
    "System.IterationId",
    "System.IterationLevel1",
    "System.IterationLevel2",
    "System.IterationLevel3",
    "System.IterationLevel4",
    "System.IterationLevel5",
    "System.IterationLevel6",
    "System.IterationLevel7",
    FIELD_REV,
    "System.RevisedDate",
    "System.CreatedDate",
    "System.CreatedBy",
    "System.ChangedDate",
    "System.ChangedBy",
    "System.AuthorizedDate",
    "System.AuthorizedAs",
    "System.Watermark",
    "System.BoardColumn",
    "System.BoardColumnDone",
    "System.BoardLane",
    "System.NodeName",
    "System.PersonId",
    "System.CommentCount",
];

/// Which parts of a work item the server returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expand {
    None,
    Relations,
    Fields,
    Links,
    #[default]
    All,
}

impl Expand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Relations => "Relations",
            Self::Fields => "Fields",
            Self::Links => "Links",
            Self::All => "All",
        }
    }
}

/// Standard query parameters of mutating calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub expand: Expand,
    /// Do not enforce the work item type rules on this update.
    pub bypass_rules: bool,
    /// Do not fire notifications for this change.
    pub suppress_notifications: bool,
    /// Validate the change without saving it.
    pub validate_only: bool,
}

impl UpdateOptions {
    fn to_query(&self, api_version: &str) -> QueryParams {
        vec![
            ("api-version".to_string(), api_version.to_string()),
            ("$expand".to_string(), self.expand.as_str().to_string()),
            ("bypassRules".to_string(), self.bypass_rules.to_string()),
            (
                "suppressNotifications".to_string(),
                self.suppress_notifications.to_string(),
            ),
            ("validateOnly".to_string(), self.validate_only.to_string()),
        ]
    }
}

/// Client for the work item tracking endpoints of one project.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct WorkItemClient {
    transport: Arc<dyn Transport>,
    connection: Connection,
    settings: Arc<ClientSettings>,
}

impl WorkItemClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        connection: Connection,
        settings: Arc<ClientSettings>,
    ) -> Self {
        Self {
            transport,
            connection,
            settings,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn workitems_path(&self) -> String {
        format!("{}wit/workitems", self.connection.project_url())
    }

    fn version_query(&self) -> QueryParams {
        vec![(
            "api-version".to_string(),
            self.settings.api_version.clone(),
        )]
    }

    async fn send_patch(
        &self,
        operation: &str,
        path: &str,
        patch: &[PatchOperation],
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        let body = serde_json::to_value(patch)?;
        let response = self
            .transport
            .patch(
                path,
                &body,
                &options.to_query(&self.settings.api_version),
                &[("Content-Type", JSON_PATCH_CONTENT_TYPE)],
            )
            .await?;
        mappers::parse_work_item(operation, response)
    }

    /// Fetches work items by id, `batch_size` ids per request.
    ///
    /// Results keep the order of `ids`. When `fields` is given only those fields
    /// are returned and `expand` is not sent, since the server rejects the
    /// combination. A malformed batch fails the whole call.
    pub async fn get_workitems(
        &self,
        ids: &[i32],
        fields: Option<&[&str]>,
        expand: Expand,
        batch_size: Option<usize>,
    ) -> Result<Vec<WorkItem>> {
        if ids.is_empty() {
            return Err(TfsError::validation("work item ids can't be empty"));
        }
        let batch_size = batch_size.unwrap_or(self.settings.batch_size);
        if batch_size == 0 {
            return Err(TfsError::validation("batch size must be greater than zero"));
        }

        let fields = fields.filter(|names| !names.is_empty());
        let concurrency = self.settings.max_concurrent_batches.max(1);

        debug!(
            count = ids.len(),
            batch_size, concurrency, "fetching work items in batches"
        );

        let batches: Vec<Vec<WorkItem>> = stream::iter(ids.chunks(batch_size))
            .map(|chunk| self.fetch_batch(chunk, fields, expand))
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    async fn fetch_batch(
        &self,
        ids: &[i32],
        fields: Option<&[&str]>,
        expand: Expand,
    ) -> Result<Vec<WorkItem>> {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut query = vec![("ids".to_string(), id_list)];
        match fields {
            Some(names) => query.push(("fields".to_string(), names.join(","))),
            None => query.push(("$expand".to_string(), expand.as_str().to_string())),
        }
        query.extend(self.version_query());

        debug!(batch = ids.len(), "requesting work item batch");
        let response = self
            .transport
            .get(&self.workitems_path(), &query, &[])
            .await?;
        mappers::parse_work_item_list("get_workitems", response)
    }

    /// Fetches one work item with all relations, or only `fields` when given.
    pub async fn get_single_workitem(&self, id: i32, fields: Option<&[&str]>) -> Result<WorkItem> {
        self.get_workitems(&[id], fields, Expand::All, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                TfsError::response_shape("get_single_workitem", format!("work item {id} not returned"))
            })
    }

    /// Creates a work item of `type_name` with the given fields and relations.
    ///
    /// The patch holds the field operations first, then one relation operation per
    /// entry of `relations`, both in input order.
    pub async fn create_workitem(
        &self,
        type_name: &str,
        fields: &FieldMap,
        relations: &[Relation],
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        if type_name.is_empty() {
            return Err(TfsError::validation("work item type name can't be empty"));
        }

        let mut patch = build_field_patch(fields);
        patch.extend(relations.iter().map(|relation| {
            build_relation_add_patch(relation.relation_name(), relation.url(), relation.attributes())
        }));

        debug!(
            type_name,
            fields = fields.len(),
            relations = relations.len(),
            "creating work item"
        );

        let body = serde_json::to_value(&patch)?;
        let path = format!("{}/${}", self.workitems_path(), type_name);
        let response = self
            .transport
            .post(
                &path,
                &body,
                &options.to_query(&self.settings.api_version),
                &[("Content-Type", JSON_PATCH_CONTENT_TYPE)],
            )
            .await?;
        mappers::parse_work_item("create_workitem", response)
    }

    /// Creates a new work item of the same type with the source's fields.
    ///
    /// Server-managed fields ([`COPY_IGNORED_FIELDS`]) and `extra_ignored` are left
    /// out; `field_overrides` replace copied values or add new ones. Relations are
    /// not copied.
    pub async fn copy_workitem<'a>(
        &self,
        source: impl Into<WorkItemRef<'a>>,
        field_overrides: Option<&FieldMap>,
        extra_ignored: &[&str],
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        let fetched;
        let source = match source.into() {
            WorkItemRef::Item(item) => item,
            WorkItemRef::Id(id) => {
                fetched = self.get_single_workitem(id, None).await?;
                &fetched
            }
        };

        let type_name = source.type_name().ok_or_else(|| {
            TfsError::validation(format!(
                "work item {} has no type name to copy",
                source.id()
            ))
        })?;

        let mut fields: FieldMap = source
            .fields()
            .into_iter()
            .filter(|(name, _)| {
                !COPY_IGNORED_FIELDS.contains(&name.as_str())
                    && !extra_ignored.contains(&name.as_str())
            })
            .collect();

        if let Some(overrides) = field_overrides {
            for (name, value) in overrides {
                fields.insert(name.clone(), value.clone());
            }
        }

        debug!(source = source.id(), type_name, "copying work item");
        self.create_workitem(type_name, &fields, &[], options).await
    }

    /// Writes `fields` onto an existing work item.
    ///
    /// There is no revision check: concurrent writers overwrite each other.
    pub async fn update_workitem_fields<'a>(
        &self,
        target: impl Into<WorkItemRef<'a>>,
        fields: &FieldMap,
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        if fields.is_empty() {
            return Err(TfsError::validation("fields to update can't be empty"));
        }

        let id = target.into().id();
        debug!(work_item = id, fields = fields.len(), "updating work item fields");

        let path = format!("{}/{}", self.workitems_path(), id);
        self.send_patch("update_workitem_fields", &path, &build_field_patch(fields), options)
            .await
    }

    /// Links `source` to `destination` and returns the updated source.
    ///
    /// A destination given by id is fetched first to learn its URL.
    pub async fn add_relation<'a, 'b>(
        &self,
        source: impl Into<WorkItemRef<'a>>,
        destination: impl Into<WorkItemRef<'b>>,
        relation_name: &str,
        attributes: Option<Value>,
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        if relation_name.is_empty() {
            return Err(TfsError::validation("relation name can't be empty"));
        }

        let source_id = source.into().id();
        let destination_url = match destination.into() {
            WorkItemRef::Item(item) => item.url().to_string(),
            WorkItemRef::Id(id) => self.get_single_workitem(id, None).await?.url().to_string(),
        };

        debug!(
            work_item = source_id,
            relation = relation_name,
            destination = %destination_url,
            "adding relation"
        );

        let patch = [build_relation_add_patch(
            relation_name,
            &destination_url,
            attributes.as_ref(),
        )];
        let path = format!("{}/{}", self.workitems_path(), source_id);
        self.send_patch("add_relation", &path, &patch, options).await
    }

    /// Removes `relation` from `work_item`.
    ///
    /// The relation is located by position in `work_item.relations()`, and the
    /// request only succeeds if the item is still at `work_item.revision()`. Pass a
    /// freshly fetched item; a stale one fails the revision test on the server.
    pub async fn remove_relation(
        &self,
        work_item: &WorkItem,
        relation: &Relation,
        options: &UpdateOptions,
    ) -> Result<WorkItem> {
        let revision = work_item.revision().ok_or_else(|| {
            TfsError::validation(format!("work item {} has no revision", work_item.id()))
        })?;

        let index = find_relation_index(work_item.relations(), relation).ok_or_else(|| {
            TfsError::RelationNotFound {
                work_item_id: work_item.id(),
                relation_name: relation.relation_name().to_string(),
                destination: relation.destination_id(),
            }
        })?;

        debug!(
            work_item = work_item.id(),
            index, revision, "removing relation"
        );

        let path = format!("{}/{}", self.workitems_path(), work_item.id());
        self.send_patch(
            "remove_relation",
            &path,
            &build_relation_remove_patch(index, revision),
            options,
        )
        .await
    }

    /// Runs a WIQL query and returns the matched ids.
    pub async fn run_wiql(&self, query: &str, max_top: Option<u32>) -> Result<WiqlResult> {
        if query.trim().is_empty() {
            return Err(TfsError::validation("WIQL query can't be empty"));
        }

        let mut params = self.version_query();
        if let Some(top) = max_top {
            params.push(("$top".to_string(), top.to_string()));
        }

        debug!(query, "running WIQL query");
        let path = format!("{}wit/wiql", self.connection.project_url());
        let response = self
            .transport
            .post(&path, &json!({ "query": query }), &params, &[])
            .await?;
        mappers::parse_wiql("run_wiql", response)
    }

    /// Runs a saved query by id or path.
    pub async fn run_saved_query(&self, query_id: &str) -> Result<WiqlResult> {
        if query_id.is_empty() {
            return Err(TfsError::validation("query id can't be empty"));
        }

        let mut params = vec![("$expand".to_string(), "wiql".to_string())];
        params.extend(self.version_query());

        let path = format!("{}wit/queries/{}", self.connection.project_url(), query_id);
        let response = self.transport.get(&path, &params, &[]).await?;
        let wiql = mappers::parse_saved_query("run_saved_query", response)?;

        self.run_wiql(&wiql, None).await
    }

    /// Revision history of a work item, oldest first.
    pub async fn get_workitem_changes(
        &self,
        id: i32,
        skip: u32,
        top: Option<u32>,
    ) -> Result<Vec<WorkItemChange>> {
        let mut params = vec![("$skip".to_string(), skip.to_string())];
        if let Some(top) = top {
            params.push(("$top".to_string(), top.to_string()));
        }
        params.extend(self.version_query());

        let path = format!("{}wit/workItems/{}/updates", self.connection.project_url(), id);
        let response = self.transport.get(&path, &params, &[]).await?;
        mappers::parse_changes("get_workitem_changes", response)
    }
}

impl std::fmt::Debug for WorkItemClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkItemClient")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
