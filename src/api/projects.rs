//! Projects, teams and team members of a collection.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::connection::Connection;
use super::mappers;
use super::traits::{QueryParams, Transport};
use crate::config::ClientSettings;
use crate::error::{Result, TfsError};
use crate::models::{IdentityRef, Project, Team};

/// Upper bound on page requests for one paginated call.
pub const MAX_PAGE_REQUESTS: usize = 100;

/// Client for the collection-scoped core endpoints.
#[derive(Clone)]
pub struct ProjectClient {
    transport: Arc<dyn Transport>,
    connection: Connection,
    settings: Arc<ClientSettings>,
}

impl ProjectClient {
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

    fn projects_path(&self) -> String {
        format!("{}projects", self.connection.api_url())
    }

    fn api_version(&self) -> (String, String) {
        ("api-version".to_string(), self.settings.api_version.clone())
    }

    /// Walks a `$skip`-paginated endpoint until the server reports `count == 0` or
    /// returns an empty page.
    async fn paginate<T>(
        &self,
        operation: &str,
        path: &str,
        mut query: QueryParams,
        skip: usize,
        parse_page: impl Fn(&str, Value) -> Result<(Option<usize>, Vec<T>)>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut request_count = 0;
        query.push(("$skip".to_string(), skip.to_string()));
        let skip_index = query.len() - 1;

        loop {
            request_count += 1;
            if request_count > MAX_PAGE_REQUESTS {
                return Err(TfsError::PaginationLimitExceeded {
                    max: MAX_PAGE_REQUESTS,
                    retrieved: items.len(),
                });
            }

            let response = self.transport.get(path, &query, &[]).await?;
            let (count, page) = parse_page(operation, response)?;
            if count == Some(0) || page.is_empty() {
                break;
            }

            debug!(operation, page = page.len(), "fetched page");
            items.extend(page);
            query[skip_index].1 = (skip + items.len()).to_string();
        }

        Ok(items)
    }

    fn parse_page<T: DeserializeOwned>(
        operation: &str,
        payload: Value,
    ) -> Result<(Option<usize>, Vec<T>)> {
        mappers::parse_list(operation, payload)
    }

    /// All projects of the collection, starting after `skip` projects.
    pub async fn get_projects(&self, skip: usize) -> Result<Vec<Project>> {
        let path = self.projects_path();
        self.paginate(
            "get_projects",
            &path,
            vec![self.api_version()],
            skip,
            Self::parse_page::<Project>,
        )
        .await
    }

    /// A single project by id or name.
    pub async fn get_project(
        &self,
        project_id: &str,
        include_capabilities: bool,
        include_history: bool,
    ) -> Result<Project> {
        if project_id.is_empty() {
            return Err(TfsError::validation("project id can't be empty"));
        }

        let path = format!("{}/{}", self.projects_path(), project_id);
        let query = vec![
            self.api_version(),
            (
                "includeCapabilities".to_string(),
                include_capabilities.to_string(),
            ),
            ("includeHistory".to_string(), include_history.to_string()),
        ];
        let response = self.transport.get(&path, &query, &[]).await?;
        mappers::parse_object("get_project", response)
    }

    /// A single team of a project.
    pub async fn get_team(
        &self,
        project_id: &str,
        team_id: &str,
        expand_identity: bool,
    ) -> Result<Team> {
        if project_id.is_empty() {
            return Err(TfsError::validation("project id can't be empty"));
        }
        if team_id.is_empty() {
            return Err(TfsError::validation("team id can't be empty"));
        }

        let path = format!("{}/{}/teams/{}", self.projects_path(), project_id, team_id);
        let query = vec![
            self.api_version(),
            ("$expandIdentity".to_string(), expand_identity.to_string()),
        ];
        let response = self.transport.get(&path, &query, &[]).await?;
        mappers::parse_object("get_team", response)
    }

    /// Teams across the collection; with `mine` only those the caller belongs to.
    ///
    /// Served by a preview API version.
    pub async fn get_all_teams(&self, mine: bool) -> Result<Vec<Team>> {
        let path = format!("{}teams", self.connection.api_url());
        let query = vec![
            (
                "api-version".to_string(),
                self.settings.api_version_preview.clone(),
            ),
            ("$mine".to_string(), mine.to_string()),
        ];
        let response = self.transport.get(&path, &query, &[]).await?;
        let (_, teams) = mappers::parse_list("get_all_teams", response)?;
        Ok(teams)
    }

    /// Teams of one project.
    pub async fn get_project_teams(
        &self,
        project: &Project,
        expand_identity: bool,
        mine: bool,
        skip: usize,
    ) -> Result<Vec<Team>> {
        let path = format!("{}/{}/teams", self.projects_path(), project.id);
        let query = vec![
            self.api_version(),
            ("$expandIdentity".to_string(), expand_identity.to_string()),
            ("$mine".to_string(), mine.to_string()),
        ];
        self.paginate(
            "get_project_teams",
            &path,
            query,
            skip,
            Self::parse_page::<Team>,
        )
        .await
    }

    /// Members of a team.
    pub async fn get_project_team_members(
        &self,
        project: &Project,
        team: &Team,
    ) -> Result<Vec<IdentityRef>> {
        let path = format!(
            "{}/{}/teams/{}/members",
            self.projects_path(),
            project.id,
            team.id
        );
        self.paginate(
            "get_project_team_members",
            &path,
            vec![self.api_version()],
            0,
            mappers::parse_team_members,
        )
        .await
    }
}

impl std::fmt::Debug for ProjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectClient")
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}
