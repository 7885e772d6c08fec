//! Results of WIQL queries.

use super::WorkItem;
use crate::api::{Expand, WorkItemClient};
use crate::error::Result;

/// Ids matched by a WIQL query, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiqlResult {
    ids: Vec<i32>,
}

impl WiqlResult {
    pub fn new(ids: Vec<i32>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Fetches the matched work items with all fields.
    ///
    /// Every call goes to the server again; nothing is cached.
    pub async fn work_items(&self, client: &WorkItemClient) -> Result<Vec<WorkItem>> {
        if self.ids.is_empty() {
            return Ok(Vec::new());
        }
        client
            .get_workitems(&self.ids, None, Expand::All, None)
            .await
    }
}
