//! TFS / Azure DevOps Server REST API clients.
//!
//! This module provides clients for the work item tracking and project endpoints,
//! all sending their requests through a [`Transport`].
//!
//! ## Features
//!
//! - Work item creation, copy and field updates through JSON patch
//! - Relation add and revision-guarded relation removal
//! - Batched work item fetches with optional ordered concurrency
//! - WIQL and saved queries, revision history
//! - Paginated project, team and team member listings
//!
//! ## Example
//!
//! ```rust,no_run
//! use secrecy::SecretString;
//! use tfsclient::api::{TfsClient, UpdateOptions};
//! use tfsclient::{ClientSettings, FieldMap};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TfsClient::new(ClientSettings::new(
//!     "https://tfs.example.com/tfs",
//!     "DefaultCollection/MyProject",
//!     SecretString::from("my-pat".to_string()),
//! ))?;
//!
//! let mut fields = FieldMap::new();
//! fields.insert("System.Title".to_string(), "Fix login".into());
//! let task = client
//!     .work_items()
//!     .create_workitem("Task", &fields, &[], &UpdateOptions::default())
//!     .await?;
//! println!("Created work item {}", task.id());
//! # Ok(())
//! # }
//! ```

mod client;
mod connection;
mod credential;
mod mappers;
pub mod patch;
mod projects;
mod traits;
mod work_items;

pub use client::TfsClient;
pub use connection::{Connection, DEFAULT_COLLECTION};
pub use credential::PatCredential;
pub use projects::{MAX_PAGE_REQUESTS, ProjectClient};
pub use traits::{HttpTransport, QueryParams, Transport};
pub use work_items::{COPY_IGNORED_FIELDS, Expand, UpdateOptions, WorkItemClient};

#[cfg(test)]
pub use traits::mocks;
