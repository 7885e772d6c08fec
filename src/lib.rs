//! # tfsclient
//!
//! An async client library for the work item tracking REST API of Team Foundation
//! Server and Azure DevOps Server. This library provides:
//!
//! - Work item creation, copy, field updates and relation management
//! - Batched fetches, WIQL and saved queries, revision history
//! - Project, team and team member listings
//! - @-mentions in work item discussions
//! - Layered configuration (defaults, config file, environment)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tfsclient::{Config, TfsClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Config::load()?.resolve()?;
//! let client = TfsClient::new(settings)?;
//!
//! let mut item = client.work_items().get_single_workitem(42, None).await?;
//! item.set_title("Renamed")?;
//! let result = item.commit(&client.work_items()).await;
//! println!("Commit: {result:?}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod mention;
pub mod models;
pub mod parsed_property;

// Re-export commonly used types for convenience
pub use api::{Expand, ProjectClient, TfsClient, Transport, UpdateOptions, WorkItemClient};
pub use config::{ClientSettings, Config};
pub use error::{ConfigError, Result, TfsError};
pub use mention::{MentionResult, send_mention};
pub use models::{
    CommitResult, FieldMap, FieldValue, IdentityRef, Relation, RelationType,
    UpdateRelationsResult, WiqlResult, WorkItem, WorkItemType,
};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
