//! Entry point tying settings, transport and the endpoint clients together.

use std::sync::Arc;

use super::connection::Connection;
use super::projects::ProjectClient;
use super::traits::{HttpTransport, Transport};
use super::work_items::WorkItemClient;
use crate::config::ClientSettings;
use crate::error::Result;

/// Client for one TFS / Azure DevOps Server collection and project.
///
/// # Example
///
/// ```rust,no_run
/// use secrecy::SecretString;
/// use tfsclient::{ClientSettings, TfsClient};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = ClientSettings::new(
///     "https://tfs.example.com/tfs",
///     "DefaultCollection/MyProject",
///     SecretString::from("my-pat".to_string()),
/// );
/// let client = TfsClient::new(settings)?;
///
/// let item = client.work_items().get_single_workitem(42, None).await?;
/// println!("{:?}", item.title());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TfsClient {
    transport: Arc<dyn Transport>,
    connection: Connection,
    settings: Arc<ClientSettings>,
}

impl TfsClient {
    /// Creates a client talking HTTPS to `settings.server_url`.
    ///
    /// # Errors
    ///
    /// Fails when the server URL is invalid or the HTTP client can't be built.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let transport = HttpTransport::new(
            &settings.server_url,
            &settings.credential(),
            settings.verify_ssl,
            settings.timeout,
        )?;
        Ok(Self::with_transport(Arc::new(transport), settings))
    }

    /// Creates a client on top of any [`Transport`].
    pub fn with_transport(transport: Arc<dyn Transport>, settings: ClientSettings) -> Self {
        Self {
            transport,
            connection: Connection::parse(&settings.project),
            settings: Arc::new(settings),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Work item tracking endpoints of the configured project.
    pub fn work_items(&self) -> WorkItemClient {
        WorkItemClient::new(
            Arc::clone(&self.transport),
            self.connection.clone(),
            Arc::clone(&self.settings),
        )
    }

    /// Project and team endpoints of the configured collection.
    pub fn projects(&self) -> ProjectClient {
        ProjectClient::new(
            Arc::clone(&self.transport),
            self.connection.clone(),
            Arc::clone(&self.settings),
        )
    }
}
