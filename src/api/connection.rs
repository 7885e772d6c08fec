//! Collection and project addressing.

/// Collection used when a project path is empty.
pub const DEFAULT_COLLECTION: &str = "DefaultCollection";

/// Resolves request paths for one collection and, optionally, one project in it.
///
/// Paths are relative to the server URL, so they can be joined onto it directly.
///
/// # Example
///
/// ```rust
/// use tfsclient::api::Connection;
///
/// let connection = Connection::parse("DefaultCollection/Phoenix");
/// assert_eq!(connection.api_url(), "DefaultCollection/_apis/");
/// assert_eq!(connection.project_url(), "DefaultCollection/Phoenix/_apis/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    collection: String,
    project: Option<String>,
}

impl Connection {
    /// Parses a `Collection/Project` path.
    ///
    /// The collection is the first segment and the project the second one when it
    /// is non-empty. Further segments are ignored.
    pub fn parse(project_path: &str) -> Self {
        let mut segments = project_path.trim().split('/');
        let collection = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(DEFAULT_COLLECTION)
            .to_string();
        let project = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);

        Self {
            collection,
            project,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Switches to another project of the same collection.
    pub fn set_project(&mut self, project: Option<String>) {
        self.project = project.filter(|name| !name.is_empty());
    }

    /// Collection-scoped API root, ending with `/`.
    pub fn api_url(&self) -> String {
        format!("{}/_apis/", self.collection)
    }

    /// Project-scoped API root, or the collection root when there is no project.
    pub fn project_url(&self) -> String {
        match &self.project {
            Some(project) => format!("{}/{}/_apis/", self.collection, project),
            None => self.api_url(),
        }
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::parse(DEFAULT_COLLECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # Connection URL Construction
    ///
    /// Tests collection and project API roots.
    ///
    /// ## Test Scenario
    /// - Parses `DefaultCollection/TestProject`
    ///
    /// ## Expected Outcome
    /// - Collection and project are split on the first slash
    /// - Both roots end with `_apis/`
    #[test]
    fn test_parse_collection_and_project() {
        let connection = Connection::parse("DefaultCollection/TestProject");

        assert_eq!(connection.collection(), "DefaultCollection");
        assert_eq!(connection.project(), Some("TestProject"));
        assert_eq!(connection.api_url(), "DefaultCollection/_apis/");
        assert_eq!(
            connection.project_url(),
            "DefaultCollection/TestProject/_apis/"
        );
    }

    /// # Collection Only
    ///
    /// Tests that a missing or empty project falls back to the collection root.
    #[test]
    fn test_parse_without_project() {
        for path in ["Sales", "Sales/", "Sales//Extra"] {
            let connection = Connection::parse(path);
            assert_eq!(connection.collection(), "Sales");
            assert_eq!(connection.project(), None);
            assert_eq!(connection.project_url(), "Sales/_apis/");
        }
    }

    #[test]
    fn test_parse_ignores_extra_segments() {
        let connection = Connection::parse("Sales/Portal/Backend");
        assert_eq!(connection.project(), Some("Portal"));
    }

    #[test]
    fn test_default_and_set_project() {
        let mut connection = Connection::default();
        assert_eq!(connection.collection(), DEFAULT_COLLECTION);

        connection.set_project(Some("Apollo".to_string()));
        assert_eq!(connection.project_url(), "DefaultCollection/Apollo/_apis/");

        connection.set_project(Some(String::new()));
        assert_eq!(connection.project(), None);
    }
}
