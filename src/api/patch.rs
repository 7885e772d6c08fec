//! JSON-patch documents for work item updates.
//!
//! The server applies every operation of one document atomically, so a `test`
//! operation placed before a `remove` turns the removal into a compare-and-swap on
//! the work item revision.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{FieldMap, Relation};

/// Media type of a JSON-patch request body.
pub const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// A single operation of a patch document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Remove { path } | Self::Test { path, .. } => path,
        }
    }
}

/// One `add` per field, in map iteration order.
pub fn build_field_patch(fields: &FieldMap) -> Vec<PatchOperation> {
    fields
        .iter()
        .map(|(name, value)| PatchOperation::Add {
            path: format!("/fields/{name}"),
            value: value.to_json(),
        })
        .collect()
}

/// Appends a relation to the end of the relation array.
pub fn build_relation_add_patch(
    relation_name: &str,
    destination_url: &str,
    attributes: Option<&Value>,
) -> PatchOperation {
    let mut relation = Map::new();
    relation.insert("rel".to_string(), Value::from(relation_name));
    relation.insert("url".to_string(), Value::from(destination_url));
    if let Some(attributes) = attributes {
        relation.insert("attributes".to_string(), attributes.clone());
    }

    PatchOperation::Add {
        path: "/relations/-".to_string(),
        value: Value::Object(relation),
    }
}

/// Removes the relation at `index`, but only if the item is still at `expected_revision`.
pub fn build_relation_remove_patch(index: usize, expected_revision: i32) -> Vec<PatchOperation> {
    vec![
        PatchOperation::Test {
            path: "/rev".to_string(),
            value: Value::from(expected_revision),
        },
        PatchOperation::Remove {
            path: format!("/relations/{index}"),
        },
    ]
}

/// Position of the first relation with the same type and destination as `target`.
///
/// The index is only meaningful for the revision the relations were read at.
pub fn find_relation_index(relations: &[Relation], target: &Relation) -> Option<usize> {
    relations.iter().position(|relation| {
        relation.relation_name() == target.relation_name()
            && relation.destination_id() == target.destination_id()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use serde_json::json;

    fn relation(name: &str, id: i32) -> Relation {
        Relation::new(
            name,
            format!("https://tfs/DefaultCollection/_apis/wit/workItems/{id}"),
            None,
        )
    }

    /// # Relation Index Resolution
    ///
    /// Tests the positional lookup used before a relation removal.
    ///
    /// ## Test Scenario
    /// - Relations [(A,1), (B,2), (A,3)]
    /// - Looks up (A,3), (A,1) and (C,9)
    ///
    /// ## Expected Outcome
    /// - (A,3) resolves to 2, (A,1) to the first match 0
    /// - (C,9) is not found
    #[test]
    fn test_find_relation_index() {
        let relations = vec![relation("A", 1), relation("B", 2), relation("A", 3)];

        assert_eq!(find_relation_index(&relations, &relation("A", 3)), Some(2));
        assert_eq!(find_relation_index(&relations, &relation("A", 1)), Some(0));
        assert_eq!(find_relation_index(&relations, &relation("C", 9)), None);
        assert_eq!(find_relation_index(&[], &relation("A", 1)), None);
    }

    /// # Field Patch Order
    ///
    /// Tests that field operations follow the map's insertion order.
    #[test]
    fn test_build_field_patch_order() {
        let mut fields = FieldMap::new();
        fields.insert("System.Title".to_string(), FieldValue::from("T"));
        fields.insert("System.State".to_string(), FieldValue::from("Active"));
        fields.insert("Custom.Points".to_string(), FieldValue::from(3_i64));

        let patch = build_field_patch(&fields);
        let wire = serde_json::to_value(&patch).unwrap();

        assert_eq!(
            wire,
            json!([
                {"op": "add", "path": "/fields/System.Title", "value": "T"},
                {"op": "add", "path": "/fields/System.State", "value": "Active"},
                {"op": "add", "path": "/fields/Custom.Points", "value": 3}
            ])
        );
        assert!(build_field_patch(&FieldMap::new()).is_empty());
    }

    /// # Revision-Guarded Removal
    ///
    /// Tests the wire form of the relation removal document.
    ///
    /// ## Expected Outcome
    /// - Exactly a test on /rev followed by a remove on the index, in that order
    #[test]
    fn test_build_relation_remove_patch() {
        let patch = build_relation_remove_patch(3, 17);
        let wire = serde_json::to_value(&patch).unwrap();

        assert_eq!(
            wire,
            json!([
                {"op": "test", "path": "/rev", "value": 17},
                {"op": "remove", "path": "/relations/3"}
            ])
        );
    }

    #[test]
    fn test_build_relation_add_patch() {
        let without = build_relation_add_patch("System.LinkTypes.Related", "https://x/workItems/5", None);
        assert_eq!(
            serde_json::to_value(&without).unwrap(),
            json!({
                "op": "add",
                "path": "/relations/-",
                "value": {"rel": "System.LinkTypes.Related", "url": "https://x/workItems/5"}
            })
        );

        let attributes = json!({"comment": "blocks release"});
        let with = build_relation_add_patch("System.LinkTypes.Related", "https://x/workItems/5", Some(&attributes));
        assert_eq!(with.path(), "/relations/-");
        assert_eq!(
            serde_json::to_value(&with).unwrap()["value"]["attributes"],
            attributes
        );
    }
}
