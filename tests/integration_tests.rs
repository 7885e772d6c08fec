//! Integration tests for the tfsclient library
//!
//! These tests drive the public API through a scripted transport and verify the
//! requests it produces end to end.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tfsclient::api::UpdateOptions;
use tfsclient::error::Result;
use tfsclient::{
    ClientSettings, CommitResult, Config, FieldMap, Relation, RelationType, TfsClient, TfsError,
    Transport, WorkItem,
};

const ITEMS: &str = "https://tfs/DefaultCollection/_apis/wit/workItems";

#[derive(Debug, Clone)]
struct Sent {
    method: &'static str,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl Sent {
    fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Answers requests from a fixed script, or echoes batch fetches.
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<Value>>,
    sent: Mutex<Vec<Sent>>,
}

impl ScriptedTransport {
    fn reply(&self, body: Value) {
        self.replies.lock().unwrap().push_back(body);
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: &'static str,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let sent = Sent {
            method,
            path: path.to_string(),
            query: query.to_vec(),
            body: body.cloned(),
        };
        let ids = sent.query("ids").map(str::to_string);
        self.sent.lock().unwrap().push(sent);

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        match ids {
            Some(ids) => Ok(json!({
                "count": ids.split(',').count(),
                "value": ids.split(',').map(|id| item_json(id.parse().unwrap(), 1)).collect::<Vec<_>>()
            })),
            None => Err(TfsError::validation("no scripted reply")),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        _headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.answer("GET", path, query, None)
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        _headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.answer("POST", path, query, Some(body))
    }

    async fn patch(
        &self,
        path: &str,
        body: &Value,
        query: &[(String, String)],
        _headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.answer("PATCH", path, query, Some(body))
    }
}

fn item_json(id: i32, rev: i32) -> Value {
    json!({
        "id": id,
        "rev": rev,
        "url": format!("{ITEMS}/{id}"),
        "fields": {
            "System.Id": id,
            "System.WorkItemType": "Task",
            "System.Rev": rev,
            "System.Title": format!("Item {id}")
        }
    })
}

fn client(transport: &Arc<ScriptedTransport>) -> TfsClient {
    let settings = ClientSettings::new(
        "https://tfs/",
        "DefaultCollection/Apollo",
        SecretString::from("pat".to_string()),
    );
    TfsClient::with_transport(transport.clone(), settings)
}

#[tokio::test]
async fn test_create_patch_ordering() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(&transport);
    transport.reply(item_json(100, 1));

    let mut fields = FieldMap::new();
    fields.insert("System.Title".to_string(), "T".into());
    let relations = [
        Relation::new(RelationType::Parent.name(), format!("{ITEMS}/5"), None),
        Relation::new(RelationType::Related.name(), format!("{ITEMS}/6"), None),
    ];

    let created = client
        .work_items()
        .create_workitem("Task", &fields, &relations, &UpdateOptions::default())
        .await
        .unwrap();

    assert_eq!(created.id(), 100);
    let sent = transport.sent();
    assert_eq!(sent[0].method, "POST");
    assert!(sent[0].path.ends_with("wit/workitems/$Task"));
    let ops = sent[0].body.as_ref().unwrap().as_array().unwrap().clone();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0]["path"], "/fields/System.Title");
    assert_eq!(ops[1]["value"]["url"], format!("{ITEMS}/5"));
    assert_eq!(ops[2]["value"]["url"], format!("{ITEMS}/6"));
}

#[tokio::test]
async fn test_batch_partitioning_preserves_order() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(&transport);
    let ids: Vec<i32> = (1..=120).collect();

    let items = client
        .work_items()
        .get_workitems(&ids, None, tfsclient::Expand::All, Some(50))
        .await
        .unwrap();

    let returned: Vec<i32> = items.iter().map(WorkItem::id).collect();
    assert_eq!(returned, ids);
    let sizes: Vec<usize> = transport
        .sent()
        .iter()
        .map(|sent| sent.query("ids").unwrap().split(',').count())
        .collect();
    assert_eq!(sizes, vec![50, 50, 20]);
}

#[tokio::test]
async fn test_commit_round_trip() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(&transport);
    let work_items = client.work_items();

    let mut item = work_items.get_single_workitem(8, None).await.unwrap();
    assert_eq!(item.commit(&work_items).await, CommitResult::Empty);

    item.set_title("Renamed").unwrap();
    assert_eq!(item.title(), Some("Renamed"));

    let mut confirmed = item_json(8, 2);
    confirmed["fields"]["System.Title"] = json!("Renamed on server");
    transport.reply(confirmed);

    assert_eq!(item.commit(&work_items).await, CommitResult::Success);
    assert_eq!(item.title(), Some("Renamed on server"));
    assert_eq!(item.revision(), Some(2));
    assert!(!item.is_dirty());

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].method, "PATCH");
    assert_eq!(sent[1].query("$expand"), Some("Fields"));
}

#[tokio::test]
async fn test_relation_removal_is_revision_guarded() {
    let transport = Arc::new(ScriptedTransport::default());
    let client = client(&transport);
    let mut source = item_json(40, 9);
    source["relations"] = json!([
        {"rel": "A", "url": format!("{ITEMS}/1")},
        {"rel": "B", "url": format!("{ITEMS}/2")},
        {"rel": "A", "url": format!("{ITEMS}/3")}
    ]);
    let item = WorkItem::from_json(source).unwrap();
    transport.reply(item_json(40, 10));

    let target = Relation::new("A", format!("{ITEMS}/3"), None);
    client
        .work_items()
        .remove_relation(&item, &target, &UpdateOptions::default())
        .await
        .unwrap();

    assert_eq!(
        transport.sent()[0].body,
        Some(json!([
            {"op": "test", "path": "/rev", "value": 9},
            {"op": "remove", "path": "/relations/2"}
        ]))
    );
}

#[test]
fn test_config_resolution() {
    let settings = Config::default()
        .merge(Config::explicit("https://tfs/", "DefaultCollection/Apollo", "pat"))
        .resolve()
        .unwrap();
    assert_eq!(settings.batch_size, 50);
    assert_eq!(settings.api_version, "6.0");

    assert!(Config::default().resolve().is_err());
}

#[test]
fn test_library_version() {
    let version = tfsclient::VERSION;
    assert!(!version.is_empty());
    assert!(version.contains('.'));
}
