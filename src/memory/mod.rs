//! In-process backend and object store.
//!
//! Interprets the operation catalog over in-memory tables and pushes created
//! records to matching subscriptions through a broadcast channel. Used for
//! offline runs and as the fake behind every test.

mod filter;

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures_util::{StreamExt, stream};
use serde::Serialize;
use serde_json::{Map, Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::broadcast;
use uuid::Uuid;

pub use filter::matches;

use crate::{
    AppResult, GetField,
    backend::{Backend, Subscription},
    graphql::{GraphQlRequest, Operation, OperationKind},
    storage::ObjectStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    UserProfile,
    Post,
    Comment,
    Like,
    Follow,
    Chat,
    Message,
    Notification,
}

/// How an operation maps onto the tables.
enum Plan {
    Get(Table),
    Scan(Table),
    Index(Table, &'static str),
    Create(Table, Option<Operation>),
    Delete(Table),
    Update(Table),
}

fn plan(operation: Operation) -> Option<Plan> {
    use Operation::*;
    Some(match operation {
        GetUserProfile => Plan::Get(Table::UserProfile),
        GetPost => Plan::Get(Table::Post),
        ListUserProfiles => Plan::Scan(Table::UserProfile),
        ListPosts => Plan::Scan(Table::Post),
        ListChats => Plan::Scan(Table::Chat),
        PostsByUserId => Plan::Index(Table::Post, "userID"),
        CommentsByPostId => Plan::Index(Table::Comment, "postID"),
        LikesByPostId => Plan::Index(Table::Like, "postID"),
        FollowsByFollowerId => Plan::Index(Table::Follow, "followerID"),
        MessagesByChatIdAndCreatedAt => Plan::Index(Table::Message, "chatID"),
        NotificationsByReceiverId => Plan::Index(Table::Notification, "receiverID"),
        CreateUserProfile => Plan::Create(Table::UserProfile, None),
        CreatePost => Plan::Create(Table::Post, Some(OnCreatePost)),
        CreateComment => Plan::Create(Table::Comment, Some(OnCreateComment)),
        CreateLike => Plan::Create(Table::Like, Some(OnCreateLike)),
        CreateFollow => Plan::Create(Table::Follow, Some(OnCreateFollow)),
        CreateChat => Plan::Create(Table::Chat, None),
        CreateMessage => Plan::Create(Table::Message, Some(OnCreateMessage)),
        DeletePost => Plan::Delete(Table::Post),
        DeleteComment => Plan::Delete(Table::Comment),
        DeleteLike => Plan::Delete(Table::Like),
        DeleteFollow => Plan::Delete(Table::Follow),
        UpdateNotification => Plan::Update(Table::Notification),
        OnCreatePost | OnCreateComment | OnCreateLike | OnCreateFollow | OnCreateMessage
        | OnCreateNotification => return None,
    })
}

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Value>>,
    clock: Option<OffsetDateTime>,
}

impl Tables {
    fn table(&mut self, table: Table) -> &mut Vec<Value> {
        self.rows.entry(table).or_default()
    }

    fn find(&self, table: Table, id: &str) -> Option<&Value> {
        self.rows
            .get(&table)?
            .iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id))
    }

    /// Strictly increasing timestamps, so creation order is always observable.
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::from_millis(1),
            _ => now,
        };
        self.clock = Some(next);
        next
    }

    fn hydrate(&self, table: Table, record: &mut Value) {
        let lookup = |t: Table, key: &str| -> Value {
            record
                .get(key)
                .and_then(Value::as_str)
                .and_then(|id| self.find(t, id))
                .cloned()
                .unwrap_or(Value::Null)
        };

        let nested: Vec<(&str, Value)> = match table {
            Table::Comment | Table::Like => {
                let post = lookup(Table::Post, "postID");
                let post = match post {
                    Value::Null => Value::Null,
                    post => json!({ "id": post["id"], "userID": post["userID"] }),
                };
                vec![("post", post), ("user", lookup(Table::UserProfile, "userID"))]
            }
            Table::Follow => vec![("follower", lookup(Table::UserProfile, "followerID"))],
            _ => Vec::new(),
        };

        if let Value::Object(fields) = record {
            for (key, value) in nested {
                fields.insert(key.to_owned(), value);
            }
        }
    }
}

fn created_at(row: &Value) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(row.get("createdAt")?.as_str()?, &Rfc3339).ok()
}

struct SubscriptionGuard(Arc<AtomicUsize>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MemoryBackend {
    tables: Mutex<Tables>,
    failures: Mutex<HashMap<Operation, usize>>,
    log: Mutex<Vec<GraphQlRequest>>,
    tx: broadcast::Sender<(Operation, Value)>,
    live: Arc<AtomicUsize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            failures: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            tx: broadcast::channel(256).0,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a record as-is, without notifying subscribers.
    pub fn insert<T: Serialize>(&self, table: Table, record: &T) -> AppResult<()> {
        let value = serde_json::to_value(record)?;
        self.tables().table(table).push(value);
        Ok(())
    }

    pub fn remove(&self, table: Table, id: &str) {
        self.tables()
            .table(table)
            .retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
    }

    pub fn count(&self, table: Table) -> usize {
        self.tables().rows.get(&table).map_or(0, Vec::len)
    }

    /// Delivers `record` to subscribers of `operation` without storing it.
    pub fn push<T: Serialize>(&self, operation: Operation, record: &T) -> AppResult<()> {
        let value = serde_json::to_value(record)?;
        let _ = self.tx.send((operation, value));
        Ok(())
    }

    /// Makes the next `times` calls of `operation` fail.
    pub fn fail_next(&self, operation: Operation, times: usize) {
        self.failures
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(operation, times);
    }

    /// Open subscriptions right now.
    pub fn live_subscriptions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Variables of every executed call of `operation`, oldest first.
    pub fn calls(&self, operation: Operation) -> Vec<Value> {
        self.log
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .filter(|r| r.operation == operation)
            .map(|r| r.variables.clone())
            .collect()
    }

    fn check_failure(&self, operation: Operation) -> AppResult<()> {
        let mut failures = self.failures.lock().unwrap_or_else(|p| p.into_inner());
        match failures.get_mut(&operation) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(format!("injected failure: {}", operation.name()).into())
            }
            _ => Ok(()),
        }
    }

    fn list(&self, table: Table, index: Option<&str>, vars: &Value) -> AppResult<Value> {
        let mut rows: Vec<Value> = {
            let tables = self.tables();
            let key = match index {
                Some(field) => Some((field, vars.get_str_field(field)?)),
                None => None,
            };
            tables
                .rows
                .get(&table)
                .map(|rows| {
                    rows.iter()
                        .filter(|row| match &key {
                            Some((field, value)) => row.get(*field).and_then(Value::as_str) == Some(value.as_str()),
                            None => true,
                        })
                        .filter(|row| matches(vars.get("filter").unwrap_or(&Value::Null), row))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if index.is_some() {
            rows.sort_by(|a, b| created_at(a).cmp(&created_at(b)));
            if vars.get("sortDirection").and_then(Value::as_str) == Some("DESC") {
                rows.reverse();
            }
        }

        let offset: usize = match vars.get("nextToken").and_then(Value::as_str) {
            Some(token) => token.parse()?,
            None => 0,
        };
        let limit = vars
            .get("limit")
            .and_then(Value::as_u64)
            .map_or(rows.len(), |l| l as usize);
        let end = rows.len().min(offset.saturating_add(limit));
        let next_token = (end < rows.len()).then(|| end.to_string());
        let items: Vec<Value> = rows.get(offset..end).map(<[Value]>::to_vec).unwrap_or_default();

        Ok(json!({ "items": items, "nextToken": next_token }))
    }

    fn create(&self, table: Table, push_to: Option<Operation>, vars: &Value) -> AppResult<Value> {
        let Value::Object(input) = vars.get_obj_field("input")?.clone() else {
            return Err("input must be an object".into());
        };

        let record = {
            let mut tables = self.tables();
            let now = tables.tick().format(&Rfc3339)?;
            let mut fields: Map<String, Value> = input;
            fields
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4().to_string()));
            fields.entry("createdAt").or_insert_with(|| json!(now.clone()));
            fields.entry("updatedAt").or_insert_with(|| json!(now));
            if table == Table::Notification {
                fields.entry("isRead").or_insert(json!(false));
            }

            let id = fields.get("id").and_then(Value::as_str).unwrap_or_default().to_owned();
            if tables.find(table, &id).is_some() {
                return Err(format!("conditional request failed: {id} exists").into());
            }

            let mut record = Value::Object(fields);
            tables.table(table).push(record.clone());
            tables.hydrate(table, &mut record);
            record
        };

        if let Some(push_to) = push_to {
            let _ = self.tx.send((push_to, record.clone()));
        }
        if table == Table::Message {
            self.touch_chat(&record);
        }
        Ok(record)
    }

    fn touch_chat(&self, message: &Value) {
        let Some(chat_id) = message.get("chatID").and_then(Value::as_str) else {
            return;
        };
        let mut tables = self.tables();
        let now = message["createdAt"].clone();
        if let Some(chat) = tables
            .table(Table::Chat)
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(chat_id))
        {
            chat["updatedAt"] = now;
        }
    }

    fn delete(&self, table: Table, vars: &Value) -> AppResult<Value> {
        let id = vars.get_obj_field("input")?.get_str_field("id")?;
        let mut tables = self.tables();
        let rows = tables.table(table);
        let Some(pos) = rows
            .iter()
            .position(|row| row.get("id").and_then(Value::as_str) == Some(id.as_str()))
        else {
            return Err(format!("conditional request failed: {id} not found").into());
        };
        Ok(rows.remove(pos))
    }

    fn update(&self, table: Table, vars: &Value) -> AppResult<Value> {
        let input = vars.get_obj_field("input")?;
        let id = input.get_str_field("id")?;
        let mut tables = self.tables();
        let now = tables.tick().format(&Rfc3339)?;
        let Some(row) = tables
            .table(table)
            .iter_mut()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id.as_str()))
        else {
            return Err(format!("conditional request failed: {id} not found").into());
        };
        if let (Value::Object(fields), Value::Object(patch)) = (&mut *row, input) {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
            fields.insert("updatedAt".to_owned(), json!(now));
        }
        Ok(row.clone())
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn execute(&self, request: GraphQlRequest) -> AppResult<Value> {
        let operation = request.operation;
        self.log
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request.clone());
        self.check_failure(operation)?;

        let Some(plan) = plan(operation) else {
            return Err(format!("{} must be subscribed to", operation.name()).into());
        };
        let vars = &request.variables;

        let result = match plan {
            Plan::Get(table) => {
                let id = vars.get_str_field("id")?;
                let mut found = self.tables().find(table, &id).cloned().unwrap_or(Value::Null);
                self.tables().hydrate(table, &mut found);
                found
            }
            Plan::Scan(table) => self.list(table, None, vars)?,
            Plan::Index(table, field) => self.list(table, Some(field), vars)?,
            Plan::Create(table, push_to) => self.create(table, push_to, vars)?,
            Plan::Delete(table) => self.delete(table, vars)?,
            Plan::Update(table) => self.update(table, vars)?,
        };

        Ok(json!({ operation.root_field(): result }))
    }

    async fn subscribe(&self, request: GraphQlRequest) -> AppResult<Subscription> {
        let operation = request.operation;
        if operation.kind() != OperationKind::Subscription {
            return Err(format!("{} is not a subscription", operation.name()).into());
        }
        self.check_failure(operation)?;

        let filter = request.variables.get("filter").cloned().unwrap_or(Value::Null);
        let rx = self.tx.subscribe();
        self.live.fetch_add(1, Ordering::SeqCst);
        let guard = SubscriptionGuard(self.live.clone());

        let events = stream::unfold((rx, guard), move |(mut rx, guard)| {
            let filter = filter.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok((op, record)) if op == operation && matches(&filter, &record) => {
                            let data = json!({ operation.root_field(): record });
                            return Some((Ok(data), (rx, guard)));
                        }
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "memory subscription lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(Subscription::new(operation, events.boxed()))
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    broken: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, bytes: Vec<u8>) {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_owned(), (bytes, "application/octet-stream".to_owned()));
    }

    /// Makes both resolution and upload of `key` fail.
    pub fn break_key(&self, key: &str) {
        self.broken
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_owned());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn check(&self, key: &str) -> AppResult<()> {
        if self.broken.lock().unwrap_or_else(|p| p.into_inner()).contains(key) {
            return Err(format!("storage unavailable for {key}").into());
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn url_for(&self, key: &str) -> AppResult<String> {
        self.check(key)?;
        if !self.contains(key) {
            return Err(format!("no such key: {key}").into());
        }
        Ok(format!("memory://media/{key}?expires=900"))
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.check(key)?;
        self.objects
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_owned(), (bytes, content_type.to_owned()));
        Ok(())
    }
}
