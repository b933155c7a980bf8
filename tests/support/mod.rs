//! Shared doubles and request helpers for router-level tests.

#![allow(dead_code)]

use std::future::pending;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use phonebook::application::contacts::{ContactService, OperationTimeouts};
use phonebook::application::repos::{ContactStore, DeleteOutcome, RepoError, UpdateOutcome};
use phonebook::cache::{CacheError, CacheKey, CacheStore, MemoryCache};
use phonebook::domain::contact::{Contact, ContactId, NewContact, PhoneNumber};
use phonebook::infra::http::{ApiState, build_router};

/// Document store kept in a vector, counting every call that reaches it.
#[derive(Default)]
pub struct InMemoryContactStore {
    contacts: Mutex<Vec<Contact>>,
    pub inserts: AtomicUsize,
    pub find_one_calls: AtomicUsize,
    pub find_all_calls: AtomicUsize,
}

impl InMemoryContactStore {
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn find_one_calls(&self) -> usize {
        self.find_one_calls.load(Ordering::SeqCst)
    }

    pub fn find_all_calls(&self) -> usize {
        self.find_all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn find_one(&self, id: ContactId) -> Result<Option<Contact>, RepoError> {
        self.find_one_calls.fetch_add(1, Ordering::SeqCst);
        let contacts = self.contacts.lock().await;
        Ok(contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Contact>, RepoError> {
        self.find_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.contacts.lock().await.clone())
    }

    async fn insert_one(&self, contact: NewContact) -> Result<ContactId, RepoError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let id = ContactId::new_v4();
        self.contacts.lock().await.push(contact.into_contact(id));
        Ok(id)
    }

    async fn update_phone(
        &self,
        id: ContactId,
        phone: &PhoneNumber,
    ) -> Result<UpdateOutcome, RepoError> {
        let mut contacts = self.contacts.lock().await;
        let Some(contact) = contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(UpdateOutcome::default());
        };
        let modified = u64::from(contact.phone != phone.as_str());
        contact.phone = phone.as_str().to_string();
        Ok(UpdateOutcome {
            matched: 1,
            modified,
        })
    }

    async fn delete_one(&self, id: ContactId) -> Result<DeleteOutcome, RepoError> {
        let mut contacts = self.contacts.lock().await;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        Ok(DeleteOutcome {
            deleted: (before - contacts.len()) as u64,
        })
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Store whose backend is gone: every call fails.
pub struct UnavailableStore;

#[async_trait]
impl ContactStore for UnavailableStore {
    async fn find_one(&self, _id: ContactId) -> Result<Option<Contact>, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn find_all(&self) -> Result<Vec<Contact>, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn insert_one(&self, _contact: NewContact) -> Result<ContactId, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn update_phone(
        &self,
        _id: ContactId,
        _phone: &PhoneNumber,
    ) -> Result<UpdateOutcome, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn delete_one(&self, _id: ContactId) -> Result<DeleteOutcome, RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Err(RepoError::from_persistence("connection refused"))
    }
}

/// Store that never answers.
pub struct StalledStore;

#[async_trait]
impl ContactStore for StalledStore {
    async fn find_one(&self, _id: ContactId) -> Result<Option<Contact>, RepoError> {
        pending().await
    }

    async fn find_all(&self) -> Result<Vec<Contact>, RepoError> {
        pending().await
    }

    async fn insert_one(&self, _contact: NewContact) -> Result<ContactId, RepoError> {
        pending().await
    }

    async fn update_phone(
        &self,
        _id: ContactId,
        _phone: &PhoneNumber,
    ) -> Result<UpdateOutcome, RepoError> {
        pending().await
    }

    async fn delete_one(&self, _id: ContactId) -> Result<DeleteOutcome, RepoError> {
        pending().await
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        pending().await
    }
}

/// Cache whose every call fails, as if the server were unreachable.
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    fn fail(&self) -> CacheError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CacheError::backend("connection refused")
    }
}

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Bytes>, CacheError> {
        Err(self.fail())
    }

    async fn set(&self, _key: &CacheKey, _value: Bytes) -> Result<(), CacheError> {
        Err(self.fail())
    }

    async fn delete(&self, _keys: &[CacheKey]) -> Result<(), CacheError> {
        Err(self.fail())
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(
        NonZeroUsize::new(128).expect("non-zero capacity"),
        None,
    ))
}

pub fn test_timeouts() -> OperationTimeouts {
    OperationTimeouts {
        store: Duration::from_millis(200),
        cache: Duration::from_millis(50),
    }
}

pub fn router(store: Arc<dyn ContactStore>, cache: Arc<dyn CacheStore>) -> Router {
    let contacts = ContactService::new(store, cache, test_timeouts());
    build_router(ApiState::new(contacts))
}

/// Send a request with an optional JSON body and decode the JSON reply.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    match body {
        Some(body) => {
            send_raw(
                app,
                method,
                uri,
                Some("application/json"),
                body.to_string(),
            )
            .await
        }
        None => send_raw(app, method, uri, None, String::new()).await,
    }
}

pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    content_type: Option<&str>,
    body: String,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    let request = builder
        .body(Body::from(body))
        .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };
    (status, json)
}

pub fn inserted_id(body: &Value) -> String {
    body["insertedId"]
        .as_str()
        .expect("insertedId should be a string")
        .to_string()
}

pub fn error_fields(body: &Value) -> Vec<(String, String)> {
    body["error"]["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .map(|f| {
                    (
                        f["field"].as_str().unwrap_or_default().to_string(),
                        f["reason"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}
