//! Callback types shared by the pipeline.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::http::request::Request;
use crate::http::response::Response;

/// Outcome of a chain callback. The terminal callback must return the
/// response it was handed.
pub type HandlerResult = anyhow::Result<Option<Response>>;

/// Outcome of a before/after middleware.
pub type MiddlewareResult = anyhow::Result<()>;

type HandlerFn = dyn Fn(Request, Response, Storage) -> BoxFuture<'static, HandlerResult> + Send + Sync;
type MiddlewareFn = dyn Fn(Request, Response, Storage) -> BoxFuture<'static, MiddlewareResult> + Send + Sync;

fn short_name<F>() -> String {
    let full = std::any::type_name::<F>();
    full.rsplit("::")
        .find(|part| !part.starts_with('{'))
        .unwrap_or(full)
        .to_string()
}

/// A named route callback.
#[derive(Clone)]
pub struct Handler {
    name: String,
    f: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async function. The name is derived from its type.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Response, Storage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let name = short_name::<F>();
        Self::named(name, f)
    }

    /// Wrap an async function under an explicit name.
    pub fn named<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Request, Response, Storage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(move |request: Request, response: Response, storage: Storage| -> BoxFuture<'static, HandlerResult> {
                Box::pin(f(request, response, storage))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(
        &self,
        request: Request,
        response: Response,
        storage: Storage,
    ) -> BoxFuture<'static, HandlerResult> {
        (self.f)(request, response, storage)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish()
    }
}

/// Shorthand for [`Handler::new`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request, Response, Storage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Handler::new(f)
}

/// A before/after hook around the route chain.
#[derive(Clone)]
pub struct Middleware {
    name: String,
    f: Arc<MiddlewareFn>,
}

impl Middleware {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Request, Response, Storage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        Self {
            name: short_name::<F>(),
            f: Arc::new(move |request: Request, response: Response, storage: Storage| -> BoxFuture<'static, MiddlewareResult> {
                Box::pin(f(request, response, storage))
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(
        &self,
        request: Request,
        response: Response,
        storage: Storage,
    ) -> BoxFuture<'static, MiddlewareResult> {
        (self.f)(request, response, storage)
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware").field("name", &self.name).finish()
    }
}

/// Shorthand for [`Middleware::new`].
pub fn middleware<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Response, Storage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    Middleware::new(f)
}

/// Per-request key-value bag shared by middleware and handlers.
///
/// Clones address the same bag. It starts empty and is dropped with the
/// dispatcher.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    inner: Arc<Mutex<Map<String, Value>>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value, returning the previous one.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.lock().insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Typed read; `None` when absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Event;
    use serde_json::json;
    use std::collections::BTreeMap;

    async fn list_users(_: Request, response: Response, _: Storage) -> HandlerResult {
        Ok(Some(response.status(200)?.json(&json!({ "data": [] }))?))
    }

    #[test]
    fn test_handler_name_from_fn_item() {
        assert_eq!(handler(list_users).name(), "list_users");
        assert_eq!(Handler::named("getUsers", list_users).name(), "getUsers");
    }

    #[tokio::test]
    async fn test_handler_call_returns_same_response() {
        let response = Response::new(BTreeMap::new());
        let returned = handler(list_users)
            .call(Request::new(Event::new("GET", "/users")), response.clone(), Storage::new())
            .await
            .unwrap()
            .unwrap();
        assert!(returned.same_as(&response));
        assert_eq!(response.status_code(), 200);
    }

    #[test]
    fn test_storage_shared_between_clones() {
        let storage = Storage::new();
        let alias = storage.clone();
        assert!(storage.is_empty());

        alias.insert("userId", "42");
        alias.insert("roles", json!(["admin"]));
        assert_eq!(storage.get("userId"), Some(json!("42")));
        assert_eq!(storage.get_as::<Vec<String>>("roles"), Some(vec!["admin".to_string()]));
        assert_eq!(storage.get_as::<u32>("userId"), None);
        assert_eq!(storage.len(), 2);

        assert_eq!(storage.remove("userId"), Some(json!("42")));
        assert!(!alias.contains_key("userId"));
        assert_eq!(alias.snapshot().len(), 1);
    }
}
