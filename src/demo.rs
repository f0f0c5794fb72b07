//! Users and messages sample API served by the binary.
//!
//! # Routes
//! - `GET /users`
//! - `POST /users`
//! - `GET /users/{userId+}`
//! - `DELETE /users/{userId+}`
//! - `GET /users/{userId+}/messages`
//! - `GET /users/{userId+}/messages/{messageId+}`
//!
//! A before hook checks the `Authorization` header shape and an after hook
//! stamps the request id on every successful response.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::json;

use event_router::errors::HttpError;
use event_router::http::{CookieOptions, Request, Response, SameSite};
use event_router::pipeline::{handler, middleware, Handler, HandlerResult, MiddlewareResult, Router, Storage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
}

/// In-memory backing data for the sample routes.
#[derive(Debug, Default)]
pub struct DemoStore {
    users: Mutex<BTreeMap<String, User>>,
    messages: BTreeMap<String, Vec<Message>>,
}

impl DemoStore {
    pub fn seeded() -> Self {
        let users = [("1", "Joe"), ("2", "Ana")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id.to_string(),
                    User {
                        id: id.to_string(),
                        name: name.to_string(),
                    },
                )
            })
            .collect();

        let messages = BTreeMap::from([(
            "1".to_string(),
            vec![
                Message {
                    id: "1".to_string(),
                    text: "Hello".to_string(),
                },
                Message {
                    id: "2".to_string(),
                    text: "Are you there?".to_string(),
                },
            ],
        )]);

        Self {
            users: Mutex::new(users),
            messages,
        }
    }

    fn users(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn user_id(request: &Request) -> Result<String, HttpError> {
    request
        .path_param("userId")
        .map(str::to_owned)
        .ok_or_else(|| HttpError::bad_request("userId is required").with_origin("Users"))
}

async fn authenticate(request: Request, _: Response, storage: Storage) -> MiddlewareResult {
    match request.header("authorization") {
        None => {
            storage.insert("caller", "anonymous");
        }
        Some(value) => {
            let token = value
                .strip_prefix("Bearer ")
                .filter(|token| !token.is_empty())
                .ok_or_else(|| HttpError::unauthorized("Invalid authorization header").with_origin("Auth"))?;
            storage.insert("caller", token);
        }
    }
    Ok(())
}

async fn stamp(request: Request, response: Response, storage: Storage) -> MiddlewareResult {
    response.set("X-Request-Id", request.request_id())?;
    if let Some(caller) = storage.get_as::<String>("caller") {
        response.set("X-Caller", caller)?;
    }
    Ok(())
}

fn list_users(store: Arc<DemoStore>) -> Handler {
    handler(move |_, response: Response, _| {
        let store = Arc::clone(&store);
        async move {
            let users: Vec<User> = store.users().values().cloned().collect();
            let body = json!({ "length": users.len(), "data": users });
            Ok(Some(response.status(200)?.json(&body)?))
        }
    })
}

fn create_user(store: Arc<DemoStore>) -> Handler {
    Handler::named("create_user", move |request: Request, response: Response, _| {
        let store = Arc::clone(&store);
        async move {
            let new_user: NewUser = request.json_body()?;
            if new_user.name.trim().is_empty() {
                return Err(HttpError::bad_request("name must not be empty")
                    .with_origin("Users")
                    .with_debug(json!({ "field": "name" }))
                    .into());
            }

            let user = {
                let mut users = store.users();
                let id = (users.len() + 1).to_string();
                let user = User { id: id.clone(), name: new_user.name };
                users.insert(id, user.clone());
                user
            };

            response
                .status(201)?
                .cookie(
                    "lastCreated",
                    &user.id,
                    CookieOptions::new().path("/").max_age("1h").http_only().same_site(SameSite::Lax),
                )?
                .json(&user)?;
            Ok(Some(response))
        }
    })
}

fn load_user(store: Arc<DemoStore>) -> Handler {
    Handler::named("load_user", move |request: Request, _, storage: Storage| {
        let store = Arc::clone(&store);
        async move {
            let id = user_id(&request)?;
            let user = store
                .users()
                .get(&id)
                .cloned()
                .ok_or_else(|| HttpError::not_found(format!("User {id} not found")).with_origin("Users"))?;
            storage.insert("user", serde_json::to_value(user)?);
            Ok(None)
        }
    })
}

async fn show_user(_: Request, response: Response, storage: Storage) -> HandlerResult {
    let user = storage.get("user").unwrap_or_default();
    Ok(Some(response.status(200)?.json(&json!({ "data": user }))?))
}

fn delete_user(store: Arc<DemoStore>) -> Handler {
    Handler::named("delete_user", move |request: Request, response: Response, _| {
        let store = Arc::clone(&store);
        async move {
            let id = user_id(&request)?;
            store.users().remove(&id);
            Ok(Some(response.status(200)?.json(&json!({ "deleted": id }))?))
        }
    })
}

fn list_messages(store: Arc<DemoStore>) -> Handler {
    Handler::named("list_messages", move |request: Request, response: Response, _| {
        let store = Arc::clone(&store);
        async move {
            let id = user_id(&request)?;
            let messages = store.messages.get(&id).cloned().unwrap_or_default();
            Ok(Some(response.status(200)?.json(&messages)?))
        }
    })
}

fn show_message(store: Arc<DemoStore>) -> Handler {
    Handler::named("show_message", move |request: Request, response: Response, _| {
        let store = Arc::clone(&store);
        async move {
            let id = user_id(&request)?;
            let message_id = request.path_param("messageId").unwrap_or_default().to_string();
            let message = store
                .messages
                .get(&id)
                .and_then(|messages| messages.iter().find(|message| message.id == message_id))
                .cloned()
                .ok_or_else(|| {
                    HttpError::not_found(format!("Message {message_id} not found")).with_origin("Messages")
                })?;
            Ok(Some(response.status(200)?.json(&json!({ "data": message }))?))
        }
    })
}

/// Register the sample routes and hooks on `router`.
pub fn install(router: &mut Router, store: Arc<DemoStore>) -> Result<(), HttpError> {
    router
        .get("/users", [list_users(Arc::clone(&store))])?
        .post("/users", [create_user(Arc::clone(&store))])?
        .get("/users/{userId+}", [load_user(Arc::clone(&store)), handler(show_user)])?
        .delete("/users/{userId+}", [delete_user(Arc::clone(&store))])?
        .get("/users/{userId+}/messages", [list_messages(Arc::clone(&store))])?
        .get("/users/{userId+}/messages/{messageId+}", [show_message(store)])?;

    router.before(middleware(authenticate)).after(middleware(stamp));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_router::config::RouterOptions;
    use event_router::http::Event;
    use serde_json::Value;

    fn demo_router() -> Router {
        let mut router = Router::new(RouterOptions::default());
        install(&mut router, Arc::new(DemoStore::seeded())).unwrap();
        router
    }

    #[tokio::test]
    async fn test_chain_loads_then_shows_user() {
        let router = demo_router();
        let response = router.respond(Event::new("GET", "/users/2")).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("X-Caller"), Some("anonymous"));
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"]["name"], "Ana");
    }

    #[tokio::test]
    async fn test_nested_message_route() {
        let router = demo_router();
        let response = router.respond(Event::new("GET", "/users/1/messages/2")).await;

        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["data"]["text"], "Are you there?");
    }

    #[tokio::test]
    async fn test_bad_authorization_is_rejected() {
        let router = demo_router();
        let event = Event::new("GET", "/users").with_header("Authorization", "Basic abc");
        let response = router.respond(event).await;

        assert_eq!(response.status_code, 401);
        assert!(response.header("X-Request-Id").is_none());
    }

    #[tokio::test]
    async fn test_create_user_sets_cookie() {
        let router = demo_router();
        let event = Event::new("POST", "/users").with_body(r#"{"name":"Lee"}"#);
        let response = router.respond(event).await;

        assert_eq!(response.status_code, 201);
        assert_eq!(response.cookies().len(), 1);
        assert!(response.cookies()[0].starts_with("lastCreated=3; Path=/; Expires="));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let router = demo_router();
        let response = router.respond(Event::new("GET", "/users/99")).await;
        assert_eq!(response.status_code, 404);
        assert_eq!(response.body, r#"{"message":"User 99 not found"}"#);
    }
}
