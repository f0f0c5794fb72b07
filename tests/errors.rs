//! Error translation: trusted errors keep their message, everything else is
//! masked, and internals only show in debug mode.

mod common;

use common::{body_json, debug_details};
use event_router::config::RouterOptions;
use event_router::errors::MASKED_MESSAGE;
use event_router::{handler, Event, HttpError, Response, Router};
use serde_json::json;

fn failing(options: RouterOptions, err: fn() -> anyhow::Error) -> Router {
    let mut router = Router::new(options);
    router
        .get("/fail", [handler(move |_, _, _| async move { Err(err()) })])
        .unwrap();
    router
}

#[tokio::test]
async fn test_untrusted_error_is_masked() {
    let router = failing(RouterOptions::default(), || anyhow::anyhow!("boom"));
    let response = router.respond(Event::new("GET", "/fail")).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, r#"{"message":"Something went wrong try again later..."}"#);
}

#[tokio::test]
async fn test_untrusted_error_source_in_debug_mode() {
    let router = failing(RouterOptions::default().debug(true), || anyhow::anyhow!("boom"));
    let response = router.respond(Event::new("GET", "/fail")).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(body_json(&response)["message"], MASKED_MESSAGE);
    let details = debug_details(&response).unwrap();
    assert_eq!(details["errorSource"], "boom");
    assert!(details["stack"].is_string());
}

#[tokio::test]
async fn test_trusted_error_keeps_status_and_message() {
    let router = failing(RouterOptions::default(), || {
        HttpError::bad_request("email is required").with_origin("Users").into()
    });
    let response = router.respond(Event::new("GET", "/fail")).await;

    assert_eq!(response.status_code, 400);
    assert_eq!(body_json(&response), json!({ "message": "email is required" }));
}

#[tokio::test]
async fn test_trusted_error_debug_payload() {
    let router = failing(RouterOptions::default().debug(true), || {
        HttpError::not_found("No such user")
            .with_origin("Users")
            .with_debug(json!({ "userId": "42" }))
            .into()
    });
    let response = router.respond(Event::new("GET", "/fail")).await;

    assert_eq!(response.status_code, 404);
    let details = debug_details(&response).unwrap();
    assert_eq!(details["userId"], "42");
    assert_eq!(details["methodName"], "Users");
}

#[tokio::test]
async fn test_non_operational_error_is_masked() {
    let router = failing(RouterOptions::default(), || {
        HttpError::service_unavailable("pool exhausted: 10.0.0.3").untrusted().into()
    });
    let response = router.respond(Event::new("GET", "/fail")).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(body_json(&response), json!({ "message": MASKED_MESSAGE }));
}

#[tokio::test]
async fn test_explicit_status_overrides_kind_default() {
    let router = failing(RouterOptions::default(), || {
        HttpError::api_error("Upstream declined").with_status(502).into()
    });
    let response = router.respond(Event::new("GET", "/fail")).await;
    assert_eq!(response.status_code, 502);
}

#[tokio::test]
async fn test_status_200_error_falls_back_to_500() {
    let router = failing(RouterOptions::default(), || HttpError::base("odd").with_status(200).into());
    let response = router.respond(Event::new("GET", "/fail")).await;
    assert_eq!(response.status_code, 500);
    assert_eq!(body_json(&response)["message"], "odd");
}

#[tokio::test]
async fn test_builder_validation_error_is_masked() {
    let mut router = Router::new(RouterOptions::default());
    router
        .get(
            "/bad",
            [handler(|_, response: Response, _| async move {
                Ok(Some(response.status(42)?))
            })],
        )
        .unwrap();

    let response = router.respond(Event::new("GET", "/bad")).await;
    assert_eq!(response.status_code, 500);
    assert_eq!(body_json(&response), json!({ "message": MASKED_MESSAGE }));
}

#[tokio::test]
async fn test_error_body_replaces_partial_success_body() {
    let mut router = Router::new(RouterOptions::default());
    router
        .get(
            "/partial",
            [
                handler(|_, response: Response, _| async move {
                    response.status(200)?.json(&json!({ "data": "half" }))?;
                    Ok(None)
                }),
                handler(|_, _, _| async { Err(HttpError::forbidden("Nope").into()) }),
            ],
        )
        .unwrap();

    let response = router.respond(Event::new("GET", "/partial")).await;
    assert_eq!(response.status_code, 403);
    assert_eq!(body_json(&response), json!({ "message": "Nope" }));
}
