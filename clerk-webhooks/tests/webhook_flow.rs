//! End-to-end tests through the axum router.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt;

use clerk_webhooks::events::{DeletedObjectJson, UserJson};
use clerk_webhooks::signing::unix_now;
use clerk_webhooks::{
    web, HandlerErrorPolicy, Webhook, WebhookConfig, WebhookSecret, WebhooksHandler,
};

const SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";
const PATH: &str = "/webhooks/clerk";

fn app(config: WebhookConfig) -> Router {
    let webhooks = WebhooksHandler::with_fallback_secret(config.secret(SECRET), None)
        .expect("valid secret");
    web::router(PATH, webhooks)
}

fn envelope(event_type: &str, data: serde_json::Value) -> String {
    json!({
        "data": data,
        "instance_id": "ins_2abc",
        "object": "event",
        "timestamp": 1716883931000i64,
        "type": event_type,
    })
    .to_string()
}

fn signed_request(secret: &str, msg_id: &str, body: &str) -> Request<Body> {
    signed_raw_request(secret, msg_id, body, Body::from(body.to_string()))
}

/// Sign `signed_body` but send `sent` as the request body.
fn signed_raw_request(secret: &str, msg_id: &str, signed_body: &str, sent: Body) -> Request<Body> {
    let signer = Webhook::new(WebhookSecret::parse(secret).expect("secret"));
    let now = unix_now();
    let signature = signer.sign(msg_id, now, signed_body).expect("signature");

    Request::builder()
        .method(Method::POST)
        .uri(PATH)
        .header("content-type", "application/json")
        .header("svix-id", msg_id)
        .header("svix-timestamp", now.to_string())
        .header("svix-signature", signature)
        .body(sent)
        .expect("request")
}

fn unsigned_request(body: Body) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(PATH)
        .body(body)
        .expect("request")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response: Response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    (status, String::from_utf8(bytes.to_vec()).expect("utf8"))
}

fn counted_user_created(calls: Arc<AtomicUsize>) -> WebhookConfig {
    WebhookConfig::new().on_user_created(move |user: UserJson| {
        let calls = Arc::clone(&calls);
        async move {
            assert_eq!(user.id, "user_29w83sxmDNGwOuEthce5gg56FcC");
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    })
}

#[tokio::test]
async fn user_created_is_acknowledged_and_user_deleted_is_not_found() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));

    let created = envelope(
        "user.created",
        json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC", "object": "user"}),
    );
    let (status, body) = send(app.clone(), signed_request(SECRET, "msg_1", &created)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let deleted = envelope(
        "user.deleted",
        json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC", "deleted": true}),
    );
    let (status, body) = send(app, signed_request(SECRET, "msg_2", &deleted)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_response_is_returned_unmodified() {
    let app = app(WebhookConfig::new().on_user_deleted(|_: DeletedObjectJson| async {
        let headers = [("x-cleanup", "scheduled")];
        Ok(Some((StatusCode::ACCEPTED, headers, "cleanup scheduled").into_response()))
    }));

    let body = envelope("user.deleted", json!({"id": "user_1", "deleted": true}));
    let response = app
        .oneshot(signed_request(SECRET, "msg_1", &body))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-cleanup"], "scheduled");
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], b"cleanup scheduled");
}

#[tokio::test]
async fn missing_any_header_is_bad_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));
    let body = envelope("user.created", json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC"}));

    for dropped in ["svix-id", "svix-timestamp", "svix-signature"] {
        let mut request = signed_request(SECRET, "msg_1", &body);
        request.headers_mut().remove(dropped);

        let (status, text) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "dropped {}", dropped);
        assert_eq!(text, "Error occurred -- no svix headers");
    }

    let (status, _) = send(app, unsigned_request(Body::from("not json at all"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_body_without_headers_reports_missing_headers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));

    let not_utf8 = unsigned_request(Body::from(vec![b'{', 0xff, 0xfe, b'}']));
    let (status, text) = send(app.clone(), not_utf8).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Error occurred -- no svix headers");

    let oversized = unsigned_request(Body::from(vec![b' '; 3 * 1024 * 1024]));
    let (status, text) = send(app, oversized).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Error occurred -- no svix headers");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_body_with_headers_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));
    let body = envelope("user.created", json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC"}));

    let mut not_utf8 = body.clone().into_bytes();
    not_utf8.push(0xff);
    let request = signed_raw_request(SECRET, "msg_1", &body, Body::from(not_utf8));
    let (status, text) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Error occurred");

    let padded = format!("{}{}", body, " ".repeat(3 * 1024 * 1024));
    let request = signed_raw_request(SECRET, "msg_2", &padded, Body::from(padded.clone()));
    let (status, text) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "Error occurred");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn null_metadata_reaches_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let app = app(WebhookConfig::new().on_organization_created(move |org| {
        let counter = Arc::clone(&counter);
        async move {
            assert_eq!(org.id, "org_1");
            assert!(org.private_metadata.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }));
    let body = envelope(
        "organization.created",
        json!({"id": "org_1", "public_metadata": null, "private_metadata": null}),
    );

    let (status, text) = send(app, signed_request(SECRET, "msg_1", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tampered_request_is_rejected_every_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));

    let body = envelope("user.created", json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC"}));
    let headers = signed_request(SECRET, "msg_1", &body).headers().clone();
    let tampered = body.replace("ins_2abc", "ins_evil");

    for _ in 0..3 {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(PATH)
            .body(Body::from(tampered.clone()))
            .expect("request");
        *request.headers_mut() = headers.clone();

        let (status, text) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Error occurred");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn tampered_header_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));

    let body = envelope("user.created", json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC"}));
    let mut request = signed_request(SECRET, "msg_1", &body);
    request
        .headers_mut()
        .insert("svix-id", "msg_replayed".parse().expect("header"));

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn other_secret_is_rejected() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = app(counted_user_created(Arc::clone(&calls)));

    let body = envelope("user.created", json!({"id": "user_29w83sxmDNGwOuEthce5gg56FcC"}));
    let request = signed_request("whsec_c2lnbmVkLXdpdGgtYW5vdGhlci1rZXk=", "msg_1", &body);

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_event_type_is_not_found() {
    let app = app(WebhookConfig::new());
    let body = envelope("billing.subscriptionItem.active", json!({"id": "csi_1"}));

    let (status, text) = send(app, signed_request(SECRET, "msg_1", &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(text, "");
}

#[tokio::test]
async fn propagated_handler_failure_becomes_server_error() {
    let app = app(WebhookConfig::new().on_user_created(|_| async {
        Err(anyhow::anyhow!("database unavailable"))
    }));
    let body = envelope("user.created", json!({"id": "user_1"}));

    let (status, text) = send(app, signed_request(SECRET, "msg_1", &body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "");
}

#[tokio::test]
async fn responded_handler_failure_has_generic_body() {
    let app = app(
        WebhookConfig::new()
            .handler_error_policy(HandlerErrorPolicy::Respond)
            .on_user_created(|_| async { Err(anyhow::anyhow!("database unavailable")) }),
    );
    let body = envelope("user.created", json!({"id": "user_1"}));

    let (status, text) = send(app, signed_request(SECRET, "msg_1", &body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "Internal Server Error");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(WebhookConfig::new());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");

    let (status, text) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, r#"{"status":"ok"}"#);
}
