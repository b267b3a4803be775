use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Article, WanEnvelope, NOT_LOGGED_IN};
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "----mockboundary";

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> Request<String> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(http::header::COOKIE, cookie);
    }
    builder.body(body).unwrap()
}

// --- articles ---

#[tokio::test]
async fn article_list_is_primary_envelope() {
    let resp = app()
        .oneshot(get_request("/article/list/0/json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, 0);
    assert_eq!(env.data["curPage"], 1);
    let datas: Vec<Article> = serde_json::from_value(env.data["datas"].clone()).unwrap();
    assert_eq!(datas.len(), 3);
}

#[tokio::test]
async fn article_list_echoes_raw_query() {
    let resp = app()
        .oneshot(get_request("/article/list/2/json?cid=60&k=a%20b"))
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.data["curPage"], 3);
    assert_eq!(env.data["query"], "cid=60&k=a%20b");
}

#[tokio::test]
async fn article_list_bad_page_returns_400() {
    let resp = app()
        .oneshot(get_request("/article/list/first/json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- register / login ---

#[tokio::test]
async fn register_then_login_sets_cookie() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(form_request(
            "/user/register",
            &[("username", "ada"), ("password", "pw"), ("repassword", "pw")],
            None,
        ))
        .await
        .unwrap();
    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, 0);

    let resp = app
        .oneshot(form_request(
            "/user/login",
            &[("username", "ada"), ("password", "pw")],
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get(http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("loginUserName=ada"));
    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.data["username"], "ada");
}

#[tokio::test]
async fn register_mismatched_passwords_is_rejected() {
    let resp = app()
        .oneshot(form_request(
            "/user/register",
            &[("username", "ada"), ("password", "pw"), ("repassword", "other")],
            None,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, -1);
    assert_eq!(env.error_msg, "passwords do not match");
}

#[tokio::test]
async fn register_duplicate_is_rejected() {
    let app = app();
    let fields = [("username", "ada"), ("password", "pw"), ("repassword", "pw")];
    app.clone()
        .oneshot(form_request("/user/register", &fields, None))
        .await
        .unwrap();
    let resp = app
        .oneshot(form_request("/user/register", &fields, None))
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, -1);
}

#[tokio::test]
async fn login_unknown_user_has_error_envelope_and_no_cookie() {
    let resp = app()
        .oneshot(form_request(
            "/user/login",
            &[("username", "nobody"), ("password", "pw")],
            None,
        ))
        .await
        .unwrap();

    assert!(resp.headers().get(http::header::SET_COOKIE).is_none());
    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, -1);
    assert!(!env.error_msg.is_empty());
}

#[tokio::test]
async fn login_without_multipart_body_returns_400() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/user/login")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

// --- collections ---

#[tokio::test]
async fn collect_list_requires_login_cookie() {
    let resp = app()
        .oneshot(get_request("/lg/collect/list/0/json"))
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, NOT_LOGGED_IN);
    assert_eq!(env.error_msg, "please log in first");
}

#[tokio::test]
async fn collect_list_with_cookie_succeeds() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/lg/collect/list/0/json")
                .header(http::header::COOKIE, "loginUserName=ada")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.error_code, 0);
    assert_eq!(env.data["user"], "ada");
}

// --- echo ---

#[tokio::test]
async fn echo_form_returns_fields_in_order_with_cookie() {
    let resp = app()
        .oneshot(form_request(
            "/echo/form",
            &[("b", "2"), ("a", "1")],
            Some("token=xyz"),
        ))
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.data["fields"], serde_json::json!([["b", "2"], ["a", "1"]]));
    assert_eq!(env.data["cookie"], "token=xyz");
}

// --- feed ---

#[tokio::test]
async fn music_focus_uses_code_envelope() {
    let resp = app()
        .oneshot(get_request("/musichall/focus"))
        .await
        .unwrap();

    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert!(body.get("errorCode").is_none());
    assert!(body["data"]["slider"].is_array());
}

#[tokio::test]
async fn music_focus_can_fail_on_demand() {
    let resp = app()
        .oneshot(get_request("/musichall/focus?fail=1"))
        .await
        .unwrap();

    let body: Value = body_json(resp).await;
    assert_eq!(body["code"], 500);
}

// --- faults ---

#[tokio::test]
async fn busy_returns_503() {
    let resp = app().oneshot(get_request("/fault/busy")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn garbage_is_not_json() {
    let resp = app().oneshot(get_request("/fault/garbage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<Value>(&bytes).is_err());
}

#[tokio::test(start_paused = true)]
async fn slow_answers_after_the_requested_delay() {
    let resp = app()
        .oneshot(get_request("/fault/slow?ms=5000"))
        .await
        .unwrap();

    let env: WanEnvelope = body_json(resp).await;
    assert_eq!(env.data["sleptMs"], 5000);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app().oneshot(get_request("/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
