use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Multipart, Path, Query, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Envelope of the primary ("wan") backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WanEnvelope {
    pub data: Value,
    #[serde(rename = "errorCode")]
    pub error_code: i64,
    #[serde(rename = "errorMsg")]
    pub error_msg: String,
}

impl WanEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            error_code: 0,
            error_msg: String::new(),
        }
    }

    pub fn err(error_code: i64, error_msg: &str) -> Self {
        Self {
            data: Value::Null,
            error_code,
            error_msg: error_msg.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub link: String,
    #[serde(rename = "chapterName")]
    pub chapter_name: String,
}

pub const LOGIN_COOKIE: &str = "loginUserName";
pub const NOT_LOGGED_IN: i64 = -1001;

/// Registered users, username to password.
pub type Db = Arc<RwLock<HashMap<String, String>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/article/list/{page}/json", get(list_articles))
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/lg/collect/list/{page}/json", get(list_collected))
        .route("/echo/form", post(echo_form))
        .route("/musichall/focus", get(music_focus))
        .route("/fault/slow", get(slow))
        .route("/fault/busy", get(busy))
        .route("/fault/garbage", get(garbage))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn articles() -> Vec<Article> {
    [
        (13250, "Rust ownership in practice", "ada", "Rust"),
        (13249, "Async timeouts without leaks", "grace", "Network"),
        (13248, "Encoding forms by hand", "linus", "Network"),
    ]
    .into_iter()
    .map(|(id, title, author, chapter)| Article {
        id,
        title: title.to_string(),
        author: author.to_string(),
        link: format!("https://www.wanandroid.com/blog/show/{id}"),
        chapter_name: chapter.to_string(),
    })
    .collect()
}

fn cookie_user(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == LOGIN_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

async fn read_form(mut multipart: Multipart) -> Result<Vec<(String, String)>, StatusCode> {
    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        fields.push((name, value));
    }
    Ok(fields)
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

async fn list_articles(Path(page): Path<u32>, RawQuery(query): RawQuery) -> Json<WanEnvelope> {
    let datas = articles();
    let total = datas.len();
    Json(WanEnvelope::ok(json!({
        "curPage": page + 1,
        "datas": datas,
        "offset": page * 20,
        "over": true,
        "pageCount": 1,
        "size": 20,
        "total": total,
        "query": query.unwrap_or_default(),
    })))
}

async fn register(
    State(db): State<Db>,
    multipart: Multipart,
) -> Result<Json<WanEnvelope>, StatusCode> {
    let fields = read_form(multipart).await?;
    let (Some(username), Some(password)) = (field(&fields, "username"), field(&fields, "password"))
    else {
        return Ok(Json(WanEnvelope::err(-1, "username and password are required")));
    };
    if field(&fields, "repassword") != Some(password) {
        return Ok(Json(WanEnvelope::err(-1, "passwords do not match")));
    }
    let mut users = db.write().await;
    if users.contains_key(username) {
        return Ok(Json(WanEnvelope::err(-1, "username already registered")));
    }
    users.insert(username.to_string(), password.to_string());
    log::info!("registered {username}");
    Ok(Json(WanEnvelope::ok(json!({ "username": username }))))
}

async fn login(State(db): State<Db>, multipart: Multipart) -> Result<Response, StatusCode> {
    let fields = read_form(multipart).await?;
    let username = field(&fields, "username").unwrap_or_default();
    let password = field(&fields, "password").unwrap_or_default();
    let users = db.read().await;
    if users.get(username).map(String::as_str) != Some(password) || username.is_empty() {
        return Ok(Json(WanEnvelope::err(-1, "username or password is incorrect")).into_response());
    }
    let cookie = format!("{LOGIN_COOKIE}={username}; Path=/");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(WanEnvelope::ok(json!({ "username": username }))),
    )
        .into_response())
}

async fn list_collected(Path(page): Path<u32>, headers: HeaderMap) -> Json<WanEnvelope> {
    match cookie_user(&headers) {
        Some(user) => Json(WanEnvelope::ok(json!({
            "curPage": page + 1,
            "datas": articles().into_iter().take(1).collect::<Vec<_>>(),
            "user": user,
        }))),
        None => Json(WanEnvelope::err(NOT_LOGGED_IN, "please log in first")),
    }
}

async fn echo_form(headers: HeaderMap, multipart: Multipart) -> Result<Json<WanEnvelope>, StatusCode> {
    let fields = read_form(multipart).await?;
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let fields: Vec<Value> = fields.into_iter().map(|(k, v)| json!([k, v])).collect();
    Ok(Json(WanEnvelope::ok(json!({ "fields": fields, "cookie": cookie }))))
}

#[derive(Deserialize)]
pub struct FocusQuery {
    #[serde(default)]
    pub fail: u8,
}

async fn music_focus(Query(query): Query<FocusQuery>) -> Json<Value> {
    if query.fail != 0 {
        return Json(json!({ "code": 500, "message": "upstream unavailable" }));
    }
    Json(json!({
        "code": 0,
        "data": {
            "slider": [
                {
                    "linkUrl": "https://y.qq.com/portal/live",
                    "picUrl": "https://y.gtimg.cn/music/live.jpg",
                    "id": 1
                }
            ]
        }
    }))
}

#[derive(Deserialize)]
pub struct SlowQuery {
    #[serde(default)]
    pub ms: u64,
}

async fn slow(Query(query): Query<SlowQuery>) -> Json<WanEnvelope> {
    tokio::time::sleep(Duration::from_millis(query.ms)).await;
    Json(WanEnvelope::ok(json!({ "sleptMs": query.ms })))
}

async fn busy() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "busy")
}

async fn garbage() -> &'static str {
    "<html>not json</html>"
}
