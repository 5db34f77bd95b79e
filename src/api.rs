use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::{Client as HttpClient, Response};
use reqwest::header::{HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";
pub const CSRF_HEADER: &str = "x-csrftoken";

/// Backend session credentials issued by the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub session_id: String,
    pub csrf_token: String,
}

impl Credentials {
    fn cookie(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.session_id.is_empty() {
            parts.push(format!("sessionid={}", self.session_id));
        }
        if !self.csrf_token.is_empty() {
            parts.push(format!("csrftoken={}", self.csrf_token));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub credentials: Credentials,
    pub http_client: Option<HttpClient>,
}

pub struct Client {
    http: HttpClient,
    user_agent: String,
    base_url: Url,
    credentials: Credentials,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(Error::validation("bookclub client user agent required"));
        }
        let mut base = config
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        let http = match config.http_client {
            Some(client) => client,
            None => HttpClient::builder()
                .timeout(config.timeout.unwrap_or(Duration::from_secs(20)))
                .build()?,
        };

        Ok(Client {
            http,
            user_agent: config.user_agent,
            base_url,
            credentials: config.credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn current_user(&self) -> Result<User> {
        self.get_json("auth/user/", &[], "Failed to load user")
    }

    pub fn discussion(&self, group_id: i64) -> Result<Vec<Post>> {
        let path = format!("groups/{group_id}/discussion/");
        self.get_json(&path, &[], "Failed to load discussion")
    }

    pub fn create_post(&self, group_id: i64, post: &NewPost) -> Result<Post> {
        let path = format!("groups/{group_id}/discussion/");
        self.post_json(&path, Some(serde_json::to_value(post)?), "Failed to post")
    }

    pub fn create_comment(&self, group_id: i64, post_id: i64, content: &str) -> Result<CommentCreated> {
        let path = format!("groups/{group_id}/discussion/{post_id}/comments/");
        let body = serde_json::json!({ "content": content });
        let value: Value = self.post_json(&path, Some(body), "Failed to reply")?;
        CommentCreated::from_value(value)
    }

    pub fn groups(&self) -> Result<Vec<Group>> {
        self.get_json("groups/", &[], "Failed to load groups")
    }

    pub fn group(&self, group_id: i64) -> Result<GroupDetail> {
        let path = format!("groups/{group_id}/");
        self.get_json(&path, &[], "Failed to load group")
    }

    pub fn create_group(&self, group: &NewGroup) -> Result<Group> {
        self.post_json(
            "groups/",
            Some(serde_json::to_value(group)?),
            "Failed to create group",
        )
    }

    pub fn join_group(&self, group_id: i64) -> Result<Confirmation> {
        let path = format!("groups/{group_id}/join/");
        self.post_json(&path, None, "Failed to join group")
    }

    pub fn books(&self, query: &str, genre: &str) -> Result<Vec<Book>> {
        let mut params = Vec::new();
        if !query.trim().is_empty() {
            params.push(("search".to_string(), query.trim().to_string()));
        }
        if !genre.trim().is_empty() {
            params.push(("genre".to_string(), genre.trim().to_string()));
        }
        self.get_json("books/", &params, "Failed to load books")
    }

    pub fn book(&self, book_id: i64) -> Result<BookDetail> {
        let path = format!("books/{book_id}/");
        self.get_json(&path, &[], "Failed to load book")
    }

    fn get_json<T>(&self, path: &str, params: &[(String, String)], fallback: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self.request(Method::GET, path, params, None, fallback)?;
        decode(resp)
    }

    fn post_json<T>(&self, path: &str, body: Option<Value>, fallback: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self.request(Method::POST, path, &[], body, fallback)?;
        decode(resp)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body: Option<Value>,
        fallback: &str,
    ) -> Result<Response> {
        let mut url = self.base_url.join(path)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }

        let unsafe_method = method != Method::GET;
        let mut req = self.http.request(method.clone(), url);
        req = req.header(USER_AGENT, self.user_agent.clone());
        req = req.header(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(cookie) = self.credentials.cookie() {
            req = req.header(COOKIE, cookie);
        }
        if unsafe_method && !self.credentials.csrf_token.is_empty() {
            req = req.header(CSRF_HEADER, self.credentials.csrf_token.clone());
        }
        if let Some(json) = body {
            req = req.json(&json);
        }

        let resp = req.send()?;
        let status = resp.status();
        debug!(%method, path, status = status.as_u16(), "backend response");
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().unwrap_or_default();
        let message = error_message(&text, fallback);
        warn!(%method, path, status = status.as_u16(), %message, "backend request failed");
        match status.as_u16() {
            400 => Err(Error::Validation(message)),
            403 => Err(Error::ForumAccess(message)),
            code => Err(Error::Server {
                status: code,
                message,
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let bytes = resp.bytes()?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Extracts a user-facing message from an error body: the `error` field, then
/// a field-specific message, then `fallback`.
pub fn error_message(body: &str, fallback: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback.to_string();
    };
    let Some(object) = value.as_object() else {
        return first_text(&value).unwrap_or_else(|| fallback.to_string());
    };

    if let Some(msg) = object.get("error").and_then(first_text) {
        return msg;
    }
    for key in ["content", "non_field_errors", "detail"] {
        if let Some(msg) = object.get(key).and_then(first_text) {
            return msg;
        }
    }
    object
        .values()
        .find_map(first_text)
        .unwrap_or_else(|| fallback.to_string())
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    #[serde(default)]
    pub author: Option<i64>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub author: Option<i64>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub chapter: Option<i64>,
    #[serde(default)]
    pub chapter_title: Option<String>,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPost {
    pub content: String,
    pub chapter: Option<i64>,
}

/// Result of a comment-creation request. Backends reply either with the
/// whole updated post or with only the new comment.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentCreated {
    FullPost(Post),
    Comment(Comment),
}

impl CommentCreated {
    pub fn from_value(value: Value) -> Result<Self> {
        let has_comments = value
            .get("comments")
            .map(Value::is_array)
            .unwrap_or(false);
        if has_comments {
            Ok(CommentCreated::FullPost(serde_json::from_value(value)?))
        } else {
            Ok(CommentCreated::Comment(serde_json::from_value(value)?))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub book: Option<i64>,
    #[serde(default)]
    pub book_title: String,
    #[serde(default)]
    pub creator_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_url: Option<String>,
}

impl BookInfo {
    /// Absolute cover image location. Relative paths are served from the
    /// backend origin, i.e. the API root without its `/api` segment.
    pub fn cover_src(&self, api_base: &Url) -> Option<String> {
        let cover = self.cover_url.as_deref()?.trim();
        if cover.is_empty() {
            return None;
        }
        if cover.starts_with("http://") || cover.starts_with("https://") {
            return Some(cover.to_string());
        }
        let base = api_base.as_str().trim_end_matches('/');
        let origin = base.strip_suffix("/api").unwrap_or(base);
        Some(format!("{origin}{cover}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    #[serde(default)]
    pub book_info: Option<BookInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub book: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewGroup {
    /// Builds a group request from raw form input. Every field is required.
    pub fn parse(name: &str, book: &str, start_date: &str, end_date: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || book.trim().is_empty() || start_date.trim().is_empty() || end_date.trim().is_empty() {
            return Err(Error::validation("Please fill all group fields"));
        }
        let book = book
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::validation(format!("invalid book id: {book}")))?;
        let parse_date = |raw: &str| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| Error::validation(format!("invalid date (expected YYYY-MM-DD): {raw}")))
        };
        Ok(NewGroup {
            name: name.to_string(),
            book,
            start_date: parse_date(start_date)?,
            end_date: parse_date(end_date)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_chapters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    #[serde(default)]
    pub available_groups: Vec<Group>,
}
