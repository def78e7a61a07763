//! The host's chat endpoints over HTTP.
//!
//! | operation       | request                                    |
//! |-----------------|--------------------------------------------|
//! | `fetch_self`    | `GET /chats/self/`                         |
//! | `fetch_dialogs` | `GET /chats/dialogs/?page=N` (paginated)   |
//! | `fetch_history` | `GET /chats/messages/{id}/?page=N` (paginated) |
//! | `fetch_users`   | `GET /chats/users/`                        |
//! | `mark_all_read` | `POST /chats/messages/{id}/mark-all-read`  |

use std::sync::Arc;

use parley_app::ChatApi;
use parley_core::{Conversation, DirectoryUser, Message, UserId};
use parley_proto::rest::{DialogRecord, MessageRecord, Page, UserRecord};
use reqwest::{
    Client,
    header::{COOKIE, HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;

use crate::CliError;

/// Upper bound on pages fetched for one listing.
pub const MAX_PAGES: u32 = 50;

/// [`ChatApi`] backed by the host's JSON endpoints.
///
/// Authentication is the host's session cookie plus its CSRF token, sent on
/// every request.
#[derive(Clone, Debug)]
pub struct HttpChatApi {
    client: Client,
    base_url: Arc<str>,
}

impl HttpChatApi {
    /// Create a client for the host at `base_url`.
    pub fn new(base_url: &str, cookie: Option<&str>, csrf_token: Option<&str>) -> Result<Self, CliError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            headers.insert(COOKIE, header_value("cookie", cookie)?);
        }
        if let Some(token) = csrf_token {
            headers.insert(HeaderName::from_static("x-csrftoken"), header_value("csrf token", token)?);
        }

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').into() })
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        let response = self.client.get(self.url(path)).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch every page of a paginated listing.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, CliError> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let url = self.url(path);
            let response =
                self.client.get(url).query(&[("page", page)]).send().await?.error_for_status()?;
            let body: Page<T> = response.json().await?;
            records.extend(body.data);

            if page >= body.pages || page >= MAX_PAGES {
                if body.pages > MAX_PAGES {
                    tracing::warn!(path, pages = body.pages, "listing truncated");
                }
                return Ok(records);
            }
            page += 1;
        }
    }
}

impl ChatApi for HttpChatApi {
    type Error = CliError;

    async fn fetch_self(&self) -> Result<DirectoryUser, CliError> {
        let me: UserRecord = self.get("self/").await?;
        Ok(me.into())
    }

    async fn fetch_dialogs(&self) -> Result<Vec<Conversation>, CliError> {
        let records: Vec<DialogRecord> = self.get_all("dialogs/").await?;
        tracing::debug!(count = records.len(), "dialogs fetched");
        Ok(records.into_iter().map(Conversation::from).collect())
    }

    async fn fetch_history(&self, user: UserId) -> Result<Vec<Message>, CliError> {
        let records: Vec<MessageRecord> = self.get_all(&format!("messages/{user}/")).await?;
        tracing::debug!(user_id = %user, count = records.len(), "history fetched");
        Ok(records.into_iter().map(Message::from).collect())
    }

    async fn fetch_users(&self) -> Result<Vec<DirectoryUser>, CliError> {
        let records: Vec<UserRecord> = self.get("users/").await?;
        Ok(records.into_iter().map(DirectoryUser::from).collect())
    }

    async fn mark_all_read(&self, user: UserId) -> Result<(), CliError> {
        self.client
            .post(self.url(&format!("messages/{user}/mark-all-read")))
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, CliError> {
    HeaderValue::from_str(value).map_err(|e| CliError::InvalidHeader { name, reason: e.to_string() })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/chats/{path}", base_url.trim_end_matches('/'))
}

/// The host's websocket endpoint for `base_url`: same host, `ws`/`wss`
/// scheme, path `/chat_ws`.
pub fn websocket_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let swapped = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{swapped}/chat_ws")
}
