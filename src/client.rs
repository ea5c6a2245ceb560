use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Something that can answer one chat message.
///
/// Implementations must be cheap to share across tasks; the controller
/// calls `send` once per submission and spawns the returned future.
pub trait ChatBackend: Send + Sync {
    fn send(&self, message: String) -> BoxFuture<'static, Result<String, ChatError>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body shape shared by success and failure replies.
#[derive(Deserialize, Default)]
struct ChatReply {
    response: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
}

impl HttpChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Use a preconfigured reqwest client (proxy settings, TLS roots, ...).
    pub fn with_client(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn query(&self, message: &str) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| ChatError::transport(&e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ChatError::transport(&e))?;

        interpret_reply(status, &body)
    }
}

impl ChatBackend for HttpChatClient {
    fn send(&self, message: String) -> BoxFuture<'static, Result<String, ChatError>> {
        let client = self.clone();
        Box::pin(async move { client.query(&message).await })
    }
}

/// Map a received status and body onto a reply or a failure.
///
/// An `error` field in the body always wins as the failure reason; otherwise
/// a non-success status is reported by itself.
fn interpret_reply(status: reqwest::StatusCode, body: &[u8]) -> Result<String, ChatError> {
    let parsed = serde_json::from_slice::<ChatReply>(body);

    if status.is_success() {
        return match parsed {
            Ok(ChatReply {
                response: Some(text),
                ..
            }) => Ok(text),
            Ok(ChatReply {
                error: Some(message),
                ..
            }) => Err(ChatError::Backend { status, message }),
            Ok(_) => Err(ChatError::Decode("missing `response` field".to_string())),
            Err(e) => Err(ChatError::Decode(e.to_string())),
        };
    }

    match parsed.unwrap_or_default().error {
        Some(message) => Err(ChatError::Backend { status, message }),
        None => Err(ChatError::Status(status)),
    }
}
