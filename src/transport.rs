use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::TransportError;
use crate::post::Post;

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub api_url: Url,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    posts_url: Url,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("build reqwest client")?;
        let posts_url = posts_url(&config.api_url)?;
        Ok(Self { client, posts_url })
    }

    pub fn posts_url(&self) -> &Url {
        &self.posts_url
    }

    pub async fn list(&self) -> Result<Vec<Post>, TransportError> {
        let resp = self.send(Method::GET, self.posts_url.clone(), None).await?;
        decode(resp).await
    }

    pub async fn get(&self, id: u64) -> Result<Post, TransportError> {
        let resp = self.send(Method::GET, self.item_url(id), None).await?;
        decode(resp).await
    }

    pub async fn create(&self, post: &Post) -> Result<Post, TransportError> {
        let resp = self
            .send(Method::POST, self.posts_url.clone(), Some(post))
            .await?;
        decode(resp).await
    }

    pub async fn update(&self, id: u64, post: &Post) -> Result<Post, TransportError> {
        let resp = self.send(Method::PUT, self.item_url(id), Some(post)).await?;
        decode(resp).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), TransportError> {
        self.send(Method::DELETE, self.item_url(id), None).await?;
        Ok(())
    }

    fn item_url(&self, id: u64) -> Url {
        let mut url = self.posts_url.clone();
        // posts_url always has a path, so path_segments_mut cannot fail here.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(&id.to_string());
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Post>,
    ) -> Result<Response, TransportError> {
        tracing::debug!(%method, %url, "request");
        let mut req: RequestBuilder = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(client_error)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(%method, %url, %status, "request failed");
        Err(TransportError::Server {
            status: status.as_u16(),
            message: server_message(status, &body),
        })
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, TransportError> {
    let status = resp.status();
    let bytes = resp.bytes().await.map_err(client_error)?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::Server {
        status: status.as_u16(),
        message: format!("invalid response body: {e}"),
    })
}

fn client_error(err: reqwest::Error) -> TransportError {
    let message = if err.is_timeout() {
        "timeout".to_string()
    } else {
        format!("{:#}", anyhow::Error::from(err))
    };
    TransportError::Client { message }
}

fn server_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    let reason = || status.canonical_reason().unwrap_or_default().to_string();
    if body.is_empty() {
        return reason();
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => json_message(&json).unwrap_or_else(reason),
        Err(_) => body.to_string(),
    }
}

/// `message`, then `error` (string or nested `error.message`), from a JSON error body.
fn json_message(json: &serde_json::Value) -> Option<String> {
    if let Some(text) = json.as_str() {
        return non_empty(text);
    }
    for key in ["message", "error"] {
        match json.get(key) {
            Some(serde_json::Value::String(text)) => {
                if let Some(text) = non_empty(text) {
                    return Some(text);
                }
            }
            Some(nested @ serde_json::Value::Object(_)) => {
                if let Some(text) = json_message(nested) {
                    return Some(text);
                }
            }
            _ => {}
        }
    }
    None
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn posts_url(api_url: &Url) -> anyhow::Result<Url> {
    if api_url.cannot_be_a_base() {
        anyhow::bail!("api url {} cannot be used as a base", api_url);
    }
    let mut url = api_url.clone();
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("api url {} has no path", api_url))?
        .pop_if_empty()
        .push("posts");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posts_url_appends_collection() {
        for (base, expected) in [
            ("http://localhost:3000", "http://localhost:3000/posts"),
            ("http://localhost:3000/", "http://localhost:3000/posts"),
            ("https://api.example.com/v1", "https://api.example.com/v1/posts"),
            ("https://api.example.com/v1/", "https://api.example.com/v1/posts"),
        ] {
            let url = posts_url(&Url::parse(base).unwrap()).unwrap();
            assert_eq!(url.as_str(), expected);
        }
    }

    #[test]
    fn server_message_prefers_body() {
        assert_eq!(
            server_message(StatusCode::INTERNAL_SERVER_ERROR, " Internal \n"),
            "Internal"
        );
        assert_eq!(server_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn server_message_reads_json_error_bodies() {
        assert_eq!(server_message(StatusCode::NOT_FOUND, "{}"), "Not Found");
        assert_eq!(
            server_message(StatusCode::BAD_REQUEST, r#"{"message":"name is required"}"#),
            "name is required"
        );
        assert_eq!(
            server_message(StatusCode::CONFLICT, r#"{"error":{"message":"duplicate"}}"#),
            "duplicate"
        );
        assert_eq!(
            server_message(StatusCode::FORBIDDEN, r#"{"error":"nope","code":3}"#),
            "nope"
        );
        assert_eq!(
            server_message(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":""}"#),
            "Internal Server Error"
        );
        assert_eq!(server_message(StatusCode::NOT_FOUND, "[]"), "Not Found");
    }

    #[test]
    fn item_url_appends_id() {
        let transport = Transport::new(&TransportConfig {
            api_url: Url::parse("http://localhost:3000/api/").unwrap(),
            user_agent: "test".to_string(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(
            transport.item_url(42).as_str(),
            "http://localhost:3000/api/posts/42"
        );
    }
}
