//! HTTP JSON client for the chat service.
//!
//! Every call is `POST {endpoint}/chat/{method}` with a JSON body. Failures
//! come back as a non-2xx status with `{"error": {"code", "message"}}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::chat::directory::{ConversationQuery, Directory};
use crate::chat::types::{Conversation, MembersType, Visibility};
use crate::error::{Error, Result};

pub struct ServiceClient {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct CanonicalizeRequest<'a> {
    name: &'a str,
    members_type: MembersType,
    visibility: Visibility,
}

#[derive(Deserialize)]
struct CanonicalizeResponse {
    canonical_name: String,
}

#[derive(Deserialize)]
struct FindResponse {
    #[serde(default)]
    conversations: Vec<Conversation>,
}

#[derive(Deserialize)]
struct CreateResponse {
    conversation: Conversation,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ServiceError,
}

#[derive(Deserialize, Debug)]
struct ServiceError {
    code: String,
    message: String,
}

impl ServiceError {
    fn into_error(self) -> Error {
        match self.code.as_str() {
            "invalid_request" => Error::InvalidRequest(self.message),
            "already_exists" => Error::AlreadyExists(self.message),
            _ => Error::Transport(format!("{}: {}", self.code, self.message)),
        }
    }
}

impl ServiceClient {
    /// Client for the service at `base_url`; `timeout` bounds each call.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Outer error is transport, inner is what the service reported.
    async fn call<Req, Resp>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<std::result::Result<Resp, ServiceError>>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/chat/{}", self.base_url, method);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(Ok(response.json::<Resp>().await?));
        }

        let text = response.text().await?;
        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => {
                tracing::debug!("{} failed: {:?}", method, envelope.error);
                Ok(Err(envelope.error))
            }
            Err(_) => Err(Error::Transport(format!(
                "{} returned {}: {}",
                method,
                status,
                text.trim()
            ))),
        }
    }
}

#[async_trait]
impl Directory for ServiceClient {
    async fn canonicalize(
        &self,
        name: &str,
        members_type: MembersType,
        visibility: Visibility,
    ) -> Result<String> {
        let request = CanonicalizeRequest {
            name,
            members_type,
            visibility,
        };
        match self
            .call::<_, CanonicalizeResponse>("canonicalize", &request)
            .await?
        {
            Ok(resp) => Ok(resp.canonical_name),
            Err(err) if err.code == "not_found" => Err(Error::Resolution(name.to_string())),
            Err(err) => Err(err.into_error()),
        }
    }

    async fn find_conversations(&self, query: &ConversationQuery) -> Result<Vec<Conversation>> {
        self.call::<_, FindResponse>("find_conversations", query)
            .await?
            .map(|resp| resp.conversations)
            .map_err(ServiceError::into_error)
    }

    async fn create_conversation(&self, query: &ConversationQuery) -> Result<Conversation> {
        self.call::<_, CreateResponse>("create_conversation", query)
            .await?
            .map(|resp| resp.conversation)
            .map_err(ServiceError::into_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{IdentifyBehavior, TopicType};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn canonicalize(Json(req): Json<Value>) -> Response {
        let name = req["name"].as_str().unwrap_or_default().to_string();
        if name == "ACME" || name == "acme" {
            return Json(json!({ "canonical_name": "acme" })).into_response();
        }
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "code": "not_found", "message": "no such user or team" } })),
        )
            .into_response()
    }

    async fn find(Json(query): Json<Value>) -> Response {
        if query["topic_name"] == "broken" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        Json(json!({
            "conversations": [{
                "info": {
                    "id": "00000100000000000000",
                    "tlf_name": query["tlf_name"],
                    "topic_name": query["topic_name"],
                    "topic_type": "chat",
                    "visibility": "private",
                    "members_type": "team"
                },
                "members": ["alice", "bob"],
                "error": { "kind": "removed", "message": "removed from team" }
            }]
        }))
        .into_response()
    }

    async fn create(Json(_query): Json<Value>) -> Response {
        (
            StatusCode::CONFLICT,
            Json(json!({ "error": { "code": "already_exists", "message": "acme#general" } })),
        )
            .into_response()
    }

    async fn slow(Json(_query): Json<Value>) -> Response {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "conversations": [] })).into_response()
    }

    async fn spawn_service() -> String {
        let app = Router::new()
            .route("/chat/canonicalize", post(canonicalize))
            .route("/chat/find_conversations", post(find))
            .route("/chat/create_conversation", post(create))
            .route("/slow/chat/find_conversations", post(slow));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn query(topic: Option<&str>) -> ConversationQuery {
        ConversationQuery {
            tlf_name: "acme".to_string(),
            topic_name: topic.map(|t| t.to_string()),
            topic_type: TopicType::Chat,
            visibility: Visibility::Private,
            members_type: MembersType::Team,
            identify_behavior: IdentifyBehavior::ChatCli,
        }
    }

    #[tokio::test]
    async fn test_canonicalize() {
        let url = spawn_service().await;
        let client = ServiceClient::new(format!("{}/", url), Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), url);

        let name = client
            .canonicalize("ACME", MembersType::Team, Visibility::Private)
            .await
            .unwrap();
        assert_eq!(name, "acme");

        let err = client
            .canonicalize("nobody", MembersType::Team, Visibility::Private)
            .await
            .unwrap_err();
        assert!(err.is_resolution());
    }

    #[tokio::test]
    async fn test_find_conversations_decodes_payload() {
        let url = spawn_service().await;
        let client = ServiceClient::new(url, Duration::from_secs(5)).unwrap();

        let convs = client
            .find_conversations(&query(Some("general")))
            .await
            .unwrap();
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].id().to_string(), "00000100000000000000");
        assert_eq!(convs[0].info.topic_name.as_deref(), Some("general"));
        assert_eq!(convs[0].members, vec!["alice", "bob"]);
        assert!(convs[0].error.as_ref().unwrap().is_benign());
    }

    #[tokio::test]
    async fn test_service_errors_are_mapped() {
        let url = spawn_service().await;
        let client = ServiceClient::new(url, Duration::from_secs(5)).unwrap();

        let err = client.create_conversation(&query(None)).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        let err = client
            .find_conversations(&query(Some("broken")))
            .await
            .unwrap_err();
        match err {
            Error::Transport(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let url = spawn_service().await;
        let client =
            ServiceClient::new(format!("{}/slow", url), Duration::from_millis(100)).unwrap();

        let err = client.find_conversations(&query(None)).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ServiceClient::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client
            .canonicalize("acme", MembersType::Team, Visibility::Private)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
