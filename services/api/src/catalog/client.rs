use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use opine_common::error::{OpineError, OpineResult};
use opine_common::types::EntityRef;

use super::models::Entity;

/// Read access to the software catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch an entity by reference. `None` when the catalog has no match.
    async fn entity(&self, entity_ref: &EntityRef) -> OpineResult<Option<Entity>>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl From<CatalogClientError> for OpineError {
    fn from(err: CatalogClientError) -> Self {
        OpineError::Integration(format!("catalog: {err}"))
    }
}

#[derive(Clone)]
pub struct RestCatalogClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestCatalogClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl CatalogClient for RestCatalogClient {
    async fn entity(&self, entity_ref: &EntityRef) -> OpineResult<Option<Entity>> {
        let url = format!(
            "{}/entities/by-name/{}/{}/{}",
            self.base_url, entity_ref.kind, entity_ref.namespace, entity_ref.name
        );

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(CatalogClientError::RequestError)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogClientError::HttpError { status, body }.into());
        }

        let entity = response
            .json::<Entity>()
            .await
            .map_err(CatalogClientError::RequestError)?;
        Ok(Some(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entity_body() -> serde_json::Value {
        serde_json::json!({
            "kind": "Component",
            "metadata": {
                "name": "search",
                "namespace": "default",
                "title": "Search",
                "annotations": {
                    "feedback/type": "JIRA",
                    "jira/project-key": "PROJ"
                }
            }
        })
    }

    #[tokio::test]
    async fn fetches_entity_by_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/entities/by-name/component/default/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestCatalogClient::new(&server.uri(), None, 5).unwrap();
        let entity_ref: EntityRef = "component:default/search".parse().unwrap();

        let entity = client
            .entity(&entity_ref)
            .await
            .unwrap()
            .expect("entity should exist");
        assert_eq!(entity.metadata.name, "search");
        assert_eq!(entity.annotation("jira/project-key"), Some("PROJ"));
    }

    #[tokio::test]
    async fn sends_bearer_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/entities/by-name/component/default/search"))
            .and(header("authorization", "Bearer catalog-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entity_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            RestCatalogClient::new(&server.uri(), Some("catalog-token".to_string()), 5).unwrap();
        let entity_ref: EntityRef = "component:default/search".parse().unwrap();

        let entity = client.entity(&entity_ref).await.unwrap();
        assert!(entity.is_some());
    }

    #[tokio::test]
    async fn returns_none_for_unknown_entity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = RestCatalogClient::new(&server.uri(), None, 5).unwrap();
        let entity_ref: EntityRef = "component:default/missing".parse().unwrap();

        let entity = client.entity(&entity_ref).await.unwrap();
        assert!(entity.is_none());
    }

    #[tokio::test]
    async fn surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = RestCatalogClient::new(&server.uri(), None, 5).unwrap();
        let entity_ref: EntityRef = "component:default/search".parse().unwrap();

        let result = client.entity(&entity_ref).await;
        assert!(matches!(result, Err(OpineError::Integration(_))));
    }
}
