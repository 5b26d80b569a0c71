use crate::config::SinkConfig;
use crate::error::IngestError;
use crate::model::ExtractedRecipe;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use url::Url;

#[async_trait]
pub trait RecipeSink: Send + Sync {
    /// Store a finished recipe and return the name the recipe manager gave it
    async fn submit(&self, recipe: &ExtractedRecipe) -> Result<String, IngestError>;
}

/// HTTP client for the recipe manager
pub struct RecipeManagerClient {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
}

impl RecipeManagerClient {
    pub fn new(config: &SinkConfig) -> Result<Self, IngestError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| IngestError::Sink("sink.base_url is not configured".into()))?;
        Self::with_base_url(base_url, config.api_token.clone())
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: &str, api_token: Option<String>) -> Result<Self, IngestError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| IngestError::Sink(format!("invalid base URL {base_url}: {e}")))?;
        Ok(RecipeManagerClient {
            client: Client::new(),
            base_url,
            api_token,
        })
    }

    fn recipes_url(&self, name: Option<&str>) -> Result<Url, IngestError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| IngestError::Sink("base URL cannot carry a path".into()))?;
            segments.pop_if_empty().extend(["api", "recipes"]);
            if let Some(name) = name {
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, IngestError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| IngestError::Sink(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Sink(format!("{status}: {body}")));
        }
        Ok(response)
    }

    /// List stored recipes, passed through as returned
    pub async fn list(&self) -> Result<Value, IngestError> {
        let response = self.send(self.client.get(self.recipes_url(None)?)).await?;
        response
            .json()
            .await
            .map_err(|e| IngestError::Sink(e.to_string()))
    }

    /// Fetch one stored recipe by the name returned from [`RecipeSink::submit`]
    pub async fn get(&self, name: &str) -> Result<Value, IngestError> {
        let response = self
            .send(self.client.get(self.recipes_url(Some(name))?))
            .await?;
        response
            .json()
            .await
            .map_err(|e| IngestError::Sink(e.to_string()))
    }

    pub async fn delete(&self, name: &str) -> Result<(), IngestError> {
        self.send(self.client.delete(self.recipes_url(Some(name))?))
            .await?;
        info!("Deleted recipe {}", name);
        Ok(())
    }
}

/// The created name may come back as a JSON string, an object, or bare text.
fn created_name(body: &str) -> Option<String> {
    let name = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => ["name", "slug", "id"]
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })?,
        Ok(_) => return None,
        Err(_) => body.to_string(),
    };
    let name = name.trim().to_string();
    (!name.is_empty()).then_some(name)
}

#[async_trait]
impl RecipeSink for RecipeManagerClient {
    async fn submit(&self, recipe: &ExtractedRecipe) -> Result<String, IngestError> {
        debug!("Submitting recipe {}", recipe.name);
        let response = self
            .send(self.client.post(self.recipes_url(None)?).json(recipe))
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| IngestError::Sink(e.to_string()))?;

        created_name(&body)
            .ok_or_else(|| IngestError::Sink(format!("no recipe name in response: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn recipe() -> ExtractedRecipe {
        ExtractedRecipe {
            name: "Chili".to_string(),
            ingredients: "beans".to_string(),
            directions: "1. Simmer".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_returns_created_name() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/recipes")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::PartialJson(json!({
                "name": "Chili",
                "directions": "1. Simmer",
                "notes": ""
            })))
            .with_status(201)
            .with_body(r#""chili""#)
            .create();

        let client = RecipeManagerClient::with_base_url(&server.url(), Some("secret".into())).unwrap();
        assert_eq!(client.submit(&recipe()).await.unwrap(), "chili");
        mock.assert();
    }

    #[tokio::test]
    async fn test_submit_failure_is_sink_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", "/api/recipes")
            .with_status(422)
            .with_body("duplicate")
            .create();

        let client = RecipeManagerClient::with_base_url(&server.url(), None).unwrap();
        let err = client.submit(&recipe()).await.unwrap_err();
        assert!(matches!(err, IngestError::Sink(_)));
        assert!(err.to_string().contains("duplicate"));
    }

    #[tokio::test]
    async fn test_passthrough_operations() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/api/recipes")
            .with_status(200)
            .with_body(r#"[{"name": "chili"}]"#)
            .create();
        let get = server
            .mock("GET", "/api/recipes/chili")
            .with_status(200)
            .with_body(r#"{"name": "chili"}"#)
            .create();
        let delete = server
            .mock("DELETE", "/api/recipes/chili")
            .with_status(204)
            .create();

        let client = RecipeManagerClient::with_base_url(&server.url(), None).unwrap();
        assert_eq!(client.list().await.unwrap()[0]["name"], "chili");
        assert_eq!(client.get("chili").await.unwrap()["name"], "chili");
        client.delete("chili").await.unwrap();

        list.assert();
        get.assert();
        delete.assert();
    }

    #[test]
    fn test_created_name_shapes() {
        assert_eq!(created_name(r#""pie""#).as_deref(), Some("pie"));
        assert_eq!(created_name(r#"{"slug": "pie"}"#).as_deref(), Some("pie"));
        assert_eq!(created_name(r#"{"id": 7}"#).as_deref(), Some("7"));
        assert_eq!(created_name("pie-2").as_deref(), Some("pie-2"));
        assert_eq!(created_name(r#"{"ok": true}"#), None);
        assert_eq!(created_name(""), None);
    }

    #[test]
    fn test_new_requires_base_url() {
        assert!(RecipeManagerClient::new(&SinkConfig::default()).is_err());
    }
}
