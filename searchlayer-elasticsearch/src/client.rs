use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

use searchlayer_core::{
    client::{BulkOperation, BulkResponse, MultiGetItem, SearchResponse, StoreClient, StoreClientBuilder},
    compiler::CompiledQuery,
    document::Record,
    error::{SearchLayerError, SearchLayerResult},
};

use crate::{
    config::ConnectionConfig,
    translator::{query_body, search_body},
    wire::{BulkBody, CountBody, MultiGetBody, SearchBody, bulk_lines},
};

/// Search store client speaking the Elasticsearch HTTP API.
///
/// Documents are addressed with the typed layout `/{index}/{type}/...`, one type per
/// collection.
#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    http: reqwest::Client,
    base_url: Url,
    index_name: String,
    credentials: Option<(String, Option<String>)>,
}

impl ElasticsearchClient {
    pub fn builder(config: ConnectionConfig) -> ElasticsearchClientBuilder {
        ElasticsearchClientBuilder::new(config)
    }

    /// The index named by the connection configuration.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        // The base URL was checked to be hierarchical when the client was built.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let request = self.http.request(method, self.url(segments));

        match &self.credentials {
            Some((username, password)) => request.basic_auth(username, password.as_deref()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> SearchLayerResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| SearchLayerError::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(SearchLayerError::Store(format!("{status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SearchLayerError::Store(e.to_string()))
    }

    async fn index_exists(&self) -> SearchLayerResult<bool> {
        let response = self
            .request(Method::HEAD, &[self.index_name.as_str()])
            .send()
            .await
            .map_err(|e| SearchLayerError::Initialization(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(SearchLayerError::Initialization(format!(
                "unexpected status {status} while checking index {}",
                self.index_name
            ))),
        }
    }

    async fn create_index(&self, settings: Option<Value>) -> SearchLayerResult<()> {
        self.send::<Value>(
            self.request(Method::PUT, &[self.index_name.as_str()])
                .json(&settings.unwrap_or_else(|| json!({}))),
        )
        .await
        .map_err(|e| SearchLayerError::Initialization(e.to_string()))?;

        tracing::info!(index = %self.index_name, "created index");

        Ok(())
    }
}

#[async_trait]
impl StoreClient for ElasticsearchClient {
    async fn multi_get(
        &self,
        index: &str,
        type_name: &str,
        ids: Vec<String>,
    ) -> SearchLayerResult<Vec<MultiGetItem>> {
        Ok(self
            .send::<MultiGetBody>(
                self.request(Method::POST, &[index, type_name, "_mget"])
                    .json(&json!({ "ids": ids })),
            )
            .await?
            .into_items())
    }

    async fn search(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<SearchResponse> {
        let body = search_body(query)?;
        tracing::debug!(index, type_name, %body, "search");

        Ok(self
            .send::<SearchBody>(
                self.request(Method::POST, &[index, type_name, "_search"])
                    .json(&body),
            )
            .await?
            .into_response())
    }

    async fn raw_search(
        &self,
        index: &str,
        type_name: &str,
        body: Value,
    ) -> SearchLayerResult<SearchResponse> {
        tracing::debug!(index, type_name, %body, "raw search");

        Ok(self
            .send::<SearchBody>(
                self.request(Method::POST, &[index, type_name, "_search"])
                    .json(&body),
            )
            .await?
            .into_response())
    }

    async fn update(
        &self,
        index: &str,
        type_name: &str,
        id: &str,
        partial: Record,
    ) -> SearchLayerResult<()> {
        self.send::<Value>(
            self.request(Method::POST, &[index, type_name, id, "_update"])
                .json(&json!({ "doc": partial })),
        )
        .await?;

        Ok(())
    }

    async fn delete_by_query(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<()> {
        self.send::<Value>(
            self.request(Method::DELETE, &[index, type_name, "_query"])
                .json(&query_body(query)?),
        )
        .await?;

        Ok(())
    }

    async fn count(
        &self,
        index: &str,
        type_name: &str,
        query: &CompiledQuery,
    ) -> SearchLayerResult<u64> {
        Ok(self
            .send::<CountBody>(
                self.request(Method::POST, &[index, type_name, "_count"])
                    .json(&query_body(query)?),
            )
            .await?
            .count)
    }

    async fn bulk(
        &self,
        index: &str,
        type_name: &str,
        operations: Vec<BulkOperation>,
    ) -> SearchLayerResult<BulkResponse> {
        if operations.is_empty() {
            return Ok(BulkResponse::default());
        }

        Ok(self
            .send::<BulkBody>(
                self.request(Method::POST, &[index, type_name, "_bulk"])
                    .header(CONTENT_TYPE, "application/x-ndjson")
                    .body(bulk_lines(&operations)?),
            )
            .await?
            .into_response())
    }
}

/// Parses the first configured host into a base URL that path segments can be appended to.
fn parse_base_url(config: &ConnectionConfig) -> SearchLayerResult<Url> {
    let base_url = config
        .base_url()
        .ok_or_else(|| SearchLayerError::Initialization("no Elasticsearch host configured".to_string()))?;

    let url = Url::parse(&base_url)
        .map_err(|e| SearchLayerError::Initialization(format!("invalid host {base_url}: {e}")))?;

    if url.cannot_be_a_base() {
        return Err(SearchLayerError::Initialization(format!("invalid host {base_url}")));
    }

    Ok(url)
}

/// Builder for [`ElasticsearchClient`].
///
/// Building checks that the configured index exists and creates it, with the configured
/// index settings, when it does not.
///
/// ```ignore
/// use searchlayer_elasticsearch::{ConnectionConfig, ElasticsearchClient};
/// use searchlayer_core::client::StoreClientBuilder;
///
/// let client = ElasticsearchClient::builder(ConnectionConfig::from_env())
///     .build()
///     .await?;
/// ```
pub struct ElasticsearchClientBuilder {
    config: ConnectionConfig,
}

impl ElasticsearchClientBuilder {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreClientBuilder for ElasticsearchClientBuilder {
    type Client = ElasticsearchClient;

    async fn build(self) -> SearchLayerResult<Self::Client> {
        let base_url = parse_base_url(&self.config)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| SearchLayerError::Initialization(e.to_string()))?;

        let client = ElasticsearchClient {
            http,
            base_url,
            index_name: self.config.index_name,
            credentials: self
                .config
                .username
                .map(|username| (username, self.config.password)),
        };

        if !client.index_exists().await? {
            client.create_index(self.config.index_settings).await?;
        }

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: &str) -> ElasticsearchClient {
        ElasticsearchClient {
            http: reqwest::Client::new(),
            base_url: parse_base_url(&ConnectionConfig::default().with_hosts(vec![host.to_string()])).unwrap(),
            index_name: "app".to_string(),
            credentials: None,
        }
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let url = client("127.0.0.1:9200").url(&["app", "ticket", "a/b?c#d", "_update"]);

        assert_eq!(url.as_str(), "http://127.0.0.1:9200/app/ticket/a%2Fb%3Fc%23d/_update");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_url_keeps_base_path() {
        let url = client("https://search.example.com/es/").url(&["app", "_count"]);

        assert_eq!(url.as_str(), "https://search.example.com/es/app/_count");
    }

    #[test]
    fn test_base_url_requires_a_host() {
        let config = ConnectionConfig::default().with_hosts(Vec::<String>::new());

        assert!(matches!(parse_base_url(&config), Err(SearchLayerError::Initialization(_))));
    }
}
