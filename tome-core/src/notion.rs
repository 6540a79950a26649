//! Blocking client for the Notion REST API.

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::NotionConfig;
use crate::model::{Block, Comment, Container, Page};
use crate::source::{Listing, Source, SourceError};

const PAGE_SIZE: &str = "100";

/// Error body returned with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiErrorBody {
    code: String,
    message: String,
}

pub struct NotionClient {
    http: Client,
    base_url: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Notion-Version", HeaderValue::from_str(&config.version)?);

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SourceError> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let error: ApiErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        self.send(self.http.get(self.url(path)).query(query))
    }
}

fn paged<'a>(cursor: Option<&'a str>) -> Vec<(&'static str, &'a str)> {
    let mut query = vec![("page_size", PAGE_SIZE)];
    if let Some(cursor) = cursor {
        query.push(("start_cursor", cursor));
    }
    query
}

impl Source for NotionClient {
    fn retrieve_page(&self, id: &str) -> Result<Page, SourceError> {
        self.get(&format!("pages/{id}"), &[])
    }

    fn retrieve_container(&self, id: &str) -> Result<Container, SourceError> {
        self.get(&format!("databases/{id}"), &[])
    }

    fn list_children(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Block>, SourceError> {
        self.get(&format!("blocks/{id}/children"), &paged(cursor))
    }

    fn query_records(&self, id: &str, cursor: Option<&str>) -> Result<Listing<Page>, SourceError> {
        let mut body = json!({ "page_size": 100 });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        let request = self.http.post(self.url(&format!("databases/{id}/query"))).json(&body);
        self.send(request)
    }

    fn list_comments(
        &self,
        id: &str,
        cursor: Option<&str>,
    ) -> Result<Listing<Comment>, SourceError> {
        let mut query = paged(cursor);
        query.push(("block_id", id));
        self.get("comments", &query)
    }
}
