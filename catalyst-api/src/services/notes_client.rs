//! Notes export client (Notion)
//!
//! Converts markdown into Notion blocks and creates a page either under a
//! parent page or as an entry in a database.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::NotesSettings;

const NOTION_VERSION: &str = "2022-06-28";

/// Prefix of integration tokens; a parent page id with it is a misconfiguration
const TOKEN_PREFIX: &str = "ntn_";

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("NOTION_API_KEY is not configured")]
    NotConfigured,

    #[error("No parent page found. Specify a parent_page_id or set NOTION_PARENT_PAGE_ID to a page id from your Notion workspace.")]
    NoParentPage,

    #[error("Failed to find parent page: {0}")]
    ParentSearch(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Created page reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedPage {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
}

pub struct NotesClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    default_parent: Option<String>,
}

impl NotesClient {
    pub fn new(settings: &NotesSettings) -> Result<Self, NotesError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| NotesError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            default_parent: settings.parent_page_id.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Create a page holding `content` under a parent page
    ///
    /// Parent: explicit id, else the configured default, else the first page
    /// visible to the integration.
    pub async fn create_page(
        &self,
        content: &str,
        title: &str,
        parent_page_id: Option<&str>,
    ) -> Result<ExportedPage, NotesError> {
        let parent = match parent_page_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id.to_string(),
            None => match self.usable_default_parent() {
                Some(id) => id.to_string(),
                None => self.find_any_page().await?,
            },
        };

        let body = json!({
            "parent": { "page_id": parent },
            "properties": {
                "title": { "title": [ { "text": { "content": title } } ] }
            },
            "children": markdown_to_blocks(content),
        });

        self.post_page(body).await
    }

    /// Add an entry holding `content` to a database
    pub async fn add_to_database(
        &self,
        content: &str,
        title: &str,
        database_id: &str,
    ) -> Result<ExportedPage, NotesError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": {
                "Name": { "title": [ { "text": { "content": title } } ] }
            },
            "children": markdown_to_blocks(content),
        });

        self.post_page(body).await
    }

    fn usable_default_parent(&self) -> Option<&str> {
        self.default_parent
            .as_deref()
            .filter(|id| !id.starts_with(TOKEN_PREFIX))
    }

    fn api_key(&self) -> Result<&str, NotesError> {
        self.api_key.as_deref().ok_or(NotesError::NotConfigured)
    }

    async fn find_any_page(&self) -> Result<String, NotesError> {
        let api_key = self.api_key()?;
        let url = format!("{}/search", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "filter": { "property": "object", "value": "page" } }))
            .send()
            .await
            .map_err(|e| NotesError::ParentSearch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotesError::ParentSearch(format!("{}: {}", status.as_u16(), error_text)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| NotesError::ParentSearch(e.to_string()))?;

        let page = parsed.results.into_iter().next().ok_or(NotesError::NoParentPage)?;
        tracing::debug!(page_id = %page.id, "Using first searchable page as parent");
        Ok(page.id)
    }

    async fn post_page(&self, body: Value) -> Result<ExportedPage, NotesError> {
        let api_key = self.api_key()?;
        let url = format!("{}/pages", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotesError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotesError::Api(status.as_u16(), error_text));
        }

        let page: ExportedPage = response
            .json()
            .await
            .map_err(|e| NotesError::Parse(e.to_string()))?;

        tracing::info!(page_id = %page.id, "Exported page to Notion");
        Ok(page)
    }
}

fn text_block(kind: &str, content: &str) -> Value {
    json!({
        "object": "block",
        "type": kind,
        kind: {
            "rich_text": [ { "type": "text", "text": { "content": content } } ]
        }
    })
}

/// Convert markdown into Notion blocks, one block per non-blank line
pub fn markdown_to_blocks(content: &str) -> Vec<Value> {
    let mut blocks = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let trimmed = line.trim();

        let block = if let Some(text) = line.strip_prefix("### ") {
            text_block("heading_3", text)
        } else if let Some(text) = line.strip_prefix("## ") {
            text_block("heading_2", text)
        } else if let Some(text) = line.strip_prefix("# ") {
            text_block("heading_1", text)
        } else if let Some(text) = trimmed.strip_prefix("- ") {
            text_block("bulleted_list_item", text)
        } else if let Some(text) = numbered_item(trimmed) {
            text_block("numbered_list_item", text)
        } else {
            text_block("paragraph", line)
        };
        blocks.push(block);
    }

    blocks
}

/// Text of a single-digit numbered item such as `3. Ship it`
fn numbered_item(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let first = chars.next()?;
    if first.is_ascii_digit() && chars.next() == Some('.') {
        Some(line[2..].trim_start())
    } else {
        None
    }
}
