//! `/ai/summarize`: server-side summarization of text or stored articles.

use std::sync::Arc;

use once_cell::sync::Lazy;
use refetch_core::ClientError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{HttpClient, RequestOptions};

/// Longest text sent for summarization, in characters.
pub const MAX_INPUT_CHARS: usize = 8000;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Summary style understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Tldr,
    #[default]
    Detailed,
    Outline,
}

impl SummaryMode {
    /// Parse a mode name; anything unrecognized becomes `Detailed`.
    pub fn pick(name: &str) -> Self {
        match name {
            "tldr" => Self::Tldr,
            "outline" => Self::Outline,
            _ => Self::Detailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tldr => "tldr",
            Self::Detailed => "detailed",
            Self::Outline => "outline",
        }
    }
}

/// What to summarize: raw text, a stored article, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummarizeInput {
    pub text: Option<String>,
    pub article_id: Option<String>,
    pub mode: SummaryMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn compress(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Strip markup, collapse whitespace, cap at [`MAX_INPUT_CHARS`].
pub fn clean_text(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    compress(&stripped).chars().take(MAX_INPUT_CHARS).collect()
}

fn request_body(input: &SummarizeInput) -> Result<Value, ClientError> {
    let mut body = Map::new();
    body.insert("mode".to_string(), Value::from(input.mode.as_str()));

    if let Some(text) = input.text.as_deref().map(clean_text).filter(|t| !t.is_empty()) {
        body.insert("text".to_string(), Value::from(text));
    }
    if let Some(id) = input.article_id.as_deref().filter(|id| !id.is_empty()) {
        body.insert("articleId".to_string(), Value::from(id));
    }

    if !body.contains_key("text") && !body.contains_key("articleId") {
        return Err(ClientError::InvalidInput(
            "summarize requires text or an article id".to_string(),
        ));
    }
    Ok(Value::Object(body))
}

pub async fn summarize(
    client: &HttpClient,
    token: Option<&str>,
    input: &SummarizeInput,
) -> Result<Summary, ClientError> {
    let body = request_body(input)?;
    let response = client
        .post("/ai/summarize", body, RequestOptions::authed(token))
        .await?;
    let summary = response
        .get("summary")
        .and_then(Value::as_str)
        .map(compress)
        .unwrap_or_default();
    Ok(Summary { summary })
}

pub async fn summarize_by_id(
    client: &HttpClient,
    token: Option<&str>,
    article_id: &str,
    mode: SummaryMode,
) -> Result<Summary, ClientError> {
    let input = SummarizeInput {
        text: None,
        article_id: Some(article_id.to_string()),
        mode,
    };
    summarize(client, token, &input).await
}

/// Summarize rendered article HTML, falling back to "title. excerpt" when
/// the markup carries no text.
pub async fn summarize_html(
    client: &HttpClient,
    token: Option<&str>,
    html: &str,
    title: &str,
    excerpt: &str,
    mode: SummaryMode,
) -> Result<Summary, ClientError> {
    let input = SummarizeInput {
        text: Some(html_or_fallback(html, title, excerpt)),
        article_id: None,
        mode,
    };
    summarize(client, token, &input).await
}

fn html_or_fallback(html: &str, title: &str, excerpt: &str) -> String {
    let text = clean_text(html);
    if text.is_empty() {
        compress(&format!("{}. {}", title, excerpt))
    } else {
        text
    }
}
