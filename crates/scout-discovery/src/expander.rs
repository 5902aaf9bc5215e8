//! Query expansion: one concept in, related search terms out.
//!
//! [`ChatExpander`] asks an OpenAI-compatible chat endpoint for related
//! components and parses its free-text answer at this boundary, so the
//! rest of the pipeline only ever sees a typed [`Expansion`].

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scout_core::LlmConfig;
use serde_json::{json, Value};

use crate::error::ExpanderError;

/// Upper bound on components accepted from one expansion.
pub const MAX_COMPONENTS: usize = 10;

/// Used when the model's answer carries no strategy section.
pub const DEFAULT_STRATEGY: &str = "Broad search across all related components";

const COMPONENT_MARKERS: [&str; 3] = ["اجزاء مرتبط:", "Related components:", "Components:"];
const STRATEGY_MARKERS: [&str; 3] = ["استراتژی جستجو:", "Search strategy:", "Strategy:"];

/// Related search terms for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Ordered most relevant first, at most [`MAX_COMPONENTS`].
    pub components: Vec<String>,
    pub strategy: String,
}

impl Expansion {
    /// An expansion with no components.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            components: Vec::new(),
            strategy: DEFAULT_STRATEGY.to_string(),
        }
    }
}

/// Turns a concept query into related component queries.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ExpanderError`] when the backing service cannot be reached
    /// or answers with a non-success status. A reply that cannot be parsed
    /// into components is an empty expansion, not an error.
    async fn expand(&self, query: &str) -> Result<Expansion, ExpanderError>;
}

/// Expander that never expands; discovery then uses the original query only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

#[async_trait]
impl QueryExpander for NoExpansion {
    async fn expand(&self, _query: &str) -> Result<Expansion, ExpanderError> {
        Ok(Expansion::empty())
    }
}

/// Expander backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatExpander {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatExpander {
    /// # Errors
    ///
    /// Returns [`ExpanderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self, ExpanderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn request_body(&self, query: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You expand marketplace shopping queries into the concrete parts, \
                                accessories and supplies a buyer of that concept would also look for. \
                                Answer in the language of the query."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Query: \"{query}\"\n\n\
                         List at most {MAX_COMPONENTS} related components as short search keywords, \
                         most important first, one per line, in this exact format:\n\
                         Related components:\n- <component>\n- <component>\n\n\
                         Search strategy: <one sentence on how the search was broadened>"
                    )
                }
            ],
            "temperature": 0.2
        })
    }
}

#[async_trait]
impl QueryExpander for ChatExpander {
    async fn expand(&self, query: &str) -> Result<Expansion, ExpanderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExpanderError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        let content = body
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ExpanderError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        let expansion = parse_expansion(content);
        tracing::debug!(
            query,
            components = expansion.components.len(),
            "query expanded"
        );
        Ok(expansion)
    }
}

/// Parses a free-text expansion answer.
///
/// Components are the `-` bullet lines following a components marker; the
/// strategy is the text after a strategy marker, continuing over any
/// following lines. Missing markers yield no components and the default
/// strategy.
#[must_use]
pub fn parse_expansion(text: &str) -> Expansion {
    enum Section {
        None,
        Components,
        Strategy,
    }

    let mut section = Section::None;
    let mut components: Vec<String> = Vec::new();
    let mut strategy_parts: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = strip_marker(line, &COMPONENT_MARKERS) {
            section = Section::Components;
            if let Some(component) = bullet(rest) {
                components.push(component);
            }
            continue;
        }
        if let Some(rest) = strip_marker(line, &STRATEGY_MARKERS) {
            section = Section::Strategy;
            if !rest.is_empty() {
                strategy_parts.push(rest.to_string());
            }
            continue;
        }
        match section {
            Section::Components => {
                if let Some(component) = bullet(line) {
                    components.push(component);
                }
            }
            Section::Strategy => strategy_parts.push(line.to_string()),
            Section::None => {}
        }
    }

    let mut seen = HashSet::new();
    components.retain(|c| seen.insert(c.clone()));
    components.truncate(MAX_COMPONENTS);

    let strategy = strategy_parts.join(" ");
    Expansion {
        components,
        strategy: if strategy.is_empty() {
            DEFAULT_STRATEGY.to_string()
        } else {
            strategy
        },
    }
}

fn strip_marker<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    markers.iter().find_map(|marker| {
        let stripped = line.trim_start_matches(['*', '#', ' ']);
        let head = stripped.get(..marker.len())?;
        if head.eq_ignore_ascii_case(marker) {
            Some(stripped[marker.len()..].trim_matches(['*', ' ']))
        } else {
            None
        }
    })
}

fn bullet(line: &str) -> Option<String> {
    let item = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('•'))
        .or_else(|| line.strip_prefix('*'))?
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim();
    if item.is_empty() {
        None
    } else {
        Some(item.to_string())
    }
}

#[cfg(test)]
#[path = "expander_test.rs"]
mod tests;
