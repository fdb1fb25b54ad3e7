use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::deepl::DeeplApi;
use crate::error::ToolError;
use crate::languages::CatalogCache;
use crate::schema::{Arguments, ParameterSchema};

mod document;
mod glossary;
mod languages;
mod rephrase;
mod translate;

pub use document::derive_output_path;

pub const FORMALITY_LEVELS: &[&str] = &["less", "more", "default", "prefer_less", "prefer_more"];

pub const WRITING_STYLES: &[&str] = &[
    "simple",
    "business",
    "academic",
    "casual",
    "default",
    "prefer_simple",
    "prefer_business",
    "prefer_academic",
    "prefer_casual",
];

pub const WRITING_TONES: &[&str] = &[
    "enthusiastic",
    "friendly",
    "confident",
    "diplomatic",
    "default",
    "prefer_enthusiastic",
    "prefer_friendly",
    "prefer_confident",
    "prefer_diplomatic",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// The response shape of every tool call, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEnvelope {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ContentEnvelope {
    pub fn text<I, S>(blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            content: blocks
                .into_iter()
                .map(|text| ContentBlock::Text { text: text.into() })
                .collect(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect()
    }
}

/// Shared state handed to every handler: the upstream client and the
/// language catalogs it feeds.
pub struct ToolContext {
    api: Arc<dyn DeeplApi>,
    catalogs: CatalogCache,
}

impl ToolContext {
    pub fn new(api: Arc<dyn DeeplApi>) -> Self {
        Self {
            api,
            catalogs: CatalogCache::new(),
        }
    }

    pub fn api(&self) -> &dyn DeeplApi {
        self.api.as_ref()
    }

    pub fn catalogs(&self) -> &CatalogCache {
        &self.catalogs
    }
}

pub type ToolFuture<'a> = Pin<Box<dyn Future<Output = Result<ContentEnvelope, ToolError>> + Send + 'a>>;

pub type ToolHandler = for<'a> fn(&'a ToolContext, Arguments) -> ToolFuture<'a>;

/// Cross-field checks that need no network access.
pub type ArgumentRule = fn(&Arguments) -> Result<(), ToolError>;

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: ParameterSchema,
    rule: Option<ArgumentRule>,
    handler: ToolHandler,
}

impl ToolDescriptor {
    pub fn new(
        name: &'static str,
        description: &'static str,
        schema: ParameterSchema,
        handler: ToolHandler,
    ) -> Self {
        Self {
            name,
            description,
            schema,
            rule: None,
            handler,
        }
    }

    pub fn with_rule(mut self, rule: ArgumentRule) -> Self {
        self.rule = Some(rule);
        self
    }

    async fn invoke(&self, ctx: &ToolContext, raw: &Value) -> Result<ContentEnvelope, ToolError> {
        let mut args = self.schema.parse(raw)?;
        if let Some(rule) = self.rule {
            rule(&args)?;
        }
        self.schema
            .validate_languages(&mut args, ctx.catalogs(), ctx.api())
            .await?;
        (self.handler)(ctx, args).await
    }
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        if self.index.contains_key(descriptor.name) {
            return Err(ToolError::DuplicateToolName(descriptor.name.to_string()));
        }
        self.index.insert(descriptor.name, self.tools.len());
        self.tools.push(descriptor);
        Ok(())
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Runs a tool. Only an unknown name is an `Err`; every failure inside
    /// the tool comes back as an envelope flagged with `isError`.
    pub async fn dispatch(
        &self,
        ctx: &ToolContext,
        name: &str,
        raw: &Value,
    ) -> Result<ContentEnvelope, ToolError> {
        let descriptor = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        match descriptor.invoke(ctx, raw).await {
            Ok(envelope) => {
                debug!("tool {} succeeded", name);
                Ok(envelope)
            }
            Err(err) => {
                warn!("tool {} failed: {}", name, err);
                Ok(ContentEnvelope::error(err.to_string()))
            }
        }
    }
}

pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    for descriptor in [
        languages::source_languages_tool(),
        languages::target_languages_tool(),
        translate::translate_text_tool(),
        rephrase::rephrase_text_tool(),
        rephrase::writing_styles_tool(),
        rephrase::writing_tones_tool(),
        document::translate_document_tool(),
        glossary::list_glossaries_tool(),
        glossary::get_glossary_tool(),
        glossary::glossary_entries_tool(),
    ] {
        registry.register(descriptor)?;
    }
    Ok(registry)
}
