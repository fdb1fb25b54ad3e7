use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::deepl::DeeplApi;
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageKind {
    Source,
    Target,
}

impl LanguageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageKind::Source => "source",
            LanguageKind::Target => "target",
        }
    }
}

impl fmt::Display for LanguageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageEntry {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_formality: Option<bool>,
}

/// Languages supported in one direction, in upstream order.
#[derive(Debug, Clone)]
pub struct LanguageCatalog {
    entries: Vec<LanguageEntry>,
    codes: HashSet<String>,
}

impl LanguageCatalog {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        let codes = entries
            .iter()
            .map(|entry| normalize_code(&entry.code))
            .collect();
        Self { entries, codes }
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&normalize_code(code))
    }

    pub fn find(&self, code: &str) -> Option<&LanguageEntry> {
        if !self.contains(code) {
            return None;
        }
        let code = normalize_code(code);
        self.entries
            .iter()
            .find(|entry| normalize_code(&entry.code) == code)
    }

    pub fn codes(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.code.clone()).collect()
    }
}

/// Memoized source and target catalogs, filled on first use and kept for the
/// lifetime of the owning server. A failed fetch leaves the slot empty so the
/// next caller fetches again.
#[derive(Debug, Default)]
pub struct CatalogCache {
    source: OnceCell<LanguageCatalog>,
    target: OnceCell<LanguageCatalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: LanguageKind) -> &OnceCell<LanguageCatalog> {
        match kind {
            LanguageKind::Source => &self.source,
            LanguageKind::Target => &self.target,
        }
    }

    pub async fn get(
        &self,
        api: &dyn DeeplApi,
        kind: LanguageKind,
    ) -> Result<&LanguageCatalog, ToolError> {
        self.slot(kind)
            .get_or_try_init(|| async move {
                debug!("fetching {} language catalog", kind);
                api.languages(kind)
                    .await
                    .map(LanguageCatalog::new)
                    .map_err(|err| ToolError::UpstreamUnavailable {
                        kind,
                        message: err.to_string(),
                    })
            })
            .await
    }

    pub async fn validate(
        &self,
        api: &dyn DeeplApi,
        kind: LanguageKind,
        code: &str,
    ) -> Result<LanguageEntry, ToolError> {
        let catalog = self.get(api, kind).await?;
        catalog
            .find(code)
            .cloned()
            .ok_or_else(|| ToolError::InvalidLanguageCode {
                kind,
                code: code.to_string(),
                valid: catalog.codes(),
            })
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}
