use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::ApiError;
use crate::languages::{LanguageEntry, LanguageKind};

mod client;

pub use client::DeeplClient;

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connection settings for the DeepL API.
#[derive(Debug, Clone)]
pub struct DeeplConfig {
    pub auth_key: String,
    pub server_url: Option<String>,
    pub poll_interval: Duration,
}

impl DeeplConfig {
    pub fn new(auth_key: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            server_url: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        if !server_url.trim().is_empty() {
            self.server_url = Some(server_url);
        }
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        if !poll_interval.is_zero() {
            self.poll_interval = poll_interval;
        }
        self
    }

    /// Free-plan keys carry a `:fx` suffix and must use the free endpoint.
    pub fn base_url(&self) -> String {
        if let Some(url) = self.server_url.as_deref() {
            return url.trim().trim_end_matches('/').to_string();
        }
        if self.auth_key.trim().ends_with(":fx") {
            FREE_API_URL.to_string()
        } else {
            PRO_API_URL.to_string()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TranslateRequest {
    pub text: String,
    pub target_lang: String,
    pub source_lang: Option<String>,
    pub formality: Option<String>,
    pub glossary_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RephraseRequest {
    pub text: String,
    pub style: Option<String>,
    pub tone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub target_lang: String,
    pub source_lang: Option<String>,
    pub formality: Option<String>,
    pub glossary_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextResult {
    pub text: String,
    pub detected_source_lang: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub bytes: Vec<u8>,
    pub billed_characters: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Glossary {
    pub glossary_id: String,
    pub name: String,
    pub dictionaries: Vec<GlossaryDictionary>,
    pub creation_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryDictionary {
    pub source_lang: String,
    pub target_lang: String,
    pub entry_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlossaryEntries {
    pub source_lang: String,
    pub target_lang: String,
    pub entries: BTreeMap<String, String>,
}

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// The upstream operations the tools are built on.
pub trait DeeplApi: Send + Sync {
    fn languages(&self, kind: LanguageKind) -> ApiFuture<'_, Vec<LanguageEntry>>;
    fn translate_text(&self, request: TranslateRequest) -> ApiFuture<'_, TextResult>;
    fn rephrase_text(&self, request: RephraseRequest) -> ApiFuture<'_, TextResult>;
    fn translate_document(&self, request: DocumentRequest) -> ApiFuture<'_, DocumentResult>;
    fn list_glossaries(&self) -> ApiFuture<'_, Vec<Glossary>>;
    fn get_glossary(&self, glossary_id: String) -> ApiFuture<'_, Glossary>;
    fn glossary_entries(
        &self,
        glossary_id: String,
        source_lang: String,
        target_lang: String,
    ) -> ApiFuture<'_, GlossaryEntries>;
}

/// DeepL language codes: primary subtag lower case, region upper case.
pub fn standardize_code(code: &str) -> String {
    let mut parts = code.trim().split('-');
    let primary = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.map(str::to_uppercase).collect::<Vec<_>>();
    if rest.is_empty() {
        primary
    } else {
        format!("{}-{}", primary, rest.join("-"))
    }
}
