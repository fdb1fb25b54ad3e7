use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

use super::{
    ApiFuture, DeeplApi, DeeplConfig, DocumentRequest, DocumentResult, Glossary,
    GlossaryDictionary, GlossaryEntries, RephraseRequest, TextResult, TranslateRequest,
    standardize_code,
};
use crate::error::ApiError;
use crate::languages::{LanguageEntry, LanguageKind};

const USER_AGENT: &str = concat!("deepl-mcp-rust/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct DeeplClient {
    http: reqwest::Client,
    base_url: String,
    auth: HeaderValue,
    poll_interval: Duration,
}

impl DeeplClient {
    pub fn new(config: DeeplConfig) -> Result<Self, ApiError> {
        let key = config.auth_key.trim();
        if key.is_empty() {
            return Err(ApiError::Decode("DeepL auth key is empty".to_string()));
        }
        let mut auth = HeaderValue::from_str(&format!("DeepL-Auth-Key {}", key))
            .map_err(|err| ApiError::Decode(format!("invalid auth key: {}", err)))?;
        auth.set_sensitive(true);
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            auth,
            poll_interval: config.poll_interval,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.auth.clone())
    }

    /// Builds a URL from path segments, percent-encoding each one so caller
    /// supplied IDs cannot change the path or add a query.
    fn segment_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(segment.trim(), "" | "." | ".."))
        {
            return Err(ApiError::Decode(format!("invalid path segment '{}'", bad)));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ApiError::Decode(format!("invalid server url: {}", err)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Decode(format!("invalid server url: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(AUTHORIZATION, self.auth.clone())
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn fetch_languages(&self, kind: LanguageKind) -> Result<Vec<LanguageEntry>, ApiError> {
        let builder = self
            .request(Method::GET, "/v2/languages")
            .query(&[("type", kind.as_str())]);
        let languages: Vec<LanguageWire> = self.send_json(builder).await?;
        debug!("fetched {} {} languages", languages.len(), kind);
        Ok(languages
            .into_iter()
            .map(|language| LanguageEntry {
                code: standardize_code(&language.language),
                name: language.name,
                supports_formality: match kind {
                    LanguageKind::Source => None,
                    LanguageKind::Target => language.supports_formality,
                },
            })
            .collect())
    }

    async fn post_translate(&self, request: TranslateRequest) -> Result<TextResult, ApiError> {
        let body = TranslateBody {
            text: vec![request.text],
            target_lang: request.target_lang,
            source_lang: request.source_lang,
            formality: request.formality,
            glossary_id: request.glossary_id,
        };
        let builder = self.request(Method::POST, "/v2/translate").json(&body);
        let response: TranslateResponse = self.send_json(builder).await?;
        let translation = response
            .translations
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode("translations list is empty".to_string()))?;
        Ok(TextResult {
            text: translation.text,
            detected_source_lang: translation
                .detected_source_language
                .map(|code| standardize_code(&code)),
        })
    }

    async fn post_rephrase(&self, request: RephraseRequest) -> Result<TextResult, ApiError> {
        let body = RephraseBody {
            text: vec![request.text],
            writing_style: request.style,
            tone: request.tone,
        };
        let builder = self.request(Method::POST, "/v2/write/rephrase").json(&body);
        let response: RephraseResponse = self.send_json(builder).await?;
        let improvement = response
            .improvements
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode("improvements list is empty".to_string()))?;
        Ok(TextResult {
            text: improvement.text,
            detected_source_lang: improvement
                .detected_source_language
                .map(|code| standardize_code(&code)),
        })
    }

    async fn run_document(&self, request: DocumentRequest) -> Result<DocumentResult, ApiError> {
        let mut form = Form::new()
            .part(
                "file",
                Part::bytes(request.bytes).file_name(request.file_name.clone()),
            )
            .text("target_lang", request.target_lang);
        if let Some(source_lang) = request.source_lang {
            form = form.text("source_lang", source_lang);
        }
        if let Some(formality) = request.formality {
            form = form.text("formality", formality);
        }
        if let Some(glossary_id) = request.glossary_id {
            form = form.text("glossary_id", glossary_id);
        }
        let handle: DocumentHandle = self
            .send_json(self.request(Method::POST, "/v2/document").multipart(form))
            .await?;
        debug!(
            "uploaded document {} as {}",
            request.file_name, handle.document_id
        );

        let key_body = json!({ "document_key": handle.document_key });
        let status_path = format!("/v2/document/{}", handle.document_id);
        let billed_characters = loop {
            let status: DocumentStatus = self
                .send_json(self.request(Method::POST, &status_path).json(&key_body))
                .await?;
            match status.status.as_str() {
                "done" => break status.billed_characters,
                "error" => {
                    return Err(ApiError::DocumentFailed(
                        status
                            .error_message
                            .unwrap_or_else(|| "unknown error".to_string()),
                    ));
                }
                other => {
                    let wait = status
                        .seconds_remaining
                        .map(Duration::from_secs)
                        .unwrap_or(self.poll_interval)
                        .max(self.poll_interval);
                    debug!(
                        "document {} is {}; checking again in {:.1}s",
                        handle.document_id,
                        other,
                        wait.as_secs_f32()
                    );
                    sleep(wait).await;
                }
            }
        };

        let response = self
            .request(Method::POST, &format!("{}/result", status_path))
            .json(&key_body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &text));
        }
        let bytes = response.bytes().await?;
        Ok(DocumentResult {
            bytes: bytes.to_vec(),
            billed_characters,
        })
    }

    async fn fetch_glossaries(&self) -> Result<Vec<Glossary>, ApiError> {
        let list: GlossaryList = self
            .send_json(self.request(Method::GET, "/v3/glossaries"))
            .await?;
        Ok(list.glossaries.into_iter().map(Glossary::from).collect())
    }

    async fn fetch_glossary(&self, glossary_id: String) -> Result<Glossary, ApiError> {
        let url = self.segment_url(&["v3", "glossaries", glossary_id.as_str()])?;
        let glossary: GlossaryWire = self.send_json(self.request_url(Method::GET, url)).await?;
        Ok(glossary.into())
    }

    async fn fetch_entries(
        &self,
        glossary_id: String,
        source_lang: String,
        target_lang: String,
    ) -> Result<GlossaryEntries, ApiError> {
        let url = self.segment_url(&["v3", "glossaries", glossary_id.as_str(), "entries"])?;
        let builder = self.request_url(Method::GET, url).query(&[
            ("source_lang", source_lang.as_str()),
            ("target_lang", target_lang.as_str()),
        ]);
        let response: EntriesResponse = self.send_json(builder).await?;
        let Some(dictionary) = response.dictionaries.into_iter().next() else {
            return Ok(GlossaryEntries {
                source_lang,
                target_lang,
                entries: BTreeMap::new(),
            });
        };
        if dictionary.entries_format != "tsv" {
            return Err(ApiError::Decode(format!(
                "unsupported entries format '{}'",
                dictionary.entries_format
            )));
        }
        Ok(GlossaryEntries {
            source_lang: dictionary.source_lang,
            target_lang: dictionary.target_lang,
            entries: parse_tsv_entries(&dictionary.entries),
        })
    }
}

impl DeeplApi for DeeplClient {
    fn languages(&self, kind: LanguageKind) -> ApiFuture<'_, Vec<LanguageEntry>> {
        Box::pin(self.fetch_languages(kind))
    }

    fn translate_text(&self, request: TranslateRequest) -> ApiFuture<'_, TextResult> {
        Box::pin(self.post_translate(request))
    }

    fn rephrase_text(&self, request: RephraseRequest) -> ApiFuture<'_, TextResult> {
        Box::pin(self.post_rephrase(request))
    }

    fn translate_document(&self, request: DocumentRequest) -> ApiFuture<'_, DocumentResult> {
        Box::pin(self.run_document(request))
    }

    fn list_glossaries(&self) -> ApiFuture<'_, Vec<Glossary>> {
        Box::pin(self.fetch_glossaries())
    }

    fn get_glossary(&self, glossary_id: String) -> ApiFuture<'_, Glossary> {
        Box::pin(self.fetch_glossary(glossary_id))
    }

    fn glossary_entries(
        &self,
        glossary_id: String,
        source_lang: String,
        target_lang: String,
    ) -> ApiFuture<'_, GlossaryEntries> {
        Box::pin(self.fetch_entries(glossary_id, source_lang, target_lang))
    }
}

fn status_error(status: u16, body: &str) -> ApiError {
    let message = extract_deepl_error(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no error message".to_string()
        } else {
            trimmed.to_string()
        }
    });
    ApiError::Status { status, message }
}

fn extract_deepl_error(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.message.filter(|value| !value.trim().is_empty())?;
    match parsed.detail.filter(|value| !value.trim().is_empty()) {
        Some(detail) => Some(format!("{}, {}", message, detail)),
        None => Some(message),
    }
}

fn parse_tsv_entries(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(source, target)| (source.trim().to_string(), target.trim().to_string()))
        .filter(|(source, _)| !source.is_empty())
        .collect()
}

impl From<GlossaryWire> for Glossary {
    fn from(wire: GlossaryWire) -> Self {
        Glossary {
            glossary_id: wire.glossary_id,
            name: wire.name,
            dictionaries: wire
                .dictionaries
                .into_iter()
                .map(|dictionary| GlossaryDictionary {
                    source_lang: dictionary.source_lang,
                    target_lang: dictionary.target_lang,
                    entry_count: dictionary.entry_count,
                })
                .collect(),
            creation_time: wire.creation_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguageWire {
    language: String,
    name: String,
    supports_formality: Option<bool>,
}

#[derive(Debug, Serialize)]
struct TranslateBody {
    text: Vec<String>,
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslationWire>,
}

#[derive(Debug, Deserialize)]
struct TranslationWire {
    text: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Serialize)]
struct RephraseBody {
    text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    writing_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RephraseResponse {
    improvements: Vec<ImprovementWire>,
}

#[derive(Debug, Deserialize)]
struct ImprovementWire {
    text: String,
    detected_source_language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentHandle {
    document_id: String,
    document_key: String,
}

#[derive(Debug, Deserialize)]
struct DocumentStatus {
    status: String,
    seconds_remaining: Option<u64>,
    billed_characters: Option<u64>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlossaryList {
    glossaries: Vec<GlossaryWire>,
}

#[derive(Debug, Deserialize)]
struct GlossaryWire {
    glossary_id: String,
    name: String,
    #[serde(default)]
    dictionaries: Vec<DictionaryWire>,
    #[serde(default)]
    creation_time: String,
}

#[derive(Debug, Deserialize)]
struct DictionaryWire {
    source_lang: String,
    target_lang: String,
    #[serde(default)]
    entry_count: u64,
}

#[derive(Debug, Deserialize)]
struct EntriesResponse {
    #[serde(default)]
    dictionaries: Vec<EntriesWire>,
}

#[derive(Debug, Deserialize)]
struct EntriesWire {
    source_lang: String,
    target_lang: String,
    entries: String,
    #[serde(default = "default_entries_format")]
    entries_format: String,
}

fn default_entries_format() -> String {
    "tsv".to_string()
}
