use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::deepl::{
    ApiFuture, DeeplApi, DocumentRequest, DocumentResult, Glossary, GlossaryDictionary,
    GlossaryEntries, RephraseRequest, TextResult, TranslateRequest,
};
use crate::error::ApiError;
use crate::languages::{LanguageEntry, LanguageKind};

pub(crate) const STUB_GLOSSARY_ID: &str = "def3a26b-3e84-45b3-84ae-0c0aaf3525f7";

/// In-memory DeepL stand-in that records every call it receives.
#[derive(Default)]
pub(crate) struct StubApi {
    source_fetches: AtomicUsize,
    target_fetches: AtomicUsize,
    upstream_calls: AtomicUsize,
    fail_languages: AtomicBool,
    fail_with: Mutex<Option<String>>,
    translations: Mutex<Vec<TranslateRequest>>,
    rephrases: Mutex<Vec<RephraseRequest>>,
    documents: Mutex<Vec<DocumentRequest>>,
}

impl StubApi {
    pub(crate) fn language_fetches(&self, kind: LanguageKind) -> usize {
        match kind {
            LanguageKind::Source => self.source_fetches.load(Ordering::SeqCst),
            LanguageKind::Target => self.target_fetches.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn upstream_calls(&self) -> usize {
        self.upstream_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_languages(&self, fail: bool) {
        self.fail_languages.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_with(&self, message: &str) {
        *self.fail_with.lock().expect("stub lock") = Some(message.to_string());
    }

    pub(crate) fn translations(&self) -> Vec<TranslateRequest> {
        self.translations.lock().expect("stub lock").clone()
    }

    pub(crate) fn rephrases(&self) -> Vec<RephraseRequest> {
        self.rephrases.lock().expect("stub lock").clone()
    }

    pub(crate) fn documents(&self) -> Vec<DocumentRequest> {
        self.documents.lock().expect("stub lock").clone()
    }

    fn check_failure(&self) -> Result<(), ApiError> {
        self.upstream_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_with.lock().expect("stub lock").clone() {
            Some(message) => Err(ApiError::Status {
                status: 456,
                message,
            }),
            None => Ok(()),
        }
    }
}

fn entry(code: &str, name: &str, supports_formality: Option<bool>) -> LanguageEntry {
    LanguageEntry {
        code: code.to_string(),
        name: name.to_string(),
        supports_formality,
    }
}

pub(crate) fn source_languages() -> Vec<LanguageEntry> {
    vec![
        entry("de", "German", None),
        entry("en", "English", None),
        entry("fr", "French", None),
        entry("ja", "Japanese", None),
    ]
}

pub(crate) fn target_languages() -> Vec<LanguageEntry> {
    vec![
        entry("de", "German", Some(true)),
        entry("en-GB", "English (British)", Some(false)),
        entry("en-US", "English (American)", Some(false)),
        entry("fr", "French", Some(true)),
        entry("ja", "Japanese", Some(true)),
    ]
}

pub(crate) fn stub_glossary() -> Glossary {
    Glossary {
        glossary_id: STUB_GLOSSARY_ID.to_string(),
        name: "Product terms".to_string(),
        dictionaries: vec![GlossaryDictionary {
            source_lang: "en".to_string(),
            target_lang: "de".to_string(),
            entry_count: 2,
        }],
        creation_time: "2024-05-01T09:30:00.000Z".to_string(),
    }
}

impl DeeplApi for StubApi {
    fn languages(&self, kind: LanguageKind) -> ApiFuture<'_, Vec<LanguageEntry>> {
        Box::pin(async move {
            match kind {
                LanguageKind::Source => self.source_fetches.fetch_add(1, Ordering::SeqCst),
                LanguageKind::Target => self.target_fetches.fetch_add(1, Ordering::SeqCst),
            };
            if self.fail_languages.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 503,
                    message: "Service unavailable".to_string(),
                });
            }
            Ok(match kind {
                LanguageKind::Source => source_languages(),
                LanguageKind::Target => target_languages(),
            })
        })
    }

    fn translate_text(&self, request: TranslateRequest) -> ApiFuture<'_, TextResult> {
        Box::pin(async move {
            self.check_failure()?;
            self.translations.lock().expect("stub lock").push(request);
            Ok(TextResult {
                text: "Hallo".to_string(),
                detected_source_lang: Some("en".to_string()),
            })
        })
    }

    fn rephrase_text(&self, request: RephraseRequest) -> ApiFuture<'_, TextResult> {
        Box::pin(async move {
            self.check_failure()?;
            self.rephrases.lock().expect("stub lock").push(request);
            Ok(TextResult {
                text: "Could you please send me the report?".to_string(),
                detected_source_lang: Some("en".to_string()),
            })
        })
    }

    fn translate_document(&self, request: DocumentRequest) -> ApiFuture<'_, DocumentResult> {
        Box::pin(async move {
            self.check_failure()?;
            let mut bytes = format!("[{}] ", request.target_lang).into_bytes();
            bytes.extend_from_slice(&request.bytes);
            self.documents.lock().expect("stub lock").push(request);
            Ok(DocumentResult {
                bytes,
                billed_characters: Some(1234),
            })
        })
    }

    fn list_glossaries(&self) -> ApiFuture<'_, Vec<Glossary>> {
        Box::pin(async move {
            self.check_failure()?;
            Ok(vec![stub_glossary()])
        })
    }

    fn get_glossary(&self, glossary_id: String) -> ApiFuture<'_, Glossary> {
        Box::pin(async move {
            self.check_failure()?;
            if glossary_id == STUB_GLOSSARY_ID {
                Ok(stub_glossary())
            } else {
                Err(ApiError::Status {
                    status: 404,
                    message: "Glossary not found".to_string(),
                })
            }
        })
    }

    fn glossary_entries(
        &self,
        glossary_id: String,
        source_lang: String,
        target_lang: String,
    ) -> ApiFuture<'_, GlossaryEntries> {
        Box::pin(async move {
            self.check_failure()?;
            if glossary_id != STUB_GLOSSARY_ID {
                return Err(ApiError::Status {
                    status: 404,
                    message: "Glossary not found".to_string(),
                });
            }
            let mut entries = BTreeMap::new();
            entries.insert("checkout".to_string(), "Kasse".to_string());
            entries.insert("invoice".to_string(), "Rechnung".to_string());
            Ok(GlossaryEntries {
                source_lang,
                target_lang,
                entries,
            })
        })
    }
}

pub(crate) fn with_temp_home<F, R>(func: F) -> R
where
    F: FnOnce(&std::path::Path) -> R,
{
    static HOME_MUTEX: Mutex<()> = Mutex::new(());
    let _guard = HOME_MUTEX.lock().expect("home lock");
    let dir = tempfile::tempdir().expect("tempdir");
    let old_home = std::env::var("HOME").ok();
    // SAFETY: HOME is only touched by tests holding HOME_MUTEX.
    unsafe { std::env::set_var("HOME", dir.path()) };
    let result = func(dir.path());
    match old_home {
        // SAFETY: as above.
        Some(old) => unsafe { std::env::set_var("HOME", old) },
        None => unsafe { std::env::remove_var("HOME") },
    }
    result
}
