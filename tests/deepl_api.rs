use std::time::Duration;

use deepl_mcp_rust::deepl::{DocumentRequest, RephraseRequest, TranslateRequest};
use deepl_mcp_rust::languages::LanguageKind;
use deepl_mcp_rust::{ApiError, DeeplApi, DeeplClient, DeeplConfig};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, method, path, query_param},
};

const AUTH: &str = "DeepL-Auth-Key test-key:fx";

fn client(server: &MockServer) -> DeeplClient {
    let config = DeeplConfig::new("test-key:fx")
        .with_server_url(server.uri())
        .with_poll_interval(Duration::from_millis(10));
    DeeplClient::new(config).expect("client")
}

#[tokio::test]
async fn fetches_target_languages_with_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/languages"))
        .and(query_param("type", "target"))
        .and(header("Authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"language": "DE", "name": "German", "supports_formality": true},
            {"language": "EN-GB", "name": "English (British)", "supports_formality": false},
            {"language": "PT-BR", "name": "Portuguese (Brazilian)", "supports_formality": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let languages = client(&server)
        .languages(LanguageKind::Target)
        .await
        .expect("languages");
    let codes = languages
        .iter()
        .map(|entry| entry.code.as_str())
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["de", "en-GB", "pt-BR"]);
    assert_eq!(languages[0].supports_formality, Some(true));
    assert_eq!(languages[1].supports_formality, Some(false));
}

#[tokio::test]
async fn source_languages_carry_no_formality_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/languages"))
        .and(query_param("type", "source"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"language": "EN", "name": "English"},
            {"language": "JA", "name": "Japanese"}
        ])))
        .mount(&server)
        .await;

    let languages = client(&server)
        .languages(LanguageKind::Source)
        .await
        .expect("languages");
    assert_eq!(languages.len(), 2);
    assert_eq!(languages[1].code, "ja");
    assert!(languages.iter().all(|entry| entry.supports_formality.is_none()));
}

#[tokio::test]
async fn translate_sends_only_given_options() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .and(header("Authorization", AUTH))
        .and(body_json(json!({
            "text": ["Hello"],
            "target_lang": "de",
            "formality": "prefer_more"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "translations": [{"detected_source_language": "EN", "text": "Hallo"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .translate_text(TranslateRequest {
            text: "Hello".to_string(),
            target_lang: "de".to_string(),
            source_lang: None,
            formality: Some("prefer_more".to_string()),
            glossary_id: None,
        })
        .await
        .expect("translate");
    assert_eq!(result.text, "Hallo");
    assert_eq!(result.detected_source_lang.as_deref(), Some("en"));
}

#[tokio::test]
async fn rephrase_maps_style_to_writing_style() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/write/rephrase"))
        .and(body_json(json!({
            "text": ["send me report"],
            "writing_style": "business"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "improvements": [{
                "text": "Please send me the report.",
                "detected_source_language": "en",
                "target_language": "en-US"
            }]
        })))
        .mount(&server)
        .await;

    let result = client(&server)
        .rephrase_text(RephraseRequest {
            text: "send me report".to_string(),
            style: Some("business".to_string()),
            tone: None,
        })
        .await
        .expect("rephrase");
    assert_eq!(result.text, "Please send me the report.");
}

#[tokio::test]
async fn upstream_error_message_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/translate"))
        .respond_with(
            ResponseTemplate::new(456).set_body_json(json!({"message": "Quota exceeded"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .translate_text(TranslateRequest {
            text: "Hello".to_string(),
            target_lang: "de".to_string(),
            source_lang: None,
            formality: None,
            glossary_id: None,
        })
        .await
        .unwrap_err();
    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 456);
            assert_eq!(message, "Quota exceeded");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "DeepL API error (456): Quota exceeded");
}

#[tokio::test]
async fn document_is_uploaded_polled_and_downloaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/document"))
        .and(header("Authorization", AUTH))
        .and(body_string_contains("report.txt"))
        .and(body_string_contains("quarterly numbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "04DE5AD98A02647D83285A36021911C6",
            "document_key": "0CB0054F1C132C1625B392EADDA41CB754A742822F6877173029A6C487E7F60A"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/document/04DE5AD98A02647D83285A36021911C6"))
        .and(body_json(json!({
            "document_key": "0CB0054F1C132C1625B392EADDA41CB754A742822F6877173029A6C487E7F60A"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "04DE5AD98A02647D83285A36021911C6",
            "status": "translating",
            "seconds_remaining": 0
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/document/04DE5AD98A02647D83285A36021911C6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "04DE5AD98A02647D83285A36021911C6",
            "status": "done",
            "billed_characters": 17
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/document/04DE5AD98A02647D83285A36021911C6/result"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Quartalszahlen".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server)
        .translate_document(DocumentRequest {
            file_name: "report.txt".to_string(),
            bytes: b"quarterly numbers".to_vec(),
            target_lang: "de".to_string(),
            source_lang: Some("en".to_string()),
            formality: None,
            glossary_id: None,
        })
        .await
        .expect("document");
    assert_eq!(result.bytes, b"Quartalszahlen");
    assert_eq!(result.billed_characters, Some(17));
}

#[tokio::test]
async fn document_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "abc",
            "document_key": "key"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/document/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "abc",
            "status": "error",
            "error_message": "Source and target language are equal."
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .translate_document(DocumentRequest {
            file_name: "notes.txt".to_string(),
            bytes: b"Hallo".to_vec(),
            target_lang: "de".to_string(),
            source_lang: None,
            formality: None,
            glossary_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::DocumentFailed(_)));
    assert!(err.to_string().contains("Source and target language are equal."));
}

#[tokio::test]
async fn reads_glossaries_and_entries() {
    let server = MockServer::start().await;
    let glossary = json!({
        "glossary_id": "def3a26b-3e84-45b3-84ae-0c0aaf3525f7",
        "name": "Product terms",
        "dictionaries": [{"source_lang": "en", "target_lang": "de", "entry_count": 2}],
        "creation_time": "2024-05-01T09:30:00.000Z"
    });
    Mock::given(method("GET"))
        .and(path("/v3/glossaries"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"glossaries": [glossary.clone()]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/glossaries/def3a26b-3e84-45b3-84ae-0c0aaf3525f7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(glossary))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/glossaries/def3a26b-3e84-45b3-84ae-0c0aaf3525f7/entries"))
        .and(query_param("source_lang", "en"))
        .and(query_param("target_lang", "de"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dictionaries": [{
                "source_lang": "en",
                "target_lang": "de",
                "entries": "checkout\tKasse\ninvoice\tRechnung",
                "entries_format": "tsv"
            }]
        })))
        .mount(&server)
        .await;

    let api = client(&server);
    let glossaries = api.list_glossaries().await.expect("glossaries");
    assert_eq!(glossaries.len(), 1);
    assert_eq!(glossaries[0].dictionaries[0].entry_count, 2);

    let one = api
        .get_glossary("def3a26b-3e84-45b3-84ae-0c0aaf3525f7".to_string())
        .await
        .expect("glossary");
    assert_eq!(one.name, "Product terms");

    let entries = api
        .glossary_entries(
            "def3a26b-3e84-45b3-84ae-0c0aaf3525f7".to_string(),
            "en".to_string(),
            "de".to_string(),
        )
        .await
        .expect("entries");
    assert_eq!(entries.entries.get("invoice").map(String::as_str), Some("Rechnung"));
}

#[tokio::test]
async fn glossary_id_cannot_escape_the_glossary_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"character_count": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server);
    let err = api
        .get_glossary("../../v2/usage?".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 404, .. }));
    api.glossary_entries(
        "x/../../v2/usage".to_string(),
        "en".to_string(),
        "de".to_string(),
    )
    .await
    .unwrap_err();
    assert!(api.get_glossary("..".to_string()).await.is_err());

    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert!(
            request.url.path().starts_with("/v3/glossaries/"),
            "escaped to {}",
            request.url.path()
        );
        assert!(
            request
                .url
                .query()
                .is_none_or(|query| query.starts_with("source_lang=en&")),
            "unexpected query {:?}",
            request.url.query()
        );
    }
}
