use super::{ContentEnvelope, FORMALITY_LEVELS, ToolContext, ToolDescriptor, ToolFuture};
use crate::deepl::{TextResult, TranslateRequest};
use crate::error::ToolError;
use crate::languages::LanguageKind;
use crate::schema::{Arguments, FieldKind, FieldSpec, ParameterSchema};

pub(super) fn translate_text_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "translate-text",
        "Translate text into a target language using DeepL",
        ParameterSchema::new(vec![
            FieldSpec::required("text", "Text to translate", FieldKind::String),
            FieldSpec::required(
                "targetLang",
                "Target language code (e.g. 'en-US', 'de', 'fr')",
                FieldKind::Language(LanguageKind::Target),
            ),
            FieldSpec::optional(
                "sourceLang",
                "Source language code; detected automatically when omitted",
                FieldKind::Language(LanguageKind::Source),
            ),
            FieldSpec::optional(
                "formality",
                "Whether the translation should lean formal or informal",
                FieldKind::Enum(FORMALITY_LEVELS),
            ),
            FieldSpec::optional(
                "glossaryId",
                "Glossary to apply; requires sourceLang",
                FieldKind::String,
            ),
        ]),
        translate_text,
    )
    .with_rule(require_source_for_glossary)
}

fn translate_text(ctx: &ToolContext, args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_translate_text(ctx, args))
}

async fn run_translate_text(
    ctx: &ToolContext,
    args: Arguments,
) -> Result<ContentEnvelope, ToolError> {
    check_formality(&args)?;
    let request = TranslateRequest {
        text: args.require_str("text")?.to_string(),
        target_lang: args.require_language_code("targetLang")?,
        source_lang: args.language_code("sourceLang"),
        formality: args.string("formality"),
        glossary_id: args.trimmed("glossaryId"),
    };
    let result = ctx.api().translate_text(request).await?;
    Ok(text_result_envelope(result))
}

pub(super) fn text_result_envelope(result: TextResult) -> ContentEnvelope {
    let mut blocks = vec![result.text];
    if let Some(lang) = result.detected_source_lang {
        blocks.push(format!("Detected source language: {}", lang));
    }
    ContentEnvelope::text(blocks)
}

/// DeepL needs an explicit source language whenever a glossary is used.
pub(super) fn require_source_for_glossary(args: &Arguments) -> Result<(), ToolError> {
    if args.str("glossaryId").is_some() && args.str("sourceLang").is_none() {
        return Err(ToolError::invalid_arguments(
            "field 'sourceLang' is required when 'glossaryId' is set",
        ));
    }
    Ok(())
}

/// `less` and `more` fail upstream for targets without formality support;
/// the `prefer_*` levels fall back silently and are always accepted.
pub(super) fn check_formality(args: &Arguments) -> Result<(), ToolError> {
    let Some(formality) = args.str("formality") else {
        return Ok(());
    };
    if !matches!(formality, "less" | "more") {
        return Ok(());
    }
    let Some(target) = args.language("targetLang") else {
        return Ok(());
    };
    if target.supports_formality == Some(false) {
        return Err(ToolError::invalid_arguments(format!(
            "target language '{}' does not support formality '{}'; use default, prefer_less or prefer_more",
            target.code, formality
        )));
    }
    Ok(())
}
