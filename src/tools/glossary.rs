use serde::Serialize;

use super::{ContentEnvelope, ToolContext, ToolDescriptor, ToolFuture};
use crate::error::ToolError;
use crate::languages::LanguageKind;
use crate::schema::{Arguments, FieldKind, FieldSpec, ParameterSchema};

const GLOSSARY_ID: FieldSpec = FieldSpec::required(
    "glossaryId",
    "ID of the glossary (see list-glossaries)",
    FieldKind::String,
);

pub(super) fn list_glossaries_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "list-glossaries",
        "List all glossaries stored in the DeepL account",
        ParameterSchema::empty(),
        list_glossaries,
    )
}

pub(super) fn get_glossary_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-glossary",
        "Get a glossary's name, language pairs and entry counts",
        ParameterSchema::new(vec![GLOSSARY_ID]),
        get_glossary,
    )
}

// Glossary dictionaries are keyed by bare language codes ("en", "de"), which
// only the source catalog lists for every language.
pub(super) fn glossary_entries_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-glossary-entries",
        "Get the entries of one language pair of a glossary",
        ParameterSchema::new(vec![
            GLOSSARY_ID,
            FieldSpec::required(
                "sourceLang",
                "Source language of the dictionary (e.g. 'en')",
                FieldKind::Language(LanguageKind::Source),
            ),
            FieldSpec::required(
                "targetLang",
                "Target language of the dictionary (e.g. 'de')",
                FieldKind::Language(LanguageKind::Source),
            ),
        ]),
        get_glossary_entries,
    )
}

fn list_glossaries(ctx: &ToolContext, _args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_list_glossaries(ctx))
}

fn get_glossary(ctx: &ToolContext, args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_get_glossary(ctx, args))
}

fn get_glossary_entries(ctx: &ToolContext, args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_get_glossary_entries(ctx, args))
}

async fn run_list_glossaries(ctx: &ToolContext) -> Result<ContentEnvelope, ToolError> {
    let glossaries = ctx.api().list_glossaries().await?;
    if glossaries.is_empty() {
        return Ok(ContentEnvelope::text(["No glossaries found"]));
    }
    let blocks = glossaries
        .iter()
        .map(to_json)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ContentEnvelope::text(blocks))
}

async fn run_get_glossary(
    ctx: &ToolContext,
    args: Arguments,
) -> Result<ContentEnvelope, ToolError> {
    let glossary_id = args.require_str("glossaryId")?.trim().to_string();
    let glossary = ctx.api().get_glossary(glossary_id).await?;
    Ok(ContentEnvelope::text([to_json(&glossary)?]))
}

async fn run_get_glossary_entries(
    ctx: &ToolContext,
    args: Arguments,
) -> Result<ContentEnvelope, ToolError> {
    let glossary_id = args.require_str("glossaryId")?.trim().to_string();
    let source_lang = args.require_language_code("sourceLang")?;
    let target_lang = args.require_language_code("targetLang")?;
    let entries = ctx
        .api()
        .glossary_entries(glossary_id, source_lang, target_lang)
        .await?;
    Ok(ContentEnvelope::text([to_json(&entries)?]))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(|err| ToolError::UpstreamError(err.to_string()))
}
