use super::{ContentEnvelope, ToolContext, ToolDescriptor, ToolFuture};
use crate::error::ToolError;
use crate::languages::{LanguageEntry, LanguageKind};
use crate::schema::{Arguments, ParameterSchema};

pub(super) fn source_languages_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-source-languages",
        "Get the list of languages DeepL can translate from",
        ParameterSchema::empty(),
        get_source_languages,
    )
}

pub(super) fn target_languages_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-target-languages",
        "Get the list of languages DeepL can translate into, including formality support",
        ParameterSchema::empty(),
        get_target_languages,
    )
}

fn get_source_languages(ctx: &ToolContext, _args: Arguments) -> ToolFuture<'_> {
    Box::pin(list_languages(ctx, LanguageKind::Source))
}

fn get_target_languages(ctx: &ToolContext, _args: Arguments) -> ToolFuture<'_> {
    Box::pin(list_languages(ctx, LanguageKind::Target))
}

async fn list_languages(
    ctx: &ToolContext,
    kind: LanguageKind,
) -> Result<ContentEnvelope, ToolError> {
    let catalog = ctx.catalogs().get(ctx.api(), kind).await?;
    Ok(ContentEnvelope::text(
        catalog.entries().iter().map(format_language),
    ))
}

fn format_language(entry: &LanguageEntry) -> String {
    if entry.supports_formality == Some(true) {
        format!("{}: {} (supports formality)", entry.code, entry.name)
    } else {
        format!("{}: {}", entry.code, entry.name)
    }
}
