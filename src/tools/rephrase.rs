use super::translate::text_result_envelope;
use super::{
    ContentEnvelope, ToolContext, ToolDescriptor, ToolFuture, WRITING_STYLES, WRITING_TONES,
};
use crate::deepl::RephraseRequest;
use crate::error::ToolError;
use crate::schema::{Arguments, FieldKind, FieldSpec, ParameterSchema};

pub(super) fn rephrase_text_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "rephrase-text",
        "Rephrase text in its own language, optionally in a given writing style or tone",
        ParameterSchema::new(vec![
            FieldSpec::required("text", "Text to rephrase", FieldKind::String),
            FieldSpec::optional(
                "style",
                "Writing style; cannot be combined with tone",
                FieldKind::Enum(WRITING_STYLES),
            ),
            FieldSpec::optional(
                "tone",
                "Writing tone; cannot be combined with style",
                FieldKind::Enum(WRITING_TONES),
            ),
        ]),
        rephrase_text,
    )
    .with_rule(style_or_tone)
}

pub(super) fn writing_styles_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-writing-styles",
        "Get the writing styles accepted by rephrase-text",
        ParameterSchema::empty(),
        get_writing_styles,
    )
}

pub(super) fn writing_tones_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "get-writing-tones",
        "Get the writing tones accepted by rephrase-text",
        ParameterSchema::empty(),
        get_writing_tones,
    )
}

fn style_or_tone(args: &Arguments) -> Result<(), ToolError> {
    if args.str("style").is_some() && args.str("tone").is_some() {
        return Err(ToolError::invalid_arguments(
            "only one of 'style' and 'tone' may be set",
        ));
    }
    Ok(())
}

fn rephrase_text(ctx: &ToolContext, args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_rephrase_text(ctx, args))
}

async fn run_rephrase_text(
    ctx: &ToolContext,
    args: Arguments,
) -> Result<ContentEnvelope, ToolError> {
    let request = RephraseRequest {
        text: args.require_str("text")?.to_string(),
        style: args.string("style"),
        tone: args.string("tone"),
    };
    let result = ctx.api().rephrase_text(request).await?;
    Ok(text_result_envelope(result))
}

fn get_writing_styles(_ctx: &ToolContext, _args: Arguments) -> ToolFuture<'_> {
    Box::pin(list_values(WRITING_STYLES))
}

fn get_writing_tones(_ctx: &ToolContext, _args: Arguments) -> ToolFuture<'_> {
    Box::pin(list_values(WRITING_TONES))
}

async fn list_values(values: &'static [&'static str]) -> Result<ContentEnvelope, ToolError> {
    Ok(ContentEnvelope::text(values.iter().copied()))
}
