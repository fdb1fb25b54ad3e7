use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use super::translate::{check_formality, require_source_for_glossary};
use super::{ContentEnvelope, FORMALITY_LEVELS, ToolContext, ToolDescriptor, ToolFuture};
use crate::deepl::DocumentRequest;
use crate::error::ToolError;
use crate::languages::LanguageKind;
use crate::schema::{Arguments, FieldKind, FieldSpec, ParameterSchema};

pub(super) fn translate_document_tool() -> ToolDescriptor {
    ToolDescriptor::new(
        "translate-document",
        "Translate a document file (docx, pptx, xlsx, pdf, html, txt, ...) using DeepL",
        ParameterSchema::new(vec![
            FieldSpec::required("inputFile", "Path to the document to translate", FieldKind::String),
            FieldSpec::optional(
                "outputFile",
                "Where to write the translation; defaults to the input name with a language suffix",
                FieldKind::String,
            ),
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
        translate_document,
    )
    .with_rule(require_source_for_glossary)
}

/// `report.docx` translated to `fr-FR` becomes `report_fr.docx` next to the
/// input. The suffix keeps the input from ever being overwritten.
pub fn derive_output_path(input: &Path, target_lang: &str) -> PathBuf {
    let suffix = target_lang
        .split('-')
        .next()
        .unwrap_or(target_lang)
        .trim()
        .to_lowercase();
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    input.with_file_name(name)
}

fn translate_document(ctx: &ToolContext, args: Arguments) -> ToolFuture<'_> {
    Box::pin(run_translate_document(ctx, args))
}

async fn run_translate_document(
    ctx: &ToolContext,
    args: Arguments,
) -> Result<ContentEnvelope, ToolError> {
    check_formality(&args)?;
    let input = PathBuf::from(args.require_str("inputFile")?);
    let target_lang = args.require_language_code("targetLang")?;
    let output = match args.str("outputFile") {
        Some(path) => PathBuf::from(path),
        None => derive_output_path(&input, &target_lang),
    };
    if is_same_file(&input, &output) {
        return Err(ToolError::document_io(
            &output,
            "output file would overwrite the input file",
        ));
    }

    let bytes = tokio::fs::read(&input)
        .await
        .map_err(|err| ToolError::document_io(&input, format!("failed to read input file: {}", err)))?;
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let request = DocumentRequest {
        file_name,
        bytes,
        target_lang,
        source_lang: args.language_code("sourceLang"),
        formality: args.string("formality"),
        glossary_id: args.trimmed("glossaryId"),
    };
    let result = ctx.api().translate_document(request).await?;
    write_output(&output, &result.bytes)?;
    info!(
        "translated {} into {}",
        input.display(),
        output.display()
    );

    let mut blocks = vec![format!(
        "Translated document written to {}",
        output.display()
    )];
    if let Some(billed) = result.billed_characters {
        blocks.push(format!("Billed characters: {}", billed));
    }
    Ok(ContentEnvelope::text(blocks))
}

fn is_same_file(input: &Path, output: &Path) -> bool {
    if input == output {
        return true;
    }
    match (std::fs::canonicalize(input), std::fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

/// Writes through a temp file in the destination directory so a failed write
/// never leaves a truncated document behind.
fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = tempfile::Builder::new()
        .prefix(".deepl-mcp-")
        .tempfile_in(&dir)
        .map_err(|err| ToolError::document_io(path, format!("failed to create output file: {}", err)))?;
    file.write_all(bytes)
        .map_err(|err| ToolError::document_io(path, format!("failed to write output file: {}", err)))?;
    file.persist(path)
        .map_err(|err| ToolError::document_io(path, format!("failed to write output file: {}", err.error)))?;
    Ok(())
}
