use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

use crate::deepl::DeeplApi;
use crate::error::ToolError;
use crate::languages::{CatalogCache, LanguageEntry, LanguageKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer { min: i64, max: i64 },
    Enum(&'static [&'static str]),
    Language(LanguageKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            description,
            kind,
            required: false,
        }
    }
}

/// Declared parameters of a tool. Parsing runs every local check; language
/// fields are resolved against the catalogs in a second, separate step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSchema {
    fields: Vec<FieldSpec>,
}

impl ParameterSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field_json_schema(field));
            if field.required {
                required.push(Value::String(field.name.to_string()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }

    pub fn parse(&self, raw: &Value) -> Result<Arguments, ToolError> {
        let empty = Map::new();
        let object = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                return Err(ToolError::invalid_arguments(
                    "arguments must be a JSON object",
                ));
            }
        };

        let mut args = Arguments::default();
        for field in &self.fields {
            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(ToolError::invalid_arguments(format!(
                            "field '{}' is required",
                            field.name
                        )));
                    }
                }
                Some(value) => {
                    let parsed = parse_field(field, value)?;
                    args.values.insert(field.name, parsed);
                }
            }
        }
        Ok(args)
    }

    pub async fn validate_languages(
        &self,
        args: &mut Arguments,
        catalogs: &CatalogCache,
        api: &dyn DeeplApi,
    ) -> Result<(), ToolError> {
        for field in &self.fields {
            let FieldKind::Language(kind) = field.kind else {
                continue;
            };
            let Some(code) = args.str(field.name) else {
                continue;
            };
            let entry = catalogs.validate(api, kind, code).await?;
            args.languages.insert(field.name, entry);
        }
        Ok(())
    }
}

fn field_json_schema(field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::String | FieldKind::Language(_) => json!({
            "type": "string",
            "description": field.description
        }),
        FieldKind::Integer { min, max } => json!({
            "type": "integer",
            "description": field.description,
            "minimum": min,
            "maximum": max
        }),
        FieldKind::Enum(values) => json!({
            "type": "string",
            "description": field.description,
            "enum": values
        }),
    }
}

fn parse_field(field: &FieldSpec, value: &Value) -> Result<ArgValue, ToolError> {
    match field.kind {
        FieldKind::String => {
            let text = expect_string(field, value)?;
            Ok(ArgValue::Text(text.to_string()))
        }
        FieldKind::Language(_) => {
            let code = expect_string(field, value)?;
            Ok(ArgValue::Text(code.trim().to_string()))
        }
        FieldKind::Integer { min, max } => {
            let number = match value {
                Value::Number(number) => number.as_i64(),
                Value::String(text) => text.trim().parse::<i64>().ok(),
                _ => None,
            }
            .ok_or_else(|| {
                ToolError::invalid_arguments(format!("field '{}' must be an integer", field.name))
            })?;
            if number < min || number > max {
                return Err(ToolError::invalid_arguments(format!(
                    "field '{}' must be between {} and {} (got {})",
                    field.name, min, max, number
                )));
            }
            Ok(ArgValue::Integer(number))
        }
        FieldKind::Enum(values) => {
            let text = expect_string(field, value)?;
            let normalized = text.trim().to_lowercase();
            values
                .iter()
                .find(|candidate| **candidate == normalized)
                .map(|candidate| ArgValue::Text(candidate.to_string()))
                .ok_or_else(|| {
                    ToolError::invalid_arguments(format!(
                        "field '{}' must be one of: {} (got '{}')",
                        field.name,
                        values.join(", "),
                        text
                    ))
                })
        }
    }
}

fn expect_string<'a>(field: &FieldSpec, value: &'a Value) -> Result<&'a str, ToolError> {
    let text = value.as_str().ok_or_else(|| {
        ToolError::invalid_arguments(format!("field '{}' must be a string", field.name))
    })?;
    if text.trim().is_empty() {
        return Err(ToolError::invalid_arguments(format!(
            "field '{}' must not be empty",
            field.name
        )));
    }
    Ok(text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
}

/// Arguments that passed their schema, plus the catalog entries resolved for
/// language fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: BTreeMap<&'static str, ArgValue>,
    languages: BTreeMap<&'static str, LanguageEntry>,
}

impl Arguments {
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.str(name).map(str::to_string)
    }

    /// Identifier-like values (glossary IDs) are forwarded without
    /// surrounding whitespace.
    pub fn trimmed(&self, name: &str) -> Option<String> {
        self.str(name).map(|value| value.trim().to_string())
    }

    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        self.str(name)
            .ok_or_else(|| ToolError::invalid_arguments(format!("field '{}' is required", name)))
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn language(&self, name: &str) -> Option<&LanguageEntry> {
        self.languages.get(name)
    }

    /// The catalog spelling of a language field, falling back to the raw value
    /// when it has not been resolved.
    pub fn language_code(&self, name: &str) -> Option<String> {
        self.language(name)
            .map(|entry| entry.code.clone())
            .or_else(|| self.string(name))
    }

    pub fn require_language_code(&self, name: &str) -> Result<String, ToolError> {
        self.language_code(name)
            .ok_or_else(|| ToolError::invalid_arguments(format!("field '{}' is required", name)))
    }
}
