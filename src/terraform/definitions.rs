use std::path::Path;

use anyhow::{Context, Result};
use hcl::{Body, Expression};
use log::{debug, warn};
use serde_json::{Map, Value};

/// One `variable "<name>" { ... }` block of a `variables.tf` file.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub description: Option<String>,
    /// Type constraint as written, e.g. `string` or `list(string)`.
    pub var_type: Option<String>,
    pub default: Option<Value>,
    pub sensitive: bool,
}

/// A definition paired with the value it ends up with after tfvars overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub definition: VariableDefinition,
    pub value: Value,
}

impl ResolvedVariable {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn rendered(&self) -> String {
        render_value(&self.value)
    }

    /// Lists and maps have to be sent as HCL rather than plain strings.
    pub fn is_hcl(&self) -> bool {
        matches!(self.value, Value::Array(_) | Value::Object(_))
    }
}

fn expression_to_json(expr: &Expression) -> Result<Value> {
    let value = hcl::Value::from(expr.clone());
    serde_json::to_value(value).context("Failed to convert HCL expression")
}

/// Non-literal expressions such as `list(string)` come back as `${...}`
/// interpolations; only the inner text is kept.
fn strip_interpolation(raw: &str) -> &str {
    raw.strip_prefix("${")
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(raw)
}

/// Whether `value` came from an expression that has no literal value,
/// such as a function call or a reference.
fn is_interpolation(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with("${") && s.ends_with('}'))
}

fn parse_variable_block(name: &str, body: &Body) -> Result<VariableDefinition> {
    let mut definition = VariableDefinition {
        name: name.to_string(),
        description: None,
        var_type: None,
        default: None,
        sensitive: false,
    };

    for attribute in body.attributes() {
        let value = expression_to_json(&attribute.expr)
            .with_context(|| format!("Invalid attribute {} on variable {name}", attribute.key))?;
        match attribute.key.as_str() {
            "description" => definition.description = value.as_str().map(str::to_string),
            "type" => definition.var_type = value.as_str().map(|t| strip_interpolation(t).to_string()),
            "default" if is_interpolation(&value) => {
                warn!("Ignoring non-literal default {value} on variable {name}");
            }
            "default" => definition.default = Some(value),
            "sensitive" => definition.sensitive = value.as_bool().unwrap_or(false),
            other => debug!("Ignoring attribute {other} on variable {name}"),
        }
    }

    Ok(definition)
}

/// `src[start..end]` with the 1-based line its first non-blank character is on.
fn chunk_at(src: &str, start: usize, end: usize) -> Option<(usize, &str)> {
    let chunk = &src[start..end];
    if chunk.trim().is_empty() {
        return None;
    }
    let lead = chunk.len() - chunk.trim_start().len();
    let line = src[..start + lead].matches('\n').count() + 1;
    Some((line, chunk))
}

/// Split `src` into top-level chunks, each ending where its outermost brace
/// closes, paired with the 1-based line the chunk starts on.
fn top_level_chunks(src: &str) -> Vec<(usize, &str)> {
    let mut chunks = Vec::new();

    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;
    let mut chars = src.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '#' => in_comment = true,
            '/' if matches!(chars.peek(), Some((_, '/'))) => in_comment = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    chunks.extend(chunk_at(src, start, i + 1));
                    start = i + 1;
                }
            }
            _ => {}
        }
    }
    chunks.extend(chunk_at(src, start, src.len()));
    chunks
}

/// Whether `rest` starts with whitespace followed by `<identifier> =`.
fn starts_attribute(rest: &str) -> bool {
    let rest = rest.trim_start();
    let key_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let starts_with_letter = rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let after = rest[key_len..].trim_start();
    key_len > 0 && starts_with_letter && after.starts_with('=') && !after.starts_with("==")
}

/// Put every attribute of a block written on one line, such as
/// `variable "x" { description = "d" default = "5" }`, on its own line.
fn split_one_line_attributes(chunk: &str) -> String {
    let mut out = String::with_capacity(chunk.len() + 8);
    let mut braces = 0usize;
    let mut nested = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut in_comment = false;
    for (i, c) in chunk.char_indices() {
        if in_comment {
            in_comment = c != '\n';
        } else if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '#' => in_comment = true,
                '/' if chunk[i + 1..].starts_with('/') => in_comment = true,
                '{' => {
                    braces += 1;
                    if braces == 1 {
                        out.push_str("{\n");
                        continue;
                    }
                }
                '}' => {
                    if braces == 1 {
                        out.push('\n');
                    }
                    braces = braces.saturating_sub(1);
                }
                '[' | '(' => nested += 1,
                ']' | ')' => nested = nested.saturating_sub(1),
                c if c.is_whitespace()
                    && braces == 1
                    && nested == 0
                    && starts_attribute(&chunk[i..]) =>
                {
                    out.push('\n');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Parse `src` one top-level block at a time, re-flowing blocks whose
/// attributes share a single line.
fn parse_block_by_block(src: &str) -> Result<Body> {
    let bodies = top_level_chunks(src)
        .into_iter()
        .map(|(line, chunk)| {
            hcl::parse(chunk)
                .or_else(|_| hcl::parse(&split_one_line_attributes(chunk)))
                .with_context(|| format!("Failed to parse variable definitions at line {line}"))
        })
        .collect::<Result<Vec<Body>>>()?;
    Ok(bodies.into_iter().flatten().collect())
}

/// Parse every `variable` block of a `variables.tf` document, in declaration order.
pub fn parse_variables(src: &str) -> Result<Vec<VariableDefinition>> {
    let body = match hcl::parse(src) {
        Ok(body) => body,
        Err(err) => {
            debug!("Parsing variable definitions block by block: {err}");
            parse_block_by_block(src)?
        }
    };

    body.blocks()
        .filter(|block| block.identifier.as_str() == "variable")
        .map(|block| {
            let name = block
                .labels
                .first()
                .map(|label| label.as_str().to_string())
                .context("variable block without a name")?;
            parse_variable_block(&name, &block.body)
        })
        .collect()
}

/// Parse the top-level `name = value` assignments of a `.tfvars` document.
pub fn parse_tfvars(src: &str) -> Result<Map<String, Value>> {
    let body = hcl::parse(src).context("Failed to parse tfvars")?;

    let mut overrides = Map::new();
    for attribute in body.attributes() {
        let value = expression_to_json(&attribute.expr)?;
        if is_interpolation(&value) {
            warn!("Ignoring non-literal value {value} for {}", attribute.key);
            continue;
        }
        overrides.insert(attribute.key.to_string(), value);
    }
    Ok(overrides)
}

/// Read `variables_path` and, when given, the tfvars file at `tfvars_path`.
pub fn load_definitions(
    variables_path: &Path,
    tfvars_path: Option<&Path>,
) -> Result<(Vec<VariableDefinition>, Map<String, Value>)> {
    let src = std::fs::read_to_string(variables_path)
        .with_context(|| format!("Error reading {}", variables_path.display()))?;
    let definitions = parse_variables(&src)
        .with_context(|| format!("Error parsing {}", variables_path.display()))?;

    let overrides = match tfvars_path {
        Some(path) => {
            let src = std::fs::read_to_string(path)
                .with_context(|| format!("Error reading {}", path.display()))?;
            parse_tfvars(&src).with_context(|| format!("Error parsing {}", path.display()))?
        }
        None => Map::new(),
    };

    debug!(
        "Loaded {} definitions and {} overrides",
        definitions.len(),
        overrides.len()
    );
    Ok((definitions, overrides))
}

/// Resolve each definition to its final value. A tfvars value beats the
/// declared default; with neither, the value is an empty string.
pub fn merge_overrides(
    definitions: Vec<VariableDefinition>,
    overrides: &Map<String, Value>,
) -> Vec<ResolvedVariable> {
    definitions
        .into_iter()
        .map(|definition| {
            let value = overrides
                .get(&definition.name)
                .or(definition.default.as_ref())
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            ResolvedVariable { definition, value }
        })
        .collect()
}

/// Strings are rendered raw, other scalars through Display and
/// lists/maps as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
