use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Default nesting limit applied by [`Canonicalizer::default`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// Two object members collapse onto the same key after NFC normalization.
    #[error("duplicate key after normalization at {0}")]
    DuplicateKey(String),
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Value nests deeper than the configured limit.
    #[error("nesting exceeds {max} levels at {path}")]
    DepthExceeded {
        /// Location where the limit was hit.
        path: String,
        /// Configured limit.
        max: usize,
    },
    /// The input could not be represented as JSON at all.
    #[error("unsupported value: {0}")]
    Unsupported(String),
}

/// Helper for building JSON paths during validation.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }

    fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "root.{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic bytes.
///
/// Rules:
/// - object keys are NFC-normalized and sorted by their UTF-8 bytes
/// - strings are NFC-normalized; only `"`, `\` and control characters are escaped
/// - numbers have one textual form: no exponent, no trailing zeros, `-0` is `0`
/// - arrays keep their order; no insignificant whitespace
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    max_depth: usize,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer with a custom nesting limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Produces canonical bytes for a JSON value.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
        let mut out = String::new();
        self.write_value(value, &Path::root(), &mut out)?;
        Ok(out.into_bytes())
    }

    /// Serializes any `Serialize` value to JSON, then canonicalizes it.
    pub fn canonicalize_serialize<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, CanonicalizationError> {
        let value = serde_json::to_value(value)
            .map_err(|e| CanonicalizationError::Unsupported(e.to_string()))?;
        self.canonicalize(&value)
    }

    fn write_value(
        &self,
        value: &Value,
        path: &Path,
        out: &mut String,
    ) -> Result<(), CanonicalizationError> {
        if path.depth() > self.max_depth {
            return Err(CanonicalizationError::DepthExceeded {
                path: path.to_string(),
                max: self.max_depth,
            });
        }
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(num) => out.push_str(&render_number(num, path)?),
            Value::String(s) => write_string(&s.nfc().collect::<String>(), out),
            Value::Array(items) => {
                out.push('[');
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    self.write_value(item, &path.push_index(idx), out)?;
                }
                out.push(']');
            }
            Value::Object(map) => {
                // BTreeMap<String, _> orders by UTF-8 bytes.
                let mut sorted: BTreeMap<String, &Value> = BTreeMap::new();
                for (key, child) in map {
                    let normalized: String = key.nfc().collect();
                    if sorted.insert(normalized, child).is_some() {
                        return Err(CanonicalizationError::DuplicateKey(
                            path.push_field(key).to_string(),
                        ));
                    }
                }
                out.push('{');
                for (idx, (key, child)) in sorted.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    write_string(key, out);
                    out.push(':');
                    self.write_value(child, &path.push_field(key), out)?;
                }
                out.push('}');
            }
        }
        Ok(())
    }
}

/// Canonicalizes a value with the default profile.
pub fn canonicalize(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    Canonicalizer::default().canonicalize(value)
}

/// Renders a float in the canonical number form.
///
/// Integral values print without a fractional part, `-0.0` prints as `0`,
/// and no value ever uses exponent notation.
pub fn format_number(value: f64) -> Result<String, CanonicalizationError> {
    if !value.is_finite() {
        return Err(CanonicalizationError::NonFiniteNumber(value.to_string()));
    }
    if value == 0.0 {
        return Ok("0".to_string());
    }
    // f64 Display is shortest round-trip and never switches to exponent form.
    Ok(format!("{}", value))
}

fn render_number(num: &Number, path: &Path) -> Result<String, CanonicalizationError> {
    if let Some(i) = num.as_i64() {
        return Ok(i.to_string());
    }
    if let Some(u) = num.as_u64() {
        return Ok(u.to_string());
    }
    match num.as_f64() {
        Some(f) if f.is_finite() => format_number(f),
        _ => Err(CanonicalizationError::NonFiniteNumber(path.to_string())),
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
