use crate::error::AiError;
use serde_json::Value;

/// Locates the JSON payload inside a free-text reply: from the first `{` or
/// `[` to the last closer of the same kind. No attempt is made to repair
/// truncated or partial JSON.
pub fn extract_json(text: &str) -> Result<&str, AiError> {
    let start = text.find(['{', '[']).ok_or(AiError::NoJson)?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer).ok_or(AiError::NoJson)?;
    if end < start {
        return Err(AiError::NoJson);
    }
    Ok(&text[start..=end])
}

pub fn parse_json(text: &str) -> Result<Value, AiError> {
    let raw = extract_json(text)?;
    serde_json::from_str(raw).map_err(|err| AiError::Parse {
        message: err.to_string(),
    })
}
