//! Line-delimited JSON codec spoken with the renderer process.
//!
//! Request: `{"markdown": "..."}`. Response: `{"html": "...", "warnings": [...]}` on success,
//! `{"error": "..."}` on failure. One line each way per document.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

#[derive(Serialize)]
struct WireRequest<'a> {
    markdown: &'a str,
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

/// Decoded response line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderResponse {
    Success { html: String, warnings: Vec<String> },
    Failure { message: String },
}

/// Encode one request line (newline-terminated). The text is passed through untouched,
/// front matter included; the renderer does its own parsing.
pub fn encode_request(markdown: &str) -> Result<String, RenderError> {
    let mut line = serde_json::to_string(&WireRequest { markdown }).map_err(|e| {
        RenderError::Protocol {
            detail: format!("cannot encode request: {e}"),
            line: String::new(),
        }
    })?;
    line.push('\n');
    Ok(line)
}

/// Decode one response line. `error` wins over `html` when both are present.
pub fn decode_response(line: &str) -> Result<RenderResponse, RenderError> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    let wire: WireResponse = serde_json::from_str(trimmed).map_err(|e| RenderError::Protocol {
        detail: e.to_string(),
        line: trimmed.to_string(),
    })?;

    if let Some(message) = wire.error {
        return Ok(RenderResponse::Failure { message });
    }
    match wire.html {
        Some(html) => Ok(RenderResponse::Success {
            html,
            warnings: wire.warnings.unwrap_or_default(),
        }),
        None => Err(RenderError::Protocol {
            detail: "response has neither 'html' nor 'error'".to_string(),
            line: trimmed.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_one_line_even_with_newlines_in_text() {
        let line = encode_request("---\ntitle: x\n---\n# Hi\n").unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
        let v: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(v["markdown"], "---\ntitle: x\n---\n# Hi\n");
    }

    #[test]
    fn error_field_wins_over_html() {
        let r = decode_response(r#"{"html":"<p>x</p>","error":"boom"}"#).unwrap();
        assert_eq!(
            r,
            RenderResponse::Failure {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn non_string_html_is_protocol_error() {
        let err = decode_response(r#"{"html":42}"#).unwrap_err();
        assert!(matches!(err, RenderError::Protocol { .. }));
    }
}
