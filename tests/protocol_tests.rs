use markpool::RenderError;
use markpool::engine::{RenderResponse, decode_response, encode_request};

#[test]
fn test_request_carries_raw_text() {
    let text = "---\ntitle: \"Quoted\"\n---\n{% callout %}Hi{% /callout %}\n";
    let line = encode_request(text).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(v["markdown"], text);
    assert_eq!(v.as_object().unwrap().len(), 1);
}

#[test]
fn test_round_trip_html_and_warnings() {
    let html = "<h1 id=\"a\">A</h1>\n<p>\"quoted\" &amp; more</p>";
    let warnings = vec!["unknown tag: foo".to_string(), "second".to_string()];
    let line = serde_json::json!({ "html": html, "warnings": warnings }).to_string() + "\n";
    assert_eq!(
        decode_response(&line).unwrap(),
        RenderResponse::Success {
            html: html.to_string(),
            warnings
        }
    );
}

#[test]
fn test_round_trip_empty_html_and_empty_warnings() {
    assert_eq!(
        decode_response("{\"html\":\"\",\"warnings\":[]}\n").unwrap(),
        RenderResponse::Success {
            html: String::new(),
            warnings: Vec::new()
        }
    );
}

#[test]
fn test_warnings_optional() {
    assert_eq!(
        decode_response(r#"{"html":"<p>x</p>"}"#).unwrap(),
        RenderResponse::Success {
            html: "<p>x</p>".to_string(),
            warnings: Vec::new()
        }
    );
}

#[test]
fn test_error_field_is_failure() {
    assert_eq!(
        decode_response(r#"{"error":"Unexpected token at line 3"}"#).unwrap(),
        RenderResponse::Failure {
            message: "Unexpected token at line 3".to_string()
        }
    );
}

#[test]
fn test_malformed_json_is_protocol_error() {
    let err = decode_response("<html>oops</html>").unwrap_err();
    assert!(matches!(err, RenderError::Protocol { .. }));
    assert!(err.worker_reusable());
}

#[test]
fn test_missing_html_and_error_is_protocol_error() {
    let err = decode_response(r#"{"warnings":["w"]}"#).unwrap_err();
    assert!(matches!(err, RenderError::Protocol { .. }));
}
