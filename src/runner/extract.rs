//! Extraction of the automation result object from unstructured output.
//!
//! The automation executable prints human-readable log lines and, somewhere
//! near the end, one JSON result object. Logging almost always precedes the
//! result, so the scanner looks for the *last* plausible object: candidate
//! positions where a top-level `{` opens, tried from the end of the output
//! backwards, each matched forward with string-aware brace counting. The
//! first span that parses as a JSON object wins. Starting from the last
//! candidate avoids false matches on braces embedded in earlier log lines.

use serde_json::Value;

/// Finds the last parseable top-level JSON object in `text`.
///
/// Returns `None` when no brace span both terminates and parses as an
/// object. Non-object JSON (arrays, bare strings) is deliberately rejected;
/// the result contract is an object with `status`/`message` fields.
pub fn extract_last_json_object(text: &str) -> Option<Value> {
    for start in top_level_open_positions(text).into_iter().rev() {
        if let Some(end) = matching_close(&text.as_bytes()[start..]) {
            let span = &text[start..start + end + 1];
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
                return Some(value);
            }
        }
    }
    None
}

/// Byte offsets where the nesting depth transitions 0 → 1.
///
/// Depth is clamped at zero so stray `}` in log lines cannot push it
/// negative and hide a later result object.
fn top_level_open_positions(text: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth: usize = 0;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    positions.push(i);
                }
                depth += 1;
            }
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    positions
}

/// Forward scan from an opening brace to its matching close, skipping braces
/// inside JSON string literals. Returns the offset of the closing brace, or
/// `None` if the object never terminates.
fn matching_close(bytes: &[u8]) -> Option<usize> {
    debug_assert_eq!(bytes.first(), Some(&b'{'));

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        let value = extract_last_json_object(r#"{"status":"success","message":"ok"}"#)
            .expect("object should parse");
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn object_after_log_lines() {
        let out = "navigating to page\nfilling 4 fields\n{\"status\":\"success\",\"message\":\"submitted\"}\n";
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["message"], "submitted");
    }

    #[test]
    fn braces_in_earlier_log_lines_are_skipped() {
        let out = "progress {50%} done\nselector {div.main} matched\n{\"status\":\"failed\",\"message\":\"captcha\"}";
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["status"], "failed");
    }

    #[test]
    fn garbage_after_result_falls_back_to_earlier_candidate() {
        let out = "{\"status\":\"success\",\"message\":\"ok\"}\ntrailing note {not json}";
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn nested_object_returns_the_outer_one() {
        let out = r#"done {"status":"success","detail":{"fields":3},"message":"ok"}"#;
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["detail"]["fields"], 3);
        assert_eq!(value["message"], "ok");
    }

    #[test]
    fn braces_inside_string_values() {
        let out = r#"{"status":"success","message":"submitted {form#main}"}"#;
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["message"], "submitted {form#main}");
    }

    #[test]
    fn unterminated_object_is_rejected() {
        assert!(extract_last_json_object(r#"{"status":"success""#).is_none());
    }

    #[test]
    fn no_braces_at_all() {
        assert!(extract_last_json_object("all went fine").is_none());
        assert!(extract_last_json_object("").is_none());
    }

    #[test]
    fn stray_closing_braces_do_not_mask_the_result() {
        let out = "}}} weird prefix\n{\"status\":\"success\",\"message\":\"ok\"}";
        let value = extract_last_json_object(out).expect("object should parse");
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(extract_last_json_object("[1, 2, 3]").is_none());
    }
}
