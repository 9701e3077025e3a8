//! JSON visitor event source
//!
//! Settings text is consumed as a stream of visitor events rather than as a
//! parsed document, so any tokenizer can feed the parser. [`visit`] is the
//! built-in event source: it accepts JSON with `//` and `/* */` comments and
//! trailing commas.

use serde_json::Value;
use std::fmt;

/// Callbacks for a stream of JSON events.
///
/// Every method has an empty default so visitors only implement what they
/// need.
pub trait JsonVisitor {
    fn on_object_begin(&mut self) {}

    fn on_object_property(&mut self, _name: &str) {}

    fn on_object_end(&mut self) {}

    fn on_array_begin(&mut self) {}

    fn on_array_end(&mut self) {}

    /// A string, number, boolean or null value.
    fn on_literal_value(&mut self, _value: Value) {}

    fn on_error(&mut self, _error: ParseError) {}
}

/// Kind of syntax error found while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
    InvalidSyntax,
    UnexpectedEnd,
    InvalidData,
}

impl fmt::Display for ParseErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidSyntax => "invalid syntax",
            Self::UnexpectedEnd => "unexpected end of input",
            Self::InvalidData => "invalid data",
        };
        f.write_str(name)
    }
}

/// A syntax error with its byte position in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub code: ParseErrorCode,
    pub offset: usize,
    pub length: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.code, self.offset)
    }
}

/// Tokenize `text` and feed the events to `visitor`.
///
/// Comments and trailing commas are blanked out before parsing, so error
/// offsets still point into the original text. When the text is not valid,
/// a single [`ParseError`] is reported and no other events are emitted.
///
/// # Examples
///
/// ```
/// use strata_model::visitor::{visit, JsonVisitor};
///
/// #[derive(Default)]
/// struct Properties(Vec<String>);
///
/// impl JsonVisitor for Properties {
///     fn on_object_property(&mut self, name: &str) {
///         self.0.push(name.to_string());
///     }
/// }
///
/// let mut properties = Properties::default();
/// visit("{ // editor\n \"a\": 1, \"b\": [2,], }", &mut properties);
/// assert_eq!(properties.0, vec!["a", "b"]);
/// ```
pub fn visit(text: &str, visitor: &mut impl JsonVisitor) {
    let cleaned = blank_comments_and_trailing_commas(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => walk(value, visitor),
        Err(error) => {
            let code = match error.classify() {
                serde_json::error::Category::Eof => ParseErrorCode::UnexpectedEnd,
                serde_json::error::Category::Data => ParseErrorCode::InvalidData,
                _ => ParseErrorCode::InvalidSyntax,
            };
            let offset = byte_offset(text, error.line(), error.column());
            visitor.on_error(ParseError {
                code,
                offset,
                length: usize::from(offset < text.len()),
            });
        }
    }
}

fn walk(value: Value, visitor: &mut impl JsonVisitor) {
    match value {
        Value::Object(map) => {
            visitor.on_object_begin();
            for (name, child) in map {
                visitor.on_object_property(&name);
                walk(child, visitor);
            }
            visitor.on_object_end();
        }
        Value::Array(items) => {
            visitor.on_array_begin();
            for item in items {
                walk(item, visitor);
            }
            visitor.on_array_end();
        }
        literal => visitor.on_literal_value(literal),
    }
}

/// Convert serde_json's 1-based line/column into a byte offset.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, content) in text.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            return (offset + column.saturating_sub(1)).min(text.len());
        }
        offset += content.len();
    }
    text.len()
}

/// Replace comments and trailing commas with spaces.
///
/// Newlines inside block comments are kept so line numbers stay valid.
fn blank_comments_and_trailing_commas(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let len = bytes.len();

    let mut i = 0;
    let mut in_string = false;
    while i < len {
        let byte = bytes[i];
        if in_string {
            match byte {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match (byte, bytes.get(i + 1)) {
            (b'"', _) => in_string = true,
            (b'/', Some(b'/')) => {
                while i < len && bytes[i] != b'\n' {
                    bytes[i] = b' ';
                    i += 1;
                }
                continue;
            }
            (b'/', Some(b'*')) => {
                let mut closed = false;
                while i < len {
                    if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        bytes[i] = b' ';
                        bytes[i + 1] = b' ';
                        i += 2;
                        closed = true;
                        break;
                    }
                    if bytes[i] != b'\n' && bytes[i] != b'\r' {
                        bytes[i] = b' ';
                    }
                    i += 1;
                }
                if !closed {
                    break;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    // Comments are gone now, so a trailing comma is one followed only by
    // whitespace and a closing bracket.
    let mut i = 0;
    let mut in_string = false;
    while i < len {
        let byte = bytes[i];
        if in_string {
            match byte {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else if byte == b'"' {
            in_string = true;
        } else if byte == b',' {
            let next = bytes[i + 1..]
                .iter()
                .find(|b| !b.is_ascii_whitespace());
            if matches!(next, Some(b'}') | Some(b']')) {
                bytes[i] = b' ';
            }
        }
        i += 1;
    }

    // Comments are blanked whole, so no multi-byte sequence is split.
    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        errors: Vec<ParseError>,
    }

    impl JsonVisitor for Recorder {
        fn on_object_begin(&mut self) {
            self.events.push("{".into());
        }
        fn on_object_property(&mut self, name: &str) {
            self.events.push(format!("{}:", name));
        }
        fn on_object_end(&mut self) {
            self.events.push("}".into());
        }
        fn on_array_begin(&mut self) {
            self.events.push("[".into());
        }
        fn on_array_end(&mut self) {
            self.events.push("]".into());
        }
        fn on_literal_value(&mut self, value: Value) {
            self.events.push(value.to_string());
        }
        fn on_error(&mut self, error: ParseError) {
            self.errors.push(error);
        }
    }

    #[test]
    fn test_visit_emits_events_in_order() {
        let mut recorder = Recorder::default();
        visit(r#"{"a": [1, "x"], "b": {"c": null}}"#, &mut recorder);
        assert_eq!(
            recorder.events,
            vec!["{", "a:", "[", "1", "\"x\"", "]", "b:", "{", "c:", "null", "}", "}"]
        );
        assert!(recorder.errors.is_empty());
    }

    #[test]
    fn test_comments_inside_strings_survive() {
        let cleaned = blank_comments_and_trailing_commas(r#"{"url": "http://x/*y*/", } // tail"#);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value, json!({"url": "http://x/*y*/"}));
    }

    #[test]
    fn test_block_comment_keeps_offsets() {
        let text = "{/* a\nb */ \"k\": 1}";
        let cleaned = blank_comments_and_trailing_commas(text);
        assert_eq!(cleaned.len(), text.len());
        assert_eq!(cleaned.find('"'), text.find("\"k"));
    }

    #[test]
    fn test_escaped_quote_in_string() {
        let cleaned = blank_comments_and_trailing_commas(r#"{"a": "x\",", }"#);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value, json!({"a": "x\","}));
    }

    #[test]
    fn test_error_reports_offset() {
        let mut recorder = Recorder::default();
        visit("{\n  \"a\": ?\n}", &mut recorder);
        assert!(recorder.events.is_empty());
        assert_eq!(recorder.errors.len(), 1);
        assert_eq!(recorder.errors[0].code, ParseErrorCode::InvalidSyntax);
        // The error sits on the second line, past the property name
        let offset = recorder.errors[0].offset;
        assert!((7..=11).contains(&offset), "offset {}", offset);
    }

    #[test]
    fn test_truncated_input_is_unexpected_end() {
        let mut recorder = Recorder::default();
        visit("{\"a\": 1", &mut recorder);
        assert_eq!(recorder.errors[0].code, ParseErrorCode::UnexpectedEnd);
    }
}
