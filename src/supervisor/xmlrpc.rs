// ABOUTME: Minimal XML-RPC codec for the supervisor control protocol.
// ABOUTME: Encodes method calls and decodes method responses and faults with quick-xml.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("unexpected element: expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("invalid {kind} value: {value}")]
    InvalidScalar { kind: &'static str, value: String },

    #[error("expected {expected} value, found {found}")]
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("unexpected end of document")]
    Eof,
}

impl From<quick_xml::Error> for CodecError {
    fn from(e: quick_xml::Error) -> Self {
        CodecError::Xml(e.to_string())
    }
}

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Double(f64),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Double(_) => "double",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::Nil => "nil",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Result<&BTreeMap<String, Value>, CodecError> {
        match self {
            Value::Struct(map) => Ok(map),
            other => Err(CodecError::WrongType {
                expected: "struct",
                found: other.type_name(),
            }),
        }
    }

    pub fn as_array(&self) -> Result<&[Value], CodecError> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(CodecError::WrongType {
                expected: "array",
                found: other.type_name(),
            }),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// Decoded method response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Value),
    Fault { code: i64, message: String },
}

// =============================================================================
// Encoding
// =============================================================================

pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        encode_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn encode_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Int(i) => {
            let _ = write!(out, "<int>{i}</int>");
        }
        Value::Bool(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Str(s) => {
            out.push_str("<string>");
            out.push_str(&escape(s.as_str()));
            out.push_str("</string>");
        }
        Value::Double(d) => {
            let _ = write!(out, "<double>{d}</double>");
        }
        Value::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                encode_value(out, item);
            }
            out.push_str("</data></array>");
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape(name.as_str()));
                out.push_str("</name>");
                encode_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
        Value::Nil => out.push_str("<nil/>"),
    }
    out.push_str("</value>");
}

// =============================================================================
// Decoding
// =============================================================================

pub fn decode_response(body: &str) -> Result<Response, CodecError> {
    let mut parser = Parser::new(body);
    parser.expect_start("methodResponse")?;

    match parser.next()? {
        Token::Start(tag) if tag == "params" => {
            parser.expect_start("param")?;
            parser.expect_start("value")?;
            let value = parser.value()?;
            parser.expect_end("param")?;
            parser.expect_end("params")?;
            parser.expect_end("methodResponse")?;
            Ok(Response::Success(value))
        }
        Token::Start(tag) if tag == "fault" => {
            parser.expect_start("value")?;
            let value = parser.value()?;
            let fields = value.as_struct()?;
            let code = fields
                .get("faultCode")
                .and_then(Value::as_int)
                .ok_or_else(|| CodecError::MissingField("faultCode".to_string()))?;
            let message = fields
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(Response::Fault { code, message })
        }
        other => Err(CodecError::Unexpected {
            expected: "params or fault".to_string(),
            found: other.describe(),
        }),
    }
}

#[derive(Debug)]
enum Token {
    Start(String),
    End(String),
    Empty(String),
    Text(String),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Start(t) => format!("<{t}>"),
            Token::End(t) => format!("</{t}>"),
            Token::Empty(t) => format!("<{t}/>"),
            Token::Text(t) => format!("text {t:?}"),
            Token::Eof => "end of document".to_string(),
        }
    }
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(body: &'a str) -> Self {
        Self {
            reader: Reader::from_str(body),
        }
    }

    /// Next token, skipping prolog noise and whitespace-only text.
    fn next(&mut self) -> Result<Token, CodecError> {
        loop {
            let token = self.raw()?;
            match token {
                Token::Text(ref t) if t.trim().is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    fn raw(&mut self) -> Result<Token, CodecError> {
        loop {
            let event = self.reader.read_event()?;
            return Ok(match event {
                Event::Start(e) => Token::Start(tag_name(e.name().as_ref())),
                Event::End(e) => Token::End(tag_name(e.name().as_ref())),
                Event::Empty(e) => Token::Empty(tag_name(e.name().as_ref())),
                Event::Text(t) => Token::Text(t.unescape()?.into_owned()),
                Event::CData(c) => {
                    Token::Text(String::from_utf8_lossy(&c.into_inner()).into_owned())
                }
                Event::Eof => Token::Eof,
                _ => continue,
            });
        }
    }

    fn expect_start(&mut self, tag: &str) -> Result<(), CodecError> {
        match self.next()? {
            Token::Start(t) if t == tag => Ok(()),
            other => Err(unexpected(&format!("<{tag}>"), other)),
        }
    }

    fn expect_end(&mut self, tag: &str) -> Result<(), CodecError> {
        match self.next()? {
            Token::End(t) if t == tag => Ok(()),
            other => Err(unexpected(&format!("</{tag}>"), other)),
        }
    }

    /// Collect text up to the closing tag; whitespace is preserved.
    fn text_until(&mut self, tag: &str) -> Result<String, CodecError> {
        let mut text = String::new();
        loop {
            match self.raw()? {
                Token::Text(t) => text.push_str(&t),
                Token::End(t) if t == tag => return Ok(text),
                Token::Eof => return Err(CodecError::Eof),
                other => return Err(unexpected(&format!("</{tag}>"), other)),
            }
        }
    }

    /// Parse the body of a `<value>` whose start tag was already consumed.
    fn value(&mut self) -> Result<Value, CodecError> {
        let value = match self.raw()? {
            Token::End(t) if t == "value" => return Ok(Value::Str(String::new())),
            Token::Text(text) => match self.raw()? {
                Token::End(t) if t == "value" => return Ok(Value::Str(text)),
                Token::Start(tag) if text.trim().is_empty() => self.typed(&tag)?,
                Token::Empty(tag) if text.trim().is_empty() => empty_typed(&tag)?,
                other => return Err(unexpected("</value>", other)),
            },
            Token::Start(tag) => self.typed(&tag)?,
            Token::Empty(tag) => empty_typed(&tag)?,
            Token::Eof => return Err(CodecError::Eof),
            other => return Err(unexpected("value content", other)),
        };
        self.expect_end("value")?;
        Ok(value)
    }

    fn typed(&mut self, tag: &str) -> Result<Value, CodecError> {
        match tag {
            "int" | "i4" | "i8" => {
                let raw = self.text_until(tag)?;
                raw.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|_| CodecError::InvalidScalar {
                        kind: "int",
                        value: raw,
                    })
            }
            "boolean" => {
                let raw = self.text_until(tag)?;
                match raw.trim() {
                    "1" => Ok(Value::Bool(true)),
                    "0" => Ok(Value::Bool(false)),
                    _ => Err(CodecError::InvalidScalar {
                        kind: "boolean",
                        value: raw,
                    }),
                }
            }
            "double" => {
                let raw = self.text_until(tag)?;
                raw.trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| CodecError::InvalidScalar {
                        kind: "double",
                        value: raw,
                    })
            }
            "string" => self.text_until(tag).map(Value::Str),
            "nil" => {
                self.expect_end("nil")?;
                Ok(Value::Nil)
            }
            "array" => self.array(),
            "struct" => self.structure(),
            other => Err(CodecError::Unexpected {
                expected: "value type".to_string(),
                found: format!("<{other}>"),
            }),
        }
    }

    fn array(&mut self) -> Result<Value, CodecError> {
        let mut items = Vec::new();
        match self.next()? {
            Token::Empty(t) if t == "data" => {}
            Token::Start(t) if t == "data" => loop {
                match self.next()? {
                    Token::Start(t) if t == "value" => items.push(self.value()?),
                    Token::End(t) if t == "data" => break,
                    other => return Err(unexpected("<value> or </data>", other)),
                }
            },
            other => return Err(unexpected("<data>", other)),
        }
        self.expect_end("array")?;
        Ok(Value::Array(items))
    }

    fn structure(&mut self) -> Result<Value, CodecError> {
        let mut members = BTreeMap::new();
        loop {
            match self.next()? {
                Token::Start(t) if t == "member" => {
                    self.expect_start("name")?;
                    let name = self.text_until("name")?;
                    self.expect_start("value")?;
                    let value = self.value()?;
                    self.expect_end("member")?;
                    members.insert(name, value);
                }
                Token::End(t) if t == "struct" => return Ok(Value::Struct(members)),
                other => return Err(unexpected("<member> or </struct>", other)),
            }
        }
    }
}

fn empty_typed(tag: &str) -> Result<Value, CodecError> {
    match tag {
        "nil" => Ok(Value::Nil),
        "string" => Ok(Value::Str(String::new())),
        "array" => Ok(Value::Array(Vec::new())),
        "struct" => Ok(Value::Struct(BTreeMap::new())),
        other => Err(CodecError::Unexpected {
            expected: "value type".to_string(),
            found: format!("<{other}/>"),
        }),
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn unexpected(expected: &str, found: Token) -> CodecError {
    match found {
        Token::Eof => CodecError::Eof,
        other => CodecError::Unexpected {
            expected: expected.to_string(),
            found: other.describe(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_method_call_with_escaped_params() {
        let xml = encode_call(
            "supervisor.stopProcess",
            &[Value::from("a&b:<c>"), Value::from(true)],
        );
        assert!(xml.contains("<methodName>supervisor.stopProcess</methodName>"));
        assert!(xml.contains("<string>a&amp;b:&lt;c&gt;</string>"));
        assert!(xml.contains("<boolean>1</boolean>"));
    }

    #[test]
    fn decodes_struct_array_response() {
        let body = r#"<?xml version='1.0'?>
<methodResponse>
<params>
<param>
<value><array><data>
<value><struct>
<member><name>name</name><value><string>web</string></value></member>
<member><name>state</name><value><int>20</int></value></member>
<member><name>description</name><value>pid 12, uptime 0:01:00</value></member>
<member><name>spawnerr</name><value><string></string></value></member>
</struct></value>
</data></array></value>
</param>
</params>
</methodResponse>"#;

        let Response::Success(value) = decode_response(body).unwrap() else {
            panic!("expected success");
        };
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        let fields = items[0].as_struct().unwrap();
        assert_eq!(fields["name"], Value::Str("web".to_string()));
        assert_eq!(fields["state"], Value::Int(20));
        assert_eq!(
            fields["description"],
            Value::Str("pid 12, uptime 0:01:00".to_string())
        );
        assert_eq!(fields["spawnerr"], Value::Str(String::new()));
    }

    #[test]
    fn decodes_boolean_response() {
        let body = "<methodResponse><params><param><value><boolean>1</boolean></value></param></params></methodResponse>";
        assert_eq!(
            decode_response(body).unwrap(),
            Response::Success(Value::Bool(true))
        );
    }

    #[test]
    fn decodes_fault() {
        let body = r#"<?xml version='1.0'?>
<methodResponse>
<fault>
<value><struct>
<member><name>faultCode</name><value><int>70</int></value></member>
<member><name>faultString</name><value><string>NOT_RUNNING: web</string></value></member>
</struct></value>
</fault>
</methodResponse>"#;
        assert_eq!(
            decode_response(body).unwrap(),
            Response::Fault {
                code: 70,
                message: "NOT_RUNNING: web".to_string()
            }
        );
    }

    #[test]
    fn rejects_truncated_document() {
        let err = decode_response("<methodResponse><params><param>").unwrap_err();
        assert!(matches!(err, CodecError::Eof));
    }

    #[test]
    fn rejects_bad_int() {
        let body = "<methodResponse><params><param><value><int>x</int></value></param></params></methodResponse>";
        assert!(matches!(
            decode_response(body),
            Err(CodecError::InvalidScalar { kind: "int", .. })
        ));
    }
}
