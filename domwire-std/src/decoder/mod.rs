//! # Argument Decoding
//!
//! Turns the raw request parameters into JSON values.
//!
//! Every raw scalar is decoded the same way:
//!
//! 1. In `multipart/form-data` requests, the value is URL-decoded first.
//! 2. An empty value is the empty string.
//! 3. A value that parses as a JSON array, object or string literal is that
//!    JSON value.
//! 4. Otherwise the first character is a type tag: `S` (string), `B`
//!    (boolean, `true`/`false` in any case or a non-zero number), `N`
//!    (number, an integer when it has no fractional part). Anything else
//!    decodes to `null`.
//!
//! Lists and maps decode recursively. When UTF-8 decoding is enabled, every
//! string leaf and every map key is then re-encoded with the first supporting
//! [`Transcoder`].

mod transcode;

pub use transcode::{EncodingRsTranscoder, Latin1Transcoder, Transcoder};

use crate::config::{Config, DEFAULT_ENCODING};
use domwire_core::{
    ClassName, ConfigError, DataBags, Error, RawParam, Request, RequestError, Target,
    is_identifier,
    request::{ARGS_PARAM, BAGS_PARAM, CALL_PARAM},
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::{borrow::Cow, sync::Arc};

/// URL-decode a form value (`+` is a space).
pub fn url_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Decode one raw scalar, without re-encoding.
///
/// A raw JSON array, object, string or boolean is taken as is. Anything else
/// goes by its type prefix.
pub fn decode_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(value @ (Value::Array(_) | Value::Object(_) | Value::String(_) | Value::Bool(_))) =
        serde_json::from_str::<Value>(raw)
    {
        return value;
    }
    let mut chars = raw.chars();
    let tag = chars.next();
    let rest = chars.as_str();
    match tag {
        Some('S') => Value::String(rest.to_string()),
        Some('B') => Value::Bool(decode_bool(rest)),
        Some('N') => decode_number(rest),
        _ => Value::Null,
    }
}

fn decode_bool(raw: &str) -> bool {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("true") {
        return true;
    }
    if raw.eq_ignore_ascii_case("false") {
        return false;
    }
    raw.parse::<f64>().is_ok_and(|n| n != 0.0)
}

fn decode_number(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n == n.floor() && n >= i64::MIN as f64 && n <= i64::MAX as f64 => {
            Value::from(n as i64)
        }
        Ok(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    }
}

/// The `jxncall` descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallDescriptor {
    /// `function` or `Class.method`.
    pub name: String,
    /// Inline arguments, already JSON.
    #[serde(default)]
    pub args: Option<Vec<Value>>,
}

/// A decoded inbound call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingCall {
    name: String,
    args: Vec<Value>,
    bags: DataBags,
}

impl IncomingCall {
    /// Build a call from already decoded parts.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
            bags: DataBags::default(),
        }
    }

    /// Attach data bags.
    pub fn with_bags(mut self, bags: DataBags) -> Self {
        self.bags = bags;
        self
    }

    /// The called name as sent.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The decoded positional arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// The decoded data bags.
    pub fn bags(&self) -> &DataBags {
        &self.bags
    }

    /// Returns `true` if the name addresses a class method.
    pub fn is_method_call(&self) -> bool {
        self.name.contains('.')
    }

    /// Split `Class.method` at the last `.`.
    pub fn split(&self) -> Option<(&str, &str)> {
        self.name.rsplit_once('.')
    }

    /// The target this call names.
    pub fn to_target(&self) -> Result<Target, RequestError> {
        match self.split() {
            Some((class, method)) => {
                let class = ClassName::from_client(class)?;
                let method = method.trim();
                if !is_identifier(method) {
                    return Err(RequestError::InvalidMethodName(method.to_string()));
                }
                Ok(Target::Method {
                    class,
                    method: method.to_string(),
                    args: self.args.clone(),
                })
            }
            None => {
                let name = self.name.trim();
                if !is_identifier(name) {
                    return Err(RequestError::MalformedCall(format!(
                        "`{name}` is not a valid function name"
                    )));
                }
                Ok(Target::Function {
                    name: name.to_string(),
                    args: self.args.clone(),
                })
            }
        }
    }
}

/// Decodes request parameters into JSON values.
#[derive(Clone)]
pub struct ArgumentDecoder {
    decode_utf8: bool,
    encoding: String,
    transcoders: Vec<Arc<dyn Transcoder>>,
}

impl Default for ArgumentDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArgumentDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentDecoder")
            .field("decode_utf8", &self.decode_utf8)
            .field("encoding", &self.encoding)
            .field(
                "transcoders",
                &self.transcoders.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ArgumentDecoder {
    /// A decoder with re-encoding disabled and the built-in transcoders.
    pub fn new() -> Self {
        Self {
            decode_utf8: false,
            encoding: DEFAULT_ENCODING.to_string(),
            transcoders: vec![Arc::new(EncodingRsTranscoder), Arc::new(Latin1Transcoder)],
        }
    }

    /// A decoder following `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut decoder = Self::new();
        decoder.decode_utf8 = config.decode_utf8;
        decoder.encoding = config.encoding.clone();
        decoder
    }

    /// Put a user transcoder in front of the built-in ones.
    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoders.insert(0, transcoder);
        self
    }

    /// Enable or disable re-encoding.
    pub fn set_decode_utf8(&mut self, enabled: bool) {
        self.decode_utf8 = enabled;
    }

    /// Returns `true` if re-encoding is enabled.
    pub fn decodes_utf8(&self) -> bool {
        self.decode_utf8
    }

    /// The first transcoder supporting the configured encoding.
    pub fn transcoder(&self) -> Result<&dyn Transcoder, ConfigError> {
        self.transcoders
            .iter()
            .find(|t| t.supports(&self.encoding))
            .map(|t| t.as_ref())
            .ok_or_else(|| ConfigError::UnsupportedEncoding(self.encoding.clone()))
    }

    /// Decode one raw parameter, recursively, without re-encoding.
    pub fn decode_param(&self, param: &RawParam, multipart: bool) -> Value {
        match param {
            RawParam::Scalar(raw) if multipart => decode_scalar(&url_decode(raw)),
            RawParam::Scalar(raw) => decode_scalar(raw),
            RawParam::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.decode_param(item, multipart))
                    .collect(),
            ),
            RawParam::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.decode_param(item, multipart)))
                    .collect(),
            ),
        }
    }

    /// Re-encode string leaves and keys when re-encoding is enabled.
    pub fn reencode(&self, value: Value) -> Result<Value, ConfigError> {
        if !self.decode_utf8 {
            return Ok(value);
        }
        let transcoder = self.transcoder()?;
        Ok(reencode_with(transcoder, &self.encoding, value))
    }

    /// Decode every parameter of `request`.
    pub fn decode_params(&self, request: &Request) -> Result<Map<String, Value>, ConfigError> {
        let multipart = request.is_multipart();
        let decoded = request
            .params()
            .iter()
            .map(|(key, param)| (key.clone(), self.decode_param(param, multipart)))
            .collect();
        match self.reencode(Value::Object(decoded))? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Decode the call descriptor, the positional arguments and the data bags.
    pub fn decode(&self, request: &Request) -> Result<IncomingCall, Error> {
        let multipart = request.is_multipart();
        let raw = match request.param(CALL_PARAM) {
            None => return Err(RequestError::MissingCall.into()),
            Some(RawParam::Scalar(raw)) => raw,
            Some(_) => {
                return Err(RequestError::MalformedCall("expected a JSON object".into()).into());
            }
        };
        let raw: Cow<'_, str> = if multipart {
            Cow::Owned(url_decode(raw))
        } else {
            Cow::Borrowed(raw)
        };
        let call: CallDescriptor = serde_json::from_str(&raw)
            .map_err(|e| RequestError::MalformedCall(e.to_string()))?;

        let args = match call.args {
            Some(args) => args,
            None => self.positional_args(request, multipart)?,
        };
        let args = match self.reencode(Value::Array(args))? {
            Value::Array(args) => args,
            _ => Vec::new(),
        };

        let bags = match request.param(BAGS_PARAM) {
            Some(param) => DataBags::from_value(self.reencode(self.decode_param(param, multipart))?),
            None => DataBags::default(),
        };

        Ok(IncomingCall::new(call.name, args).with_bags(bags))
    }

    fn positional_args(&self, request: &Request, multipart: bool) -> Result<Vec<Value>, RequestError> {
        match request.param(ARGS_PARAM) {
            None => Ok(Vec::new()),
            Some(RawParam::List(items)) => Ok(items
                .iter()
                .map(|item| self.decode_param(item, multipart))
                .collect()),
            Some(RawParam::Map(map)) => {
                let mut indexed = map
                    .iter()
                    .map(|(key, item)| {
                        key.parse::<usize>().map(|i| (i, item)).map_err(|_| {
                            RequestError::MalformedParameter {
                                name: ARGS_PARAM.to_string(),
                                reason: format!("`{key}` is not an argument index"),
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                indexed.sort_by_key(|(index, _)| *index);
                Ok(indexed
                    .into_iter()
                    .map(|(_, item)| self.decode_param(item, multipart))
                    .collect())
            }
            Some(scalar @ RawParam::Scalar(_)) => match self.decode_param(scalar, multipart) {
                Value::Array(items) => Ok(items),
                other => Ok(vec![other]),
            },
        }
    }
}

fn reencode_with(transcoder: &dyn Transcoder, encoding: &str, value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(transcoder.transcode(&s, encoding)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| reencode_with(transcoder, encoding, item))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| {
                    (
                        transcoder.transcode(&key, encoding),
                        reencode_with(transcoder, encoding, item),
                    )
                })
                .collect(),
        ),
        other => other,
    }
}
