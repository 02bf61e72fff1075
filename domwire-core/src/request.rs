//! Inbound request representation.
//!
//! HTTP adapters translate their native request into a [`Request`]: the method,
//! the content type and the raw parameters, still encoded as the client sent them.

use std::{collections::BTreeMap, path::PathBuf};

/// Name of the parameter carrying the call descriptor.
pub const CALL_PARAM: &str = "jxncall";
/// Name of the parameter carrying positional arguments.
pub const ARGS_PARAM: &str = "jxnargs";
/// Name of the parameter carrying data bags.
pub const BAGS_PARAM: &str = "jxnbags";
/// Name of the parameter referencing a previous upload.
pub const UPLOAD_PARAM: &str = "jxnupl";

/// The HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// Parameters come from the query string.
    Get,
    /// Parameters come from the body.
    #[default]
    Post,
}

/// A raw request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawParam {
    /// A single string value.
    Scalar(String),
    /// An indexed list of values (`a[]=1&a[]=2`).
    List(Vec<RawParam>),
    /// A keyed map of values (`a[x]=1&a[y]=2`).
    Map(BTreeMap<String, RawParam>),
}

impl RawParam {
    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            RawParam::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for RawParam {
    fn from(value: &str) -> Self {
        RawParam::Scalar(value.to_string())
    }
}

impl From<String> for RawParam {
    fn from(value: String) -> Self {
        RawParam::Scalar(value)
    }
}

impl<T: Into<RawParam>> From<Vec<T>> for RawParam {
    fn from(values: Vec<T>) -> Self {
        RawParam::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<RawParam>> From<BTreeMap<String, T>> for RawParam {
    fn from(values: BTreeMap<String, T>) -> Self {
        RawParam::Map(values.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// An inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    method: HttpMethod,
    content_type: Option<String>,
    params: BTreeMap<String, RawParam>,
}

impl Request {
    /// Create an empty POST request.
    pub fn post() -> Self {
        Self::default()
    }

    /// Create an empty GET request.
    pub fn get() -> Self {
        Self {
            method: HttpMethod::Get,
            ..Self::default()
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<RawParam>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add the call descriptor naming `name` (`fn` or `Class.method`).
    pub fn with_call(self, name: &str) -> Self {
        let call = serde_json::json!({ "name": name }).to_string();
        self.with_param(CALL_PARAM, call)
    }

    /// Add positional arguments, each a raw JSON or type-tagged string.
    pub fn with_args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<RawParam> = args.into_iter().map(|s| RawParam::Scalar(s.into())).collect();
        self.with_param(ARGS_PARAM, RawParam::List(args))
    }

    /// The HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The content type, if known.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns `true` for `multipart/form-data` requests.
    pub fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
    }

    /// Look up a parameter.
    pub fn param(&self, name: &str) -> Option<&RawParam> {
        self.params.get(name)
    }

    /// Look up a scalar parameter.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(RawParam::as_scalar)
    }

    /// All parameters.
    pub fn params(&self) -> &BTreeMap<String, RawParam> {
        &self.params
    }
}

/// A file received with the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The form field the file was sent under.
    pub field: String,
    /// The client-side file name.
    pub name: String,
    /// Where the upload manager stored it.
    pub path: PathBuf,
    /// The declared MIME type.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
}
