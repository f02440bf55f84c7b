//! Cache keys derived from logical read requests
//!
//! A cache key is the literal endpoint string the transport fetched. Two
//! logical requests are cache-equivalent iff their keys are byte-equal, so
//! every parameter is appended in a fixed order and without any encoding.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Write};

/// Identifier of an experiment on the platform.
pub type ExperimentId = i64;

/// Base path for experiment reads.
pub const EXPERIMENTS_PATH: &str = "/experiments";

/// Exact endpoint string used to index the result cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an endpoint string as a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The endpoint string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the endpoint string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets the store be queried with a plain `&str` endpoint.
impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// One of the three canonical experiment list views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    /// Experiments the caller administers
    Admin,
    /// Experiments the caller has joined
    Joined,
    /// Experiments the caller created
    Mine,
}

impl ListType {
    /// Every list type, in key-building order
    pub const ALL: [Self; 3] = [Self::Admin, Self::Joined, Self::Mine];

    /// The bare query flag selecting this list
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Joined => "joined",
            Self::Mine => "mine",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "joined" => Ok(Self::Joined),
            "mine" => Ok(Self::Mine),
            other => Err(format!("unknown list type: {other}")),
        }
    }
}

/// Paged read of an experiment list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListRequest {
    /// Which list view
    pub list_type: ListType,
    /// Whether `limit=<pageSize>` is appended
    pub limit_applied: bool,
    /// Continuation cursor from a previous page; `None` for the first page
    pub cursor: Option<String>,
}

/// Read of a single experiment by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DetailRequest {
    /// Experiment to read
    pub id: ExperimentId,
}

/// A semantically distinct read, independent of its string encoding
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalRequest {
    /// `/experiments?<type>[&limit=..][&cursor=..]`
    List(ListRequest),
    /// `/experiments?id=<id>`
    Detail(DetailRequest),
}

impl LogicalRequest {
    /// A list read
    pub fn list(list_type: ListType, limit_applied: bool, cursor: Option<String>) -> Self {
        Self::List(ListRequest {
            list_type,
            limit_applied,
            cursor,
        })
    }

    /// A detail read
    pub fn detail(id: ExperimentId) -> Self {
        Self::Detail(DetailRequest { id })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryParam {
    Flag(String),
    Pair(String, String),
}

/// Ordered query-string emitter
///
/// Parameters are written in insertion order, joined with `&`, and never
/// percent-encoded. Bare flags (`?admin`) and `name=value` pairs can be mixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    path: String,
    params: Vec<QueryParam>,
}

impl QueryBuilder {
    /// Start a query on `path`
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
        }
    }

    /// Append a bare parameter with no value
    #[must_use]
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.params.push(QueryParam::Flag(name.into()));
        self
    }

    /// Append a bare parameter when `condition` holds
    #[must_use]
    pub fn flag_if(self, condition: bool, name: impl Into<String>) -> Self {
        if condition { self.flag(name) } else { self }
    }

    /// Append `name=value`
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params
            .push(QueryParam::Pair(name.into(), value.to_string()));
        self
    }

    /// Append `name=value` when `condition` holds
    #[must_use]
    pub fn param_if(self, condition: bool, name: impl Into<String>, value: impl fmt::Display) -> Self {
        if condition { self.param(name, value) } else { self }
    }

    /// Append `name=value` when a value is present
    #[must_use]
    pub fn param_opt<V: fmt::Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Render `path?p1&p2...`, or the bare path when there are no parameters
    pub fn build(&self) -> String {
        let mut endpoint = String::with_capacity(self.path.len() + 16 * self.params.len());
        endpoint.push_str(&self.path);

        for (index, param) in self.params.iter().enumerate() {
            endpoint.push(if index == 0 { '?' } else { '&' });
            // Writing to a String cannot fail
            let _ = match param {
                QueryParam::Flag(name) => write!(endpoint, "{name}"),
                QueryParam::Pair(name, value) => write!(endpoint, "{name}={value}"),
            };
        }

        endpoint
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Derives cache keys from logical requests
///
/// Pure and deterministic. The list page size is part of the key, so the
/// builder must be configured with the same page size the reads use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeyBuilder {
    list_page_size: u32,
}

impl CacheKeyBuilder {
    /// Builder appending `limit=<list_page_size>` to limited lists
    pub const fn new(list_page_size: u32) -> Self {
        Self { list_page_size }
    }

    /// Page size used for limited lists
    pub const fn list_page_size(&self) -> u32 {
        self.list_page_size
    }

    /// Endpoint for a logical request: list type, then limit, then cursor.
    pub fn endpoint(&self, request: &LogicalRequest) -> QueryBuilder {
        match request {
            LogicalRequest::List(list) => QueryBuilder::new(EXPERIMENTS_PATH)
                .flag(list.list_type.as_str())
                .param_opt("limit", list.limit_applied.then_some(self.list_page_size))
                .param_opt("cursor", list.cursor.as_deref()),
            LogicalRequest::Detail(detail) => {
                QueryBuilder::new(EXPERIMENTS_PATH).param("id", detail.id)
            }
        }
    }

    /// Cache key for a logical request
    pub fn build(&self, request: &LogicalRequest) -> CacheKey {
        CacheKey(self.endpoint(request).build())
    }
}
