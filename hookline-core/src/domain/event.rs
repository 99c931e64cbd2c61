//! Request-scoped event types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// An ordered string multimap
///
/// Used for both headers and query parameters. Names keep the casing they
/// arrived with; lookups that need case-insensitivity say so in their name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
}

impl MultiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under `name`, grouping with an exact-name entry if one exists
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Every value of every entry whose name matches ignoring ASCII case
    pub fn get_ignore_case<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }

    /// First value of the first entry whose name matches ignoring ASCII case
    pub fn first_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for MultiMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MultiMap::new();
        for (name, value) in iter {
            map.append(name, value);
        }
        map
    }
}

/// Identifier of one accepted event and of the run it may produce
///
/// Always [`RunId::LEN`] lowercase ASCII alphanumerics, so it is safe to use
/// as a resource name suffix and a label value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub const LEN: usize = 12;

    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(Self::LEN);
        Self(id)
    }

    /// Wraps an existing identifier, rejecting anything not of the generated shape
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let valid = id.len() == Self::LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
        valid.then_some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the pipeline stages need to know about one inbound event
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub run_id: RunId,
    /// Raw body bytes, exactly as signed by the sender
    pub payload: Vec<u8>,
    /// Value of the event-type header
    pub event: String,
    pub query: MultiMap,
    pub headers: MultiMap,
    pub check_source_ip: bool,
}
