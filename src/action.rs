//! Actions and request matching.
//!
//! An [`Action`] is a registered route frozen into a matchable form: a verb,
//! a path template compiled into a one-route `matchit` tree, and the dense id
//! that ties it to its handler. Matching a request yields a [`MatchResult`],
//! which is either the extracted [`MappedParameters`] or the shared
//! `Unmatched` value.
//!
//! Template syntax is matchit's: `{name}` binds one segment, `{*name}` binds
//! the rest of the path. Anything else is a literal.

use std::borrow::Cow;
use std::fmt;

use http::Uri;
use matchit::Router as MatchitRouter;

use crate::error::Error;
use crate::method::Method;

/// A resolved, identified route entry.
pub struct Action {
    id: usize,
    method: Method,
    path: String,
    to: String,
    template: MatchitRouter<()>,
}

impl Action {
    /// Compiles `path` and synthesises the `dynamic<id>(<signature>)` target.
    pub fn new(id: usize, method: Method, path: &str, action_signature: &str) -> Result<Self, Error> {
        let mut template = MatchitRouter::new();
        template.insert(path, ()).map_err(|source| Error::InvalidRoute {
            path: path.to_owned(),
            source,
        })?;

        Ok(Self {
            id,
            method,
            path: path.to_owned(),
            to: format!("dynamic{id}({action_signature})"),
            template,
        })
    }

    pub fn id(&self) -> usize { self.id }
    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn to(&self) -> &str { &self.to }

    /// Matches the verb exactly and the URI path against the template.
    ///
    /// Query parameters are only extracted once the path has matched.
    pub fn match_with(&self, method: Method, uri: &Uri) -> MatchResult {
        if method != self.method {
            return MatchResult::Unmatched;
        }
        let Ok(matched) = self.template.at(uri.path()) else {
            return MatchResult::Unmatched;
        };

        let path = matched.params.iter()
            .map(|(name, value)| (name.to_owned(), decode_segment(value)))
            .collect();
        let query = uri.query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        MatchResult::Matched(MappedParameters { action_id: self.id, method, path, query })
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("to", &self.to)
            .finish()
    }
}

/// Percent-decodes a captured segment; malformed escapes are kept verbatim.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .unwrap_or(Cow::Borrowed(raw))
        .into_owned()
}

// ── MappedParameters ──────────────────────────────────────────────────────────

/// Values extracted by a successful match, in the order they appeared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MappedParameters {
    action_id: usize,
    method: Method,
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl MappedParameters {
    /// Builds parameters by hand, for transports that resolve actions
    /// themselves.
    pub fn new(action_id: usize, method: Method, path: Vec<(String, String)>) -> Self {
        Self { action_id, method, path, query: Vec::new() }
    }

    /// An empty set, used for requests that have not been matched yet.
    pub(crate) fn empty(method: Method) -> Self {
        Self::new(usize::MAX, method, Vec::new())
    }

    pub fn action_id(&self) -> usize { self.action_id }
    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &[(String, String)] { &self.path }
    pub fn query(&self) -> &[(String, String)] { &self.query }

    /// Path parameter by name, falling back to the query string.
    pub fn get(&self, name: &str) -> Option<&str> {
        lookup(&self.path, name).or_else(|| lookup(&self.query, name))
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs.iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

impl fmt::Display for MappedParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappedParameters[actionId={}, method={}, path=[", self.action_id, self.method)?;
        write_pairs(f, &self.path)?;
        f.write_str("], query=[")?;
        write_pairs(f, &self.query)?;
        f.write_str("]]")
    }
}

fn write_pairs(f: &mut fmt::Formatter<'_>, pairs: &[(String, String)]) -> fmt::Result {
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{k}={v}")?;
    }
    Ok(())
}

// ── MatchResult ───────────────────────────────────────────────────────────────

/// Outcome of matching a request against an action table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchResult {
    Matched(MappedParameters),
    Unmatched,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn into_parameters(self) -> Option<MappedParameters> {
        match self {
            Self::Matched(p) => Some(p),
            Self::Unmatched => None,
        }
    }
}
