//! Incoming HTTP request type.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Uri};
use serde::de::DeserializeOwned;

use crate::action::MappedParameters;
use crate::error::Error;
use crate::mapper::Mapper;
use crate::method::Method;

/// An incoming request, already parsed by the transport.
///
/// Parameters are empty until a resource dispatches the request; handlers
/// see the values their action extracted.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    params: MappedParameters,
}

impl Request {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: MappedParameters::empty(method),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds one header. Invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn set_params(&mut self, params: MappedParameters) {
        self.params = params;
    }

    pub fn method(&self) -> Method { self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn params(&self) -> &MappedParameters { &self.params }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.path().iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a decoded query-string parameter.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.params.query().iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Deserialises the body with `mapper`. A body that is not UTF-8 fails
    /// with [`Error::InvalidBody`] before the mapper sees it.
    pub fn mapped_body<T: DeserializeOwned, M: Mapper>(&self, mapper: &M) -> Result<T, Error> {
        mapper.from_data(std::str::from_utf8(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::JsonMapper;

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::Get, Uri::from_static("/"))
            .with_header("Content-Type", "application/json");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn unmatched_requests_have_no_params() {
        let req = Request::new(Method::Get, Uri::from_static("/users/1?x=2"));
        assert_eq!(req.param("id"), None);
        assert_eq!(req.query("x"), None);
        assert_eq!(req.path(), "/users/1");
    }

    #[test]
    fn mapped_body_rejects_invalid_utf8() {
        let req = Request::new(Method::Post, Uri::from_static("/"))
            .with_body(&b"\"caf\xe9\""[..]);

        let err = req.mapped_body::<String, _>(&JsonMapper).unwrap_err();
        assert!(matches!(err, Error::InvalidBody(_)));
    }

    #[test]
    fn mapped_body_reads_utf8() {
        let req = Request::new(Method::Post, Uri::from_static("/"))
            .with_body("\"café\"");
        assert_eq!(req.mapped_body::<String, _>(&JsonMapper).unwrap(), "café");
    }
}
