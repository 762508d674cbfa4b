//! Response bodies.

use std::borrow::Cow;

/// Content a response can carry.
///
/// Simple bodies are sent as-is with a `content-length`; complex ones
/// (chunked) carry their own framing.
pub trait Body {
    fn content(&self) -> Cow<'_, str>;
    fn has_content(&self) -> bool;
    fn is_complex(&self) -> bool;
}

/// A flat, non-chunked body.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlainBody {
    content: String,
}

impl PlainBody {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

impl Body for PlainBody {
    fn content(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.content)
    }

    fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    fn is_complex(&self) -> bool {
        false
    }
}

impl From<&str> for PlainBody {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PlainBody {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
