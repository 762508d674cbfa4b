//! Media types.
//!
//! [`MediaTypeDescriptor`] is a plain value: a type, a subtype and a
//! parameter map. Parameters live in a `BTreeMap`, so two descriptors built
//! in different orders compare and hash equal, and rendering is always in
//! parameter-name order:
//!
//! ```rust
//! use restmux::media::MediaTypeDescriptor;
//!
//! let a = MediaTypeDescriptor::builder()
//!     .with_mime_type("text")
//!     .with_mime_sub_type("plain")
//!     .with_parameter("format", "flowed")
//!     .with_parameter("charset", "utf-8")
//!     .build();
//! let b: MediaTypeDescriptor = "text/plain; charset=utf-8; format=flowed".parse()?;
//!
//! assert_eq!(a, b);
//! assert_eq!(a.to_string(), "text/plain;charset=utf-8;format=flowed");
//! # Ok::<(), restmux::Error>(())
//! ```
//!
//! Specialised descriptors such as [`AcceptMediaType`] reuse the same
//! [`Builder`] by supplying their own factory.

mod accept;
mod content;

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::Error;

pub use accept::{AcceptMediaType, AcceptMediaTypes};
pub use content::ContentMediaType;

const PARAMETER_SEPARATOR: char = ';';
const MIME_SUBTYPE_SEPARATOR: char = '/';
const PARAMETER_ASSIGNMENT: char = '=';
const WILDCARD: &str = "*";

/// Media type parameters, ordered by name.
pub type Parameters = BTreeMap<String, String>;

/// The construction function a [`Builder`] finishes with.
pub type Factory<T> = fn(String, String, Parameters) -> T;

/// A MIME type, subtype and parameter set, e.g. `application/json;charset=utf-8`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MediaTypeDescriptor {
    mime_type: String,
    mime_sub_type: String,
    parameters: Parameters,
}

impl MediaTypeDescriptor {
    pub fn new(mime_type: impl Into<String>, mime_sub_type: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            mime_type: mime_type.into(),
            mime_sub_type: mime_sub_type.into(),
            parameters,
        }
    }

    /// A descriptor with no parameters.
    pub fn of(mime_type: impl Into<String>, mime_sub_type: impl Into<String>) -> Self {
        Self::new(mime_type, mime_sub_type, Parameters::new())
    }

    pub fn builder() -> Builder<Self> {
        Builder::new(Self::from_parts as Factory<Self>)
    }

    fn from_parts(mime_type: String, mime_sub_type: String, parameters: Parameters) -> Self {
        Self { mime_type, mime_sub_type, parameters }
    }

    pub fn mime_type(&self) -> &str { &self.mime_type }
    pub fn mime_sub_type(&self) -> &str { &self.mime_sub_type }
    pub fn parameters(&self) -> &Parameters { &self.parameters }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// Whether `self` falls inside `range`.
    ///
    /// `range` may use `*` for the type or subtype. Every parameter named by
    /// `range` must be present on `self` with the same value.
    pub fn matches(&self, range: &MediaTypeDescriptor) -> bool {
        let part = |wanted: &str, own: &str| wanted == WILDCARD || wanted.eq_ignore_ascii_case(own);

        part(&range.mime_type, &self.mime_type)
            && part(&range.mime_sub_type, &self.mime_sub_type)
            && range.parameters.iter().all(|(name, value)| {
                self.parameters.get(name).is_some_and(|own| own.eq_ignore_ascii_case(value))
            })
    }

    /// `*/*` < `type/*` < `type/subtype` < `type/subtype;params`.
    pub(crate) fn specificity(&self) -> u8 {
        match (self.mime_type == WILDCARD, self.mime_sub_type == WILDCARD) {
            (true, _) => 0,
            (false, true) => 1,
            (false, false) if self.parameters.is_empty() => 2,
            (false, false) => 3,
        }
    }
}

impl fmt::Display for MediaTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{MIME_SUBTYPE_SEPARATOR}{}", self.mime_type, self.mime_sub_type)?;
        for (name, value) in &self.parameters {
            write!(f, "{PARAMETER_SEPARATOR}{name}{PARAMETER_ASSIGNMENT}{value}")?;
        }
        Ok(())
    }
}

/// Parses `type/subtype[;name=value]*`.
///
/// Whitespace around every part is ignored, type, subtype and parameter
/// names are lowercased, and quoted values are unquoted.
impl FromStr for MediaTypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::builder().parse(s)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Incremental construction of any descriptor type.
///
/// `build` hands the accumulated parts to the factory. Each call gets its own
/// copy of the parameters, so one builder can produce several independent
/// descriptors.
#[derive(Clone, Debug)]
pub struct Builder<T, F = Factory<T>>
where
    F: Fn(String, String, Parameters) -> T,
{
    mime_type: String,
    mime_sub_type: String,
    parameters: Parameters,
    factory: F,
    product: PhantomData<fn() -> T>,
}

impl<T, F> Builder<T, F>
where
    F: Fn(String, String, Parameters) -> T,
{
    pub fn new(factory: F) -> Self {
        Self {
            mime_type: String::new(),
            mime_sub_type: String::new(),
            parameters: Parameters::new(),
            factory,
            product: PhantomData,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_mime_sub_type(mut self, mime_sub_type: impl Into<String>) -> Self {
        self.mime_sub_type = mime_sub_type.into();
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn build(&self) -> T {
        (self.factory)(
            self.mime_type.clone(),
            self.mime_sub_type.clone(),
            self.parameters.clone(),
        )
    }

    /// Fills the builder from a rendered media type and builds it.
    pub fn parse(mut self, s: &str) -> Result<T, Error> {
        let invalid = || Error::InvalidMediaType(s.to_owned());

        let mut parts = s.split(PARAMETER_SEPARATOR);
        let essence = parts.next().unwrap_or_default();
        let (mime_type, mime_sub_type) = essence.split_once(MIME_SUBTYPE_SEPARATOR).ok_or_else(invalid)?;
        let (mime_type, mime_sub_type) = (mime_type.trim(), mime_sub_type.trim());
        if mime_type.is_empty() || mime_sub_type.is_empty() {
            return Err(invalid());
        }
        self = self
            .with_mime_type(mime_type.to_ascii_lowercase())
            .with_mime_sub_type(mime_sub_type.to_ascii_lowercase());

        for parameter in parts.map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = parameter.split_once(PARAMETER_ASSIGNMENT).ok_or_else(invalid)?;
            let name = name.trim();
            if name.is_empty() {
                return Err(invalid());
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            self = self.with_parameter(name.to_ascii_lowercase(), value);
        }

        Ok(self.build())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use super::*;

    fn hash_of(d: &MediaTypeDescriptor) -> u64 {
        let mut h = DefaultHasher::new();
        d.hash(&mut h);
        h.finish()
    }

    #[test]
    fn renders_without_parameters() {
        assert_eq!(MediaTypeDescriptor::of("application", "json").to_string(), "application/json");
    }

    #[test]
    fn equality_ignores_insertion_order() {
        let a = MediaTypeDescriptor::builder()
            .with_mime_type("application")
            .with_mime_sub_type("json")
            .with_parameter("charset", "utf-8")
            .with_parameter("version", "2")
            .build();
        let b = MediaTypeDescriptor::builder()
            .with_mime_type("application")
            .with_mime_sub_type("json")
            .with_parameter("version", "2")
            .with_parameter("charset", "utf-8")
            .build();

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn every_field_takes_part_in_equality() {
        let base = MediaTypeDescriptor::of("application", "json");
        assert_ne!(base, MediaTypeDescriptor::of("application", "xml"));
        assert_ne!(base, MediaTypeDescriptor::of("text", "json"));

        let mut parameters = Parameters::new();
        parameters.insert("charset".to_owned(), "utf-8".to_owned());
        assert_ne!(base, MediaTypeDescriptor::new("application", "json", parameters));
    }

    #[test]
    fn build_copies_parameters_per_call() {
        let builder = MediaTypeDescriptor::builder()
            .with_mime_type("text")
            .with_mime_sub_type("plain")
            .with_parameter("charset", "utf-8");
        let first = builder.build();
        let second = builder.with_parameter("format", "flowed").build();

        assert_eq!(first.parameters().len(), 1);
        assert_eq!(second.parameters().len(), 2);
    }

    #[test]
    fn factory_decides_the_product() {
        let builder = Builder::new(|t: String, s: String, p: Parameters| format!("{t}|{s}|{}", p.len()))
            .with_mime_type("image")
            .with_mime_sub_type("png");
        assert_eq!(builder.build(), "image|png|0");
    }

    #[test]
    fn parses_and_normalises() {
        let parsed: MediaTypeDescriptor = " Application/JSON ; Charset=\"utf-8\" ;".parse().unwrap();
        assert_eq!(parsed.mime_type(), "application");
        assert_eq!(parsed.mime_sub_type(), "json");
        assert_eq!(parsed.parameter("charset"), Some("utf-8"));
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "json", "/json", "application/", "text/plain;charset", "text/plain;=x"] {
            assert!(
                matches!(bad.parse::<MediaTypeDescriptor>(), Err(Error::InvalidMediaType(_))),
                "{bad:?} should not parse",
            );
        }
    }

    #[test]
    fn matches_ranges() {
        let json: MediaTypeDescriptor = "application/json;charset=utf-8".parse().unwrap();

        assert!(json.matches(&"*/*".parse().unwrap()));
        assert!(json.matches(&"application/*".parse().unwrap()));
        assert!(json.matches(&"application/json".parse().unwrap()));
        assert!(json.matches(&"application/json;charset=UTF-8".parse().unwrap()));
        assert!(!json.matches(&"application/json;charset=latin1".parse().unwrap()));
        assert!(!json.matches(&"text/*".parse().unwrap()));
    }
}
