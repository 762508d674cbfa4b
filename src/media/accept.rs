//! `Accept` header entries and content negotiation.

use super::{Builder, Factory, MediaTypeDescriptor, Parameters};
use crate::error::Error;

const QUALITY: &str = "q";

/// One media range from an `Accept` header with its quality weight.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptMediaType {
    descriptor: MediaTypeDescriptor,
    quality: f32,
}

impl AcceptMediaType {
    /// A builder whose factory lifts the `q` parameter out of the range.
    /// Missing or unparsable weights count as `1.0`; others are clamped to
    /// `0.0..=1.0`.
    pub fn builder() -> Builder<Self> {
        Builder::new(Self::from_parts as Factory<Self>)
    }

    fn from_parts(mime_type: String, mime_sub_type: String, mut parameters: Parameters) -> Self {
        let quality = parameters.remove(QUALITY)
            .and_then(|q| q.trim().parse::<f32>().ok())
            .filter(|q| !q.is_nan())
            .map_or(1.0, |q| q.clamp(0.0, 1.0));

        Self {
            descriptor: MediaTypeDescriptor::new(mime_type, mime_sub_type, parameters),
            quality,
        }
    }

    pub fn descriptor(&self) -> &MediaTypeDescriptor { &self.descriptor }
    pub fn quality(&self) -> f32 { self.quality }
}

/// A parsed `Accept` header, most preferred range first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AcceptMediaTypes {
    entries: Vec<AcceptMediaType>,
}

impl AcceptMediaTypes {
    /// Parses a comma-separated `Accept` value. Empty input accepts
    /// anything.
    pub fn parse(header: &str) -> Result<Self, Error> {
        let mut entries = header.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| AcceptMediaType::builder().parse(entry))
            .collect::<Result<Vec<_>, _>>()?;

        entries.sort_by(|a, b| {
            b.quality.total_cmp(&a.quality)
                .then_with(|| b.descriptor.specificity().cmp(&a.descriptor.specificity()))
        });
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[AcceptMediaType] {
        &self.entries
    }

    /// Weight the client gives `media_type`: the quality of the most specific
    /// range it falls in, or `0.0` if none.
    pub fn quality_of(&self, media_type: &MediaTypeDescriptor) -> f32 {
        if self.entries.is_empty() {
            return 1.0;
        }
        self.entries.iter()
            .rev()
            .filter(|entry| media_type.matches(&entry.descriptor))
            .max_by_key(|entry| entry.descriptor.specificity())
            .map_or(0.0, |entry| entry.quality)
    }

    /// Picks the best of `available`, which is listed in the server's order
    /// of preference. Ties go to the earlier entry; `q=0` never wins.
    pub fn negotiate<'a>(&self, available: &'a [MediaTypeDescriptor]) -> Option<&'a MediaTypeDescriptor> {
        let mut best: Option<(&MediaTypeDescriptor, f32)> = None;
        for candidate in available {
            let quality = self.quality_of(candidate);
            if quality > 0.0 && best.is_none_or(|(_, q)| quality > q) {
                best = Some((candidate, quality));
            }
        }
        best.map(|(candidate, _)| candidate)
    }

    /// Acceptable ranges in preference order.
    pub fn preferred(&self) -> impl Iterator<Item = &MediaTypeDescriptor> {
        self.entries.iter()
            .filter(|entry| entry.quality > 0.0)
            .map(|entry| &entry.descriptor)
    }
}
