//! Well-known content types.

use super::{MediaTypeDescriptor, Parameters};

/// Common `content-type` values for [`ResponseBuilder::content`].
///
/// [`ResponseBuilder::content`]: crate::response::ResponseBuilder::content
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentMediaType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    FormData,     // application/x-www-form-urlencoded
    Html,         // text/html;charset=utf-8
    Json,         // application/json
    MsgPack,      // application/msgpack
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Text,         // text/plain;charset=utf-8
    Xml,          // application/xml
}

impl ContentMediaType {
    pub fn descriptor(self) -> MediaTypeDescriptor {
        let (mime_type, mime_sub_type) = match self {
            Self::Csv         => ("text", "csv"),
            Self::EventStream => ("text", "event-stream"),
            Self::FormData    => ("application", "x-www-form-urlencoded"),
            Self::Html        => ("text", "html"),
            Self::Json        => ("application", "json"),
            Self::MsgPack     => ("application", "msgpack"),
            Self::OctetStream => ("application", "octet-stream"),
            Self::Pdf         => ("application", "pdf"),
            Self::Text        => ("text", "plain"),
            Self::Xml         => ("application", "xml"),
        };

        let mut parameters = Parameters::new();
        if matches!(self, Self::Html | Self::Text) {
            parameters.insert("charset".to_owned(), "utf-8".to_owned());
        }
        MediaTypeDescriptor::new(mime_type, mime_sub_type, parameters)
    }
}

impl From<ContentMediaType> for MediaTypeDescriptor {
    fn from(content: ContentMediaType) -> Self {
        content.descriptor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_types_carry_a_charset() {
        assert_eq!(ContentMediaType::Text.descriptor().to_string(), "text/plain;charset=utf-8");
        assert_eq!(ContentMediaType::Html.descriptor().to_string(), "text/html;charset=utf-8");
        assert_eq!(ContentMediaType::Json.descriptor().to_string(), "application/json");
    }
}
