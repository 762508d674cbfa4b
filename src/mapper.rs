//! Body (de)serialisation strategy.
//!
//! There is no process-wide mapper. Whatever needs one receives it when it
//! is built, usually by capturing it in the handler closure:
//!
//! ```rust
//! use std::sync::Arc;
//! use restmux::{JsonMapper, Method, Request, Response, DynamicResource};
//!
//! let mapper = Arc::new(JsonMapper);
//! let resource = DynamicResource::builder("echo")
//!     .on(Method::Post, "/echo", move |req: Request| {
//!         let mapper = Arc::clone(&mapper);
//!         async move {
//!             match req.mapped_body::<serde_json::Value, _>(&*mapper) {
//!                 Ok(value) => Response::builder().mapped(&*mapper, &value),
//!                 Err(_) => Response::status(http::StatusCode::BAD_REQUEST),
//!             }
//!         }
//!     })
//!     .build()?;
//! # Ok::<(), restmux::Error>(())
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::media::{ContentMediaType, MediaTypeDescriptor};

/// Converts between body text and typed values.
pub trait Mapper: Send + Sync {
    fn from_data<T: DeserializeOwned>(&self, data: &str) -> Result<T, Error>;
    fn to_data<T: Serialize>(&self, value: &T) -> Result<String, Error>;

    /// The `content-type` of what [`to_data`](Mapper::to_data) produces.
    fn media_type(&self) -> MediaTypeDescriptor;
}

/// JSON via serde_json.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMapper;

impl Mapper for JsonMapper {
    fn from_data<T: DeserializeOwned>(&self, data: &str) -> Result<T, Error> {
        Ok(serde_json::from_str(data)?)
    }

    fn to_data<T: Serialize>(&self, value: &T) -> Result<String, Error> {
        Ok(serde_json::to_string(value)?)
    }

    fn media_type(&self) -> MediaTypeDescriptor {
        ContentMediaType::Json.descriptor()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Order {
        id: u32,
        item: String,
    }

    #[test]
    fn maps_both_ways() {
        let mapper = JsonMapper;
        let order = Order { id: 7, item: "tea".to_owned() };

        let text = mapper.to_data(&order).unwrap();
        assert_eq!(text, r#"{"id":7,"item":"tea"}"#);
        assert_eq!(mapper.from_data::<Order>(&text).unwrap(), order);
    }

    #[test]
    fn surfaces_malformed_input() {
        assert!(matches!(JsonMapper.from_data::<Order>("{"), Err(Error::Mapping(_))));
    }
}
