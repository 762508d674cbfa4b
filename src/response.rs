//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! A response body is either plain bytes, sent with a `content-length`, or a
//! [`ChunkedBody`], sent with `transfer-encoding: chunked`. Two writers are
//! provided: [`Response::write_to`] frames the chunks onto any `AsyncWrite`,
//! and the server hands hyper one frame per chunk. Both skip empty chunks.

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::{Either, Full};
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{error, warn};

use crate::chunked::{ChunkFrames, ChunkedBody};
use crate::mapper::Mapper;
use crate::media::{ContentMediaType, MediaTypeDescriptor};

/// Body type handed to hyper.
pub type HttpBody = Either<Full<Bytes>, ChunkFrames>;

#[derive(Debug)]
enum ResponseBody {
    Plain(Bytes),
    Chunked(ChunkedBody),
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use restmux::{ChunkedBody, Response};
/// use restmux::media::ContentMediaType;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// let mut body = ChunkedBody::new();
/// body.append_chunk("part one")?.append_chunk("part two")?.end()?;
/// Response::builder()
///     .status(StatusCode::OK)
///     .chunked(ContentMediaType::Text, body);
/// # Ok::<(), restmux::Error>(())
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: ResponseBody,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`, `text/plain;charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK` with a chunked body and no declared content type.
    pub fn chunked(body: ChunkedBody) -> Self {
        Self { status: StatusCode::OK, headers: Vec::new(), body: ResponseBody::Chunked(body) }
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: Vec::new(), body: ResponseBody::Plain(Bytes::new()) }
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self.body, ResponseBody::Chunked(_))
    }

    /// Body bytes as built; chunk framing included.
    pub fn body(&self) -> &[u8] {
        match &self.body {
            ResponseBody::Plain(bytes) => bytes,
            ResponseBody::Chunked(chunked) => chunked.as_bytes(),
        }
    }

    /// Writes the full HTTP/1.1 response to `writer`.
    ///
    /// Chunked bodies are framed from their payloads, so an empty chunk
    /// never reaches the wire as an early terminator, then closed with the
    /// zero chunk and the blank line whether or not the body was ended.
    pub async fn write_to<W: AsyncWrite + Unpin>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or(""),
            ).as_bytes(),
        ).await?;
        match &self.body {
            ResponseBody::Plain(bytes) => {
                writer.write_all(format!("content-length: {}\r\n", bytes.len()).as_bytes()).await?;
            }
            ResponseBody::Chunked(_) => {
                writer.write_all(b"transfer-encoding: chunked\r\n").await?;
            }
        }
        for (name, value) in &self.headers {
            writer.write_all(format!("{name}: {value}\r\n").as_bytes()).await?;
        }
        writer.write_all(b"\r\n").await?;

        match &self.body {
            ResponseBody::Plain(bytes) => writer.write_all(bytes).await?,
            ResponseBody::Chunked(chunked) => {
                for payload in chunked.payloads() {
                    writer.write_all(format!("{:x}\r\n", payload.len()).as_bytes()).await?;
                    writer.write_all(payload).await?;
                    writer.write_all(b"\r\n").await?;
                }
                writer.write_all(b"0\r\n\r\n").await?;
            }
        }
        writer.flush().await
    }

    /// Converts into a hyper response. hyper writes `content-length` or the
    /// chunk framing itself.
    pub(crate) fn into_http(self) -> http::Response<HttpBody> {
        let body = match self.body {
            ResponseBody::Plain(bytes) => Either::Left(Full::new(bytes)),
            ResponseBody::Chunked(chunked) => Either::Right(chunked.into_frames()),
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = self.status;
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().append(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`. Terminated by a
/// typed body method.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.content(ContentMediaType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain;charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.content(ContentMediaType::Text, body)
    }

    /// Terminate with a body of any media type.
    pub fn content(self, media_type: impl Into<MediaTypeDescriptor>, body: impl Into<Bytes>) -> Response {
        self.finish(media_type.into(), ResponseBody::Plain(body.into()))
    }

    /// Terminate with a chunked body.
    pub fn chunked(self, media_type: impl Into<MediaTypeDescriptor>, body: ChunkedBody) -> Response {
        self.finish(media_type.into(), ResponseBody::Chunked(body))
    }

    /// Terminate with `value` serialised by `mapper`. A value the mapper
    /// cannot serialise becomes `500 Internal Server Error`.
    pub fn mapped<M: Mapper, T: Serialize>(self, mapper: &M, value: &T) -> Response {
        match mapper.to_data(value) {
            Ok(data) => self.content(mapper.media_type(), data),
            Err(e) => {
                error!("response mapping failed: {e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: ResponseBody::Plain(Bytes::new()) }
    }

    fn finish(self, media_type: MediaTypeDescriptor, body: ResponseBody) -> Response {
        let mut headers = vec![("content-type".to_owned(), media_type.to_string())];
        headers.extend(self.headers);
        Response { status: self.status, headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for ChunkedBody {
    fn into_response(self) -> Response { Response::chunked(self) }
}

/// Return a bare status from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;
    use crate::mapper::JsonMapper;

    async fn written(response: Response) -> String {
        let mut out = Vec::new();
        response.write_to(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn writes_plain_bodies_with_length() {
        let wire = written(Response::text("hi")).await;
        assert_eq!(
            wire,
            "HTTP/1.1 200 OK\r\ncontent-length: 2\r\ncontent-type: text/plain;charset=utf-8\r\n\r\nhi",
        );
    }

    #[tokio::test]
    async fn writes_chunked_bodies_and_the_closing_line() {
        let mut body = ChunkedBody::new();
        body.append_chunk("hello").unwrap().end().unwrap();

        let wire = written(Response::chunked(body)).await;
        assert_eq!(
            wire,
            "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n",
        );
    }

    #[tokio::test]
    async fn terminates_unended_chunked_bodies() {
        let mut body = ChunkedBody::new();
        body.append_chunk("ab").unwrap();

        let wire = written(Response::chunked(body)).await;
        assert!(wire.ends_with("\r\n\r\n2\r\nab\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn empty_chunks_do_not_terminate_the_stream_early() {
        let mut body = ChunkedBody::new();
        body.append_chunk("a").unwrap()
            .append_chunk("").unwrap()
            .append_chunk("b").unwrap()
            .end().unwrap();

        let wire = written(Response::chunked(body)).await;
        assert!(wire.ends_with("\r\n\r\n1\r\na\r\n1\r\nb\r\n0\r\n\r\n"), "{wire}");
        assert_eq!(wire.matches("0\r\n\r\n").count(), 1);
    }

    #[tokio::test]
    async fn both_writers_send_the_same_payload() {
        let build = || {
            let mut body = ChunkedBody::new();
            body.append_chunk("x").unwrap().append_chunk("").unwrap().append_chunk("yz").unwrap();
            Response::chunked(body)
        };

        let wire = written(build()).await;
        let framed = &wire[wire.find("\r\n\r\n").unwrap() + 4..];
        assert_eq!(framed, "1\r\nx\r\n2\r\nyz\r\n0\r\n\r\n");

        let collected = build().into_http().into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"xyz");
    }

    #[test]
    fn builder_puts_content_type_first() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/42")
            .json(br#"{"id":42}"#.to_vec());

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.headers()[0], ("content-type".to_owned(), "application/json".to_owned()));
        assert_eq!(response.header("Location"), Some("/users/42"));
    }

    #[test]
    fn mapped_bodies_use_the_mapper_media_type() {
        let response = Response::builder().mapped(&JsonMapper, &vec![1, 2, 3]);
        assert_eq!(response.body(), b"[1,2,3]");
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn http_conversion_keeps_status_and_headers() {
        let response = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header("x-trace", "abc")
            .header("bad header", "x")
            .text("ok")
            .into_http();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()["x-trace"], "abc");
        assert_eq!(response.headers().len(), 2);
    }
}
