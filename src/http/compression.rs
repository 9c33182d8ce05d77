//! Gzip compression decorator.
//!
//! # Responsibilities
//! - Negotiate gzip from the client's `Accept-Encoding`
//! - Announce `Content-Encoding: gzip` on the wrapped handler's response
//! - Compress the response body frame by frame as the wrapped handler
//!   produces it
//!
//! # Design Decisions
//! - The decorator wraps any `ProxyHandler` and only intercepts the body;
//!   status, headers and trailers pass through (minus `Content-Length`,
//!   which no longer describes the encoded stream)
//! - Streaming, never buffering the whole body
//! - The encoder is finished exactly once: at end of stream, before
//!   trailers, or when the wrapped body fails

use std::io::Write;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::BoxError;
use flate2::write::GzEncoder;
use flate2::Compression;
use futures_util::future::BoxFuture;
use hyper::body::{Bytes, Frame};

use crate::http::handler::ProxyHandler;

/// Wraps a handler so that gzip-capable clients receive compressed bodies.
#[derive(Debug, Clone)]
pub struct Gzip<H> {
    inner: H,
}

impl<H> Gzip<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: ProxyHandler> ProxyHandler for Gzip<H> {
    fn handle(&self, request: Request<Body>) -> BoxFuture<'_, Response<Body>> {
        if !accepts_gzip(request.headers()) {
            return self.inner.handle(request);
        }

        let is_head = request.method() == Method::HEAD;
        Box::pin(async move {
            let response = self.inner.handle(request).await;
            if is_head || !carries_body(response.status()) {
                return response;
            }
            compress_response(response)
        })
    }
}

/// Whether the `Accept-Encoding` headers admit gzip with a non-zero quality.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    let mut wildcard = false;

    let tokens = headers
        .get_all(header::ACCEPT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','));

    for token in tokens {
        let mut params = token.split(';');
        let coding = params.next().unwrap_or_default().trim();
        let quality = params
            .filter_map(|param| param.trim().strip_prefix("q="))
            .find_map(|q| q.trim().parse::<f32>().ok())
            .unwrap_or(1.0);

        if coding.eq_ignore_ascii_case("gzip") {
            return quality > 0.0;
        }
        if coding == "*" {
            wildcard = quality > 0.0;
        }
    }

    wildcard
}

fn carries_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

fn compress_response(response: Response<Body>) -> Response<Body> {
    // Already encoded by the handler or backend.
    if response.headers().contains_key(header::CONTENT_ENCODING) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    parts
        .headers
        .insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::new(GzipBody::new(body)))
}

/// Response body that gzips the frames of an inner body as they arrive.
pub struct GzipBody<B> {
    inner: B,
    encoder: Option<GzEncoder<Vec<u8>>>,
    trailers: Option<HeaderMap>,
}

impl<B> GzipBody<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            encoder: Some(GzEncoder::new(Vec::new(), Compression::default())),
            trailers: None,
        }
    }

    /// Drain whatever compressed output the encoder has produced so far.
    fn take_output(&mut self) -> Bytes {
        self.encoder
            .as_mut()
            .map(|encoder| Bytes::from(std::mem::take(encoder.get_mut())))
            .unwrap_or_default()
    }

    /// Finish the encoder, returning the remaining output and gzip footer.
    /// Later calls return an empty buffer.
    fn finish(&mut self) -> std::io::Result<Bytes> {
        match self.encoder.take() {
            Some(encoder) => encoder.finish().map(Bytes::from),
            None => Ok(Bytes::new()),
        }
    }
}

impl<B> hyper::body::Body for GzipBody<B>
where
    B: hyper::body::Body<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, BoxError>>> {
        let this = self.get_mut();

        if this.encoder.is_none() {
            return Poll::Ready(this.trailers.take().map(|t| Ok(Frame::trailers(t))));
        }

        loop {
            match ready!(Pin::new(&mut this.inner).poll_frame(cx)) {
                Some(Ok(frame)) => match frame.into_data() {
                    Ok(data) => {
                        if let Some(encoder) = this.encoder.as_mut() {
                            if let Err(e) = encoder.write_all(&data) {
                                this.encoder = None;
                                return Poll::Ready(Some(Err(e.into())));
                            }
                        }
                        let output = this.take_output();
                        if !output.is_empty() {
                            return Poll::Ready(Some(Ok(Frame::data(output))));
                        }
                    }
                    Err(frame) => {
                        this.trailers = frame.into_trailers().ok();
                        return match this.finish() {
                            Ok(tail) if !tail.is_empty() => Poll::Ready(Some(Ok(Frame::data(tail)))),
                            Ok(_) => Poll::Ready(this.trailers.take().map(|t| Ok(Frame::trailers(t)))),
                            Err(e) => Poll::Ready(Some(Err(e.into()))),
                        };
                    }
                },
                Some(Err(e)) => {
                    // Finish to release the encoder; the stream is broken either way.
                    if let Err(finish_err) = this.finish() {
                        tracing::debug!(error = %finish_err, "Gzip encoder dropped after body error");
                    }
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    return match this.finish() {
                        Ok(tail) => Poll::Ready(Some(Ok(Frame::data(tail)))),
                        Err(e) => Poll::Ready(Some(Err(e.into()))),
                    };
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.encoder.is_none() && self.trailers.is_none()
    }
}
