//! Buffered HTTP responses

use crate::errors::HttpError;
use bytes::Bytes;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Method, StatusCode};
use std::borrow::Cow;
use url::Url;

/// A completed exchange with its body read exactly once
///
/// A failure while reading the body does not fail the exchange; it is kept
/// here so body-consuming checks can report it.
#[derive(Debug)]
pub struct Response {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Result<Bytes, HttpError>,
}

impl Response {
    pub fn new(
        method: Method,
        url: Url,
        status: StatusCode,
        headers: HeaderMap,
        body: Result<Bytes, HttpError>,
    ) -> Self {
        Self {
            method,
            url,
            status,
            headers,
            body,
        }
    }

    /// Request path, used when naming the exchange in failures
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn body(&self) -> Result<&Bytes, &HttpError> {
        self.body.as_ref()
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> Result<Cow<'_, str>, &HttpError> {
        self.body().map(|bytes| String::from_utf8_lossy(bytes))
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}
