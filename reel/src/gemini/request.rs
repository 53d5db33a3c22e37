// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use url::Url;

/// Longest request URL a client may send, excluding the CRLF.
pub const MAX_REQUEST_LEN: usize = 1024;

#[derive(Debug)]
pub enum RequestError {
    TooLong,
    MissingCrlf,
    NotUtf8,
    InvalidUrl(String),
    UnsupportedScheme(String),
    UserInfo,
    Io(io::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::TooLong => write!(f, "Request exceeds {} bytes", MAX_REQUEST_LEN),
            RequestError::MissingCrlf => write!(f, "Request is not terminated by CRLF"),
            RequestError::NotUtf8 => write!(f, "Request is not valid UTF-8"),
            RequestError::InvalidUrl(err) => write!(f, "Invalid request URL: {}", err),
            RequestError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported scheme: {}", scheme)
            }
            RequestError::UserInfo => write!(f, "Request URL must not contain userinfo"),
            RequestError::Io(err) => write!(f, "Failed to read request: {}", err),
        }
    }
}

impl Error for RequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RequestError::Io(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    url: Url,
    path: String,
}

impl Request {
    /// Parse a request line with its CRLF already removed.
    pub fn parse(line: &[u8]) -> Result<Self, RequestError> {
        if line.len() > MAX_REQUEST_LEN {
            return Err(RequestError::TooLong);
        }
        let text = std::str::from_utf8(line).map_err(|_| RequestError::NotUtf8)?;
        let url = Url::parse(text).map_err(|err| RequestError::InvalidUrl(err.to_string()))?;

        if url.scheme() != "gemini" {
            return Err(RequestError::UnsupportedScheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(RequestError::UserInfo);
        }

        let decoded = urlencoding::decode(url.path())
            .map_err(|err| RequestError::InvalidUrl(err.to_string()))?;
        let path = if decoded.is_empty() {
            "/".to_string()
        } else {
            decoded.into_owned()
        };

        Ok(Self { url, path })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Percent-decoded path, always starting with '/'.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Read bytes up to and including CRLF, returning the line without it.
pub async fn read_request_line<R>(reader: &mut R) -> Result<Vec<u8>, RequestError>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::with_capacity(128);
    let mut byte = [0u8; 1];

    loop {
        let read = reader.read(&mut byte).await.map_err(RequestError::Io)?;
        if read == 0 {
            return Err(RequestError::MissingCrlf);
        }
        line.push(byte[0]);

        if line.ends_with(b"\r\n") {
            line.truncate(line.len() - 2);
            return Ok(line);
        }
        if line.len() > MAX_REQUEST_LEN + 2 {
            return Err(RequestError::TooLong);
        }
    }
}
