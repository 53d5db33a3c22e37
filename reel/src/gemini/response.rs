// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fmt;

/// Meta line for pages rendered from templates.
pub const RENDERED_PAGE_MIME: &str = "text/gemini; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    PermanentRedirect,
    PermanentFailure,
    NotFound,
    ProxyRequestRefused,
    BadRequest,
}

impl Status {
    pub fn code(self) -> u8 {
        match self {
            Status::Success => 20,
            Status::PermanentRedirect => 31,
            Status::PermanentFailure => 50,
            Status::NotFound => 51,
            Status::ProxyRequestRefused => 53,
            Status::BadRequest => 59,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    /// MIME type on success, redirect target or human readable reason otherwise.
    pub meta: String,
    pub body: Vec<u8>,
}

impl Response {
    pub fn success(mime: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: Status::Success,
            meta: mime.into(),
            body,
        }
    }

    pub fn gemtext(body: String) -> Self {
        Self::success(RENDERED_PAGE_MIME, body.into_bytes())
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Self::without_body(Status::PermanentRedirect, target)
    }

    pub fn not_found() -> Self {
        Self::without_body(Status::NotFound, "Not found")
    }

    pub fn internal_error() -> Self {
        Self::without_body(Status::PermanentFailure, "Internal error")
    }

    pub fn proxy_refused() -> Self {
        Self::without_body(Status::ProxyRequestRefused, "Proxy request refused")
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::without_body(Status::BadRequest, reason)
    }

    fn without_body(status: Status, meta: impl Into<String>) -> Self {
        Self {
            status,
            meta: meta.into(),
            body: Vec::new(),
        }
    }

    /// Header line and, for successful responses, the body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("{} {}\r\n", self.status, self.meta).into_bytes();
        if self.status == Status::Success {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::GEMINI_MIME;

    #[test]
    fn success_carries_mime_and_body() {
        let response = Response::gemtext("# Hi\n".to_string());
        assert_eq!(
            response.to_bytes(),
            b"20 text/gemini; charset=utf-8\r\n# Hi\n".to_vec()
        );

        let file = Response::success(GEMINI_MIME, b"=> /\n".to_vec());
        assert_eq!(file.to_bytes(), b"20 text/gemini\r\n=> /\n".to_vec());
    }

    #[test]
    fn failures_have_no_body() {
        assert_eq!(Response::not_found().to_bytes(), b"51 Not found\r\n".to_vec());
        assert_eq!(
            Response::internal_error().to_bytes(),
            b"50 Internal error\r\n".to_vec()
        );
        assert_eq!(
            Response::redirect("/films/").to_bytes(),
            b"31 /films/\r\n".to_vec()
        );
    }
}
