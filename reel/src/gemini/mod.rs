// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod static_files;

pub use request::{MAX_REQUEST_LEN, Request, RequestError};
pub use response::{Response, Status};
pub use router::Router;
pub use server::{ServerHandle, ServerSettings, bind_listener, spawn_server};
pub use static_files::StaticFiles;
