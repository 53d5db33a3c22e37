// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::Utc;
use env_logger::Logger;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

/// Rewrites the level of records from noisy targets before they reach env_logger.
/// Each rule is `(target prefix, level emitted, level recorded)`.
struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<(String, Level, Level)>,
}

impl LevelModifierLogger {
    fn new(inner: Logger, rules: Vec<(String, Level, Level)>) -> Self {
        LevelModifierLogger { inner, rules }
    }

    fn get_new_level(&self, target: &str, original_level: Level) -> Level {
        self.rules
            .iter()
            .find(|(prefix, from, _)| target.starts_with(prefix.as_str()) && *from == original_level)
            .map(|(_, _, to)| *to)
            .unwrap_or(original_level)
    }
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let new_metadata = Metadata::builder()
            .level(self.get_new_level(metadata.target(), metadata.level()))
            .target(metadata.target())
            .build();
        self.inner.enabled(&new_metadata)
    }

    fn log(&self, record: &Record) {
        let new_record = Record::builder()
            .level(self.get_new_level(record.target(), record.level()))
            .target(record.target())
            .args(*record.args())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.inner.log(&new_record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger(
    rules: Vec<(String, Level, Level)>,
    logger: Logger,
) -> Result<(), SetLoggerError> {
    let custom_logger = LevelModifierLogger::new(logger, rules);
    log::set_boxed_logger(Box::new(custom_logger))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

/// Map the configured level name onto a filter. Unknown names fall back to info.
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Build the stdout env_logger with the server's line format and install it.
pub fn init_stdout_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = env_logger::Builder::from_default_env()
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();

    init_logger(
        vec![
            ("rustls".to_string(), Level::Debug, Level::Trace),
            ("tokio_rustls".to_string(), Level::Debug, Level::Trace),
        ],
        logger,
    )
}
