// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the error type shared across the monitor crates.
//!
//! Note that capability absence (no battery, no memory introspection, no
//! refresh primitive) is never reported through this type: it degrades to
//! default values and a capability flag instead.

use std::fmt;

/// A specialized `Result` type for monitor operations.
pub type VitalsResult<T> = Result<T, VitalsError>;

/// An error that can occur while configuring or wiring the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum VitalsError {
    /// A configuration value is outside its valid range.
    InvalidConfig {
        /// The offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A configuration file could not be read or written.
    ConfigIo {
        /// The path of the file.
        path: String,
        /// The underlying I/O error.
        source_error: String,
    },
    /// A configuration document could not be parsed.
    ConfigParse(String),
    /// A platform source was asked to register but has no backing primitive.
    SourceUnavailable(&'static str),
    /// A platform source failed while registering.
    SourceFailed {
        /// The source that failed.
        source_name: &'static str,
        /// Details from the platform.
        details: String,
    },
    /// A background worker thread could not be spawned.
    Spawn(String),
    /// The process-scoped monitor was initialized twice.
    AlreadyInitialized,
}

impl fmt::Display for VitalsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalsError::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration for '{field}': {reason}")
            }
            VitalsError::ConfigIo { path, source_error } => {
                write!(f, "Failed to access configuration file '{path}': {source_error}")
            }
            VitalsError::ConfigParse(details) => {
                write!(f, "Failed to parse configuration: {details}")
            }
            VitalsError::SourceUnavailable(name) => {
                write!(f, "Platform source '{name}' is not available on this host")
            }
            VitalsError::SourceFailed {
                source_name,
                details,
            } => {
                write!(f, "Platform source '{source_name}' failed: {details}")
            }
            VitalsError::Spawn(details) => write!(f, "Failed to spawn worker thread: {details}"),
            VitalsError::AlreadyInitialized => {
                write!(f, "The process-wide monitor is already initialized")
            }
        }
    }
}

impl std::error::Error for VitalsError {}

impl From<serde_json::Error> for VitalsError {
    fn from(err: serde_json::Error) -> Self {
        VitalsError::ConfigParse(err.to_string())
    }
}
