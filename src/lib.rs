// SPDX-License-Identifier: GPL-3.0-or-later

#![warn(missing_docs)]

//!
//! This crate is a conformance checker for SAND (Server And Network
//! assisted DASH, ISO/IEC 23009-5) messages carried as HTTP header values.
//!
//! Given a header name and its raw value, it decides whether the value is
//! syntactically and semantically conformant and, when it is not, returns
//! a list of precise, human-readable diagnostics. It is meant to be
//! embedded inside a larger conformance server that also validates the
//! XML-form SAND messages and MPDs, but those paths are external
//! collaborators — this crate only ever sees header name/value pairs.
//!
//! # Third-party crates
//!
//! This project depends on a small number of crates, each covering one
//! cross-cutting concern rather than the SAND grammar itself, which is a
//! hand-written recursive-descent parser with no external parsing crate:
//!
//! 1. Error / diagnostic vocabulary:
//!     * [thiserror][1]: for the closed diagnostic enum behind every
//!       conformance report.
//!
//! 2. Logging:
//!     * [tracing][2]: for structured, leveled log output emitted as
//!       diagnostics are recorded during parsing.
//!
//! 3. Configuration:
//!     * [dotenvy][3]: for resolving the two optional extended-check
//!       flags from the process environment.
//!
//! [1]: https://crates.io/crates/thiserror
//! [2]: https://crates.io/crates/tracing
//! [3]: https://crates.io/crates/dotenvy
//!

mod config;
mod sand;

pub use config::{config, Config};
pub use sand::{check_header, check_headers, SandList, SandObject};
