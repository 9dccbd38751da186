// SPDX-License-Identifier: GPL-3.0-or-later

//! SAND header conformance checking: lexical matchers, parse tree model,
//! grammar descriptors, the generic parser, per-message-class post-checks,
//! and the public header dispatcher.

mod diagnostic;
mod dispatch;
mod grammar;
mod messages;
mod parser;
mod types;

pub(crate) mod tree;

pub use dispatch::{check_header, check_headers};
pub use tree::{SandList, SandObject};
