// Copyright (c) The ormgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconcile the results of an ORM driver's compliance test suite against a version-pinned
//! baseline of known failures, and gate CI on the outcome.
//!
//! The engine lives in [`ormgate_runner`]; this crate is the command-line frontend. See
//! `ormgate --help` for usage.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, OutputWriter};
