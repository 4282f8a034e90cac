// SPDX-FileCopyrightText: 2026 fwdd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for input sources.

pub mod source;

pub use source::Source;
