// SPDX-License-Identifier: LGPL-3.0-or-later

//! Mathematical operations on sample buffers.
//!
//! - [`horizontal`]: reductions (RMS, peak, difference norms)

pub mod horizontal;
