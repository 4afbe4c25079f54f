// SPDX-License-Identifier: LGPL-3.0-or-later

//! Band planning, Butterworth design, Q31 quantization and the
//! per-band engines that tie them together.

pub mod bank;
pub mod butterworth;
pub mod cascade;
pub mod equalizer;
pub mod mixer;
pub mod planner;
pub mod quantizer;
pub mod sos;
