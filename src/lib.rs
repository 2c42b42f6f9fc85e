//! Biased random-instruction fuzzer for x86 decoders.
//!
//! Candidates are built as a prefix run, an escape sequence and a random tail,
//! submitted to a decoder under a rotating set of machine modes, and recorded
//! in a process-wide memento right before each submission so a crashing
//! decoder can be reported from a signal handler.
//!
//! SPDX-License-Identifier: MIT

pub mod misc;
pub mod err;
pub mod rng;
pub mod prefix;
pub mod escape;
pub mod encoder;
pub mod machine;
pub mod decoder;
pub mod memento;
pub mod fault;
pub mod stats;
pub mod config;
pub mod context;

pub use err::FuzzErr;
