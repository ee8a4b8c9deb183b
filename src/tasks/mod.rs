//! Generic task implementations.
//!
//! Real probes live with the host application; these cover the cases the
//! binary can express from configuration, plus closure adapters for callers
//! that want to plug a function in without declaring a type.

pub mod builtin;

pub use builtin::*;
