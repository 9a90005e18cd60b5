//! Modelgate - Per-Key Sliding-Window Admission Control
//!
//! This crate implements a blocking admission controller that keeps callers
//! under a per-key request rate measured over a rolling window. Callers that
//! would exceed the quota are suspended until a slot frees up rather than
//! rejected.

pub mod config;
pub mod error;
pub mod ratelimit;
