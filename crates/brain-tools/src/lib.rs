//! Tracing/debug primitives for tick-driven behavior trees.
//!
//! Engine-agnostic on purpose. Rendering of traces belongs in host tooling.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, NullTraceSink, SharedTraceLog, TraceEvent, TraceLog, TraceSink, VecTraceSink,
};
