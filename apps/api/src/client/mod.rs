//! Client library for the CareerNav API and the resume extraction service.
//!
//! Mirrors what a frontend does: request state tracking, the multi-step
//! resume flow, a health probe gating uploads, and a small persistent cache
//! of the last recommendations. Payloads are normalized with the same
//! [`crate::normalize`] code the server uses.

pub mod api;
pub mod cache;
pub mod flow;
pub mod probe;

pub use api::{CareerNavClient, ClientError};
pub use cache::RecommendationCache;
pub use flow::{FileMeta, FlowKind, RequestState, ResumeFile, ResumeFlow, ResumeStep, ReviewDraft};
pub use probe::ServiceProbe;
