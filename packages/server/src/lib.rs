// Proposal Platform - Processing Core
//
// This crate provides the backend service that tracks asynchronous
// content-processing work (website extraction, markdown extraction, document
// conversion, content-library structuring, vector processing) for a
// multi-tenant proposal platform.
//
// The job tracker in kernel/jobs is the single writer of job lifecycle state;
// result rows live in domains/content and are only ever written together with
// the owning job's progress counter.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
