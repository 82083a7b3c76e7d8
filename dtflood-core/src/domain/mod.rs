//! Core domain types
//!
//! These types describe a remote job submission independently of the HTTP
//! APIs that carry it. They are shared between the client (which decodes
//! wire data into them) and the dispatcher (which drives a job with them).

pub mod credentials;
pub mod job;
pub mod notification;
pub mod service;
pub mod storage;
