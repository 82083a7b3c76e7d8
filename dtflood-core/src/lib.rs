//! dtflood Core
//!
//! Core types shared by the dtflood dispatch tooling.
//!
//! This crate contains:
//! - Domain types: service descriptors, storage paths, job states, credentials
//! - DTOs: wire shapes of the OSCAR REST API and MinIO notification frames

pub mod domain;
pub mod dto;
