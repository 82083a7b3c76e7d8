//! Data Transfer Objects for the remote APIs
//!
//! Wire shapes of the OSCAR REST API, the OSCAR function definition
//! language (FDL) used as service templates, and MinIO notification frames.
//! Unknown fields are carried through untouched where the API owns them.

pub mod cluster;
pub mod notification;
pub mod service;
