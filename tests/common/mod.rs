//! Common test utilities for all integration tests.
//!
//! Recording doubles for every collaborator of the certificate workflow,
//! plus PEM material generated with rcgen.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod fakes;
pub mod pem;

pub use fakes::*;
