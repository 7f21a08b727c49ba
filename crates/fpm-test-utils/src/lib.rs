//! Shared test utilities for the fingerprint patch manager workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: detection of the external `git` tool and patch text helpers
//! - [`tree`]: [`tree::TestTree`] builder for a full workspace layout

pub mod git;
pub mod tree;

pub use git::{git_available, whole_file_patch};
pub use tree::TestTree;
