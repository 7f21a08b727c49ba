//! Command implementations for fpm-cli

pub mod apply;
pub mod build;
pub mod fingerprint;
pub mod generate;
pub mod restore;
pub mod status;
pub mod structure;
pub mod template;

pub use apply::run_apply;
pub use build::run_build;
pub use fingerprint::run_fingerprint;
pub use generate::run_generate;
pub use restore::run_restore;
pub use status::run_status;
pub use structure::run_create_structure;
pub use template::run_template;
