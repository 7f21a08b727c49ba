//! Configuration layer
//!
//! Two kinds of configuration exist:
//!
//! - **Fingerprint configurations** ([`FingerprintConfig`]): JSON documents
//!   selecting which categories are patched and in which mode. They are
//!   inputs to a single apply.
//! - **Tool settings** ([`ToolSettings`]): the optional `fpm.toml` at the
//!   workspace base describing the layout, the patch tool and mapping
//!   overrides. Loaded once at startup.

mod fingerprint;
mod settings;

pub use fingerprint::{CategorySetting, DEFAULT_MODE, FingerprintConfig};
pub use settings::{ApplySettings, LayoutSettings, SETTINGS_FILE, ToolSettings};
