//! jsconf Language Server
//!
//! LSP server for JavaScript/TypeScript configuration files, providing:
//! - Diagnostics (parse errors)
//! - Completions (property keys from the file's schema, gated on the
//!   project's framework versions)

mod config;
mod position;
mod project;
mod server;

pub use config::{
    JsconfUserConfig, LoadConfigError, config_path, load_config, load_config_from,
    load_config_or_default,
};
pub use project::{ProjectContexts, find_package_json};
pub use server::{JsconfLanguageServer, run};
