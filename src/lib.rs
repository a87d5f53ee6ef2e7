// Mix Browser shell library entry point.
// Everything except `host` is pure logic with no Tauri imports and is
// tested headless; the Tauri binding sits behind the `tauri-host` feature.

pub mod config;
pub mod error;
pub mod settings;
pub mod shell;
pub mod state;
pub mod store;

// Pure logic modules
pub mod modules;

#[cfg(feature = "tauri-host")]
pub mod host;

pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use shell::Shell;
pub use state::{NavState, ShellEvent, Tab, TabId};
