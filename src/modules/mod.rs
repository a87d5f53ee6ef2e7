// Module exports for pure logic
pub mod commands;    // Sequenced navigation commands
pub mod downloads;   // Download placement and events
pub mod navigation;  // Address-bar resolution
pub mod passwords;   // Password records and CSV
pub mod policy;      // HTTPS-only / DNT request policy
pub mod session;     // Per-view back/forward history
pub mod shortcuts;   // Keyboard shortcut matching
pub mod stats;       // Per-domain visit stats
pub mod tabs;        // Tab registry
pub mod views;       // View lifecycle registry
