pub mod app;
pub mod state;
pub mod view;

// Re-export the pieces the binary wires together.
pub use app::{run, Command};
pub use state::{AppState, LoginResult, ShellContext};
pub use view::{TerminalView, View};
