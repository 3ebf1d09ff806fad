pub mod config;
pub mod dispatch;
pub mod gui;
pub mod host;
pub mod inspector;
pub mod program;
pub mod proxy;
pub mod registry;
pub mod scene;
pub mod shell;
pub mod undo;
pub mod value;
pub mod wizard;

pub use shell::EditorShell;
