// SmartMark shared type definitions
// Each submodule defines plain data used across managers, services and the RPC layer.

pub mod bookmark;
pub mod credential;
pub mod errors;
pub mod session;
pub mod settings;
