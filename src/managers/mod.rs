// SmartMark state managers
// Managers own mutable client-side state: the signed-in session and the local bookmark list.

pub mod bookmark_manager;
pub mod session_manager;
