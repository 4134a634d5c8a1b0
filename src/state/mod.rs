/// State management module
///
/// This module handles all screen state, including:
/// - Shared data structures (data.rs)
/// - The session state machine driving the screen (session.rs)

pub mod data;
pub mod session;
