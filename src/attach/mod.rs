//! Rendering surface attachment
//!
//! Any number of surfaces can be attached to a session. Each one shows one
//! rendered element per registered track for as long as it stays attached,
//! and is updated as tracks are added, removed or end.

pub mod manager;
pub mod renderer;

pub use manager::AttachmentManager;
pub use renderer::{Detached, Renderer, Target};
