//! AR session orchestration: worker threads and renderer handoff.
//!
//! The session owns the engine bridge and spawns the background workers
//! that keep camera-frame work off the render thread. Results flow back
//! through latest-value mailboxes: the renderer polls, never blocks, and
//! always sees the most recent result.

mod ar_session;
mod mailbox;
mod messages;

pub use ar_session::ArSession;
pub use mailbox::Mailbox;
pub use messages::{FrameMatches, RefineRequest};
