//! Native messaging host.
//!
//! The browser talks to the host over stdin/stdout using length-prefixed JSON
//! frames. Each request opens a URL in one of the stored profiles.

mod channel;
mod framing;
mod launcher;

pub use channel::{CommandChannel, DEFAULT_PROFILE_DIRECTORY};
pub use framing::{read_frame, write_frame, Frame, FrameError, MAX_FRAME_LEN};
pub use launcher::{BrowserLauncher, ChromeLauncher, LaunchError};
