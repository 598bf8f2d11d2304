//! External collaborators used by the sync workflow

pub mod likes_client;
pub mod rekordbox_guard;

pub use likes_client::{LikesSource, TsvLikesSource, YtDlpLikesSource};
pub use rekordbox_guard::ensure_rekordbox_closed;
