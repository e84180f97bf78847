//! Session directory for Lobbyforge.
//!
//! Knows which player identity each live connection registered. It
//! knows nothing about rooms.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← stores the profiles it is handed as room members
//!     ↕
//! Session Layer (this crate)  ← connection → player profile
//!     ↕
//! Protocol Layer (below)  ← provides ConnectionId
//! ```

mod directory;
mod error;
mod profile;

pub use directory::SessionDirectory;
pub use error::SessionError;
pub use profile::PlayerProfile;
