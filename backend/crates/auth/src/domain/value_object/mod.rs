//! Value Object Module

pub mod fingerprint;
pub mod session_entry;

pub use fingerprint::Fingerprint;
pub use kernel::id::UserId;
pub use session_entry::SessionEntry;
