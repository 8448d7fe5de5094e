//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (nosniff, frame and referrer policy)
//!     → Send to client
//! ```
//!
//! Path containment lives in `storage::resolver`, credential checks in `auth`.

pub mod headers;
