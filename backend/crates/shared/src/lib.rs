//! Shared Kernel
//!
//! Vocabulary shared by every backend crate:
//! - Error classification and the wire-level error type
//! - Typed identifiers
//!
//! Only things whose meaning is stable across domains belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
