//! Builder API for assembling machine descriptions.
//!
//! [`MachineBuilder`] is the fluent form, [`machine!`](crate::machine!) the
//! declarative one. Both produce a [`MachineDescription`](crate::machine::MachineDescription)
//! and reject malformed guards up front instead of dropping them at runtime.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
