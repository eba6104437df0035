//! Source format readers.

#[cfg(feature = "ifc")]
pub mod ifc;

#[cfg(feature = "assembly")]
pub mod assembly;
