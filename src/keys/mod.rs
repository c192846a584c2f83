//! Master key material.
//!
//! The master key that keys every recovery attempt is rebuilt from four
//! embedded fragments. The fragment transforms are fixed and public;
//! they provide no secrecy.

pub mod fragments;
mod master;

pub use fragments::FragmentError;
pub use master::{Fragment, MasterKey};
