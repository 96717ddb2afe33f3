//! Command modules for the `gcmap` binary.

pub mod contact;
