//! Parsers for the text output of the tools the facade shells out to.
//!
//! Columns are split on ASCII whitespace. None of these formats escape
//! embedded whitespace, so paths containing spaces cannot be matched.

pub mod df;
pub mod lsblk;
pub mod mounts;
pub mod sgdisk;
