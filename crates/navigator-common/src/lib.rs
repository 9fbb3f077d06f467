//! Common helpers for the Navigator explorer API.
//!
//! Identifier validation for user-supplied hashes and panic-free field
//! slicing for the fixed-width host contract file format.

pub mod fields;
pub mod validate;

pub use fields::fixed_field;
pub use validate::is_safe_identifier;
