//! Identifier Space
//!
//! Every node and every object key maps into one fixed-width identifier space
//! (40 digits, base 16). Ownership of a key follows identifier proximity:
//!
//! - **Hashing**: `Id::hash` maps an arbitrary key into the space.
//! - **Ownership**: `Id::better_choice` decides which of two node identifiers
//!   is the more appropriate root for a hashed key. The longest shared digit
//!   prefix wins, ties fall to the smaller wrap-around digit distance.

pub mod id;

pub use id::{BASE, DIGITS, Id, IdParseError};
