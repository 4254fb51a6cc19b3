//! Board evaluation module.
//!
//! Tapered hand-crafted evaluation; see [`hce`] for the term list.

mod hce;

pub use hce::evaluate;
