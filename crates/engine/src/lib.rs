//! # Dashwire Engine
//!
//! The path-addressing core of Dashwire: pure, synchronous computation over
//! in-memory JSON values with no I/O and no shared state.
//!
//! - [`extract_fields`] flattens an arbitrary JSON document into an ordered
//!   catalog of addressable `(path, type, value)` leaves — the field picker
//!   a user configures widgets from.
//! - [`get_nested_value`] resolves one of those synthetic paths back into a
//!   freshly fetched document, absorbing the ambiguity the underscore-joined
//!   encoding introduces (keys containing `_`, spaces, or leading ordinals).
//! - [`classify`] decides whether a scalar is semantically a timestamp or a
//!   percentage, which drives the type tag the flattener emits.
//! - [`format`] turns resolved values into display strings and never fails.
//!
//! Every path emitted by the flattener resolves back to its recorded value
//! against the same document; the resolver's layered fallbacks keep that
//! true when the live document drifts slightly from the sampled shape.

pub mod classify;
pub mod fields;
pub mod format;
pub mod resolve;

pub use classify::{is_percentage, is_timestamp, is_timestamp_key};
pub use fields::extract_fields;
pub use format::{auto_format, format_currency, format_date, format_number, format_percentage};
pub use resolve::get_nested_value;
