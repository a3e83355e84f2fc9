//! A [`winnow`]-based parser for the textual recurrence form.
//!
//! The grammar is two logical lines: an optional `DTSTART` line carrying
//! the `CALENDAR` parameter, and an `RRULE` line of `;`-separated
//! `name=value` parts. [`parse_rrule_string`] is the entry point; the
//! individual parsers are exposed for reuse and doc-tested in place.

pub mod primitive;
pub mod rrule;

pub use rrule::parse_rrule_string;
