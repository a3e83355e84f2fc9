//! The recurrence object model.
//!
//! # Specification
//!
//! The textual grammar follows [RFC 5545](https://datatracker.ietf.org/doc/html/rfc5545)
//! §3.3.10 and §3.8.5.3, extended for non-Gregorian recurrence in the
//! spirit of [RFC 7529](https://datatracker.ietf.org/doc/html/rfc7529):
//! a `CALENDAR` parameter naming the Hijri back-end on DTSTART, and the
//! RFC 7529 `SKIP` rule part governing days that do not exist in a
//! target month.
//!
//! All date values here are Hijri; conversion to and from the civil
//! (Gregorian) calendar happens at the [`crate::cal`] boundary.

pub mod date;
pub mod options;
pub mod rrule;
