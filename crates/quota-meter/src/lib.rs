//! Rolling-window usage accounting for metered external resources.
//!
//! A [`QuotaMeter`] guards one resource (speech minutes, translated characters, ...)
//! with a hard cap per accounting window. Reservation is a single atomic
//! check-and-commit; there is no way to check without committing.

mod meter;
pub mod window;

pub use meter::{QuotaMeter, QuotaSnapshot};
pub use window::{QuotaUnit, QuotaWindow, DEFAULT_WINDOW_DAYS};
