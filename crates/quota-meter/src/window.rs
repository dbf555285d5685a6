use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an accounting period when none is configured.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaUnit {
	Characters,
	Minutes,
}

impl QuotaUnit {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Characters => "characters",
			Self::Minutes => "minutes",
		}
	}
}

impl fmt::Display for QuotaUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Consumption counter over one rolling accounting period.
///
/// The window resets lazily: the first call that observes more than `length`
/// elapsed since `window_start` zeroes `used` and restarts the period at that
/// call's timestamp. `used <= cap` holds after every granted reservation.
#[derive(Debug, Clone)]
pub struct QuotaWindow {
	window_start: DateTime<Utc>,
	used: u64,
	cap: u64,
	length: Duration,
}

impl QuotaWindow {
	#[must_use]
	pub const fn new(cap: u64, length: Duration, now: DateTime<Utc>) -> Self {
		Self {
			window_start: now,
			used: 0,
			cap,
			length,
		}
	}

	/// Restart the period if it has expired. Returns true when a reset happened.
	pub fn roll(&mut self, now: DateTime<Utc>) -> bool {
		if now.signed_duration_since(self.window_start) > self.length {
			self.used = 0;
			self.window_start = now;
			return true;
		}
		false
	}

	/// Commit `amount` if it fits under the cap. A denied reservation leaves
	/// the window untouched.
	pub fn reserve(&mut self, amount: u64, now: DateTime<Utc>) -> bool {
		self.roll(now);

		match self.used.checked_add(amount) {
			Some(total) if total <= self.cap => {
				self.used = total;
				true
			}
			_ => false,
		}
	}

	#[must_use]
	pub const fn used(&self) -> u64 {
		self.used
	}

	#[must_use]
	pub const fn cap(&self) -> u64 {
		self.cap
	}

	#[must_use]
	pub const fn remaining(&self) -> u64 {
		self.cap.saturating_sub(self.used)
	}

	#[must_use]
	pub const fn window_start(&self) -> DateTime<Utc> {
		self.window_start
	}

	#[must_use]
	pub const fn length(&self) -> Duration {
		self.length
	}
}
