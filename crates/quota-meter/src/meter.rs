use crate::window::{QuotaUnit, QuotaWindow, DEFAULT_WINDOW_DAYS};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Process-wide usage meter for one metered resource.
///
/// All state sits behind a single lock, held only for the check-and-commit
/// of one reservation. Never hold it across a call to the metered service.
pub struct QuotaMeter {
	name: String,
	unit: QuotaUnit,
	window: Mutex<QuotaWindow>,
}

/// Point-in-time view of a meter, for metrics and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaSnapshot {
	pub name: String,
	pub unit: QuotaUnit,
	pub used: u64,
	pub cap: u64,
	pub window_start: DateTime<Utc>,
}

impl QuotaSnapshot {
	#[must_use]
	pub const fn remaining(&self) -> u64 {
		self.cap.saturating_sub(self.used)
	}
}

impl QuotaMeter {
	#[must_use]
	pub fn new(name: impl Into<String>, unit: QuotaUnit, cap: u64) -> Self {
		Self::with_window(name, unit, cap, Duration::days(DEFAULT_WINDOW_DAYS))
	}

	#[must_use]
	pub fn with_window(name: impl Into<String>, unit: QuotaUnit, cap: u64, length: Duration) -> Self {
		Self {
			name: name.into(),
			unit,
			window: Mutex::new(QuotaWindow::new(cap, length, Utc::now())),
		}
	}

	/// Atomically reserve `amount` units. Returns false, with no side effects,
	/// when the reservation would push usage over the cap.
	pub async fn try_reserve(&self, amount: u64) -> bool {
		self.try_reserve_at(amount, Utc::now()).await
	}

	pub async fn try_reserve_at(&self, amount: u64, now: DateTime<Utc>) -> bool {
		let mut window = self.window.lock().await;

		if window.roll(now) {
			info!(quota = %self.name, "Quota window expired, usage reset");
		}

		let granted = window.reserve(amount, now);
		if granted {
			debug!(quota = %self.name, unit = %self.unit, amount, used = window.used(), cap = window.cap(), "Quota reserved");
		} else {
			warn!(quota = %self.name, unit = %self.unit, requested = amount, used = window.used(), cap = window.cap(), "Quota reservation denied");
		}

		granted
	}

	pub async fn snapshot(&self) -> QuotaSnapshot {
		let window = self.window.lock().await;
		QuotaSnapshot {
			name: self.name.clone(),
			unit: self.unit,
			used: window.used(),
			cap: window.cap(),
			window_start: window.window_start(),
		}
	}

	pub async fn used(&self) -> u64 {
		self.window.lock().await.used()
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub const fn unit(&self) -> QuotaUnit {
		self.unit
	}
}

impl std::fmt::Debug for QuotaMeter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QuotaMeter").field("name", &self.name).field("unit", &self.unit).finish_non_exhaustive()
	}
}
