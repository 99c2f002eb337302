//! Injectable time and identifier sources for assertion construction.

// self
use crate::_prelude::*;

/// Supplies the current instant used for `iat`.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Clock pinned to a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub OffsetDateTime);
impl Clock for FixedClock {
	fn now(&self) -> OffsetDateTime {
		self.0
	}
}

/// Supplies `jti` values; each call must return a value never returned before.
pub trait JtiSource
where
	Self: Send + Sync,
{
	/// Returns a fresh identifier.
	fn next_jti(&self) -> String;
}

/// Random 122-bit identifiers in UUID v4 layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomJti;
impl JtiSource for RandomJti {
	fn next_jti(&self) -> String {
		uuid::Builder::from_random_bytes(rand::random()).into_uuid().to_string()
	}
}
