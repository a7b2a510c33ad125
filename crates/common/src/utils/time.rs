use chrono::{DateTime, Utc};
use std::time::Instant;

/// The current UTC time, used to stamp fetched storage.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds elapsed since `start`, saturating at `u64::MAX`.
///
/// ```
/// use slotscope_common::utils::time::elapsed_millis;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// assert!(elapsed_millis(start) < 1_000);
/// ```
pub fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use crate::utils::time::*;

    #[test]
    fn test_now_utc_is_monotonic_enough() {
        let a = now_utc();
        let b = now_utc();
        assert!(b >= a);
    }
}
