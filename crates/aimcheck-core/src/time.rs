/// Milliseconds since the Unix epoch from the wall clock (0 if the clock is
/// set before the epoch).
pub fn unix_millis() -> u64 {
    let dur = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}
