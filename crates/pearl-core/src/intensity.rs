/// Number of distinct intensity levels, zero included.
pub const LEVEL_COUNT: usize = 5;

pub const MAX_LEVEL: u8 = 4;

/// Buckets `count` relative to `max_count` into a level 0-4.
///
/// Zero counts (or a zero maximum) are level 0. Otherwise the ratio falls
/// into one of four equal bands whose upper edges are inclusive, so a ratio
/// of exactly 0.5 is level 2 and the maximum itself is always level 4.
pub fn classify(count: u64, max_count: u64) -> u8 {
    if count == 0 || max_count == 0 {
        return 0;
    }

    let ratio = count as f64 / max_count as f64;
    if ratio <= 0.25 {
        1
    } else if ratio <= 0.50 {
        2
    } else if ratio <= 0.75 {
        3
    } else {
        MAX_LEVEL
    }
}
