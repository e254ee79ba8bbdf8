//! Shared helpers for the storage and serial adapters.

/// Returns `true` if `name` is a FAT 8.3 short name: a 1–8 character stem,
/// optionally followed by `.` and a 1–3 character extension, using only
/// uppercase letters, digits and `_`/`-`.
///
/// The SD card is formatted FAT without long file name support.
pub(super) fn is_short_file_name(name: &str) -> bool {
    let valid = |part: &str, max: usize| {
        (1..=max).contains(&part.len())
            && part
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
    };
    match name.split_once('.') {
        Some((stem, ext)) => valid(stem, 8) && valid(ext, 3),
        None => valid(name, 8),
    }
}

/// Milliseconds left of a `budget_ms` wait that began at `started_us`
/// (microsecond timestamps). `None` once the budget is spent.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(super) fn remaining_ms(started_us: i64, now_us: i64, budget_ms: u32) -> Option<u32> {
    let elapsed_ms = (now_us.saturating_sub(started_us) / 1_000).max(0);
    let left = i64::from(budget_ms) - elapsed_ms;
    (left > 0).then(|| left as u32)
}
