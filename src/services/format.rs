//! Display formatting for usage snapshots.
//!
//! Both functions are pure: the current time is always an argument.

/// Rendered for an expiry of 0 (the client never expires).
pub const UNBOUNDED: &str = "∞";

/// Rendered once the expiry instant has been reached.
pub const EXPIRED: &str = "Expired";

const BYTES_PER_GIB: u128 = 1 << 30;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Render a byte count as gibibytes with exactly two decimals.
///
/// Rounds half away from zero on the exact quotient, so `1073741824` becomes
/// `"1.00"` and `5368709` (0.005 GiB, just under) becomes `"0.00"`.
/// Negative counts keep their sign, including `"-0.00"` for tiny magnitudes.
pub fn format_gigabytes(bytes: i64) -> String {
    let magnitude = u128::from(bytes.unsigned_abs());
    let hundredths = (magnitude * 100 + BYTES_PER_GIB / 2) / BYTES_PER_GIB;
    let sign = if bytes < 0 { "-" } else { "" };

    format!("{}{}.{:02}", sign, hundredths / 100, hundredths % 100)
}

/// Render an absolute expiry (epoch ms) relative to `now_ms`.
///
/// - `0` renders as [`UNBOUNDED`].
/// - Any instant at or before `now_ms` renders as [`EXPIRED`]. The panel's
///   negative "start on first use" durations land here too.
/// - Otherwise `"{d}d {h}h {m}m {s}s"` with days unbounded and the smaller
///   units taken modulo their period. Sub-second remainders are dropped.
pub fn format_expiry(expiry_ms: i64, now_ms: i64) -> String {
    if expiry_ms == 0 {
        return UNBOUNDED.to_string();
    }
    if expiry_ms <= now_ms {
        return EXPIRED.to_string();
    }

    let remaining = expiry_ms.saturating_sub(now_ms);
    let days = remaining / MS_PER_DAY;
    let hours = (remaining % MS_PER_DAY) / MS_PER_HOUR;
    let minutes = (remaining % MS_PER_HOUR) / MS_PER_MINUTE;
    let seconds = (remaining % MS_PER_MINUTE) / MS_PER_SECOND;

    format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
}
