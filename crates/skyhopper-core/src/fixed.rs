use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Cooldown lengths in seconds. Fixed-point so clock math is deterministic.
pub type Seconds = Fixed64;

/// Wall-clock timestamps and durations, in milliseconds.
pub type Millis = u64;

/// Convert an f64 to Seconds. Use only for initialization, never in the tick loop.
#[inline]
pub fn seconds(v: f64) -> Seconds {
    Seconds::from_num(v)
}

/// Convert Seconds to f64. Use only for display.
#[inline]
pub fn seconds_to_f64(v: Seconds) -> f64 {
    v.to_num::<f64>()
}

/// Length of a cooldown of `speed` seconds, in milliseconds.
///
/// Rounded to the nearest millisecond, so decimal speeds like 0.2 s that
/// Q32.32 cannot hold exactly still give 200 ms. Negative speeds clamp to
/// zero.
#[inline]
pub fn cooldown_millis(speed: Seconds) -> Millis {
    if speed <= Seconds::ZERO {
        return 0;
    }
    speed
        .checked_mul(Seconds::from_num(1000))
        .and_then(|ms| ms.checked_round())
        .map_or(Millis::MAX, |ms| ms.to_num::<u64>())
}
