//! Session clock
//!
//! Время сессии хранится как `Duration` (целые наносекунды), как у bevy `Time`.
//! Возраст снаряда и cooldown считаются точной разностью двух моментов.

use std::time::Duration;

/// Секунды (config, frame dt) → `Duration`. NaN и отрицательные дают ноль.
pub fn seconds(value: f32) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f32(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_clamps_invalid_values() {
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f32::NAN), Duration::ZERO);
        assert_eq!(seconds(f32::INFINITY), Duration::MAX);
        assert_eq!(seconds(2.0), Duration::from_secs(2));
    }

    #[test]
    fn test_frame_sum_reaches_lifetime_exactly() {
        // 120 кадров по 1/60 дают не меньше 2 секунд, без f32 накопления
        let frame = seconds(1.0 / 60.0);
        let total: Duration = (0..120).map(|_| frame).sum();
        assert!(total >= seconds(2.0));
        assert!(total - frame < seconds(2.0));
    }
}
