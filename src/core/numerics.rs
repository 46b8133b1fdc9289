/// Round to the nearest multiple of `step`, then scrub accumulated float
/// noise at the tenth decimal so step arithmetic stays stable.
pub fn round_to_step(x: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return x;
    }
    ((x / step).round() * step * 1e10).round() / 1e10
}

/// Truncate toward zero at `decimals` places, operating on the shortest
/// decimal rendering so binary representation noise cannot round up.
pub fn truncate_float(x: f64, decimals: i32) -> f64 {
    if decimals <= 0 {
        return x.trunc();
    }
    let s = format!("{}", x);
    match s.find('.') {
        Some(dot) => {
            let end = (dot + 1 + decimals as usize).min(s.len());
            s[..end].parse().unwrap_or(x)
        }
        None => x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_step() {
        assert_eq!(round_to_step(0.123_456, 0.001), 0.123);
        assert_eq!(round_to_step(0.123_6, 0.001), 0.124);
        assert_eq!(round_to_step(2.5, 0.1), 2.5);
        assert_eq!(round_to_step(100.0, 1.0), 100.0);
    }

    #[test]
    fn step_noise_is_scrubbed() {
        // 0.1 + 0.2 style artifacts must not survive
        assert_eq!(round_to_step(0.3, 0.1), 0.3);
        assert_eq!(round_to_step(29_345.67, 0.01), 29_345.67);
    }

    #[test]
    fn zero_step_is_identity() {
        assert_eq!(round_to_step(1.234, 0.0), 1.234);
    }

    #[test]
    fn truncates_toward_zero() {
        assert_eq!(truncate_float(4.56789, 2), 4.56);
        assert_eq!(truncate_float(4.56, 2), 4.56);
        assert_eq!(truncate_float(-1.239, 2), -1.23);
        assert_eq!(truncate_float(123.9, 0), 123.0);
    }

    #[test]
    fn truncate_handles_short_fractions() {
        assert_eq!(truncate_float(7.5, 4), 7.5);
        assert_eq!(truncate_float(42.0, 2), 42.0);
    }
}
