//! Pure metric functions for timed skill trials.
//!
//! Everything here is total: empty sequences and zero denominators yield
//! zero-valued results rather than errors, so callers never have to guard
//! degenerate data themselves.

/// Standard second value: the SMV expressed in seconds.
pub fn ssv(smv: f64) -> f64 {
    smv * 60.0
}

/// Arithmetic mean of the timer readings, 0 for an empty trial.
pub fn average_time(timer_values: &[f64]) -> f64 {
    if timer_values.is_empty() {
        return 0.0;
    }
    timer_values.iter().sum::<f64>() / timer_values.len() as f64
}

/// Efficiency percentage; may exceed 100 when the worker beats the standard.
pub fn efficiency(ssv: f64, avg_time: f64) -> f64 {
    if avg_time > 0.0 {
        ssv / avg_time * 100.0
    } else {
        0.0
    }
}

/// First-time-through percentage over the runs actually timed.
pub fn ftt(good_garments: u32, timers_run: usize) -> f64 {
    if timers_run > 0 {
        f64::from(good_garments) / timers_run as f64 * 100.0
    } else {
        0.0
    }
}

/// Skill level 1-4 from FTT and efficiency.
///
/// Anything below a perfect FTT is level 1 regardless of efficiency; the
/// comparison is exact equality with 100, not `>= 100`. 99.99% FTT is level 1.
pub fn skill_level(ftt: f64, efficiency: f64) -> u8 {
    if ftt == 100.0 {
        if efficiency < 40.0 {
            1
        } else if efficiency < 60.0 {
            2
        } else if efficiency < 80.0 {
            3
        } else {
            4
        }
    } else {
        1
    }
}

/// Display label for the four fixed skill tiers.
pub fn skill_level_label(level: u8) -> &'static str {
    match level {
        1 => "Beginner",
        2 => "Intermediate",
        3 => "Advanced",
        4 => "Expert",
        _ => "Unknown",
    }
}

/// Chart/badge color for the four fixed skill tiers.
pub fn skill_level_color(level: u8) -> &'static str {
    match level {
        1 => "#F44336",
        2 => "#FF9800",
        3 => "#2196F3",
        4 => "#4CAF50",
        _ => "#9E9E9E",
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.2}%")
}

/// Seconds under a minute render as `12.34s`, otherwise `2m 5s`.
pub fn format_time(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.2}s")
    } else {
        let minutes = (seconds / 60.0).floor();
        let remaining = seconds % 60.0;
        format!("{minutes:.0}m {remaining:.0}s")
    }
}
