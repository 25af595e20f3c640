//! Duration estimation and formatting for fill/drain operations

/// Estimate the total duration of an operation in seconds.
///
/// `total_liters` is converted to milliliters, divided by the volume flowing
/// per interval to get the number of intervals, then multiplied by the
/// interval length. Returns `None` when any input is non-finite, the volume
/// is negative, or either rate component is not strictly positive.
pub fn estimate_total_seconds(
    total_liters: f64,
    flow_volume_ml: f64,
    interval_seconds: f64,
) -> Option<f64> {
    if !total_liters.is_finite() || !flow_volume_ml.is_finite() || !interval_seconds.is_finite() {
        return None;
    }
    if total_liters < 0.0 || flow_volume_ml <= 0.0 || interval_seconds <= 0.0 {
        return None;
    }

    Some(total_liters * 1000.0 / flow_volume_ml * interval_seconds)
}

/// Format a duration in seconds as a compact human-readable string,
/// e.g. `"1 h 01 min 01 sec"` or `"45 sec"`.
///
/// Zero components are omitted. Once a higher unit is shown, the lower units
/// that follow are zero-padded to two digits. Negative or non-finite input
/// renders as the zero duration.
pub fn format_duration(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds < 0.0 {
        return "0 sec".to_string();
    }

    let mut seconds = total_seconds.floor() as u64;
    let days = seconds / 86400;
    seconds %= 86400;
    let hours = seconds / 3600;
    seconds %= 3600;
    let minutes = seconds / 60;
    let secs = seconds % 60;

    let mut parts: Vec<String> = Vec::new();

    if days > 0 {
        parts.push(format!("{} jour{}", days, if days > 1 { "s" } else { "" }));
    }
    if hours > 0 {
        parts.push(format!("{} h", hours));
    }
    if minutes > 0 {
        if days > 0 || hours > 0 {
            parts.push(format!("{:02} min", minutes));
        } else {
            parts.push(format!("{} min", minutes));
        }
    }
    if secs > 0 || parts.is_empty() {
        if days > 0 || hours > 0 || minutes > 0 {
            parts.push(format!("{:02} sec", secs));
        } else {
            parts.push(format!("{} sec", secs));
        }
    }

    parts.join(" ")
}

/// Two-line variant: the day count on its own line (always present, even as
/// `"0 jour"`), then hours, minutes and seconds zero-padded and always shown.
pub fn format_duration_lines(total_seconds: f64) -> [String; 2] {
    let total = if total_seconds.is_finite() && total_seconds >= 0.0 {
        total_seconds.floor() as u64
    } else {
        0
    };

    let days = total / 86400;
    let rest = total % 86400;
    let hours = rest / 3600;
    let minutes = (rest % 3600) / 60;
    let secs = rest % 60;

    [
        format!("{} jour{}", days, if days > 1 { "s" } else { "" }),
        format!("{:02} h {:02} min {:02} sec", hours, minutes, secs),
    ]
}
