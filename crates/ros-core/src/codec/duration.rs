//! RouterOS time values
//!
//! Input accepts a sequence of `<integer><unit>` tokens with units `w`, `d`,
//! `h`, `m`/`M` (minutes), `s`, `ms`; a bare integer is seconds. The
//! clock form `HH:MM:SS` printed by older firmware is accepted as well.
//! Output is always the compact token form (`1h30m`, `500ms`, `0s`).

use chrono::TimeDelta;

/// Parse a time value
pub fn parse(input: &str) -> Result<TimeDelta, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    if input.contains(':') {
        return parse_clock(input);
    }

    let bytes = input.as_bytes();
    let mut total = TimeDelta::zero();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if start == i {
            return Err(format!("expected number at offset {} in {:?}", start, input));
        }
        let amount: i64 = input[start..i]
            .parse()
            .map_err(|e| format!("invalid number in {:?}: {}", input, e))?;

        let unit = if input[i..].starts_with("ms") {
            i += 2;
            "ms"
        } else if i < bytes.len() && !bytes[i].is_ascii() {
            return Err(format!("unknown time unit in {:?}", input));
        } else if i < bytes.len() {
            i += 1;
            &input[i - 1..i]
        } else {
            "s"
        };

        let part = match unit {
            "ms" => TimeDelta::try_milliseconds(amount),
            "s" => TimeDelta::try_seconds(amount),
            "m" | "M" => TimeDelta::try_minutes(amount),
            "h" => TimeDelta::try_hours(amount),
            "d" => TimeDelta::try_days(amount),
            "w" => TimeDelta::try_weeks(amount),
            other => return Err(format!("unknown time unit {:?} in {:?}", other, input)),
        }
        .ok_or_else(|| format!("duration out of range: {:?}", input))?;

        total = total
            .checked_add(&part)
            .ok_or_else(|| format!("duration out of range: {:?}", input))?;
    }

    Ok(total)
}

fn parse_clock(input: &str) -> Result<TimeDelta, String> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected HH:MM:SS, got {:?}", input));
    }

    let mut seconds: i64 = 0;
    for part in parts {
        let n: i64 = part
            .parse()
            .map_err(|_| format!("expected HH:MM:SS, got {:?}", input))?;
        seconds = seconds * 60 + n;
    }

    TimeDelta::try_seconds(seconds).ok_or_else(|| format!("duration out of range: {:?}", input))
}

/// Render a duration in compact token form
pub fn format(duration: TimeDelta) -> String {
    let mut ms = duration.num_milliseconds();
    if ms == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    if ms < 0 {
        out.push('-');
        ms = -ms;
    }

    const UNITS: &[(i64, &str)] = &[
        (7 * 24 * 3600 * 1000, "w"),
        (24 * 3600 * 1000, "d"),
        (3600 * 1000, "h"),
        (60 * 1000, "m"),
        (1000, "s"),
        (1, "ms"),
    ];

    for (size, unit) in UNITS {
        if ms >= *size {
            out.push_str(&format!("{}{}", ms / size, unit));
            ms %= size;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse("1h").unwrap().num_seconds(), 3600);
        assert_eq!(parse("3600s").unwrap().num_seconds(), 3600);
        assert_eq!(parse("3600").unwrap().num_seconds(), 3600);
        assert_eq!(parse("1h30m").unwrap().num_seconds(), 5400);
        assert_eq!(parse("90M").unwrap().num_seconds(), 5400);
        assert_eq!(parse("1w1d").unwrap().num_seconds(), 8 * 86400);
        assert_eq!(parse("1s500ms").unwrap().num_milliseconds(), 1500);
        assert_eq!(parse("01:00:00").unwrap().num_seconds(), 3600);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("").is_err());
        assert!(parse("h").is_err());
        assert!(parse("5y").is_err());
        assert!(parse("1:2").is_err());
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format(TimeDelta::seconds(3600)), "1h");
        assert_eq!(format(TimeDelta::seconds(5400)), "1h30m");
        assert_eq!(format(TimeDelta::milliseconds(1500)), "1s500ms");
        assert_eq!(format(TimeDelta::zero()), "0s");
        assert_eq!(format(TimeDelta::days(8)), "1w1d");
    }
}
