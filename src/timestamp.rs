//! Clock-style timestamps: `M:SS`, `H:MM:SS` and the subtitle-file form `HH:MM:SS.mmm`.

/// Render whole seconds as `M:SS`, or `H:MM:SS` once past the hour.
pub fn format_clock(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Parse `H:MM:SS`, `MM:SS`, `90s` or `90` into whole seconds.
pub fn parse_clock(input: &str) -> Option<u64> {
    let input = input.trim();
    let input = input.strip_suffix('s').unwrap_or(input);
    if input.is_empty() {
        return None;
    }

    if input.contains(':') {
        let parts = input
            .split(':')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        return match parts.as_slice() {
            [m, s] => to_secs(0, *m, *s),
            [h, m, s] => to_secs(*h, *m, *s),
            _ => None,
        };
    }

    let secs = input.parse::<f64>().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| secs.floor() as u64)
}

/// Parse a subtitle cue time (`HH:MM:SS.mmm`, `H:MM:SS.mmm` or `MM:SS.mmm`).
///
/// The millisecond part is validated but truncated, never rounded.
pub fn parse_cue_time(input: &str) -> Option<u64> {
    let input = input.trim();
    let (clock, millis) = match input.split_once(['.', ',']) {
        Some((clock, millis)) => (clock, Some(millis)),
        None => (input, None),
    };
    if millis.is_some_and(|m| !is_digits(m)) {
        return None;
    }

    let fields = clock
        .split(':')
        .map(|p| if is_digits(p) { p.parse::<u64>().ok() } else { None })
        .collect::<Option<Vec<_>>>()?;
    match fields.as_slice() {
        [m, s] if *s < 60 => to_secs(0, *m, *s),
        [h, m, s] if *m < 60 && *s < 60 => to_secs(*h, *m, *s),
        _ => None,
    }
}

/// `None` when the total does not fit in a `u64`.
fn to_secs(hours: u64, mins: u64, secs: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(mins.checked_mul(60)?)?
        .checked_add(secs)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
