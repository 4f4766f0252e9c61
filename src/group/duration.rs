// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::time::Duration;

use crate::error::ValueError;

/// Fade duration used when none is spoken.
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_secs(120);

/// Parses a spoken ISO-8601 duration such as `PT2M10S`.
///
/// Days, hours, minutes and seconds are accepted; seconds may carry a
/// fraction. A missing or blank value gives [`DEFAULT_FADE_DURATION`].
///
/// # Errors
///
/// Returns `ValueError::InvalidDuration` if the value is not an ISO-8601
/// duration, uses years or months, or is zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use lumenctl::group::parse_spoken_duration;
///
/// assert_eq!(parse_spoken_duration(Some("PT1M30S")).unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_spoken_duration(None).unwrap(), Duration::from_secs(120));
/// assert!(parse_spoken_duration(Some("ten seconds")).is_err());
/// ```
pub fn parse_spoken_duration(value: Option<&str>) -> Result<Duration, ValueError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(DEFAULT_FADE_DURATION);
    };
    let invalid = || ValueError::InvalidDuration(value.to_string());

    let rest = value
        .strip_prefix('P')
        .or_else(|| value.strip_prefix('p'))
        .ok_or_else(invalid)?;
    let (date, time) = match rest.find(['T', 't']) {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };

    let mut millis: u64 = 0;
    let mut components = 0;
    for (number, unit) in components_of(date).ok_or_else(invalid)? {
        let factor = match unit {
            'D' => 86_400_000,
            'W' => 7 * 86_400_000,
            _ => return Err(invalid()),
        };
        millis = add_component(millis, number, factor, false).ok_or_else(invalid)?;
        components += 1;
    }
    if let Some(time) = time {
        if time.is_empty() {
            return Err(invalid());
        }
        for (number, unit) in components_of(time).ok_or_else(invalid)? {
            let (factor, fraction) = match unit {
                'H' => (3_600_000, false),
                'M' => (60_000, false),
                'S' => (1000, true),
                _ => return Err(invalid()),
            };
            millis = add_component(millis, number, factor, fraction).ok_or_else(invalid)?;
            components += 1;
        }
    }

    if components == 0 || millis == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_millis(millis))
}

/// Splits `5H30M` into `[("5", 'H'), ("30", 'M')]`.
fn components_of(part: &str) -> Option<Vec<(&str, char)>> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in part.char_indices() {
        if c.is_ascii_digit() || c == '.' || c == ',' {
            continue;
        }
        let number = &part[start..i];
        if number.is_empty() {
            return None;
        }
        out.push((number, c.to_ascii_uppercase()));
        start = i + c.len_utf8();
    }
    // trailing digits without a unit
    if start != part.len() {
        return None;
    }
    Some(out)
}

fn add_component(total: u64, number: &str, factor: u64, fraction: bool) -> Option<u64> {
    let number = number.replace(',', ".");
    let value = match number.split_once('.') {
        None => number.parse::<u64>().ok()?.checked_mul(factor)?,
        Some((whole, frac)) if fraction => {
            let whole = if whole.is_empty() { 0 } else { whole.parse::<u64>().ok()? };
            let digits: String = frac.chars().take(3).collect();
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let scale = 10_u64.pow(u32::try_from(digits.len()).ok()?);
            let frac = digits.parse::<u64>().ok()? * factor / scale;
            whole.checked_mul(factor)?.checked_add(frac)?
        }
        Some(_) => return None,
    };
    total.checked_add(value)
}

/// Renders a duration the way it is read back to the user, such as
/// `"1 minute and 20 seconds"`.
#[must_use]
pub fn describe_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let parts: Vec<String> = [
        (total / 3600, "hour"),
        (total % 3600 / 60, "minute"),
        (total % 60, "second"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, unit)| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    })
    .collect();

    match parts.as_slice() {
        [] => "0 seconds".to_string(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Result<Duration, ValueError> {
        parse_spoken_duration(Some(value))
    }

    #[test]
    fn spoken_durations() {
        assert_eq!(parse("PT10S").unwrap(), Duration::from_secs(10));
        assert_eq!(parse("PT2M").unwrap(), Duration::from_secs(120));
        assert_eq!(parse("PT1M20S").unwrap(), Duration::from_secs(80));
        assert_eq!(parse("PT2M30S").unwrap(), Duration::from_secs(150));
        assert_eq!(parse("PT1H").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse("P1DT1S").unwrap(), Duration::from_secs(86_401));
        assert_eq!(parse("pt5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse("PT1.5S").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn missing_duration_uses_default() {
        assert_eq!(parse_spoken_duration(None).unwrap(), DEFAULT_FADE_DURATION);
        assert_eq!(parse_spoken_duration(Some(" ")).unwrap(), DEFAULT_FADE_DURATION);
    }

    #[test]
    fn invalid_durations() {
        for value in ["10", "PT", "P", "PTS", "PT10", "P1M", "PT1.5M", "PT0S", "two minutes", "PT-5S"] {
            assert!(
                matches!(parse(value), Err(ValueError::InvalidDuration(ref v)) if v == value),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn describe() {
        assert_eq!(describe_duration(Duration::from_secs(10)), "10 seconds");
        assert_eq!(describe_duration(Duration::from_secs(120)), "2 minutes");
        assert_eq!(describe_duration(Duration::from_secs(80)), "1 minute and 20 seconds");
        assert_eq!(
            describe_duration(Duration::from_secs(3661)),
            "1 hour, 1 minute and 1 second"
        );
    }
}
