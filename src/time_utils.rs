use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Clone, Copy)]
enum ParsedTimezone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_timezone(raw: &str) -> Option<ParsedTimezone> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_uppercase();
    if upper == "UTC" || upper == "GMT" {
        return FixedOffset::east_opt(0).map(ParsedTimezone::Fixed);
    }
    if let Some(offset) = upper.strip_prefix("UTC").or_else(|| upper.strip_prefix("GMT")) {
        return parse_fixed_offset(offset).map(ParsedTimezone::Fixed);
    }

    trimmed.parse::<Tz>().ok().map(ParsedTimezone::Named)
}

pub fn normalize_timezone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let normalized = if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("gmt") {
        "UTC".to_string()
    } else {
        trimmed.to_string()
    };
    parse_timezone(&normalized).map(|_| normalized)
}

/// Calendar date in the portal's timezone. Unknown zones fall back to UTC.
pub fn local_date(raw_tz: &str, utc_dt: DateTime<Utc>) -> NaiveDate {
    match parse_timezone(raw_tz) {
        Some(ParsedTimezone::Named(tz)) => utc_dt.with_timezone(&tz).date_naive(),
        Some(ParsedTimezone::Fixed(offset)) => utc_dt.with_timezone(&offset).date_naive(),
        None => utc_dt.date_naive(),
    }
}

pub fn local_today(raw_tz: &str) -> NaiveDate {
    local_date(raw_tz, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_evening_utc_is_previous_day_in_new_york() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap();
        assert_eq!(
            local_date("America/New_York", utc),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn fixed_offsets_are_accepted() {
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert_eq!(
            local_date("UTC+03:00", utc),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
        assert_eq!(normalize_timezone("gmt").as_deref(), Some("UTC"));
        assert!(normalize_timezone("Nowhere/City").is_none());
    }
}
