//! Excel serial date conversion and ISO-8601 helpers.
//!
//! Excel serials count days since 1899-12-30 (1900 system, with the phantom
//! 1900-02-29 at serial 60) or since 1904-01-01 (1904 system). Conversions go
//! through Julian Day Numbers in the proleptic Gregorian calendar.

/// Calendar components of a date or datetime value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Whether the source value carried a time-of-day portion.
    pub has_time: bool,
}

impl DateParts {
    /// Render as "YYYY-MM-DD" or "YYYY-MM-DDTHH:MM:SS" depending on `has_time`.
    pub fn to_iso(self) -> String {
        if self.has_time {
            format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                self.year, self.month, self.day, self.hour, self.minute, self.second
            )
        } else {
            format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
        }
    }
}

/// Convert an Excel serial date to calendar components.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn serial_to_parts(serial: f64, date1904: bool) -> DateParts {
    let days = serial.floor() as i32;
    let time_frac = serial.fract().abs();

    // Excel 1900 system: serial 1 = Jan 1, 1900 = JDN 2415021, but Excel
    // treats 1900 as a leap year, so serial 60 is the phantom Feb 29.
    let jdn = if date1904 {
        days + 2_416_481
    } else if days <= 60 {
        days + 2_415_020
    } else {
        days + 2_415_019
    };

    let (year, month, day) = jdn_to_ymd(jdn);

    let total_seconds = (time_frac * 86400.0).round() as u32;
    let hour = total_seconds / 3600;
    let minute = (total_seconds % 3600) / 60;
    let second = total_seconds % 60;

    DateParts {
        year,
        month,
        day,
        hour,
        minute,
        second,
        has_time: time_frac > 0.0 || hour + minute + second > 0,
    }
}

/// Convert calendar components to an Excel serial date.
pub fn parts_to_serial(parts: DateParts, date1904: bool) -> f64 {
    let jdn = ymd_to_jdn(parts.year, parts.month, parts.day);
    let days = if date1904 {
        jdn - 2_416_481
    } else if jdn >= 2_415_080 {
        // On or after 1900-03-01: account for the phantom Feb 29.
        jdn - 2_415_019
    } else {
        jdn - 2_415_020
    };
    let frac =
        f64::from(parts.hour * 3600 + parts.minute * 60 + parts.second) / 86400.0;
    f64::from(days) + frac
}

/// Convert Julian Day Number to (year, month, day) in the proleptic Gregorian calendar.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn jdn_to_ymd(jdn: i32) -> (i32, u32, u32) {
    let y = 4716;
    let j = 1401;
    let m = 2;
    let n = 12;
    let r = 4;
    let p = 1461;
    let v = 3;
    let u = 5;
    let s = 153;
    let w = 2;
    let b = 274_277;
    let c = -38;

    let jdn_i64 = i64::from(jdn);

    let f = jdn_i64 + j + (((4 * jdn_i64 + b) / 146_097) * 3) / 4 + c;
    let e = r * f + v;
    let g = (e % p) / r;
    let h = u * g + w;

    let day = (h % s) / u + 1;
    let month = ((h / s + m) % n) + 1;
    let year = (e / p) - y + (n + m - month) / n;

    (year as i32, month as u32, day as u32)
}

/// Convert (year, month, day) to a Julian Day Number.
#[allow(clippy::cast_possible_wrap)]
fn ymd_to_jdn(year: i32, month: u32, day: u32) -> i32 {
    let y = i64::from(year);
    let m = i64::from(month);
    let d = i64::from(day);

    let a = (14 - m) / 12;
    let yy = y + 4800 - a;
    let mm = m + 12 * a - 3;

    let jdn = d + (153 * mm + 2) / 5 + 365 * yy + yy / 4 - yy / 100 + yy / 400 - 32045;
    #[allow(clippy::cast_possible_truncation)]
    {
        jdn as i32
    }
}

/// Parse an ISO-8601 date ("2026-01-15") or datetime ("2026-01-15T10:30:45").
pub fn parse_iso(text: &str) -> Option<DateParts> {
    let text = text.trim();
    let (date_part, time_part) = match text.split_once(['T', ' ']) {
        Some((d, t)) => (d, Some(t)),
        None => (text, None),
    };

    let mut fields = date_part.split('-');
    let year: i32 = fields.next()?.parse().ok()?;
    let month: u32 = fields.next()?.parse().ok()?;
    let day: u32 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let mut parts = DateParts {
        year,
        month,
        day,
        hour: 0,
        minute: 0,
        second: 0,
        has_time: false,
    };

    if let Some(time) = time_part {
        let mut fields = time.split(':');
        parts.hour = fields.next()?.parse().ok()?;
        parts.minute = fields.next()?.parse().ok()?;
        // Seconds are optional in some producers' output.
        parts.second = match fields.next() {
            Some(s) => s.parse().ok()?,
            None => 0,
        };
        if parts.hour > 23 || parts.minute > 59 || parts.second > 59 {
            return None;
        }
        parts.has_time = true;
    }

    Some(parts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn serial_round_trip_modern_date() {
        let parts = parse_iso("2026-02-04").unwrap();
        let serial = parts_to_serial(parts, false);
        let back = serial_to_parts(serial, false);
        assert_eq!(back.to_iso(), "2026-02-04");
    }

    #[test]
    fn serial_round_trip_datetime() {
        let parts = parse_iso("2026-02-04T10:30:45").unwrap();
        let serial = parts_to_serial(parts, false);
        let back = serial_to_parts(serial, false);
        assert_eq!(back.to_iso(), "2026-02-04T10:30:45");
    }

    #[test]
    fn known_serials() {
        // Serial 1 is Jan 1, 1900 in the 1900 system.
        assert_eq!(serial_to_parts(1.0, false).to_iso(), "1900-01-01");
        // Serial 61 is Mar 1, 1900 (after the phantom leap day).
        assert_eq!(serial_to_parts(61.0, false).to_iso(), "1900-03-01");
        // 1904 system: serial 0 is Jan 1, 1904.
        assert_eq!(serial_to_parts(0.0, true).to_iso(), "1904-01-01");
    }

    #[test]
    fn parse_iso_rejects_garbage() {
        assert!(parse_iso("not a date").is_none());
        assert!(parse_iso("2026-13-01").is_none());
        assert!(parse_iso("2026-01-15T25:00:00").is_none());
    }

    #[test]
    fn parse_iso_time_without_seconds() {
        let parts = parse_iso("2026-01-15T10:30").unwrap();
        assert_eq!(parts.second, 0);
        assert!(parts.has_time);
    }
}
