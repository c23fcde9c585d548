//! Tools for working with time.

use regex::Regex;
use std::fmt;
use std::time::Duration;

use crate::errors::{Error, Result};

/// A point in time, as written in an XSub header: hours, minutes, seconds
/// and milliseconds.
///
/// ```
/// use subpicture::TimeCode;
///
/// let t: TimeCode = "00:01:02.345".parse().unwrap();
/// assert_eq!(t.minutes(), 1);
/// assert_eq!(t.total_milliseconds(), 62_345);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeCode {
    hours: u32,
    minutes: u32,
    seconds: u32,
    milliseconds: u32,
}

impl TimeCode {
    /// Create a new time code.
    pub fn new(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> TimeCode {
        TimeCode { hours, minutes, seconds, milliseconds }
    }

    /// Hours.
    pub fn hours(&self) -> u32 {
        self.hours
    }

    /// Minutes.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Seconds.
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Milliseconds.
    pub fn milliseconds(&self) -> u32 {
        self.milliseconds
    }

    /// The whole time code in milliseconds.
    pub fn total_milliseconds(&self) -> u64 {
        ((u64::from(self.hours) * 60 + u64::from(self.minutes)) * 60
         + u64::from(self.seconds)) * 1000
            + u64::from(self.milliseconds)
    }

    /// The whole time code in seconds.
    pub fn to_seconds(&self) -> f64 {
        cast::f64(self.total_milliseconds()) / 1000.0
    }

    /// The time code as a `Duration` from zero.
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.total_milliseconds())
    }
}

impl std::str::FromStr for TimeCode {
    type Err = Error;

    /// Parse four numbers separated by any mix of `:`, `;`, `.`, `,` and
    /// `-`. Extra fields after the fourth are ignored.
    fn from_str(s: &str) -> Result<TimeCode> {
        lazy_static! {
            static ref SEPARATOR: Regex = Regex::new("[:;.,-]+").unwrap();
        }

        let mut fields = SEPARATOR
            .split(s.trim())
            .filter(|f| !f.is_empty())
            .map(|f| f.parse::<u32>());
        let mut next = || match fields.next() {
            Some(Ok(n)) => Ok(n),
            _ => Err(Error::invalid_time_code(s)),
        };
        Ok(TimeCode {
            hours: next()?,
            minutes: next()?,
            seconds: next()?,
            milliseconds: next()?,
        })
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}.{:03}",
               self.hours, self.minutes, self.seconds, self.milliseconds)
    }
}

#[test]
fn parse_time_codes_with_any_separator() {
    let expected = TimeCode::new(1, 2, 3, 456);
    for s in ["01:02:03.456", "01;02;03,456", "01-02-03-456", "01:02:03.456-"] {
        assert_eq!(s.parse::<TimeCode>().unwrap(), expected, "{}", s);
    }
    assert_eq!("-00:00:05.000".parse::<TimeCode>().unwrap(),
               TimeCode::new(0, 0, 5, 0));
}

#[test]
fn reject_malformed_time_codes() {
    assert!("01:02:03".parse::<TimeCode>().is_err());
    assert!("01:xx:03.456".parse::<TimeCode>().is_err());
    assert!("".parse::<TimeCode>().is_err());
}

#[test]
fn time_code_conversions() {
    let t = TimeCode::new(1, 0, 2, 500);
    assert_eq!(t.total_milliseconds(), 3_602_500);
    assert_eq!(t.to_duration(), Duration::from_millis(3_602_500));
    assert!((t.to_seconds() - 3602.5).abs() < 1e-9);
    assert_eq!(t.to_string(), "01:00:02.500");
}
