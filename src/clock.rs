// Copyright 2021 bmc::labs Gmbh. All rights reserved.
//
// Authors:
//   Florian Eich <florian@bmc-labs.com>
//   Jonas Reitemeyer <alumni@bmc-labs.com>

use super::{ensure, fault, fault::Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use getset::CopyGetters;
use std::{env, fmt, ops, time};


const MICROS_PER_SEC: i64 = 1_000_000;
const SECS_PER_DAY: i64 = 86_400;

/// Day count of 1970-01-01 in the date-number convention.
const DATENUM_EPOCH_OFFSET: f64 = 719_529.0;

const SQL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SQL_ZERO: &str = "0000-00-00 00:00:00";
const MONIKER_FORMAT: &str = "%Y%m%d_%H%M%S";
const DAY_MONIKER_FORMAT: &str = "%Y%m%d";
const DEFAULT_FORMAT: &str = "%S.%i";


/// Absolute or relative time with microsecond resolution.
///
/// Stored as signed seconds since the epoch plus microseconds normalized
/// into `[0, 1_000_000)`; the sign lives entirely in the seconds field, so
/// `-0.25s` is held as `(-1, 750_000)`. Plain value type, copied freely.
#[derive(Clone,
         Copy,
         Debug,
         Default,
         Eq,
         Ord,
         PartialEq,
         PartialOrd,
         CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Clock {
  seconds: i64,
  micros:  i64,
}

// CONSTRUCTION ------------------------------------------------------------ //
impl Clock {
  /// Far future sentinel, useful as an upper bound for window scans.
  pub const MAX: Self = Self { seconds: i32::MAX as i64,
                               micros:  999_999, };

  /// Creates a `Clock` from a seconds/microseconds pair. The pair is
  /// carry-normalized, so e.g. `(0, -1)` becomes `(-1, 999_999)`.
  pub fn new(seconds: i64, micros: i64) -> Self {
    Self::normalized(seconds, micros)
  }

  /// Creates a `Clock` from fractional seconds.
  pub fn from_secs_f64(value: f64) -> Self {
    if value < 0.0 {
      return -Self::from_secs_f64(-value);
    }
    let seconds = value.trunc();
    let micros = ((value - seconds) * 1_000_000.0) as i64;
    Self::normalized(seconds as i64, micros)
  }

  /// Creates a `Clock` holding the current system time.
  pub fn now() -> Self {
    match time::SystemTime::now().duration_since(time::UNIX_EPOCH) {
      Ok(elapsed) => Self::new(elapsed.as_secs() as i64,
                               i64::from(elapsed.subsec_micros())),
      Err(_) => Self::default(),
    }
  }

  fn normalized(seconds: i64, micros: i64) -> Self {
    Self { seconds: seconds + micros.div_euclid(MICROS_PER_SEC),
           micros:  micros.rem_euclid(MICROS_PER_SEC), }
  }
}

// VALUE ACCESS ------------------------------------------------------------ //
impl Clock {
  /// This time as fractional seconds.
  pub fn as_secs_f64(&self) -> f64 {
    self.seconds as f64 + self.micros as f64 / 1_000_000.0
  }

  /// Whole seconds, rounded to the nearest second.
  pub fn epoch_seconds(&self) -> i64 {
    if self.micros >= 500_000 {
      self.seconds + 1
    } else {
      self.seconds
    }
  }

  pub fn is_zero(&self) -> bool {
    self.seconds == 0 && self.micros == 0
  }

  /// Sets this time back to zero.
  pub fn reset(&mut self) {
    *self = Self::default();
  }

  /// Milliseconds from `prior` to `latter`. `None` when `latter` precedes
  /// `prior` or the difference does not fit 31 bits of milliseconds.
  pub fn milliseconds_diff(prior: Self, latter: Self) -> Option<i64> {
    if latter < prior || latter - prior >= Self::new(2_147_483, 646_978) {
      return None;
    }
    Some(((latter.as_secs_f64() - prior.as_secs_f64()) * 1_000.0) as i64)
  }
}

// ARITHMETIC -------------------------------------------------------------- //
impl ops::Add for Clock {
  type Output = Self;

  fn add(self, other: Self) -> Self {
    Self::normalized(self.seconds + other.seconds, self.micros + other.micros)
  }
}

impl ops::Sub for Clock {
  type Output = Self;

  fn sub(self, other: Self) -> Self {
    Self::normalized(self.seconds - other.seconds, self.micros - other.micros)
  }
}

impl ops::AddAssign for Clock {
  fn add_assign(&mut self, other: Self) {
    *self = *self + other;
  }
}

impl ops::SubAssign for Clock {
  fn sub_assign(&mut self, other: Self) {
    *self = *self - other;
  }
}

impl ops::Neg for Clock {
  type Output = Self;

  fn neg(self) -> Self {
    if self.micros == 0 {
      Self { seconds: -self.seconds,
             micros:  0, }
    } else {
      Self { seconds: -self.seconds - 1,
             micros:  MICROS_PER_SEC - self.micros, }
    }
  }
}

impl ops::Mul<f64> for Clock {
  type Output = Self;

  fn mul(self, factor: f64) -> Self {
    Self::from_secs_f64(self.as_secs_f64() * factor)
  }
}

impl ops::Div<f64> for Clock {
  type Output = Self;

  fn div(self, divisor: f64) -> Self {
    Self::from_secs_f64(self.as_secs_f64() / divisor)
  }
}

// FORMATTING -------------------------------------------------------------- //
impl Clock {
  /// Expands a percent-escape pattern over this time value.
  ///
  /// Upper-case escapes are totals over the whole magnitude, prefixed with
  /// `-` when the value is negative: `%D` days, `%H` hours, `%M` minutes,
  /// `%S` seconds, `%I` milliseconds, `%U` microseconds. Lower-case escapes
  /// are zero-padded remainders after the next larger unit: `%h` (2
  /// digits), `%m` (2), `%s` (2), `%i` milliseconds (3), `%u` microseconds
  /// (6). `%%` renders a literal percent, an unknown escape is echoed and
  /// a trailing `%` is dropped.
  pub fn format(&self, pattern: &str) -> String {
    let negative = self.seconds < 0;
    let magnitude = if negative { -*self } else { *self };
    let sign = if negative { "-" } else { "" };

    let tday = magnitude.seconds / SECS_PER_DAY;
    let thour = magnitude.seconds / 3_600;
    let tmin = magnitude.seconds / 60;
    let tsec = magnitude.seconds;
    let tmilli = 1_000 * magnitude.seconds + magnitude.micros / 1_000;
    let tmicro = 1_000_000 * magnitude.seconds + magnitude.micros;

    let rhour = thour - 24 * tday;
    let rmin = tmin - 60 * thour;
    let rsec = tsec - 60 * tmin;
    let rmilli = tmilli - 1_000 * tsec;
    let rmicro = tmicro - 1_000_000 * tsec;

    let mut out = String::with_capacity(pattern.len() + 8);
    let mut escapes = pattern.chars();
    while let Some(current) = escapes.next() {
      if current != '%' {
        out.push(current);
        continue;
      }
      match escapes.next() {
        None => break, // trailing '%' in the pattern
        Some('%') => out.push('%'),
        Some('D') => out.push_str(&format!("{}{}", sign, tday)),
        Some('H') => out.push_str(&format!("{}{}", sign, thour)),
        Some('M') => out.push_str(&format!("{}{}", sign, tmin)),
        Some('S') => out.push_str(&format!("{}{}", sign, tsec)),
        Some('I') => out.push_str(&format!("{}{}", sign, tmilli)),
        Some('U') => out.push_str(&format!("{}{}", sign, tmicro)),
        Some('h') => out.push_str(&format!("{:02}", rhour)),
        Some('m') => out.push_str(&format!("{:02}", rmin)),
        Some('s') => out.push_str(&format!("{:02}", rsec)),
        Some('i') => out.push_str(&format!("{:03}", rmilli)),
        Some('u') => out.push_str(&format!("{:06}", rmicro)),
        Some(other) => {
          // echo any bad '%?'
          out.push('%');
          out.push(other);
        }
      }
    }
    out
  }
}

impl fmt::Display for Clock {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.format(DEFAULT_FORMAT))
  }
}

// CALENDAR CONVERSIONS ---------------------------------------------------- //
impl Clock {
  /// Parses a SQL datetime `YYYY-MM-DD HH:MM:SS[.ffffff]` (19 to 26
  /// characters). The all-zero sentinel `0000-00-00 00:00:00` maps to the
  /// zero time without further parsing.
  pub fn from_sql_datetime(text: &str) -> Result<Self> {
    require_utc()?;
    ensure!(text.len() >= 19 && text.len() <= 26,
            Format,
            "SQL datetime must be 19 to 26 characters: '{}'",
            text);
    let head = match text.get(..19) {
      Some(head) => head,
      None => return fault!(Format, "malformed SQL datetime: '{}'", text),
    };
    if head == SQL_ZERO {
      return Ok(Self::default());
    }

    let base = NaiveDateTime::parse_from_str(head, SQL_FORMAT)?;
    let mut micros = 0;
    if text.len() > 19 {
      let fraction = &text[19..];
      ensure!(fraction.starts_with('.'),
              Format,
              "fractional seconds must follow a '.': '{}'",
              text);
      let digits = &fraction[1..];
      ensure!(digits.bytes().all(|b| b.is_ascii_digit()),
              Format,
              "fractional seconds must be decimal digits: '{}'",
              text);
      if !digits.is_empty() {
        // left-aligned onto six digits, so ".1" means 100000 microseconds
        let mut padded = digits.to_string();
        while padded.len() < 6 {
          padded.push('0');
        }
        micros = padded.parse::<i64>()?;
      }
    }

    Ok(Self::new(base.timestamp(), micros))
  }

  /// Renders `YYYY-MM-DD HH:MM:SS`, rounded to the nearest second.
  pub fn to_sql_datetime(&self) -> Result<String> {
    require_utc()?;
    Ok(calendar(self.epoch_seconds())?.format(SQL_FORMAT).to_string())
  }

  /// Renders `YYYY-MM-DD HH:MM:SS.ffffff` without rounding.
  pub fn to_sql_datetime_full(&self) -> Result<String> {
    require_utc()?;
    Ok(format!("{}.{:06}",
               calendar(self.seconds)?.format(SQL_FORMAT),
               self.micros))
  }

  /// Parses a day moniker `YYYYMMDD`, anchoring the time at 08:00:00 as
  /// the sensor file convention does.
  pub fn from_moniker(moniker: &str) -> Result<Self> {
    ensure!(moniker.len() == 8 && moniker.is_ascii(),
            Format,
            "day moniker '{}' must be 8 digits",
            moniker);
    Self::from_sql_datetime(&format!("{}-{}-{} 08:00:00",
                                     &moniker[..4],
                                     &moniker[4..6],
                                     &moniker[6..8]))
  }

  /// Parses a day moniker `YYYYMMDD`, anchoring the time at midnight.
  pub fn from_day_moniker(moniker: &str) -> Result<Self> {
    ensure!(moniker.len() == 8 && moniker.is_ascii(),
            Format,
            "day moniker '{}' must be 8 digits",
            moniker);
    Self::from_sql_datetime(&format!("{}-{}-{} 00:00:00",
                                     &moniker[..4],
                                     &moniker[4..6],
                                     &moniker[6..8]))
  }

  /// Day moniker `YYYYMMDD` of this time.
  pub fn day_moniker(&self) -> Result<String> {
    require_utc()?;
    Ok(calendar(self.seconds)?.format(DAY_MONIKER_FORMAT).to_string())
  }

  /// Time moniker `HHMMSS` of this time.
  pub fn time_moniker(&self) -> Result<String> {
    require_utc()?;
    Ok(calendar(self.seconds)?.format("%H%M%S").to_string())
  }

  /// Full moniker `YYYYMMDD_HHMMSS` of this time.
  pub fn moniker(&self) -> Result<String> {
    Ok(format!("{}_{}", self.day_moniker()?, self.time_moniker()?))
  }

  /// This time as a date-number: days since the date-number epoch, with
  /// the time of day in the fractional part.
  pub fn datenum(&self) -> f64 {
    self.seconds as f64 / 86_400.0
    + self.micros as f64 / (1_000_000.0 * 86_400.0)
    + DATENUM_EPOCH_OFFSET
  }

  /// Creates a `Clock` from a date-number.
  pub fn from_datenum(datenum: f64) -> Self {
    let dn_secs = (datenum - DATENUM_EPOCH_OFFSET) * SECS_PER_DAY as f64;
    let seconds = dn_secs.floor();
    Self::normalized(seconds as i64, ((dn_secs - seconds) * 1_000_000.0) as i64)
  }

  /// This time one calendar day later, via the date-number transform.
  pub fn next_day(&self) -> Self {
    Self::from_datenum(self.datenum() + 1.0)
  }

  /// This time one calendar day earlier, via the date-number transform.
  pub fn prev_day(&self) -> Self {
    Self::from_datenum(self.datenum() - 1.0)
  }
}

// SENSOR FILE NAMING ------------------------------------------------------ //
impl Clock {
  /// Parses an 8-hex-digit sensor date, e.g. `4E04FF6E`. Tolerates being
  /// handed a full file path; only the last path segment, and only its
  /// first 8 characters, are significant.
  pub fn from_hex_date(hex_date: &str) -> Result<Self> {
    require_utc()?;
    let name = basename(hex_date);
    let head = match name.get(..8) {
      Some(head) => head,
      None => {
        return fault!(Format, "hex date '{}' shorter than 8 digits", hex_date)
      }
    };
    let seconds = u32::from_str_radix(head, 16)?;
    Ok(Self::new(i64::from(seconds), 0))
  }

  /// Renders this time as an 8-hex-digit sensor date, rounded to the
  /// nearest second. Fails for times outside the 32 bit range.
  pub fn to_hex_date(&self) -> Result<String> {
    require_utc()?;
    let seconds = self.epoch_seconds();
    ensure!((0..=i64::from(u32::MAX)).contains(&seconds),
            Validation,
            "{} seconds does not fit the 32 bit hex date form",
            seconds);
    Ok(format!("{:08X}", seconds))
  }

  /// Converts an 8-hex-digit sensor date (or a path to a file named after
  /// one) to the moniker `YYYYMMDD_HHMMSS`.
  pub fn hex_date_to_moniker(hex_date: &str) -> Result<String> {
    let clock = Self::from_hex_date(hex_date)?;
    Ok(calendar(clock.seconds)?.format(MONIKER_FORMAT).to_string())
  }

  /// Converts a moniker `YYYYMMDD_HHMMSS` (or a path to a file named after
  /// one) to the 8-hex-digit sensor date.
  pub fn moniker_to_hex_date(moniker: &str) -> Result<String> {
    require_utc()?;
    let name = basename(moniker);
    let head = match name.get(..15) {
      Some(head) => head,
      None => {
        return fault!(Format,
                      "moniker '{}' shorter than YYYYMMDD_HHMMSS",
                      moniker)
      }
    };
    let datetime = NaiveDateTime::parse_from_str(head, MONIKER_FORMAT)?;
    Self::new(datetime.timestamp(), 0).to_hex_date()
  }

  /// Shifts a day moniker `YYYYMMDD` by a number of calendar days.
  pub fn back_date(moniker: &str, offset_days: i32) -> Result<String> {
    require_utc()?;
    ensure!(moniker.len() == 8 && moniker.is_ascii(),
            Format,
            "day moniker '{}' must be 8 digits",
            moniker);
    let date = NaiveDate::parse_from_str(moniker, DAY_MONIKER_FORMAT)?;
    let shifted = date + Duration::days(i64::from(offset_days));
    Ok(shifted.format(DAY_MONIKER_FORMAT).to_string())
  }

  /// Integer twin of [`Clock::back_date`].
  pub fn back_date_int(moniker: i32, offset_days: i32) -> Result<i32> {
    Ok(Self::back_date(&format!("{:08}", moniker), offset_days)?.parse()?)
  }
}


/// Calendar conversions only run in a process pinned to UTC; a drifting
/// zone would silently shift every sensor file name and SQL timestamp.
fn require_utc() -> Result<()> {
  zone_ok(env::var("TZ").ok().as_deref())
}

fn zone_ok(zone: Option<&str>) -> Result<()> {
  match zone {
    Some("UTC") => Ok(()),
    Some(other) => {
      fault!(Precondition, "time zone set to '{}', must be UTC", other)
    }
    None => fault!(Precondition, "time zone not set, must be UTC"),
  }
}

fn calendar(seconds: i64) -> Result<NaiveDateTime> {
  match NaiveDateTime::from_timestamp_opt(seconds, 0) {
    Some(datetime) => Ok(datetime),
    None => fault!(Format, "{} seconds is outside the calendar range", seconds),
  }
}

fn basename(text: &str) -> &str {
  match text.rfind('/') {
    Some(slash) => &text[slash + 1..],
    None => text,
  }
}


#[cfg(test)]
mod tests {
  use super::{super::fault::Fault, *};
  use pretty_assertions::assert_eq;

  fn in_utc() {
    env::set_var("TZ", "UTC");
  }

  #[test]
  fn normalization_test() {
    assert_eq!(Clock::new(1, 500_000), Clock::new(0, 1_500_000));
    assert_eq!(Clock::new(-1, 999_999), Clock::new(0, -1));
    assert_eq!(Clock::new(2, 0), Clock::new(0, 2_000_000));
    assert_eq!(Clock::new(-2, 750_000), Clock::from_secs_f64(-1.25));
    assert_eq!(-1.25, Clock::from_secs_f64(-1.25).as_secs_f64());

    let samples = [Clock::new(0, 0),
                   Clock::new(3, 141_592),
                   Clock::new(-3, 141_592),
                   Clock::from_secs_f64(1.999_999),
                   Clock::from_secs_f64(-1.999_999)];
    for a in samples.iter() {
      for b in samples.iter() {
        let sum = *a + *b;
        let diff = *a - *b;
        assert!((0..1_000_000).contains(&sum.micros()));
        assert!((0..1_000_000).contains(&diff.micros()));
      }
      assert_eq!(Clock::default(), *a - *a);
    }
  }

  #[test]
  fn negation_test() {
    assert_eq!(Clock::new(-6, 750_000), -Clock::new(5, 250_000));
    assert_eq!(Clock::new(-5, 0), -Clock::new(5, 0));
    assert_eq!(Clock::default(), -Clock::default());
    assert_eq!(Clock::new(5, 250_000), -(-Clock::new(5, 250_000)));
  }

  #[test]
  fn ordering_test() {
    assert!(Clock::new(1, 0) < Clock::new(1, 1));
    assert!(Clock::new(0, 999_999) < Clock::new(1, 0));
    assert!(Clock::new(-1, 999_999) < Clock::new(0, 0));
    assert!(Clock::new(3, 5) == Clock::new(3, 5));
    assert!(Clock::MAX > Clock::now());
  }

  #[test]
  fn scalar_test() {
    assert_eq!(Clock::new(5, 0), Clock::new(2, 500_000) * 2.0);
    assert_eq!(Clock::new(1, 250_000), Clock::new(2, 500_000) / 2.0);
    assert_eq!(Clock::new(-5, 0), Clock::new(2, 500_000) * -2.0);
  }

  #[test]
  fn format_test() {
    let clock = Clock::new(90_061, 123_456); // 1d 1h 1m 1s and change
    assert_eq!("1 01:01:01", clock.format("%D %h:%m:%s"));
    assert_eq!("25", clock.format("%H"));
    assert_eq!("1501", clock.format("%M"));
    assert_eq!("90061", clock.format("%S"));
    assert_eq!("90061123", clock.format("%I"));
    assert_eq!("90061123456", clock.format("%U"));
    assert_eq!("123", clock.format("%i"));
    assert_eq!("123456", clock.format("%u"));
    assert_eq!("90061.123", clock.to_string());

    // escapes and malformed patterns
    assert_eq!("100%", Clock::default().format("100%%"));
    assert_eq!("%x", Clock::default().format("%x"));
    assert_eq!("leftover", Clock::default().format("leftover%"));

    // negative values carry the sign on totals only
    let negative = Clock::new(-2, 750_000); // -1.25s
    assert_eq!("-1", negative.format("%S"));
    assert_eq!("-1250", negative.format("%I"));
    assert_eq!("250", negative.format("%i"));
    assert_eq!("-1.250", negative.to_string());
  }

  #[test]
  fn sql_datetime_test() {
    in_utc();

    let plain = "2011-01-23 04:05:06";
    let clock = Clock::from_sql_datetime(plain).unwrap();
    assert_eq!(plain, clock.to_sql_datetime().unwrap());
    assert_eq!("2011-01-23 04:05:06.000000",
               clock.to_sql_datetime_full().unwrap());

    let full = "2011-01-23 04:05:06.123456";
    let clock = Clock::from_sql_datetime(full).unwrap();
    assert_eq!(full, clock.to_sql_datetime_full().unwrap());
    assert_eq!(123_456, clock.micros());

    // left-aligned fraction: ".1" is a tenth of a second
    let clock = Clock::from_sql_datetime("2011-01-23 04:05:06.1").unwrap();
    assert_eq!(100_000, clock.micros());

    // the all-zero sentinel maps to the zero time
    let zero = Clock::from_sql_datetime("0000-00-00 00:00:00").unwrap();
    assert!(zero.is_zero());
  }

  #[test]
  fn sql_datetime_rounding_test() {
    in_utc();

    let clock = Clock::from_sql_datetime("2011-01-23 04:05:06.700000").unwrap();
    assert_eq!("2011-01-23 04:05:07", clock.to_sql_datetime().unwrap());
    assert_eq!("2011-01-23 04:05:06.700000",
               clock.to_sql_datetime_full().unwrap());
  }

  #[test]
  fn sql_datetime_rejects_test() {
    in_utc();

    assert!(Clock::from_sql_datetime("2011-01-23").is_err());
    assert!(Clock::from_sql_datetime("2011-13-23 04:05:06").is_err());
    assert!(Clock::from_sql_datetime("2011-01-23 04:05:06,5").is_err());
    assert!(Clock::from_sql_datetime("2011-01-23 04:05:06.1234567").is_err());
  }

  #[test]
  fn hex_date_test() {
    in_utc();

    let hex = "4E04FF6E";
    let moniker = "20110624_211942";

    assert_eq!(moniker, Clock::hex_date_to_moniker(hex).unwrap());
    assert_eq!(hex, Clock::moniker_to_hex_date(moniker).unwrap());
    assert_eq!(hex,
               Clock::from_hex_date(hex).unwrap().to_hex_date().unwrap());

    // paths and bare file names hold the same hex value
    let path = "/mnt/array12/sst/4E04FF6E.824.24b.bz2";
    let file = "4E04FF6E.824.24b.bz2";
    assert_eq!(Clock::from_hex_date(hex).unwrap(),
               Clock::from_hex_date(path).unwrap());
    assert_eq!(Clock::from_hex_date(hex).unwrap(),
               Clock::from_hex_date(file).unwrap());
    assert_eq!(moniker, Clock::hex_date_to_moniker(path).unwrap());

    assert!(Clock::from_hex_date("4E04FF").is_err());
    assert!(Clock::from_hex_date("NOTHEXAT.ALL").is_err());
  }

  #[test]
  fn moniker_test() {
    in_utc();

    let clock = Clock::from_moniker("20110206").unwrap();
    assert_eq!("2011-02-06 08:00:00", clock.to_sql_datetime().unwrap());

    let clock = Clock::from_day_moniker("20110206").unwrap();
    assert_eq!("2011-02-06 00:00:00", clock.to_sql_datetime().unwrap());

    let clock = Clock::from_sql_datetime("2011-02-06 08:09:12").unwrap();
    assert_eq!("20110206", clock.day_moniker().unwrap());
    assert_eq!("080912", clock.time_moniker().unwrap());
    assert_eq!("20110206_080912", clock.moniker().unwrap());

    assert!(Clock::from_moniker("2011026").is_err());
  }

  #[test]
  fn datenum_test() {
    in_utc();

    let epoch = Clock::from_sql_datetime("1970-01-01 00:00:00").unwrap();
    assert_eq!(719_529.0, epoch.datenum());

    let next = Clock::from_datenum(719_530.0);
    assert_eq!("1970-01-02 00:00:00", next.to_sql_datetime().unwrap());

    let day = Clock::from_sql_datetime("2011-02-06 00:00:00").unwrap();
    assert_eq!("2011-02-07 00:00:00", day.next_day().to_sql_datetime().unwrap());
    assert_eq!("2011-02-05 00:00:00", day.prev_day().to_sql_datetime().unwrap());
  }

  #[test]
  fn back_date_test() {
    in_utc();

    assert_eq!("20110228", Clock::back_date("20110301", -1).unwrap());
    assert_eq!("20120229", Clock::back_date("20120301", -1).unwrap());
    assert_eq!("20120101", Clock::back_date("20111231", 1).unwrap());
    assert_eq!("20110206", Clock::back_date("20110206", 0).unwrap());
    assert_eq!(20_110_131, Clock::back_date_int(20_110_206, -6).unwrap());

    assert!(Clock::back_date("2011026", 1).is_err());
  }

  #[test]
  fn milliseconds_diff_test() {
    let prior = Clock::new(100, 0);
    let latter = Clock::new(101, 500_000);
    assert_eq!(Some(1_500), Clock::milliseconds_diff(prior, latter));
    assert_eq!(Some(0), Clock::milliseconds_diff(prior, prior));
    assert_eq!(None, Clock::milliseconds_diff(latter, prior));
    assert_eq!(None, Clock::milliseconds_diff(Clock::default(), Clock::MAX));
  }

  #[test]
  fn zone_check_test() {
    assert_eq!(Ok(()), zone_ok(Some("UTC")));

    let err = zone_ok(Some("EST")).unwrap_err();
    assert_eq!("precondition", err.kind());
    assert_eq!(Fault::Precondition("time zone set to 'EST', must be \
                                    UTC".to_string()),
               err);
    assert_eq!("precondition", zone_ok(None).unwrap_err().kind());
  }
}
