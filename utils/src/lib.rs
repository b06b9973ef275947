use std::{fmt, io::BufRead, str::FromStr};

use clap::ArgMatches;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize logging from command line arguments
pub fn init_log(m: &ArgMatches) {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 1 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    if let Err(e) = stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()
    {
        eprintln!("Could not initialize logging: {}", e)
    }
}

/// Read in next line and split on tabs after trimming white space
pub fn get_next_line<'a, R: BufRead>(
    rdr: &mut R,
    buf: &'a mut String,
) -> anyhow::Result<Option<Vec<&'a str>>> {
    buf.clear();
    if rdr.read_line(buf)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buf.trim().split('\t').collect()))
    }
}

/// Median of v (average of the two central values for an even length).
/// v is sorted in place.  Returns None if v is empty
pub fn median(v: &mut [f64]) -> Option<f64> {
    let l = v.len();
    if l == 0 {
        None
    } else {
        v.sort_unstable_by(|a, b| a.total_cmp(b));
        let m = l >> 1;
        Some(if l & 1 == 0 {
            (v[m - 1] + v[m]) * 0.5
        } else {
            v[m]
        })
    }
}

/// Mean of the upper half of v, i.e., of the sorted elements from index l/2 to the end.
/// For odd lengths the median element is included.  v is sorted in place.
/// Returns None if v is empty
pub fn upper_half_mean(v: &mut [f64]) -> Option<f64> {
    if v.is_empty() {
        None
    } else {
        v.sort_unstable_by(|a, b| a.total_cmp(b));
        let upper = &v[v.len() >> 1..];
        Some(upper.iter().sum::<f64>() / (upper.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&mut [8.0, 0.0, 4.0, 0.0]), Some(2.0));
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn upper_half() {
        assert_eq!(upper_half_mean(&mut [0.0, 8.0, 0.0, 4.0]), Some(6.0));
        // Odd length includes the median element
        assert_eq!(upper_half_mean(&mut [1.0, 2.0, 6.0]), Some(4.0));
        assert_eq!(upper_half_mean(&mut [5.0]), Some(5.0));
        assert_eq!(upper_half_mean(&mut []), None);
    }

    #[test]
    fn split_lines() {
        let mut rdr = "a\tb\tc\n  x\ty \n".as_bytes();
        let mut buf = String::new();
        assert_eq!(
            get_next_line(&mut rdr, &mut buf).unwrap(),
            Some(vec!["a", "b", "c"])
        );
        assert_eq!(
            get_next_line(&mut rdr, &mut buf).unwrap(),
            Some(vec!["x", "y"])
        );
        assert_eq!(get_next_line(&mut rdr, &mut buf).unwrap(), None);
    }

    #[test]
    fn log_level_parse() {
        let l: LogLevel = "DEBUG".parse().unwrap();
        assert_eq!(l.get_level(), 3);
        assert!("none".parse::<LogLevel>().unwrap().is_none());
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
