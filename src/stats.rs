//! This file contains all of the code for keeping stats for the current session.
//! There's no correctness riding on any of this, it's breadcrumbs so a human
//! can tell the fuzzer is still alive

use chrono::Local;
use std::io::Write;
use std::time::Instant;

use crate::err::FuzzErr;

/// Default number of submissions per breadcrumb
pub const DEFAULT_CRUMB_INTERVAL: u64 = 1_000_000;

/// Every this many crumbs we print a count line
pub const CRUMBS_PER_LINE: u64 = 10;

// Helper function to format a big iteration count
pub fn format_iters(iters: u64) -> String {
    match iters {
        0..=999 => format!("{}", iters),
        1_000..=999_999 => format!("{:.2}K", iters as f64 / 1_000.0),
        _ => format!("{:.3}M", iters as f64 / 1_000_000.0),
    }
}

/// What a call to `update` asks the caller to print
#[derive(Debug, PartialEq)]
pub enum Crumb {
    None,
    Dot,
    DotAndLine,
}

#[derive(Clone, Default)]
pub struct Stats {
    pub start_str: String,          // String repr of date start
    pub session_iters: u64,         // Total submissions
    session_start: Option<Instant>, // Start time
    crumb_interval: u64,            // Submissions per breadcrumb
}

impl Stats {
    pub fn new(crumb_interval: u64) -> Self {
        Stats {
            crumb_interval: crumb_interval.max(1),
            ..Default::default()
        }
    }

    // Start the timers
    #[inline]
    pub fn start_session(&mut self) {
        self.start_str = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.session_start = Some(Instant::now());
    }

    // Count one submission and work out whether a crumb is due
    #[inline]
    pub fn update(&mut self) -> Crumb {
        self.session_iters += 1;

        if self.session_iters % self.crumb_interval != 0 {
            Crumb::None
        } else if self.session_iters % (self.crumb_interval * CRUMBS_PER_LINE) != 0 {
            Crumb::Dot
        } else {
            Crumb::DotAndLine
        }
    }

    pub fn iters_per_sec(&self) -> f64 {
        let Some(start) = self.session_start else {
            return 0.0;
        };

        let secs = start.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.session_iters as f64 / secs
        } else {
            0.0
        }
    }

    /// The cumulative count line
    pub fn count_line(&self) -> String {
        format!(
            "[ {:>8} tests passed | {:.0} iters/s ]",
            format_iters(self.session_iters),
            self.iters_per_sec()
        )
    }

    /// Print whatever `crumb` calls for and flush so it shows up right away
    pub fn report<W: Write>(&self, out: &mut W, crumb: Crumb) -> Result<(), FuzzErr> {
        match crumb {
            Crumb::None => return Ok(()),
            Crumb::Dot => write!(out, ".")?,
            Crumb::DotAndLine => writeln!(out, ".{}", self.count_line())?,
        }

        out.flush()?;
        Ok(())
    }

    pub fn uptime(&self) -> String {
        let Some(start) = self.session_start else {
            return "0d 0h 0m 0s".to_string();
        };

        let total_seconds = start.elapsed().as_secs();
        let days = total_seconds / 86400;
        let hours = (total_seconds % 86400) / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crumbs_follow_interval() {
        let mut stats = Stats::new(3);
        let crumbs: Vec<Crumb> = (0..30).map(|_| stats.update()).collect();

        let dots: Vec<usize> = crumbs
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != Crumb::None)
            .map(|(i, _)| i + 1)
            .collect();
        assert_eq!(dots, vec![3, 6, 9, 12, 15, 18, 21, 24, 27, 30]);
        assert_eq!(crumbs[29], Crumb::DotAndLine);
        assert_eq!(crumbs[26], Crumb::Dot);
        assert_eq!(stats.session_iters, 30);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut stats = Stats::new(0);
        assert_eq!(stats.update(), Crumb::Dot);
    }

    #[test]
    fn format_iters_units() {
        assert_eq!(format_iters(999), "999");
        assert_eq!(format_iters(1_500), "1.50K");
        assert_eq!(format_iters(20_000_000), "20.000M");
    }

    #[test]
    fn report_writes_dot_and_count_line() {
        let mut stats = Stats::new(1);
        stats.start_session();
        let mut out = Vec::<u8>::new();

        let crumb = stats.update();
        stats.report(&mut out, crumb).unwrap();
        stats.report(&mut out, Crumb::None).unwrap();
        assert_eq!(out, b".");

        for _ in 0..9 {
            let crumb = stats.update();
            stats.report(&mut out, crumb).unwrap();
        }

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(".........."));
        assert!(text.contains("[       10 tests passed |"), "{}", text);
        assert!(text.ends_with("]\n"));
    }
}
