//! Accuracy lottery: the best logged test accuracy of each run in a range of
//! run directories.
//!
//! Every run directory holds `<sub_path>/logger`, a headerless CSV whose rows
//! are `<metric>,<step>,<value>`.

use std::cmp::Ordering;
use std::io::BufRead;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use log::debug;
use lottery_core::{LotteryError, Platform, Result};

/// Name of the per-run log file.
pub const LOGGER_FILE: &str = "logger";

/// Metric whose maximum is reported.
pub const TEST_ACCURACY: &str = "test_accuracy";

/// Maximum `metric` value recorded in one logger file.
///
/// # Errors
///
/// `Io` if the file cannot be read, `Parse` if a `metric` row has no numeric
/// third column, `MissingMetric` if no row records `metric`.
pub fn best_metric(platform: &Platform, logger: &Path, metric: &str) -> Result<f64> {
    let reader = platform.open(logger)?;
    let mut best: Option<f64> = None;
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LotteryError::io(logger, e))?;
        let mut fields = line.split(',');
        if fields.next().map(str::trim) != Some(metric) {
            continue;
        }
        let raw = fields.nth(1).map(str::trim).unwrap_or("");
        let value: f64 = raw.parse().map_err(|_| {
            LotteryError::parse(logger, i + 1, format!("'{}' is not a number", raw))
        })?;
        best = Some(best.map_or(value, |b| b.max(value)));
    }
    best.ok_or_else(|| LotteryError::MissingMetric {
        path: logger.display().to_string(),
        metric: metric.to_string(),
    })
}

/// Best test accuracy of the runs `lo..=hi` of `root`, runs ordered by
/// [`natural_cmp`] so that `run_2` comes before `run_10`.
///
/// # Errors
///
/// `RunRangeOutOfBounds` if the range is empty or reaches past the last run;
/// otherwise the first error of [`best_metric`]. No partial result is
/// returned.
pub fn best_test_accuracies(
    platform: &Platform,
    root: impl AsRef<Path>,
    sub_path: impl AsRef<Path>,
    lo: usize,
    hi: usize,
) -> Result<Vec<f64>> {
    let root = root.as_ref();
    let mut runs = platform.list_dir(root)?;
    runs.sort_by(|a, b| natural_cmp(a, b));
    if lo > hi || hi >= runs.len() {
        return Err(LotteryError::RunRangeOutOfBounds {
            lo,
            hi,
            available: runs.len(),
        });
    }
    runs[lo..=hi]
        .iter()
        .map(|run| {
            let logger = root.join(run).join(sub_path.as_ref()).join(LOGGER_FILE);
            let best = best_metric(platform, &logger, TEST_ACCURACY)?;
            debug!("{}: best {} = {}", run, TEST_ACCURACY, best);
            Ok(best)
        })
        .collect()
}

/// Compares names with runs of ASCII digits taken as numbers, so `"9" < "10"`.
/// Equal numbers with different zero padding fall back to plain string order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut x, mut y) = (a.chars().peekable(), b.chars().peekable());
    loop {
        let ord = match (x.peek().copied(), y.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(c), Some(d)) if c.is_ascii_digit() && d.is_ascii_digit() => {
                let (m, n) = (digit_run(&mut x), digit_run(&mut y));
                m.len().cmp(&n.len()).then_with(|| m.cmp(&n))
            }
            (Some(c), Some(d)) => {
                x.next();
                y.next();
                c.cmp(&d)
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// Consumes a run of digits, leading zeros dropped.
fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        if !(digits.is_empty() && c == '0') {
            digits.push(c);
        }
    }
    digits
}

/// Formats accuracies as a bracketed list, e.g. `[0.5, 0.2, 0.9]`.
pub fn format_accuracies(values: &[f64]) -> String {
    format!("{:?}", values)
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
