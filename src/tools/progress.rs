//! Progress reporting for long running operations.
//!
//! The caller supplies the expected amount of work (usually a byte count) and an optional
//! callback. The callback receives a percentage at most once per `REPORT_INTERVAL` units of work
//! and once more with 100.0 when the operation ends. Values never decrease and are clamped to
//! 0..=100. The callback runs inside the read loop, so it must be cheap.

/// Work units (bytes) between two reports.
pub const REPORT_INTERVAL: u64 = 10 * 1024;

pub struct Progress<'a> {
    callback: Option<Box<dyn FnMut(f64) + 'a>>,
    total: u64,
    done: u64,
    since_report: u64,
    last: f64,
}

impl<'a> Progress<'a> {
    /// Report against `total` units of work.
    pub fn new<F: FnMut(f64) + 'a>(total: u64, callback: F) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            total,
            done: 0,
            since_report: 0,
            last: 0.0,
        }
    }

    /// A reporter that does nothing.
    pub fn none() -> Self {
        Self {
            callback: None,
            total: 0,
            done: 0,
            since_report: 0,
            last: 0.0,
        }
    }

    /// Replace the amount of expected work. Used once the real size becomes known.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    /// Record `n` more units of work, reporting if an interval has been crossed.
    pub fn advance(&mut self, n: u64) {
        if self.callback.is_none() {
            return;
        }
        self.done += n;
        self.since_report += n;
        if self.since_report >= REPORT_INTERVAL {
            self.since_report = 0;
            let pct = if self.total == 0 {
                0.0
            } else {
                self.done as f64 * 100.0 / self.total as f64
            };
            self.report(pct);
        }
    }

    /// Report completion.
    pub fn finish(&mut self) {
        self.report(100.0);
    }

    fn report(&mut self, pct: f64) {
        let pct = pct.clamp(0.0, 100.0).max(self.last);
        self.last = pct;
        if let Some(cb) = self.callback.as_mut() {
            cb(pct);
        }
    }
}

impl Default for Progress<'_> {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("total", &self.total)
            .field("done", &self.done)
            .field("last", &self.last)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::{Progress, REPORT_INTERVAL};

    #[test]
    fn interval_test() {
        let mut seen = Vec::new();
        {
            let mut p = Progress::new(REPORT_INTERVAL * 4, |pct| seen.push(pct));
            p.advance(REPORT_INTERVAL / 2);
            p.advance(REPORT_INTERVAL / 2);
            p.advance(REPORT_INTERVAL);
            p.advance(10);
            p.finish();
        }
        assert_eq!(seen, vec![25.0, 50.0, 100.0]);
    }

    #[test]
    fn clamp_and_monotonic_test() {
        let mut seen = Vec::new();
        {
            // Underestimated total: values must stop at 100.
            let mut p = Progress::new(REPORT_INTERVAL, |pct| seen.push(pct));
            p.advance(REPORT_INTERVAL * 3);
            p.set_total(REPORT_INTERVAL * 100);
            p.advance(REPORT_INTERVAL);
            p.finish();
        }
        assert_eq!(seen, vec![100.0, 100.0, 100.0]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn none_test() {
        let mut p = Progress::none();
        p.advance(REPORT_INTERVAL * 10);
        p.finish();
    }
}
