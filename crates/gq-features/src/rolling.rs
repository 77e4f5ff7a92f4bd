use std::collections::VecDeque;

/// Fixed-capacity sliding window with O(1) mean / sample std.
///
/// Sums are kept relative to the first value ever pushed (`shift`) so the
/// sum-of-squares does not lose precision at price-level magnitudes.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
    shift: Option<f64>,
    sum: f64,
    sum_sq: f64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
            shift: None,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    pub fn push(&mut self, v: f64) {
        let k = *self.shift.get_or_insert(v);
        if self.values.len() == self.capacity {
            if let Some(old) = self.values.pop_front() {
                let d = old - k;
                self.sum -= d;
                self.sum_sq -= d * d;
            }
        }
        let d = v - k;
        self.sum += d;
        self.sum_sq += d * d;
        self.values.push_back(v);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.values.iter()
    }

    /// Mean of a full window; `None` while warming up.
    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        let n = self.capacity as f64;
        Some(self.shift.unwrap_or(0.0) + self.sum / n)
    }

    /// Sample standard deviation (n - 1) of a full window.
    /// `None` while warming up or when the capacity is 1.
    pub fn std(&self) -> Option<f64> {
        if !self.is_full() || self.capacity < 2 {
            return None;
        }
        let n = self.capacity as f64;
        let var = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        Some(var.max(0.0).sqrt())
    }
}

/// Percentile rank of the newest value within the window, ties averaged:
/// `(below + (equal + 1) / 2) / n`, where `equal` includes the newest value.
///
/// A constant window ranks near the middle, not at the top.
/// `None` until the window is full.
pub fn percentile_rank_of_last(w: &RollingWindow) -> Option<f64> {
    if !w.is_full() {
        return None;
    }
    let last = *w.iter().last()?;
    let (below, equal) = w.iter().fold((0usize, 0usize), |(b, e), v| {
        if *v < last {
            (b + 1, e)
        } else if *v == last {
            (b, e + 1)
        } else {
            (b, e)
        }
    });
    let rank = below as f64 + (equal as f64 + 1.0) / 2.0;
    Some(rank / w.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_std(xs: &[f64]) -> f64 {
        let n = xs.len() as f64;
        let m = xs.iter().sum::<f64>() / n;
        (xs.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1.0)).sqrt()
    }

    #[test]
    fn mean_and_std_match_naive_after_eviction() {
        let xs = [2001.5, 2003.25, 1999.0, 2010.0, 2004.75, 2002.0, 1998.5];
        let mut w = RollingWindow::new(4);
        for x in xs {
            w.push(x);
        }
        let tail = &xs[3..];
        let mean = tail.iter().sum::<f64>() / 4.0;
        assert!((w.mean().unwrap() - mean).abs() < 1e-9);
        assert!((w.std().unwrap() - naive_std(tail)).abs() < 1e-9);
    }

    #[test]
    fn warming_window_has_no_stats() {
        let mut w = RollingWindow::new(3);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.mean(), None);
        assert_eq!(w.std(), None);
        assert_eq!(percentile_rank_of_last(&w), None);
    }

    #[test]
    fn tied_values_share_their_average_rank() {
        let mut w = RollingWindow::new(4);
        for x in [3.0, 1.0, 2.0, 2.0] {
            w.push(x);
        }
        // Ranks 2 and 3 averaged: 2.5 / 4.
        assert_eq!(percentile_rank_of_last(&w), Some(0.625));
    }

    #[test]
    fn unique_maximum_ranks_one() {
        let mut w = RollingWindow::new(4);
        for x in [3.0, 1.0, 2.0, 5.0] {
            w.push(x);
        }
        assert_eq!(percentile_rank_of_last(&w), Some(1.0));
    }

    #[test]
    fn constant_window_ranks_mid() {
        let mut w = RollingWindow::new(4);
        for _ in 0..6 {
            w.push(0.0);
        }
        assert_eq!(percentile_rank_of_last(&w), Some(0.625));
    }
}
