use serde::Serialize;
use std::ops::AddAssign;

/// Counters collected while loading one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows_read: u64,
    pub rows_kept: u64,
    pub dropped_unparsable: u64,
    pub dropped_out_of_range: u64,
    pub batches: u64,
}

impl LoadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_read(&mut self, count: u64) {
        self.rows_read += count;
    }

    pub fn inc_kept(&mut self) {
        self.rows_kept += 1;
    }

    pub fn inc_unparsable(&mut self) {
        self.dropped_unparsable += 1;
    }

    pub fn inc_out_of_range(&mut self) {
        self.dropped_out_of_range += 1;
    }

    pub fn inc_batches(&mut self) {
        self.batches += 1;
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_unparsable + self.dropped_out_of_range
    }

    /// Every row read is either kept or dropped for exactly one reason.
    pub fn is_balanced(&self) -> bool {
        self.rows_read == self.rows_kept + self.dropped()
    }
}

impl AddAssign for LoadStats {
    fn add_assign(&mut self, other: Self) {
        self.rows_read += other.rows_read;
        self.rows_kept += other.rows_kept;
        self.dropped_unparsable += other.dropped_unparsable;
        self.dropped_out_of_range += other.dropped_out_of_range;
        self.batches += other.batches;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zero() {
        let stats = LoadStats::new();
        assert_eq!(stats.rows_read, 0);
        assert_eq!(stats.rows_kept, 0);
        assert_eq!(stats.dropped(), 0);
        assert_eq!(stats.batches, 0);
        assert!(stats.is_balanced());
    }

    #[test]
    fn mixed_operations() {
        let mut stats = LoadStats::new();
        stats.add_read(4);
        stats.inc_kept();
        stats.inc_kept();
        stats.inc_unparsable();
        stats.inc_out_of_range();
        stats.inc_batches();

        assert_eq!(stats.rows_kept, 2);
        assert_eq!(stats.dropped(), 2);
        assert!(stats.is_balanced());
    }

    #[test]
    fn unbalanced_when_rows_unaccounted() {
        let mut stats = LoadStats::new();
        stats.add_read(3);
        stats.inc_kept();
        assert!(!stats.is_balanced());
    }

    #[test]
    fn add_assign_sums_fields() {
        let mut total = LoadStats::new();
        let mut part = LoadStats::new();
        part.add_read(10);
        part.inc_batches();
        total += part;
        total += part;
        assert_eq!(total.rows_read, 20);
        assert_eq!(total.batches, 2);
    }
}
