//! Random records for the benchmark table.

use chrono::{Local, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::quote_literal;

pub const MAX_INTEGER: i32 = 1_000_000_000;
pub const MAX_SMALLINT: i16 = 1_000;
pub const VARCHAR_LEN: usize = 100;

/// Timestamp layout matching the `TIMEFORMAT 'YYYY-MM-DD HH:MI:SS'` clause used when loading CSVs
pub const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// One row of the benchmark table, minus the identity column.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    pub my_integer: i32,
    pub my_smallint: i16,
    pub my_decimal: f64,
    pub my_timestamp: NaiveDateTime,
    pub my_varchar: String,
}

impl BenchmarkRecord {
    /// Renders the record as a parenthesized tuple of SQL literals, in column order.
    pub fn to_sql_values(&self) -> String {
        format!(
            "({}, {}, {:.6}, {}, {})",
            self.my_integer,
            self.my_smallint,
            self.my_decimal,
            quote_literal(&self.my_timestamp.format(SQL_TIMESTAMP_FORMAT).to_string()),
            quote_literal(&self.my_varchar),
        )
    }

    /// Renders the record as CSV fields, in column order.
    pub fn to_csv_fields(&self) -> [String; 5] {
        [
            self.my_integer.to_string(),
            self.my_smallint.to_string(),
            format!("{:.6}", self.my_decimal),
            self.my_timestamp.format(CSV_TIMESTAMP_FORMAT).to_string(),
            self.my_varchar.clone(),
        ]
    }
}

/// Generates [`BenchmarkRecord`]s from a seeded RNG, so that every run inserts the same values
/// apart from the timestamps.
pub struct RecordGenerator {
    rng: StdRng,
}

impl RecordGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn record(&mut self) -> BenchmarkRecord {
        BenchmarkRecord {
            my_integer: self.rng.gen_range(0..=MAX_INTEGER),
            my_smallint: self.rng.gen_range(0..=MAX_SMALLINT),
            my_decimal: self.rng.gen(),
            my_timestamp: Local::now().naive_local(),
            my_varchar: (0..VARCHAR_LEN)
                .map(|_| self.rng.gen_range(b'a'..=b'z') as char)
                .collect(),
        }
    }

    pub fn records(&mut self, count: usize) -> Vec<BenchmarkRecord> {
        (0..count).map(|_| self.record()).collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use test_strategy::proptest;

    use super::*;

    fn fixed_record() -> BenchmarkRecord {
        BenchmarkRecord {
            my_integer: 42,
            my_smallint: 7,
            my_decimal: 0.5,
            my_timestamp: NaiveDate::from_ymd_opt(2021, 3, 4)
                .unwrap()
                .and_hms_micro_opt(5, 6, 7, 890)
                .unwrap(),
            my_varchar: "abc".into(),
        }
    }

    #[test]
    fn sql_values() {
        assert_eq!(
            fixed_record().to_sql_values(),
            "(42, 7, 0.500000, '2021-03-04 05:06:07.000890', 'abc')"
        );
    }

    #[test]
    fn csv_fields_drop_subseconds() {
        assert_eq!(
            fixed_record().to_csv_fields(),
            [
                "42".to_owned(),
                "7".to_owned(),
                "0.500000".to_owned(),
                "2021-03-04 05:06:07".to_owned(),
                "abc".to_owned(),
            ]
        );
    }

    #[test]
    fn same_seed_same_values() {
        let strip = |r: BenchmarkRecord| (r.my_integer, r.my_smallint, r.my_decimal, r.my_varchar);
        let a = RecordGenerator::new(1).records(20);
        let b = RecordGenerator::new(1).records(20);
        let c = RecordGenerator::new(2).records(20);
        let a = a.into_iter().map(strip).collect::<Vec<_>>();
        let b = b.into_iter().map(strip).collect::<Vec<_>>();
        let c = c.into_iter().map(strip).collect::<Vec<_>>();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[proptest]
    fn records_fit_the_columns(seed: u64) {
        let record = RecordGenerator::new(seed).record();
        assert!((0..=MAX_INTEGER).contains(&record.my_integer));
        assert!((0..=MAX_SMALLINT).contains(&record.my_smallint));
        assert!((0.0..1.0).contains(&record.my_decimal));
        assert_eq!(record.my_varchar.len(), VARCHAR_LEN);
        assert!(record.my_varchar.bytes().all(|b| b.is_ascii_lowercase()));
    }
}
