//! Named counters shared with the pipeline.
//!
//! The output asks for accumulators by name and kind, the pipeline creates
//! them and hands them back. Accumulators are lock-free and may be updated
//! from any thread.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use colbridge_common::{
    ACCUMULATOR_NUMBER_OF_FILTERS_SCANNED, ACCUMULATOR_NUMBER_OF_SCANNERS,
    ACCUMULATOR_SECONDS_SCANNING,
};

/// Value kind of an accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccumulatorKind {
    /// Integer counter.
    Long,
    /// Floating-point sum.
    Double,
}

/// A request for an accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccumulatorRequest {
    name: String,
    kind: AccumulatorKind,
}

impl AccumulatorRequest {
    /// Creates a request.
    pub fn new(name: impl Into<String>, kind: AccumulatorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns the accumulator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the accumulator kind.
    pub fn kind(&self) -> AccumulatorKind {
        self.kind
    }
}

/// Integer accumulator.
#[derive(Debug, Default)]
pub struct LongAccumulator {
    value: AtomicI64,
}

impl LongAccumulator {
    /// Adds to the accumulator.
    #[inline]
    pub fn add(&self, delta: i64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Returns the current value.
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Floating-point accumulator.
#[derive(Debug, Default)]
pub struct DoubleAccumulator {
    /// `f64` bits.
    bits: AtomicU64,
}

impl DoubleAccumulator {
    /// Adds to the accumulator.
    pub fn add(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Returns the current value.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// A set of named accumulators.
#[derive(Debug, Clone, Default)]
pub struct Accumulators {
    longs: HashMap<String, Arc<LongAccumulator>>,
    doubles: HashMap<String, Arc<DoubleAccumulator>>,
}

impl Accumulators {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one accumulator per request.
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a AccumulatorRequest>) -> Self {
        let mut accumulators = Self::new();
        for request in requests {
            match request.kind() {
                AccumulatorKind::Long => {
                    accumulators
                        .longs
                        .entry(request.name().to_string())
                        .or_default();
                }
                AccumulatorKind::Double => {
                    accumulators
                        .doubles
                        .entry(request.name().to_string())
                        .or_default();
                }
            }
        }
        accumulators
    }

    /// Returns the named integer accumulator.
    pub fn long(&self, name: &str) -> Option<Arc<LongAccumulator>> {
        self.longs.get(name).cloned()
    }

    /// Returns the named floating-point accumulator.
    pub fn double(&self, name: &str) -> Option<Arc<DoubleAccumulator>> {
        self.doubles.get(name).cloned()
    }
}

/// The accumulators updated by existence scans.
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    scanners: Arc<LongAccumulator>,
    filters_scanned: Arc<LongAccumulator>,
    seconds_scanning: Arc<DoubleAccumulator>,
}

impl ScanMetrics {
    /// Returns the requests for the scan accumulators.
    pub fn requests() -> Vec<AccumulatorRequest> {
        vec![
            AccumulatorRequest::new(ACCUMULATOR_NUMBER_OF_SCANNERS, AccumulatorKind::Long),
            AccumulatorRequest::new(ACCUMULATOR_NUMBER_OF_FILTERS_SCANNED, AccumulatorKind::Long),
            AccumulatorRequest::new(ACCUMULATOR_SECONDS_SCANNING, AccumulatorKind::Double),
        ]
    }

    /// Picks the scan accumulators out of a set. Returns `None` if any is absent.
    pub fn from_accumulators(accumulators: &Accumulators) -> Option<Self> {
        Some(Self {
            scanners: accumulators.long(ACCUMULATOR_NUMBER_OF_SCANNERS)?,
            filters_scanned: accumulators.long(ACCUMULATOR_NUMBER_OF_FILTERS_SCANNED)?,
            seconds_scanning: accumulators.double(ACCUMULATOR_SECONDS_SCANNING)?,
        })
    }

    /// Records one scan over `filters` filter rows.
    pub fn record_scan(&self, filters: usize) {
        self.scanners.add(1);
        self.filters_scanned
            .add(i64::try_from(filters).unwrap_or(i64::MAX));
    }

    /// Records time spent scanning.
    pub fn record_seconds(&self, seconds: f64) {
        self.seconds_scanning.add(seconds);
    }

    /// Returns the number of scanners opened.
    pub fn scanners(&self) -> i64 {
        self.scanners.value()
    }

    /// Returns the number of filter rows scanned.
    pub fn filters_scanned(&self) -> i64 {
        self.filters_scanned.value()
    }

    /// Returns the seconds spent scanning.
    pub fn seconds_scanning(&self) -> f64 {
        self.seconds_scanning.value()
    }
}

impl fmt::Display for ScanMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanners={}, filters={}, seconds={:.3}",
            self.scanners(),
            self.filters_scanned(),
            self.seconds_scanning()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_requests() {
        let accumulators = Accumulators::from_requests(&ScanMetrics::requests());
        assert!(accumulators.long(ACCUMULATOR_NUMBER_OF_SCANNERS).is_some());
        assert!(accumulators.double(ACCUMULATOR_SECONDS_SCANNING).is_some());
        assert!(accumulators.long(ACCUMULATOR_SECONDS_SCANNING).is_none());
    }

    #[test]
    fn test_scan_metrics() {
        let accumulators = Accumulators::from_requests(&ScanMetrics::requests());
        let metrics = ScanMetrics::from_accumulators(&accumulators).unwrap();
        metrics.record_scan(3);
        metrics.record_scan(2);
        metrics.record_seconds(0.25);
        metrics.record_seconds(0.5);

        assert_eq!(metrics.scanners(), 2);
        assert_eq!(metrics.filters_scanned(), 5);
        assert!((metrics.seconds_scanning() - 0.75).abs() < 1e-9);
        assert_eq!(
            accumulators.long(ACCUMULATOR_NUMBER_OF_FILTERS_SCANNED).unwrap().value(),
            5
        );
    }

    #[test]
    fn test_incomplete_set() {
        let requests = vec![AccumulatorRequest::new(
            ACCUMULATOR_NUMBER_OF_SCANNERS,
            AccumulatorKind::Long,
        )];
        let accumulators = Accumulators::from_requests(&requests);
        assert!(ScanMetrics::from_accumulators(&accumulators).is_none());
    }

    #[test]
    fn test_double_accumulator_concurrent_adds() {
        let accumulator = Arc::new(DoubleAccumulator::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let accumulator = Arc::clone(&accumulator);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        accumulator.add(0.5);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(accumulator.value(), 2000.0);
    }
}
