// Batch proximity intersection over pairs of stored posting lists.
//
// A batch descriptor lists one pair of list identifiers per line. Each pair
// is loaded through a `PostingSource`, intersected, and reported on its own;
// a failing pair never corrupts the others.

#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpu_time::ProcessTime;
use thiserror::Error;

use super::proximity::{self, IntersectError, Window};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Pair descriptor
// ---------------------------------------------------------------------------

/// Two list identifiers to intersect: `a` supplies the windows, matches are
/// counted in `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairSpec {
    pub a: u64,
    pub b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("pairs line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Parse a batch descriptor.
///
/// One pair per line, two whitespace-separated unsigned identifiers. Blank
/// lines and lines starting with `#` are skipped. Line numbers in errors are
/// 1-based.
pub fn parse_pairs(text: &str) -> Result<Vec<PairSpec>, BatchError> {
    let mut pairs = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let err = |reason: String| BatchError::Parse {
            line: i + 1,
            reason,
        };
        let mut fields = line.split_whitespace();
        let (Some(a), Some(b), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(err(format!("expected two identifiers, got '{line}'")));
        };
        let a = a
            .parse::<u64>()
            .map_err(|e| err(format!("bad identifier '{a}': {e}")))?;
        let b = b
            .parse::<u64>()
            .map_err(|e| err(format!("bad identifier '{b}': {e}")))?;
        pairs.push(PairSpec { a, b });
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Source provider trait
// ---------------------------------------------------------------------------

/// Resolves a list identifier to a decoded posting list.
///
/// Implementations return lists ready for intersection, i.e. sorted
/// ascending.
pub trait PostingSource: Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load(&self, id: u64) -> Result<Vec<u64>, Self::Error>;
}

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// Configuration for [`run_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Tolerance window applied to every pair.
    pub window: Window,
    /// Keep the matched values, not just their count.
    pub collect_matches: bool,
    /// Continue past failing pairs instead of stopping at the first one.
    ///
    /// When unset, pairs after the first failure are not loaded. With the
    /// `parallel` feature, pairs already in flight on other threads still
    /// finish, but their outcomes are dropped from the report.
    pub keep_going: bool,
}

/// Result of one successfully intersected pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairMatch {
    pub count: usize,
    /// Present when [`BatchOptions::collect_matches`] is set.
    pub matches: Option<Vec<u64>>,
}

#[derive(Debug, Error)]
pub enum PairError {
    #[error("list {id}: {source}")]
    Load {
        id: u64,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    Intersect(#[from] IntersectError),
}

#[derive(Debug)]
pub struct PairOutcome {
    pub pair: PairSpec,
    pub result: Result<PairMatch, PairError>,
}

/// Everything a batch run produced, in descriptor order.
///
/// Without `keep_going`, outcomes stop at the first failing pair.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<PairOutcome>,
    /// Wall-clock time around the pair loop.
    pub elapsed: Duration,
    /// Process CPU time around the pair loop, summed over all threads.
    /// Zero if the platform clock is unavailable.
    pub cpu: Duration,
}

impl BatchReport {
    /// Sum of match counts over successful pairs.
    pub fn total_matches(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|m| m.count)
            .sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Intersect every pair in `pairs`, loading lists from `source`.
pub fn run_batch<S: PostingSource>(
    source: &S,
    pairs: &[PairSpec],
    opts: &BatchOptions,
) -> BatchReport {
    let started = Instant::now();
    let cpu_started = ProcessTime::try_now().ok();

    #[cfg(feature = "parallel")]
    let mut outcomes: Vec<PairOutcome> = {
        // Lowest failing index so far; later pairs are skipped.
        let first_failure = AtomicUsize::new(usize::MAX);
        let ran: Vec<Option<PairOutcome>> = pairs
            .par_iter()
            .enumerate()
            .map(|(i, &pair)| {
                if !opts.keep_going && i > first_failure.load(Ordering::Relaxed) {
                    return None;
                }
                let outcome = run_pair(source, pair, opts);
                if outcome.result.is_err() {
                    first_failure.fetch_min(i, Ordering::Relaxed);
                }
                Some(outcome)
            })
            .collect();
        ran.into_iter().map_while(std::convert::identity).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let mut outcomes: Vec<PairOutcome> = {
        let mut out = Vec::with_capacity(pairs.len());
        for &pair in pairs {
            let outcome = run_pair(source, pair, opts);
            let failed = outcome.result.is_err();
            out.push(outcome);
            if failed && !opts.keep_going {
                break;
            }
        }
        out
    };

    if !opts.keep_going
        && let Some(first_err) = outcomes.iter().position(|o| o.result.is_err())
    {
        outcomes.truncate(first_err + 1);
    }

    let cpu = cpu_started
        .and_then(|t| t.try_elapsed().ok())
        .unwrap_or_default();
    let report = BatchReport {
        outcomes,
        elapsed: started.elapsed(),
        cpu,
    };
    log::info!(
        "batch: {} pair(s), {} match(es), {} failure(s) in {:?} ({:?} cpu)",
        report.outcomes.len(),
        report.total_matches(),
        report.failures(),
        report.elapsed,
        report.cpu
    );
    report
}

fn run_pair<S: PostingSource>(source: &S, pair: PairSpec, opts: &BatchOptions) -> PairOutcome {
    let result = intersect_pair(source, pair, opts);
    match &result {
        Ok(m) => log::debug!("pair {} {}: {} match(es)", pair.a, pair.b, m.count),
        Err(e) if opts.keep_going => log::warn!("pair {} {} skipped: {e}", pair.a, pair.b),
        Err(_) => {}
    }
    PairOutcome { pair, result }
}

fn intersect_pair<S: PostingSource>(
    source: &S,
    pair: PairSpec,
    opts: &BatchOptions,
) -> Result<PairMatch, PairError> {
    let load = |id: u64| {
        source.load(id).map_err(|e| PairError::Load {
            id,
            source: Box::new(e),
        })
    };
    let a = load(pair.a)?;
    let b = load(pair.b)?;

    if opts.collect_matches {
        let r = proximity::intersect(opts.window, &a, &b)?;
        Ok(PairMatch {
            count: r.len(),
            matches: Some(r.into_matches()),
        })
    } else {
        let r = proximity::intersect_count(opts.window, &a, &b)?;
        Ok(PairMatch {
            count: r.count,
            matches: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Error)]
    #[error("no list {0}")]
    struct Missing(u64);

    struct MemSource(HashMap<u64, Vec<u64>>);

    impl PostingSource for MemSource {
        type Error = Missing;

        fn load(&self, id: u64) -> Result<Vec<u64>, Missing> {
            self.0.get(&id).cloned().ok_or(Missing(id))
        }
    }

    fn source() -> MemSource {
        MemSource(HashMap::from([
            (1, vec![10, 50, 100]),
            (2, vec![8, 12, 60, 95, 200]),
            (3, vec![]),
            (4, vec![9, 3]),
        ]))
    }

    #[test]
    fn parse_pairs_accepts_comments_and_blanks() {
        let text = "# header\n1 2\n\n  3\t4  \n";
        assert_eq!(
            parse_pairs(text).unwrap(),
            [PairSpec { a: 1, b: 2 }, PairSpec { a: 3, b: 4 }]
        );
    }

    #[test]
    fn parse_pairs_rejects_malformed_lines() {
        assert!(matches!(
            parse_pairs("1 2\n3\n"),
            Err(BatchError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_pairs("1 2 3"),
            Err(BatchError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            parse_pairs("1 -2"),
            Err(BatchError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn batch_counts_each_pair() {
        let pairs = [PairSpec { a: 1, b: 2 }, PairSpec { a: 2, b: 3 }];
        let opts = BatchOptions {
            window: Window::new(5, 5),
            ..Default::default()
        };
        let report = run_batch(&source(), &pairs, &opts);
        assert!(report.is_success());
        let counts: Vec<usize> = report
            .outcomes
            .iter()
            .map(|o| o.result.as_ref().unwrap().count)
            .collect();
        assert_eq!(counts, [3, 0]);
        assert_eq!(report.total_matches(), 3);
        assert!(report.outcomes[0].result.as_ref().unwrap().matches.is_none());
    }

    #[test]
    fn batch_collects_matches_on_request() {
        let opts = BatchOptions {
            window: Window::new(5, 5),
            collect_matches: true,
            ..Default::default()
        };
        let report = run_batch(&source(), &[PairSpec { a: 1, b: 2 }], &opts);
        let m = report.outcomes[0].result.as_ref().unwrap();
        assert_eq!(m.matches.as_deref(), Some(&[8, 12, 95][..]));
    }

    #[test]
    fn batch_stops_at_first_failure_by_default() {
        let pairs = [
            PairSpec { a: 1, b: 2 },
            PairSpec { a: 1, b: 99 },
            PairSpec { a: 2, b: 1 },
        ];
        let report = run_batch(&source(), &pairs, &BatchOptions::default());
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures(), 1);
        assert!(matches!(
            report.outcomes[1].result,
            Err(PairError::Load { id: 99, .. })
        ));
    }

    #[test]
    fn batch_reports_cpu_time() {
        let a: Vec<u64> = (0..200_000u64).map(|i| i * 3).collect();
        let b: Vec<u64> = (0..200_000u64).map(|i| i * 5).collect();
        let source = MemSource(HashMap::from([(1, a), (2, b)]));
        let pairs = [PairSpec { a: 1, b: 2 }, PairSpec { a: 2, b: 1 }];
        let opts = BatchOptions {
            window: Window::new(1, 1),
            collect_matches: true,
            ..Default::default()
        };
        let report = run_batch(&source, &pairs, &opts);
        assert!(report.is_success());
        assert!(report.cpu > Duration::ZERO);
        assert!(report.elapsed > Duration::ZERO);
    }

    /// Counts every `load` call.
    struct CountingSource {
        inner: MemSource,
        loads: std::sync::atomic::AtomicUsize,
    }

    impl PostingSource for CountingSource {
        type Error = Missing;

        fn load(&self, id: u64) -> Result<Vec<u64>, Missing> {
            self.loads.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            self.inner.load(id)
        }
    }

    fn counting() -> CountingSource {
        CountingSource {
            inner: source(),
            loads: Default::default(),
        }
    }

    #[test]
    fn pairs_after_failure_are_not_loaded() {
        let pairs = [
            PairSpec { a: 99, b: 2 },
            PairSpec { a: 1, b: 2 },
            PairSpec { a: 2, b: 1 },
            PairSpec { a: 1, b: 3 },
        ];
        let source = counting();

        #[cfg(not(feature = "parallel"))]
        let report = run_batch(&source, &pairs, &BatchOptions::default());
        // One worker runs pairs in index order.
        #[cfg(feature = "parallel")]
        let report = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| run_batch(&source, &pairs, &BatchOptions::default()));

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(source.loads.load(std::sync::atomic::Ordering::Relaxed), 1);
    }

    #[test]
    fn batch_keep_going_reports_every_pair() {
        let pairs = [
            PairSpec { a: 4, b: 2 },
            PairSpec { a: 1, b: 99 },
            PairSpec { a: 2, b: 1 },
        ];
        let opts = BatchOptions {
            keep_going: true,
            ..Default::default()
        };
        let report = run_batch(&source(), &pairs, &opts);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.failures(), 2);
        assert!(matches!(
            report.outcomes[0].result,
            Err(PairError::Intersect(IntersectError::Unsorted { .. }))
        ));
        assert!(report.outcomes[2].result.is_ok());
    }
}
