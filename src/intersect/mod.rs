// Proximity intersection of sorted posting lists.
//
// - `proximity`: Windowed two-pointer scan over two ascending lists
// - `batch`    : Pair descriptors, list loading and batch reports

pub mod batch;
pub mod proximity;

pub use batch::{
    BatchError, BatchOptions, BatchReport, PairError, PairMatch, PairOutcome, PairSpec,
    PostingSource, parse_pairs, run_batch,
};
pub use proximity::{
    IntersectError, IntersectionCount, IntersectionResult, Side, Window, intersect,
    intersect_count,
};
