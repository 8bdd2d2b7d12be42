//! Linking engine: content comparison, the link protocol and bucket reduction.
//!
//! - [`compare`]: chunked byte-for-byte equality
//! - [`link`]: rename-backup protocol behind a [`LinkBackend`]
//! - [`reducer`]: per-bucket divide-and-conquer and the worker pool
//! - [`stats`]: per-bucket reports merged by the caller

pub mod compare;
pub mod link;
pub mod reducer;
pub mod stats;

pub use compare::{contents_equal, CompareError, CHUNK_SIZE};
pub use link::{backup_path, link_file, LinkBackend, LinkError, LinkOutcome, StdFs};
pub use reducer::{reduce, reduce_bucket, select_master, LinkPolicy, ReduceError, ReducerConfig};
pub use stats::LinkStats;
