use crate::common::*;

/// Synchronous random access over the samples of one subsequence.
///
/// Subsequences hold no mutable state after construction, so shared
/// references may be read from multiple threads; parallel throughput is
/// the caller's concern.
pub trait RandomAccessDataset
where
    Self: Debug + Send + Sync,
{
    type Item;

    /// Number of samples in the subsequence.
    fn num_samples(&self) -> usize;

    /// Load the nth sample.
    fn nth(&self, index: usize) -> Result<Self::Item>;
}
