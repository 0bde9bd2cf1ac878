use thiserror::Error;

/// Reasons for which a [`PerfectHashTable`](crate::PerfectHashTable) cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The key collection is empty.
    #[error("cannot build a perfect hash table for an empty key collection")]
    EmptyInput,

    /// The key collection contains structurally equal keys and [`DuplicatePolicy::Reject`](crate::DuplicatePolicy::Reject) is in use.
    #[error("key collection contains duplicates (found in bucket {bucket})")]
    DuplicateKeys { bucket: usize },

    /// The bucket is so large that the number of its slots does not fit in `usize`.
    #[error("bucket {bucket} of {bucket_size} keys is too large to be resolved")]
    BucketTooLarge { bucket: usize, bucket_size: usize },

    /// No function separating the keys of a bucket has been drawn within the allowed number of attempts.
    /// It indicates a defect of the universal family rather than a problem with the input.
    #[error("no collision-free function found for bucket {bucket} of {bucket_size} keys in {attempts} attempts")]
    InternalHashingFailure { bucket: usize, bucket_size: usize, attempts: u32 },
}

/// The key is not in the collection the table was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("look up table does not contain such a key")]
pub struct NotFound;
