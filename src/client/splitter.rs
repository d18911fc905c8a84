//! Deterministic partitioning of a source into numbered byte ranges.

use crate::models::upload::MAX_PART_NUMBER;
use std::ops::Range;
use thiserror::Error;

/// Part size used unless the caller picks another (5 MiB, also the
/// smallest non-final part an S3-style store accepts).
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("cannot upload an empty file")]
    EmptySource,
    #[error("part size must be at least 1 byte")]
    ZeroPartSize,
    #[error("file needs {parts} parts, more than the {max} a multipart upload allows")]
    TooManyParts { parts: u64, max: u32 },
}

/// One contiguous `[start, end)` slice of the source, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    pub part_number: u32,
    pub start: u64,
    pub end: u64,
}

impl PartRange {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Number of parts `file_size` splits into: `ceil(file_size / max_part_size)`.
pub fn part_count(file_size: u64, max_part_size: u64) -> Result<u64, SplitError> {
    if file_size == 0 {
        return Err(SplitError::EmptySource);
    }
    if max_part_size == 0 {
        return Err(SplitError::ZeroPartSize);
    }
    Ok(file_size.div_ceil(max_part_size))
}

/// Split `[0, file_size)` into `ceil(file_size / max_part_size)` parts.
///
/// Every part but the last is exactly `max_part_size` long; the last holds
/// the remainder and is never empty. Same input, same output.
pub fn split_parts(file_size: u64, max_part_size: u64) -> Result<Vec<PartRange>, SplitError> {
    let parts = part_count(file_size, max_part_size)?;
    if parts > u64::from(MAX_PART_NUMBER) {
        return Err(SplitError::TooManyParts {
            parts,
            max: MAX_PART_NUMBER,
        });
    }

    Ok((1..=parts as u32)
        .map(|part_number| {
            let start = u64::from(part_number - 1) * max_part_size;
            PartRange {
                part_number,
                start,
                end: (start + max_part_size).min(file_size),
            }
        })
        .collect())
}
