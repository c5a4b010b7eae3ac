//! Lookup shapes for indexed collections
//!
//! The header stack and option lists both accept a scalar index and reject
//! everything else. `Query` keeps the two failure kinds distinguishable:
//! an out-of-range or negative scalar is an `IndexOutOfRange`, while a span
//! (range) lookup is a `Shape` error regardless of its bounds.

use std::ops::Range;

use crate::error::{Error, Result};

/// A lookup request against an indexed collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Scalar position, 0-based. Negative values are always out of range.
    At(isize),
    /// Span of positions. Not a supported query shape.
    Span(usize, usize),
}

impl Query {
    /// Resolve the query against a collection of `len` elements.
    ///
    /// Returns the concrete position for an in-range scalar query. `what`
    /// names the collection in error messages.
    pub fn resolve(self, len: usize, what: &str) -> Result<usize> {
        match self {
            Query::At(index) => {
                if index < 0 || index as usize >= len {
                    Err(Error::IndexOutOfRange { index, len })
                } else {
                    Ok(index as usize)
                }
            }
            Query::Span(start, end) => Err(Error::Shape(format!(
                "{what} supports scalar indexing only, got span {start}..{end}"
            ))),
        }
    }
}

impl From<usize> for Query {
    fn from(index: usize) -> Self {
        Query::At(index as isize)
    }
}

impl From<isize> for Query {
    fn from(index: isize) -> Self {
        Query::At(index)
    }
}

impl From<i32> for Query {
    fn from(index: i32) -> Self {
        Query::At(index as isize)
    }
}

impl From<Range<usize>> for Query {
    fn from(range: Range<usize>) -> Self {
        Query::Span(range.start, range.end)
    }
}
