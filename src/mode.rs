//! Out-of-range index resolution policies.
//!
//! Every index entering the crate, whether a linear view index or a single
//! subscript, is resolved against an inclusive upper bound by one of the
//! policies below before any address arithmetic happens. Resolution is pure
//! and side-effect free.

use crate::{Result, ViewError};

/// Policy for resolving an index which may lie outside `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// Reject any index outside `[0, max]`.
    #[default]
    Error,
    /// Saturate to the nearest bound.
    Clamp,
    /// Wrap around onto `[0, max]` using modulo arithmetic.
    Wrap,
    /// Accept a single negative index counted once from the end, then
    /// reject as [`IndexMode::Error`] does.
    Normalize,
}

/// Clamp `idx` to `[0, max]`.
#[inline]
pub fn clamp_index(idx: isize, max: usize) -> usize {
    if idx < 0 {
        0
    } else if idx as usize > max {
        max
    } else {
        idx as usize
    }
}

/// Wrap `idx` onto `[0, max]`, a range of `max + 1` values.
///
/// The near-range cases, at most one period above or below the range, are
/// handled with a single add or subtract; only far out-of-range values pay
/// for a full modulo. The result follows the mathematical modulo convention
/// and is always non-negative.
#[inline]
pub fn wrap_index(idx: isize, max: usize) -> usize {
    let period = max as isize + 1;
    if idx < 0 {
        if idx >= -period {
            (idx + period) as usize
        } else {
            let r = idx % period;
            if r == 0 {
                0
            } else {
                (r + period) as usize
            }
        }
    } else if idx > max as isize {
        if idx < 2 * period {
            (idx - period) as usize
        } else {
            (idx % period) as usize
        }
    } else {
        idx as usize
    }
}

/// Resolve a negative `idx` by counting once from the end of a range of
/// `max + 1` values, then bounds-check.
///
/// Unlike [`wrap_index`], an index more than one range-width out of bounds
/// is an error, not wrapped again.
#[inline]
pub fn normalize_index(idx: isize, max: usize) -> Result<usize> {
    let j = if idx < 0 { idx + max as isize + 1 } else { idx };
    if j < 0 || j > max as isize {
        Err(ViewError::OutOfBounds { idx, max })
    } else {
        Ok(j as usize)
    }
}

/// Resolve `idx` against the inclusive bound `max` under `mode`.
#[inline]
pub fn resolve_index(idx: isize, max: usize, mode: IndexMode) -> Result<usize> {
    match mode {
        IndexMode::Error => {
            if idx < 0 || idx as usize > max {
                Err(ViewError::OutOfBounds { idx, max })
            } else {
                Ok(idx as usize)
            }
        }
        IndexMode::Clamp => Ok(clamp_index(idx, max)),
        IndexMode::Wrap => Ok(wrap_index(idx, max)),
        IndexMode::Normalize => normalize_index(idx, max),
    }
}
