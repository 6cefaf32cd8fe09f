//! Splitting the index space `[0, n-1]` into independently dispatchable work
//! units.

use crate::error::ValidationError;
use crate::types::ComponentRange;
use crate::validation::MAX_WALKS;

/// Split `[0, n-1]` into at most `num_units` contiguous inclusive ranges.
///
/// Every range gets `n / num_units` components and the first
/// `n % num_units` get one extra. When `num_units > n` only `n` single
/// component ranges are produced.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] if `n` or `num_units`
/// is zero.
pub fn partition_components(
    n: usize,
    num_units: usize,
) -> Result<Vec<(usize, usize)>, ValidationError> {
    if n == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "n".into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }
    if num_units == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "num_units".into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }

    let units = num_units.min(n);
    let base = n / units;
    let extra = n % units;

    let mut ranges = Vec::with_capacity(units);
    let mut start = 0;
    for u in 0..units {
        let size = base + usize::from(u < extra);
        ranges.push((start, start + size - 1));
        start += size;
    }
    debug_assert_eq!(start, n);
    Ok(ranges)
}

/// [`partition_components`] with a walk count attached to every range.
///
/// # Errors
///
/// As [`partition_components`], plus
/// [`ValidationError::ParameterOutOfRange`] when `num_walks` is zero or
/// above [`MAX_WALKS`].
pub fn work_units(
    n: usize,
    num_units: usize,
    num_walks: u64,
) -> Result<Vec<ComponentRange>, ValidationError> {
    if num_walks == 0 || num_walks > MAX_WALKS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "num_walks".into(),
            value: num_walks.to_string(),
            expected: format!("[1, {MAX_WALKS}]"),
        });
    }
    Ok(partition_components(n, num_units)?
        .into_iter()
        .map(|(start, end)| ComponentRange::new(start, end, num_walks))
        .collect())
}
