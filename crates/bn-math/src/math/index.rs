//! Row-major indexing over dense tables.
//!
//! Tables are addressed by an *assignment*: one index per axis. Operands
//! whose axes are a subset (in any order) of a result's axes are read
//! through *broadcast strides*, where axes the operand lacks get stride 0.

/// Number of cells in a table of the given shape, or `None` on overflow.
///
/// The empty shape has one cell.
pub fn cell_count(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Cell count widened to `u128`, saturating at `u128::MAX`.
pub fn wide_cell_count(shape: &[usize]) -> u128 {
    shape
        .iter()
        .fold(1u128, |acc, &dim| acc.saturating_mul(dim as u128))
}

/// Row-major strides for `shape`: the last axis is contiguous.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut step = 1;
    for (stride, dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *stride = step;
        step *= dim;
    }
    strides
}

/// Lift an operand's strides into the axis space of a wider result.
///
/// `axis_map[i]` is the result axis that holds operand axis `i`. Result axes
/// the operand does not have get stride 0, so the operand value is repeated
/// along them.
pub fn broadcast_strides(operand_strides: &[usize], axis_map: &[usize], ndim: usize) -> Vec<usize> {
    let mut out = vec![0; ndim];
    for (stride, &axis) in operand_strides.iter().zip(axis_map.iter()) {
        out[axis] = *stride;
    }
    out
}

/// Linear offset of `assignment` under `strides`.
pub fn offset(assignment: &[usize], strides: &[usize]) -> usize {
    assignment
        .iter()
        .zip(strides.iter())
        .map(|(i, s)| i * s)
        .sum()
}

/// Iterator over every assignment of a shape, in row-major order.
///
/// ```
/// use bn_math::Assignments;
///
/// let all: Vec<Vec<usize>> = Assignments::new(&[2, 3]).collect();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all[0], vec![0, 0]);
/// assert_eq!(all[4], vec![1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct Assignments {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Assignments {
    pub fn new(shape: &[usize]) -> Self {
        let next = if shape.iter().any(|&d| d == 0) {
            None
        } else {
            Some(vec![0; shape.len()])
        };
        Self {
            shape: shape.to_vec(),
            next,
        }
    }
}

impl Iterator for Assignments {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        let mut axis = following.len();
        let mut carried = true;
        while carried && axis > 0 {
            axis -= 1;
            following[axis] += 1;
            if following[axis] < self.shape[axis] {
                carried = false;
            } else {
                following[axis] = 0;
            }
        }
        if !carried {
            self.next = Some(following);
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_row_major() {
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(row_major_strides(&[5]), vec![1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn cell_count_detects_overflow() {
        assert_eq!(cell_count(&[2, 3]), Some(6));
        assert_eq!(cell_count(&[]), Some(1));
        assert_eq!(cell_count(&[usize::MAX, 2]), None);
        assert_eq!(wide_cell_count(&[usize::MAX, 2]), usize::MAX as u128 * 2);
    }

    #[test]
    fn broadcast_zeroes_missing_axes() {
        // operand over result axes (2, 0)
        let strides = broadcast_strides(&[3, 1], &[2, 0], 3);
        assert_eq!(strides, vec![1, 0, 3]);
        assert_eq!(offset(&[1, 5, 2], &strides), 7);
    }

    #[test]
    fn assignments_enumerate_in_row_major_order() {
        let shape = [2, 2, 3];
        let strides = row_major_strides(&shape);
        for (i, assignment) in Assignments::new(&shape).enumerate() {
            assert_eq!(offset(&assignment, &strides), i);
        }
        assert_eq!(Assignments::new(&shape).count(), 12);
    }

    #[test]
    fn assignments_of_scalar_and_empty_shapes() {
        assert_eq!(Assignments::new(&[]).count(), 1);
        assert_eq!(Assignments::new(&[3, 0]).count(), 0);
    }
}
