use crate::error::{AppError, Result};
use serde::Serialize;
use std::ops::Deref;

/// A validated permutation of `[0, len)`: the order in which store indices
/// are visited.
///
/// The only way to obtain one is through [`VisitOrder::from_path`] or
/// [`VisitOrder::from_indices`], so holding a `VisitOrder` means the
/// permutation check has already passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VisitOrder(Vec<usize>);

impl VisitOrder {
    /// Validate a raw solver path against a set of `len` waypoints.
    ///
    /// Solvers report closed tours (`[0, 2, 1, 0]`): a path of exactly
    /// `len + 1` entries whose last entry repeats the first has its trailing
    /// return dropped before validation.
    pub fn from_path(path: &[i64], len: usize) -> Result<Self> {
        let open = match path {
            [first, .., last] if path.len() == len + 1 && first == last => &path[..len],
            _ => path,
        };

        let indices = open
            .iter()
            .map(|&raw| {
                usize::try_from(raw).map_err(|_| {
                    AppError::MalformedSolverResponse(format!("negative index {} in path", raw))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_indices(indices, len)
    }

    /// Validate that `indices` is a permutation of `[0, len)`.
    pub fn from_indices(indices: Vec<usize>, len: usize) -> Result<Self> {
        if indices.len() != len {
            return Err(AppError::MalformedSolverResponse(format!(
                "path has {} entries, expected {}",
                indices.len(),
                len
            )));
        }

        let mut seen = vec![false; len];
        for &index in &indices {
            match seen.get_mut(index) {
                None => {
                    return Err(AppError::MalformedSolverResponse(format!(
                        "index {} out of range for {} waypoints",
                        index, len
                    )))
                }
                Some(true) => {
                    return Err(AppError::MalformedSolverResponse(format!(
                        "duplicate index {} in path",
                        index
                    )))
                }
                Some(slot) => *slot = true,
            }
        }

        Ok(VisitOrder(indices))
    }

    /// The identity order `[0, 1, .., len)`
    pub fn identity(len: usize) -> Self {
        VisitOrder((0..len).collect())
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }
}

impl Deref for VisitOrder {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}
