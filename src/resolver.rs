//! Bounded search for diagrams without free faces.
//!
//! Starting from an immersed piece, the earliest free edge is repeatedly
//! closed off by attaching a disc at its initial vertex. The search is a lazy
//! breadth-first iterator over completed pieces; callers decide what to do
//! with each one.

use std::collections::VecDeque;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::complex::{ComplexError, ComplexMorphism};
use crate::facial_tree::get_children_at_vertex;
use crate::graph::Edge;

/// Limits on the free-face search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    /// Number of attachment rounds a single branch may take.
    pub max_depth: usize,
    /// Total number of emitted pieces plus expanded branches.
    pub max_resolutions: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        SearchBudget {
            max_depth: 10,
            max_resolutions: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOutcome {
    /// Every branch either closed up or died out.
    Complete,
    /// The budget ran out with `unresolved` branches still open.
    BudgetExhausted { unresolved: usize },
}

#[derive(Clone, Debug)]
pub struct Resolutions {
    pub found: Vec<ComplexMorphism>,
    pub outcome: SearchOutcome,
}

/// The children of `f` at the initial vertex of `e` in which `e` is no longer
/// free. If `e` is not free, `f` itself is the only resolution.
pub fn resolve_free_face(
    f: &ComplexMorphism,
    e: Edge,
) -> Result<Vec<ComplexMorphism>, ComplexError> {
    if !f.domain().is_free_face(e) {
        return Ok(vec![f.clone()]);
    }
    let vertex = f.domain().skeleton().initial(e);
    let resolutions = get_children_at_vertex(f.codomain(), f, vertex)?
        .into_iter()
        .filter(|child| {
            !child
                .immersion
                .domain()
                .is_free_face(child.inclusion.skeleton().edge(e))
        })
        .map(|child| child.immersion)
        .collect();
    Ok(resolutions)
}

/// Breadth-first free-face search yielding every piece without free faces.
///
/// Once the iterator is exhausted, [`FreeFaceResolver::outcome`] tells whether
/// the search space was covered or the budget cut it short.
#[derive(Debug)]
pub struct FreeFaceResolver {
    queue: VecDeque<(ComplexMorphism, usize)>,
    budget: SearchBudget,
    spent: usize,
    too_deep: usize,
    finished: bool,
}

impl FreeFaceResolver {
    pub fn new(f: ComplexMorphism, budget: SearchBudget) -> Self {
        FreeFaceResolver {
            queue: VecDeque::from([(f, 0)]),
            budget,
            spent: 0,
            too_deep: 0,
            finished: false,
        }
    }

    pub fn outcome(&self) -> SearchOutcome {
        let unresolved = self.queue.len() + self.too_deep;
        if unresolved == 0 {
            SearchOutcome::Complete
        } else {
            SearchOutcome::BudgetExhausted { unresolved }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        if let SearchOutcome::BudgetExhausted { unresolved } = self.outcome() {
            warn!("Failed to resolve all free faces within budget: {unresolved} branches open");
        }
    }
}

impl Iterator for FreeFaceResolver {
    type Item = Result<ComplexMorphism, ComplexError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.spent >= self.budget.max_resolutions {
                self.finish();
                break;
            }
            let Some((piece, depth)) = self.queue.pop_front() else {
                self.finish();
                break;
            };

            let Some((e, _)) = piece.domain().free_faces().into_iter().next() else {
                self.spent += 1;
                info!(
                    "resolved piece with {} faces at depth {depth}, chi {}",
                    piece.domain().n_faces(),
                    piece.domain().chi()
                );
                return Some(Ok(piece));
            };

            if depth >= self.budget.max_depth {
                self.too_deep += 1;
                continue;
            }

            self.spent += 1;
            match resolve_free_face(&piece, e) {
                Ok(children) => self
                    .queue
                    .extend(children.into_iter().map(|child| (child, depth + 1))),
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

/// Runs a [`FreeFaceResolver`] to the end.
pub fn resolve_free_faces(
    f: &ComplexMorphism,
    budget: SearchBudget,
) -> Result<Resolutions, ComplexError> {
    let mut resolver = FreeFaceResolver::new(f.clone(), budget);
    let found = resolver.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok(Resolutions {
        found,
        outcome: resolver.outcome(),
    })
}
