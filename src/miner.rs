//! Randomized search for immersions with large Euler characteristic.
//!
//! Each trial walks down the facial tree from a random seed disc, picking a
//! random child at every level and checking all children for `χ ≥ min_chi`.
//! Trials are independent and run on the rayon pool; the first hit stops the
//! others at their next level.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::complex::{Complex, ComplexError, ComplexMorphism};
use crate::face::{Face, Orientation};
use crate::facial_tree::get_children;
use crate::folding::fold_complex_morphism;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Levels of the facial tree walked per trial.
    pub depth: usize,
    /// Number of independent trials.
    pub max_iters: usize,
    /// Trial `i` is seeded with `seed + i`.
    pub seed: u64,
    pub min_chi: i64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            depth: 10,
            max_iters: 30,
            seed: 0,
            min_chi: 2,
        }
    }
}

/// One random walk down the facial tree of `x`.
pub fn traverse<R: Rng>(
    x: &Arc<Complex>,
    config: &MinerConfig,
    rng: &mut R,
) -> Result<Option<ComplexMorphism>, ComplexError> {
    traverse_until(x, config, rng, &AtomicBool::new(false))
}

fn traverse_until<R: Rng>(
    x: &Arc<Complex>,
    config: &MinerConfig,
    rng: &mut R,
    stop: &AtomicBool,
) -> Result<Option<ComplexMorphism>, ComplexError> {
    if x.n_faces() == 0 {
        return Ok(None);
    }
    let face = Face(rng.gen_range(0..x.n_faces()));
    let disc = Complex::disc_diagram(x, face, Orientation::Positive)?;
    let (_, mut parent) = fold_complex_morphism(&disc)?;

    for level in 0..config.depth {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }
        let children = get_children(x, &parent)?;
        if let Some(hit) = children
            .iter()
            .find(|child| child.domain().chi() >= config.min_chi)
        {
            info!(
                "found immersion with chi {} at level {level}",
                hit.domain().chi()
            );
            return Ok(Some(hit.clone()));
        }
        match children.choose(rng) {
            Some(child) => parent = child.clone(),
            None => {
                debug!("dead end at level {level}");
                return Ok(None);
            }
        }
    }
    Ok(None)
}

/// Runs `config.max_iters` trials in parallel and returns the first hit.
pub fn mine(
    x: &Arc<Complex>,
    config: &MinerConfig,
) -> Result<Option<ComplexMorphism>, ComplexError> {
    let stop = AtomicBool::new(false);
    (0..config.max_iters)
        .into_par_iter()
        .find_map_any(|i| {
            let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(i as u64));
            match traverse_until(x, config, &mut rng, &stop) {
                Ok(None) => None,
                found => {
                    stop.store(true, Ordering::Relaxed);
                    found.transpose()
                }
            }
        })
        .transpose()
}

/// Words in `a`, `b` and their inverses `A`, `B` of the given length whose
/// exponent sum in `b` is `b_exponent`. With `reduced`, no letter is followed
/// by its inverse.
pub fn words_with_exponent_sum(length: usize, b_exponent: i64, reduced: bool) -> Vec<String> {
    let mut words = Vec::new();
    let mut prefix = String::new();
    extend_words(length, b_exponent, reduced, &mut prefix, &mut words);
    words
}

fn extend_words(
    length: usize,
    b_exponent: i64,
    reduced: bool,
    prefix: &mut String,
    words: &mut Vec<String>,
) {
    if (length as i64) < b_exponent.abs() {
        return;
    }
    if length == 0 {
        words.push(prefix.clone());
        return;
    }
    for letter in ['a', 'A', 'b', 'B'] {
        if reduced && prefix.chars().last().is_some_and(|prev| is_inverse(prev, letter)) {
            continue;
        }
        let step = match letter {
            'b' => 1,
            'B' => -1,
            _ => 0,
        };
        prefix.push(letter);
        extend_words(length - 1, b_exponent - step, reduced, prefix, words);
        prefix.pop();
    }
}

fn is_inverse(x: char, y: char) -> bool {
    x != y && x.eq_ignore_ascii_case(&y)
}

/// Reduced words that stay reduced when read cyclically.
pub fn cyclically_reduced_words(length: usize, b_exponent: i64) -> Vec<String> {
    words_with_exponent_sum(length, b_exponent, true)
        .into_iter()
        .filter(|w| match (w.chars().next(), w.chars().last()) {
            (Some(first), Some(last)) if w.len() >= 2 => !is_inverse(first, last),
            _ => true,
        })
        .collect()
}

pub fn cyclically_equal(w1: &str, w2: &str) -> bool {
    w1.len() == w2.len() && format!("{w1}{w1}").contains(w2)
}

/// [`cyclically_reduced_words`] with one representative per rotation class.
pub fn unique_up_to_cycling(length: usize, b_exponent: i64) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for w in cyclically_reduced_words(length, b_exponent) {
        if !seen.iter().any(|s| cyclically_equal(s, &w)) {
            seen.push(w);
        }
    }
    seen
}
