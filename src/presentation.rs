//! Group presentations and their presentation complexes.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::complex::{Complex, ComplexError};
use crate::face::Orientation;
use crate::graph::builder::GraphBuilder;

/// A generator with an exponent of `±1`.
pub type Letter = (String, Orientation);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub generators: Vec<String>,
    pub relators: Vec<Vec<Letter>>,
}

impl Presentation {
    pub fn new(generators: Vec<String>, relators: Vec<Vec<Letter>>) -> Self {
        Presentation {
            generators,
            relators,
        }
    }

    /// Reads relators letter by letter: a lowercase letter is a generator, an
    /// uppercase one its inverse.
    ///
    /// ```
    /// # use cellfold::presentation::Presentation;
    /// let p = Presentation::from_strings(&["a", "b"], &["abAB"]);
    /// assert_eq!(p.relators[0].len(), 4);
    /// ```
    pub fn from_strings(generators: &[&str], relators: &[&str]) -> Self {
        let relators = relators
            .iter()
            .map(|word| {
                word.chars()
                    .map(|c| {
                        let orientation = if c.is_uppercase() {
                            Orientation::Negative
                        } else {
                            Orientation::Positive
                        };
                        (c.to_lowercase().collect(), orientation)
                    })
                    .collect()
            })
            .collect();
        Presentation::new(generators.iter().map(|g| g.to_string()).collect(), relators)
    }

    /// The presentation complex: a rose with one petal per generator and one
    /// face per relator, read along the petals.
    pub fn complex(&self) -> Result<Complex, ComplexError> {
        let mut builder = GraphBuilder::new();
        let v = builder.add_vertex("v");
        let petals: AHashMap<&str, _> = self
            .generators
            .iter()
            .map(|g| (g.as_str(), builder.add_edge(v, v, g.as_str())))
            .collect();
        let rose = builder.build();

        let faces = self
            .relators
            .iter()
            .map(|relator| {
                relator
                    .iter()
                    .map(|(g, orientation)| {
                        let e = *petals
                            .get(g.as_str())
                            .ok_or_else(|| ComplexError::UnknownGenerator(g.clone()))?;
                        Ok(match orientation {
                            Orientation::Positive => e,
                            Orientation::Negative => rose.bar(e),
                        })
                    })
                    .collect::<Result<Vec<_>, ComplexError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Complex::new(Arc::new(rose), faces)
    }
}
