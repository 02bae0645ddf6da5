//! Trial set generation.
//!
//! Two designs exist and they shuffle differently on purpose: the factorial
//! design shuffles the whole cross product once, the block design shuffles
//! every block on its own. Neither prevents the same cell from appearing
//! twice in a row across a block boundary or within a flat shuffle.

use hapdir_core::{BASE_DIRECTIONS, Intensity, TrialSpec};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ExperimentError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialDesign {
    /// Every direction crossed with every intensity level, one flat shuffle.
    /// An empty list means a single unlabelled level.
    Factorial { intensities: Vec<u8> },
    /// `blocks` repetitions of the base directions at a single intensity,
    /// each block shuffled independently.
    Blocks { blocks: usize },
}

impl Default for TrialDesign {
    fn default() -> Self {
        TrialDesign::Factorial {
            intensities: vec![70, 100],
        }
    }
}

impl TrialDesign {
    pub fn trial_count(&self) -> usize {
        match self {
            TrialDesign::Factorial { intensities } => {
                BASE_DIRECTIONS.len() * intensities.len().max(1)
            }
            TrialDesign::Blocks { blocks } => BASE_DIRECTIONS.len() * blocks,
        }
    }

    pub fn has_intensity(&self) -> bool {
        matches!(self, TrialDesign::Factorial { intensities } if !intensities.is_empty())
    }

    /// The unshuffled cells of one block.
    pub fn block_cells(&self) -> Vec<TrialSpec> {
        match self {
            TrialDesign::Factorial { intensities } if !intensities.is_empty() => BASE_DIRECTIONS
                .iter()
                .flat_map(|&d| {
                    intensities
                        .iter()
                        .map(move |&p| TrialSpec::new(d, Intensity::Percent(p)))
                })
                .collect(),
            _ => BASE_DIRECTIONS
                .iter()
                .map(|&d| TrialSpec::new(d, Intensity::Single))
                .collect(),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<TrialSpec>, ExperimentError> {
        let sequence = match self {
            TrialDesign::Factorial { .. } => {
                let mut cells = self.block_cells();
                cells.shuffle(rng);
                cells
            }
            TrialDesign::Blocks { blocks } => {
                let mut sequence = Vec::with_capacity(self.trial_count());
                for _ in 0..*blocks {
                    let mut block = self.block_cells();
                    block.shuffle(rng);
                    sequence.extend(block);
                }
                sequence
            }
        };
        if sequence.is_empty() {
            return Err(ExperimentError::EmptyDesign);
        }
        Ok(sequence)
    }
}
