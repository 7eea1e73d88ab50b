//! Rotation Planner
//!
//! Decides the order in which SQL variants run in every round of every
//! iteration, so no variant systematically runs first (cold cache) or last
//! (warm cache).
//!
//! For round `r` of iteration `i` over `N` variants:
//! - the base order is rotated left by `(i + (r - 1) / 2) mod N`;
//! - odd rounds run the rotated order forward, even rounds run it reversed.
//!
//! Round pairs (1, 2), (3, 4), ... therefore mirror each other, and the
//! rotation advances with the iteration and with each round pair.

use querybench_core::{Direction, RoundPlan};
use std::collections::BTreeSet;
use thiserror::Error;

/// Invalid scheduling input; fatal before any run starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("No SQL variants to schedule")]
    NoVariants,

    #[error("Rounds per iteration must be at least 1 (got {0})")]
    NoRounds(u32),

    #[error("Duplicate SQL variant name: {0}")]
    DuplicateVariant(String),
}

/// Round plans of one iteration, in round order
pub fn plan(
    variants: &[String],
    iteration: u32,
    rounds_per_iteration: u32,
) -> Result<Vec<RoundPlan>, SchedulingError> {
    validate(variants, rounds_per_iteration)?;
    Ok(plan_unchecked(variants, iteration, rounds_per_iteration))
}

/// Round plans of every iteration of a session
pub fn plan_session(
    variants: &[String],
    iterations: u32,
    rounds_per_iteration: u32,
) -> Result<Vec<RoundPlan>, SchedulingError> {
    validate(variants, rounds_per_iteration)?;
    Ok((0..iterations)
        .flat_map(|iteration| plan_unchecked(variants, iteration, rounds_per_iteration))
        .collect())
}

fn validate(variants: &[String], rounds_per_iteration: u32) -> Result<(), SchedulingError> {
    if variants.is_empty() {
        return Err(SchedulingError::NoVariants);
    }
    if rounds_per_iteration < 1 {
        return Err(SchedulingError::NoRounds(rounds_per_iteration));
    }
    let mut seen = BTreeSet::new();
    for name in variants {
        if !seen.insert(name.as_str()) {
            return Err(SchedulingError::DuplicateVariant(name.clone()));
        }
    }
    Ok(())
}

fn plan_unchecked(variants: &[String], iteration: u32, rounds_per_iteration: u32) -> Vec<RoundPlan> {
    let n = variants.len();
    (1..=rounds_per_iteration)
        .map(|round| {
            let offset = (iteration as usize + (round as usize - 1) / 2) % n;
            let mut order = variants.to_vec();
            order.rotate_left(offset);

            let direction = if round % 2 == 1 {
                Direction::Forward
            } else {
                order.reverse();
                Direction::Reverse
            };

            RoundPlan {
                iteration,
                round,
                offset,
                direction,
                order,
            }
        })
        .collect()
}
