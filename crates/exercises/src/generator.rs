//! Random workout generation.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Exercise, MovementForm};

pub const DEFAULT_AMOUNT: i64 = 3;
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 5;

/// Requested amount, defaulted and clamped into `[1, 5]`.
pub fn clamp_amount(requested: Option<i64>) -> usize {
    let amount = requested.unwrap_or(DEFAULT_AMOUNT).clamp(MIN_AMOUNT, MAX_AMOUNT);
    // clamped into 1..=5
    amount as usize
}

/// Pick up to `amount` distinct exercises training any of `forms` (all forms
/// when empty), uniformly at random.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    exercises: Vec<Exercise>,
    forms: &[MovementForm],
    amount: usize,
) -> Vec<Exercise> {
    let candidates: Vec<Exercise> = exercises.into_iter().filter(|e| e.trains_any(forms)).collect();
    candidates
        .choose_multiple(rng, amount.min(candidates.len()))
        .cloned()
        .collect()
}
