//! Seeded stratified train/test split
//!
//! Works on row indices before any encoding so vocabularies and scaler
//! statistics are only ever fitted on training rows.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of each side of a split, both ascending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so both classes keep roughly their share of the test set.
///
/// One generator seeded from `seed` drives every shuffle in turn, so the same
/// labels and seed always give the same partition.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> Split {
    let n = labels.len();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut negatives: Vec<usize> = Vec::new();
    let mut positives: Vec<usize> = Vec::new();
    for (idx, label) in labels.iter().enumerate() {
        if *label == 0 {
            negatives.push(idx);
        } else {
            positives.push(idx);
        }
    }

    let mut in_test = vec![false; n];
    let mut test = Vec::new();
    for group in [&mut negatives, &mut positives] {
        if group.is_empty() {
            continue;
        }
        group.shuffle(&mut rng);
        let take = ((test_size * group.len() as f64).round() as usize)
            .max(1)
            .min(group.len());
        for &idx in group.iter().take(take) {
            in_test[idx] = true;
            test.push(idx);
        }
    }

    // Rounding per class can leave the test set short of the overall target
    let target = ((test_size * n as f64).round() as usize).min(n);
    if test.len() < target {
        let mut all: Vec<usize> = (0..n).collect();
        all.shuffle(&mut rng);
        for idx in all {
            if test.len() >= target {
                break;
            }
            if !in_test[idx] {
                in_test[idx] = true;
                test.push(idx);
            }
        }
    }

    test.sort_unstable();
    let train = (0..n).filter(|idx| !in_test[*idx]).collect();
    Split { train, test }
}
