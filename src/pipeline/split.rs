use rand::Rng;
use rand::seq::SliceRandom;

use crate::samples::{LabeledSample, PostureLabel};

/// Disjoint train/test subsets drawn from the store at split time.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: Vec<LabeledSample>,
    pub test: Vec<LabeledSample>,
}

/// Per-label split: each label keeps `max(1, floor(count * ratio))`
/// samples for training, the rest go to test. Both halves are shuffled.
pub fn stratified_split<R: Rng + ?Sized>(
    samples: &[LabeledSample],
    train_ratio: f64,
    rng: &mut R,
) -> Split {
    let mut split = Split::default();

    for label in PostureLabel::ALL {
        let mut subset: Vec<LabeledSample> = samples
            .iter()
            .filter(|s| s.label == label)
            .cloned()
            .collect();
        if subset.is_empty() {
            continue;
        }
        subset.shuffle(rng);

        let train_count = train_count(subset.len(), train_ratio);
        let test_part = subset.split_off(train_count);
        split.train.extend(subset);
        split.test.extend(test_part);
    }

    split.train.shuffle(rng);
    split.test.shuffle(rng);
    split
}

fn train_count(count: usize, ratio: f64) -> usize {
    let floored = (count as f64 * ratio).floor() as usize;
    floored.max(1).min(count)
}
