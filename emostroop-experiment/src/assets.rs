use emostroop_core::{AssetError, Block, Emotion, ParticipantId, Stimulus};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Face images grouped by ground-truth emotion.
///
/// On disk each category is a directory named after the emotion label
/// (`<root>/Happy`, `<root>/Sad`); the category is resolved here and
/// carried on every [`Stimulus`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImagePools {
    happy: Vec<PathBuf>,
    sad: Vec<PathBuf>,
}

impl ImagePools {
    pub fn new(happy: Vec<PathBuf>, sad: Vec<PathBuf>) -> Self {
        Self { happy, sad }
    }

    /// Lists regular files in each category directory below `root`.
    pub fn load(root: &Path) -> Result<Self, AssetError> {
        let mut pools = Self::default();
        for emotion in Emotion::ALL {
            let dir = root.join(emotion.label());
            if !dir.is_dir() {
                return Err(AssetError::MissingDirectory(dir));
            }
            let mut files = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() {
                    files.push(path);
                }
            }
            if files.is_empty() {
                return Err(AssetError::EmptyPool(dir));
            }
            // read_dir order is platform dependent
            files.sort();
            info!("{} {} images in {}", files.len(), emotion, dir.display());
            *pools.pool_mut(emotion) = files;
        }
        Ok(pools)
    }

    pub fn pool(&self, emotion: Emotion) -> &[PathBuf] {
        match emotion {
            Emotion::Happy => &self.happy,
            Emotion::Sad => &self.sad,
        }
    }

    fn pool_mut(&mut self, emotion: Emotion) -> &mut Vec<PathBuf> {
        match emotion {
            Emotion::Happy => &mut self.happy,
            Emotion::Sad => &mut self.sad,
        }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.happy.shuffle(rng);
        self.sad.shuffle(rng);
    }
}

/// The four congruency buckets, in pool order.
///
/// From each pool the first `per_bucket` images get the congruent word and
/// the next `per_bucket` the incongruent one, so no image appears in two
/// buckets. A pool with fewer than `2 * per_bucket` images is split in half.
pub fn congruency_buckets(pools: &ImagePools, per_bucket: usize) -> Result<Vec<Stimulus>, AssetError> {
    let mut stimuli = Vec::new();
    for face in Emotion::ALL {
        let pool = pools.pool(face);
        let n = per_bucket.min(pool.len() / 2);
        if n == 0 {
            return Err(AssetError::EmptyPool(
                pool.first().cloned().unwrap_or_else(|| PathBuf::from(face.label())),
            ));
        }
        if n < per_bucket {
            warn!(
                "Only {} {} images, using {} per condition instead of {}",
                pool.len(),
                face,
                n,
                per_bucket
            );
        }
        stimuli.extend(pool[..n].iter().map(|p| Stimulus::new(p, face, face)));
        stimuli.extend(
            pool[n..2 * n]
                .iter()
                .map(|p| Stimulus::new(p, face, face.opposite())),
        );
    }
    Ok(stimuli)
}

/// Builds both blocks for `participant`: identical composition, each
/// shuffled once, roles in the participant's counterbalanced order.
pub fn assemble_blocks<R: Rng + ?Sized>(
    pools: &ImagePools,
    participant: &ParticipantId,
    per_bucket: usize,
    rng: &mut R,
) -> Result<[Block; 2], AssetError> {
    let buckets = congruency_buckets(pools, per_bucket)?;

    let mut first = buckets.clone();
    first.shuffle(rng);
    let mut second = buckets;
    second.shuffle(rng);

    Ok([
        Block::new(1, participant.first_block(), first),
        Block::new(2, participant.second_block(), second),
    ])
}
