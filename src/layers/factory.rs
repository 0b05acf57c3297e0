use std::sync::Arc;

use crate::assets::source::ImageSource;
use crate::foundation::math::Rng64;
use crate::layers::distribute::distribute;
use crate::layers::model::{BlendMode, LayerId, SourceRef};

const ID_LEN: usize = 9;

/// Source of everything a store operation needs that is not in the stack itself: fresh ids,
/// fresh image sources and random draws for the distribution algorithm.
///
/// Passing it explicitly keeps store operations pure: a factory built with the same seed and
/// image source replays the same results.
#[derive(Clone)]
pub struct LayerFactory {
    rng: Rng64,
    images: Arc<dyn ImageSource>,
}

impl LayerFactory {
    /// Factory with a fixed seed.
    pub fn new(seed: u64, images: Arc<dyn ImageSource>) -> Self {
        Self {
            rng: Rng64::new(seed),
            images,
        }
    }

    /// Factory seeded from the clock.
    pub fn from_entropy(images: Arc<dyn ImageSource>) -> Self {
        Self {
            rng: Rng64::from_entropy(),
            images,
        }
    }

    /// Mint a new layer id.
    pub fn next_id(&mut self) -> LayerId {
        LayerId(self.rng.token(ID_LEN))
    }

    /// Mint a new preset id.
    pub fn next_preset_id(&mut self) -> String {
        self.rng.token(ID_LEN)
    }

    /// Mint a new source from a fresh random seed.
    pub fn next_source(&mut self) -> SourceRef {
        let seed = self.rng.token(ID_LEN);
        self.images.source_for_seed(&seed)
    }

    /// Draw default parameters for position `index` of a `total`-layer stack.
    pub fn distribute(&mut self, index: usize, total: usize) -> (BlendMode, f32) {
        distribute(index, total, &mut self.rng)
    }

    /// Image source used for new layers.
    pub fn images(&self) -> &Arc<dyn ImageSource> {
        &self.images
    }
}

impl std::fmt::Debug for LayerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerFactory")
            .field("rng", &self.rng)
            .finish_non_exhaustive()
    }
}
