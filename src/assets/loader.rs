//! Fire-and-forget image loading with stale-result protection.
//!
//! Loads run on the rayon pool and report back over a channel. The owner drains completions on
//! its own thread with [`ImageLoader::poll`], so the stack is only ever touched by one thread.
//! A completion is matched against the layer by `(id, source)`: if the layer's source changed
//! while the load was in flight, the result is cached but the layer is left alone. Pixels no
//! layer references any more are dropped by [`ImageLoader::retain`].

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use rayon::prelude::*;

use crate::assets::cache::ImageCache;
use crate::assets::decode::{PreparedImage, decode_image};
use crate::assets::fetch::ImageFetcher;
use crate::foundation::error::LuminaResult;
use crate::layers::model::{LayerId, LoadState, SourceRef, Stack};
use crate::layers::store::settle_load;

/// Result of one layer load.
#[derive(Debug)]
pub struct LoadCompletion {
    /// Layer the load was issued for.
    pub layer_id: LayerId,
    /// Source the load was issued for.
    pub source: SourceRef,
    /// Decoded pixels or the reason the load failed.
    pub outcome: LuminaResult<PreparedImage>,
}

/// Issues per-layer loads and folds their completions back into stack snapshots.
pub struct ImageLoader {
    fetcher: Arc<dyn ImageFetcher>,
    cache: ImageCache,
    tx: Sender<LoadCompletion>,
    rx: Receiver<LoadCompletion>,
    in_flight: HashSet<(LayerId, SourceRef)>,
}

impl ImageLoader {
    /// Loader backed by `fetcher` with an empty cache.
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        let (tx, rx) = channel();
        Self {
            fetcher,
            cache: ImageCache::new(),
            tx,
            rx,
            in_flight: HashSet::new(),
        }
    }

    /// Decoded pixels seen so far.
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Number of loads issued but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start loads for every pending layer that has none outstanding. Returns how many started.
    ///
    /// Cached sources complete immediately (on the next [`poll`](Self::poll)) without touching
    /// the fetcher.
    pub fn request(&mut self, stack: &Stack) -> usize {
        let mut started = 0usize;
        for layer in stack.iter() {
            if layer.load_state != LoadState::Pending {
                continue;
            }
            let key = (layer.id.clone(), layer.source.clone());
            if !self.in_flight.insert(key) {
                continue;
            }
            started += 1;

            let layer_id = layer.id.clone();
            let source = layer.source.clone();
            if let Some(img) = self.cache.get(&source) {
                let _ = self.tx.send(LoadCompletion {
                    layer_id,
                    source,
                    outcome: Ok(img.clone()),
                });
                continue;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let tx = self.tx.clone();
            tracing::debug!(layer = %layer_id, source = %source, "spawning image load");
            rayon::spawn(move || {
                let outcome = load_one(fetcher.as_ref(), &source);
                // Receiver gone: the loader was dropped.
                let _ = tx.send(LoadCompletion {
                    layer_id,
                    source,
                    outcome,
                });
            });
        }
        started
    }

    /// Fold every completion that has arrived so far into `stack`.
    pub fn poll(&mut self, stack: &Stack) -> Stack {
        let mut out = stack.clone();
        while let Ok(completion) = self.rx.try_recv() {
            out = self.apply(&out, completion);
        }
        out
    }

    /// Block until every visible pending layer has settled, loading them concurrently.
    ///
    /// Layers with a background load already outstanding wait for it instead of fetching twice.
    /// Hidden pending layers are left pending; they do not take part in a composite.
    #[tracing::instrument(skip_all, fields(len = stack.len()))]
    pub fn settle(&mut self, stack: &Stack) -> Stack {
        let mut out = self.poll(stack);

        let todo: Vec<(LayerId, SourceRef)> = out
            .iter()
            .filter(|l| l.is_visible && l.load_state == LoadState::Pending)
            .map(|l| (l.id.clone(), l.source.clone()))
            .filter(|key| !self.in_flight.contains(key))
            .collect();

        if !todo.is_empty() {
            let fetcher = self.fetcher.as_ref();
            let cache = &self.cache;
            let completions: Vec<LoadCompletion> = todo
                .into_par_iter()
                .map(|(layer_id, source)| {
                    let outcome = match cache.get(&source) {
                        Some(img) => Ok(img.clone()),
                        None => load_one(fetcher, &source),
                    };
                    LoadCompletion {
                        layer_id,
                        source,
                        outcome,
                    }
                })
                .collect();
            for completion in completions {
                out = self.apply(&out, completion);
            }
        }

        while self.awaits_background(&out) {
            match self.rx.recv() {
                Ok(completion) => out = self.apply(&out, completion),
                Err(_) => break,
            }
        }
        out
    }

    fn awaits_background(&self, stack: &Stack) -> bool {
        stack.iter().any(|l| {
            l.is_visible
                && l.load_state == LoadState::Pending
                && self
                    .in_flight
                    .contains(&(l.id.clone(), l.source.clone()))
        })
    }

    /// Drop cached pixels whose source no layer in `stack` references.
    pub fn retain(&mut self, stack: &Stack) -> usize {
        let live: HashSet<&SourceRef> = stack.iter().map(|l| &l.source).collect();
        let dropped = self.cache.retain(|source| live.contains(source));
        if dropped > 0 {
            tracing::debug!(dropped, kept = self.cache.len(), "evicted unreferenced images");
        }
        dropped
    }

    /// Fold a single completion into `stack`, caching its pixels on success.
    pub fn apply(&mut self, stack: &Stack, completion: LoadCompletion) -> Stack {
        let LoadCompletion {
            layer_id,
            source,
            outcome,
        } = completion;
        self.in_flight.remove(&(layer_id.clone(), source.clone()));

        let state = match outcome {
            Ok(img) => {
                self.cache.insert(source.clone(), img);
                LoadState::Ready
            }
            Err(err) => {
                tracing::warn!(layer = %layer_id, source = %source, error = %err, "image load failed");
                LoadState::Failed
            }
        };

        match settle_load(stack, &layer_id, &source, state) {
            Some(next) => next,
            None => {
                tracing::debug!(layer = %layer_id, source = %source, "ignoring stale load completion");
                stack.clone()
            }
        }
    }
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

fn load_one(fetcher: &dyn ImageFetcher, source: &SourceRef) -> LuminaResult<PreparedImage> {
    let bytes = fetcher.fetch(source)?;
    decode_image(&bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
