use std::sync::Arc;

/// How a layer's pixels combine with everything beneath it.
///
/// `Average` is not a native blend function: it composites like [`BlendMode::Normal`] and relies
/// on the layer's opacity (usually `0.5`) to produce the mean of background and foreground.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Foreground replaces background.
    #[default]
    Normal,
    /// Normal blend used as a mean at half opacity.
    Average,
    /// `B * F`.
    Multiply,
    /// `1 - (1 - B)(1 - F)`.
    Screen,
    /// Hard light with the operands swapped.
    Overlay,
    /// Channel-wise minimum.
    Darken,
    /// Channel-wise maximum.
    Lighten,
    /// W3C soft light.
    SoftLight,
    /// Multiply or screen depending on the foreground.
    HardLight,
    /// `|B - F|`.
    Difference,
    /// `B + F - 2BF`.
    Exclusion,
    /// Brighten the background to reflect the foreground.
    ColorDodge,
    /// Darken the background to reflect the foreground.
    ColorBurn,
    /// Foreground hue with background saturation and luminosity.
    Hue,
    /// Foreground saturation with background hue and luminosity.
    Saturation,
    /// Foreground hue and saturation with background luminosity.
    Color,
    /// Foreground luminosity with background hue and saturation.
    Luminosity,
}

impl BlendMode {
    /// All supported modes in display order.
    pub const ALL: [BlendMode; 17] = [
        Self::Normal,
        Self::Average,
        Self::Multiply,
        Self::Screen,
        Self::Overlay,
        Self::Darken,
        Self::Lighten,
        Self::SoftLight,
        Self::HardLight,
        Self::Difference,
        Self::Exclusion,
        Self::ColorDodge,
        Self::ColorBurn,
        Self::Hue,
        Self::Saturation,
        Self::Color,
        Self::Luminosity,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Average => "Average",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Overlay => "Overlay",
            Self::Darken => "Darken",
            Self::Lighten => "Lighten",
            Self::SoftLight => "Soft Light",
            Self::HardLight => "Hard Light",
            Self::Difference => "Difference",
            Self::Exclusion => "Exclusion",
            Self::ColorDodge => "Color Dodge",
            Self::ColorBurn => "Color Burn",
            Self::Hue => "Hue",
            Self::Saturation => "Saturation",
            Self::Color => "Color",
            Self::Luminosity => "Luminosity",
        }
    }

    /// Return `true` for the HSL modes that cannot be computed channel by channel.
    pub fn is_non_separable(self) -> bool {
        matches!(
            self,
            Self::Hue | Self::Saturation | Self::Color | Self::Luminosity
        )
    }
}

/// Lifecycle of a layer's pixel data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    /// Pixels have been requested but not resolved yet.
    #[default]
    Pending,
    /// Pixels are decoded and can be composited.
    Ready,
    /// Fetch or decode failed; the layer is skipped.
    Failed,
}

/// Opaque identifier of a layer, stable for the layer's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a layer's pixel data: a URL or a path relative to the fetcher root.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SourceRef(pub String);

impl SourceRef {
    /// Borrow the raw reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `true` for `http://` and `https://` references.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One image in the stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Stable identifier.
    pub id: LayerId,
    /// Where the pixels come from.
    pub source: SourceRef,
    /// Blend function applied against the accumulator.
    pub blend_mode: BlendMode,
    /// Interpolation weight toward the blended result, in `[0, 1]`.
    pub opacity: f32,
    /// Hidden layers are skipped entirely.
    pub is_visible: bool,
    /// Cosmetic label.
    pub display_name: String,
    /// Load progress. Never persisted: deserialized layers start `Pending`.
    #[serde(skip, default)]
    pub load_state: LoadState,
}

impl Layer {
    /// Return `true` when the layer contributes pixels to a composite.
    pub fn participates(&self) -> bool {
        self.is_visible && self.load_state == LoadState::Ready
    }

    /// Compare the fields that influence composite output, ignoring id and name.
    pub fn same_visual_params(&self, other: &Layer) -> bool {
        self.source == other.source
            && self.blend_mode == other.blend_mode
            && self.opacity == other.opacity
            && self.is_visible == other.is_visible
    }
}

/// Partial update merged into one layer by [`crate::set_property`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    /// New blend mode.
    pub blend_mode: Option<BlendMode>,
    /// New opacity (clamped to `[0, 1]`, non-finite values are ignored).
    pub opacity: Option<f32>,
    /// New visibility.
    pub is_visible: Option<bool>,
    /// New label.
    pub display_name: Option<String>,
}

impl LayerPatch {
    /// Patch that only changes the blend mode.
    pub fn blend_mode(mode: BlendMode) -> Self {
        Self {
            blend_mode: Some(mode),
            ..Self::default()
        }
    }

    /// Patch that only changes the opacity.
    pub fn opacity(opacity: f32) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    /// Patch that only changes visibility.
    pub fn visible(is_visible: bool) -> Self {
        Self {
            is_visible: Some(is_visible),
            ..Self::default()
        }
    }
}

/// Optional explicit parameters for [`crate::add_layer`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerParams {
    /// Explicit blend mode; drawn by the distribution algorithm when absent.
    pub blend_mode: Option<BlendMode>,
    /// Explicit opacity; drawn by the distribution algorithm when absent.
    pub opacity: Option<f32>,
    /// Explicit source; a fresh one is minted when absent.
    pub source: Option<SourceRef>,
    /// Explicit label; defaults to `Layer <n>`.
    pub display_name: Option<String>,
}

/// Immutable, ordered snapshot of layers. Index 0 is painted first.
///
/// Cloning is cheap; every store mutation builds a new snapshot.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Stack {
    layers: Arc<[Layer]>,
}

impl Stack {
    /// Empty stack.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when there are no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in paint order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Position of the layer with `id`.
    pub fn position(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| &l.id == id)
    }

    /// Layer with `id`, if any.
    pub fn find(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Iterate layers in paint order.
    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Return `true` when both snapshots share the same allocation.
    pub fn ptr_eq(&self, other: &Stack) -> bool {
        Arc::ptr_eq(&self.layers, &other.layers)
    }

    /// Return `true` when both stacks have the same visual parameters in the same order.
    pub fn visually_equal(&self, other: &Stack) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| a.same_visual_params(b))
    }

    /// Copy of this stack with every layer reset to [`LoadState::Pending`].
    pub fn with_pending_loads(&self) -> Stack {
        self.iter()
            .cloned()
            .map(|mut l| {
                l.load_state = LoadState::Pending;
                l
            })
            .collect()
    }
}

impl From<Vec<Layer>> for Stack {
    fn from(layers: Vec<Layer>) -> Self {
        Self {
            layers: layers.into(),
        }
    }
}

impl FromIterator<Layer> for Stack {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        Self {
            layers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/model.rs"]
mod tests;
