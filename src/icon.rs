//! Icon types for the multi-size window icon set.
//!
//! Window managers pick the closest match from a list of same-content images,
//! so every loaded set carries one square image per entry of [`ICON_SIZES`].

use std::collections::BTreeMap;

use image::RgbaImage;

/// Pixel sizes of every icon set handed to windows.
pub const ICON_SIZES: [u32; 6] = [16, 24, 32, 48, 64, 128];

/// A single square icon bitmap in RGBA format.
#[derive(Debug, Clone, PartialEq)]
pub struct IconImage {
    /// The image data in RGBA format.
    pub data: RgbaImage,
}

impl IconImage {
    pub fn new(data: RgbaImage) -> Self {
        Self { data }
    }

    /// Edge length in pixels (icons are square).
    pub fn size(&self) -> u32 {
        self.data.width()
    }

    /// Returns false for zero-sized bitmaps, which are never drawn on.
    pub fn is_valid(&self) -> bool {
        self.data.width() > 0 && self.data.height() > 0
    }
}

/// A size-keyed set of icon images.
///
/// The [`IconManager`](crate::IconManager) owns the only live set; windows
/// only ever receive `&IconSet` and copy what they need. Dropping or
/// [`dispose_all`](Self::dispose_all) releases every image at once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IconSet {
    images: BTreeMap<u32, IconImage>,
    generation: u64,
}

impl IconSet {
    /// Creates a new empty icon set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an image under its pixel size, replacing any previous image
    /// of that size.
    pub fn insert(&mut self, image: IconImage) {
        self.images.insert(image.size(), image);
    }

    pub fn get(&self, size: u32) -> Option<&IconImage> {
        self.images.get(&size)
    }

    /// Returns the number of images in the set.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// True when an image exists for every entry of [`ICON_SIZES`].
    pub fn is_complete(&self) -> bool {
        ICON_SIZES.iter().all(|size| self.images.contains_key(size))
    }

    /// Sizes present in the set, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        self.images.keys().copied()
    }

    /// Finds the image whose size is closest to `target_size`.
    pub fn find_closest(&self, target_size: u32) -> Option<&IconImage> {
        self.images
            .values()
            .min_by_key(|img| img.size().abs_diff(target_size))
    }

    /// Returns an iterator over the images, smallest first.
    pub fn iter(&self) -> impl Iterator<Item = &IconImage> {
        self.images.values()
    }

    /// Number of times this set has been (re)filled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Releases every image. Idempotent.
    pub fn dispose_all(&mut self) {
        self.images.clear();
    }

    /// Marks the start of a new generation. The set must be empty.
    pub(crate) fn begin_generation(&mut self) {
        debug_assert!(self.images.is_empty(), "previous generation still alive");
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<'a> IntoIterator for &'a IconSet {
    type Item = &'a IconImage;
    type IntoIter = std::collections::btree_map::Values<'a, u32, IconImage>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.values()
    }
}
