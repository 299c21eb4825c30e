// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Tracking of image layouts, per command buffer and per device.
//!
//! Every command buffer keeps an [`ImageLayoutMap`] for each image it touches. The map has two
//! layers over the same key space:
//!
//! - the *initial* layouts, which are the layouts that the command buffer expects each
//!   subresource to be in when it starts executing;
//! - the *current* layouts, which are the layouts that the command buffer leaves each
//!   subresource in once it has executed up to the last recorded command.
//!
//! Subresources are flattened to a single integer index, in the order aspect, mip level, array
//! layer, so that a subresource range turns into a short list of contiguous index ranges. Both
//! layers are stored as [`RangeMap`]s over these indices.
//!
//! When a command buffer is submitted, its initial layouts are checked against the layouts that
//! previously submitted command buffers left behind, which are kept in the
//! [`GlobalImageLayoutMap`] of the device.

use crate::{
    image::{
        layout::{image_layout_matches, layouts_equivalent},
        ImageAspects, ImageLayout, ImageState, ImageSubresource, ImageSubresourceRange,
    },
    DeviceSize, ValidationError,
};
use foldhash::HashMap;
use rangemap::RangeMap;
use smallvec::SmallVec;
use std::ops::Range;

/// Converts between subresources of an image and the flat indices that layout maps are keyed by.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SubresourceIndexer {
    aspect_list: SmallVec<[ImageAspects; 4]>,
    aspect_size: DeviceSize,
    mip_level_size: DeviceSize,
    mip_levels: u32,
    array_layers: u32,
}

impl SubresourceIndexer {
    pub(crate) fn new(image: &ImageState) -> Self {
        let full_range = image.full_range();
        let aspect_list: SmallVec<[ImageAspects; 4]> = full_range.aspects.iter().collect();
        let mip_levels = full_range.mip_levels.end;
        let array_layers = full_range.array_layers.end;
        let mip_level_size = array_layers as DeviceSize;
        let aspect_size = mip_level_size * mip_levels as DeviceSize;

        SubresourceIndexer {
            aspect_list,
            aspect_size,
            mip_level_size,
            mip_levels,
            array_layers,
        }
    }

    /// Returns the number of indices that the image spans.
    #[inline]
    pub(crate) fn range_size(&self) -> DeviceSize {
        self.aspect_size * self.aspect_list.len() as DeviceSize
    }

    fn aspect_num(&self, aspect: ImageAspects) -> Option<usize> {
        self.aspect_list.iter().position(|&a| a == aspect)
    }

    /// Returns whether `range` lies within the image. Ranges outside of the image are not
    /// tracked.
    pub(crate) fn contains(&self, range: &ImageSubresourceRange) -> bool {
        !range.mip_levels.is_empty()
            && !range.array_layers.is_empty()
            && range.mip_levels.end <= self.mip_levels
            && range.array_layers.end <= self.array_layers
            && range.aspects.iter().any(|aspect| self.aspect_num(aspect).is_some())
    }

    /// Returns the index of `subresource`, if it lies within the image.
    pub(crate) fn index_of(&self, subresource: ImageSubresource) -> Option<DeviceSize> {
        if subresource.mip_level >= self.mip_levels || subresource.array_layer >= self.array_layers
        {
            return None;
        }

        let aspect_num = self.aspect_num(subresource.aspects)?;

        Some(
            aspect_num as DeviceSize * self.aspect_size
                + subresource.mip_level as DeviceSize * self.mip_level_size
                + subresource.array_layer as DeviceSize,
        )
    }

    /// Returns the subresource at `index`.
    pub(crate) fn subresource_at(&self, index: DeviceSize) -> ImageSubresource {
        let aspect_num = (index / self.aspect_size) as usize;
        let index = index % self.aspect_size;

        ImageSubresource {
            aspects: self.aspect_list[aspect_num],
            mip_level: (index / self.mip_level_size) as u32,
            array_layer: (index % self.mip_level_size) as u32,
        }
    }

    /// Returns the index ranges that `range` covers, one per aspect and mip level.
    pub(crate) fn iter_ranges<'a>(
        &'a self,
        range: &'a ImageSubresourceRange,
    ) -> impl Iterator<Item = Range<DeviceSize>> + 'a {
        let layers = range.array_layers.start as DeviceSize..range.array_layers.end as DeviceSize;

        range
            .aspects
            .iter()
            .filter_map(move |aspect| self.aspect_num(aspect))
            .flat_map(move |aspect_num| {
                let layers = layers.clone();

                range.mip_levels.clone().map(move |mip_level| {
                    let offset = aspect_num as DeviceSize * self.aspect_size
                        + mip_level as DeviceSize * self.mip_level_size;

                    offset + layers.start..offset + layers.end
                })
            })
    }

    /// Returns the subresources that `range` covers, ordered by mip level, then array layer, then
    /// aspect.
    pub(crate) fn iter_subresources<'a>(
        &'a self,
        range: &'a ImageSubresourceRange,
    ) -> impl Iterator<Item = (ImageSubresource, DeviceSize)> + 'a {
        let aspects: SmallVec<[ImageAspects; 4]> = range
            .aspects
            .iter()
            .filter(|&aspect| self.aspect_num(aspect).is_some())
            .collect();
        let array_layers = range.array_layers.clone();

        range.mip_levels.clone().flat_map(move |mip_level| {
            let aspects = aspects.clone();

            array_layers.clone().flat_map(move |array_layer| {
                aspects.clone().into_iter().filter_map(move |aspects| {
                    let subresource = ImageSubresource {
                        aspects,
                        mip_level,
                        array_layer,
                    };

                    self.index_of(subresource)
                        .map(|index| (subresource, index))
                })
            })
        })
    }
}

/// The layout that a command buffer expects a subresource to be in when it starts executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitialLayout {
    pub layout: ImageLayout,

    /// The aspects of the image view through which the layout was first used, or empty if it was
    /// not used through a view.
    pub aspects: ImageAspects,
}

/// The layouts known for one subresource, as returned by [`ImageLayoutMap::for_range`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    pub subresource: ImageSubresource,
    pub current: Option<ImageLayout>,
    pub initial: Option<InitialLayout>,
}

/// The layouts of the subresources of one image, as seen by one command buffer.
#[derive(Clone, Debug)]
pub struct ImageLayoutMap {
    indexer: SubresourceIndexer,
    current: RangeMap<DeviceSize, ImageLayout>,
    initial: RangeMap<DeviceSize, InitialLayout>,
}

impl ImageLayoutMap {
    #[inline]
    pub fn new(image: &ImageState) -> Self {
        ImageLayoutMap {
            indexer: SubresourceIndexer::new(image),
            current: RangeMap::new(),
            initial: RangeMap::new(),
        }
    }

    #[inline]
    pub(crate) fn indexer(&self) -> &SubresourceIndexer {
        &self.indexer
    }

    /// Returns whether no layout was recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.initial.is_empty()
    }

    /// Records that the subresources of `range` are transitioned to `layout`.
    ///
    /// Subresources whose initial layout is not yet known get `expected_layout` as initial
    /// layout, or `layout` itself if `expected_layout` is `None`. `range` must be normalized.
    ///
    /// Returns whether the current layout of any subresource changed.
    pub fn set_layout(
        &mut self,
        range: &ImageSubresourceRange,
        layout: ImageLayout,
        expected_layout: Option<ImageLayout>,
    ) -> bool {
        if !self.indexer.contains(range) {
            return false;
        }

        let initial = InitialLayout {
            layout: expected_layout.unwrap_or(layout),
            aspects: ImageAspects::empty(),
        };
        let mut updated = false;
        let ranges: SmallVec<[Range<DeviceSize>; 8]> = self.indexer.iter_ranges(range).collect();

        for index_range in ranges {
            let changed = self.current.gaps(&index_range).next().is_some()
                || self
                    .current
                    .overlapping(&index_range)
                    .any(|(_, &current)| current != layout);

            if changed {
                updated = true;
                self.current.insert(index_range.clone(), layout);
                fill_gaps(&mut self.initial, index_range, initial);
            }
        }

        updated
    }

    /// Records the layout that the subresources of `range` must be in before the command buffer
    /// executes, for every subresource whose initial layout is not yet known.
    ///
    /// `view_aspects` is the aspect mask of the view through which the subresources are used,
    /// if any. `range` must be normalized.
    ///
    /// Returns whether the initial layout of any subresource was recorded.
    pub fn set_initial_layout(
        &mut self,
        range: &ImageSubresourceRange,
        layout: ImageLayout,
        view_aspects: Option<ImageAspects>,
    ) -> bool {
        if !self.indexer.contains(range) {
            return false;
        }

        let initial = InitialLayout {
            layout,
            aspects: view_aspects.unwrap_or_default(),
        };
        let mut updated = false;
        let ranges: SmallVec<[Range<DeviceSize>; 8]> = self.indexer.iter_ranges(range).collect();

        for index_range in ranges {
            updated |= fill_gaps(&mut self.initial, index_range, initial);
        }

        updated
    }

    /// Returns the layouts known for the subresources of `range`, ordered by mip level, then
    /// array layer, then aspect. Subresources for which nothing was recorded are skipped.
    pub fn for_range<'a>(
        &'a self,
        range: &'a ImageSubresourceRange,
    ) -> impl Iterator<Item = LayoutEntry> + 'a {
        self.indexer
            .iter_subresources(range)
            .filter_map(move |(subresource, index)| {
                let current = self.current.get(&index).copied();
                let initial = self.initial.get(&index).copied();

                (current.is_some() || initial.is_some()).then_some(LayoutEntry {
                    subresource,
                    current,
                    initial,
                })
            })
    }

    /// Returns the current layout of `subresource`, if known.
    pub fn layout(&self, subresource: ImageSubresource) -> Option<ImageLayout> {
        self.indexer
            .index_of(subresource)
            .and_then(|index| self.current.get(&index).copied())
    }

    /// Returns the initial layout of `subresource`, along with the aspects it was recorded with.
    pub fn initial_layout(&self, subresource: ImageSubresource) -> Option<InitialLayout> {
        self.indexer
            .index_of(subresource)
            .and_then(|index| self.initial.get(&index).copied())
    }

    /// Returns the current layout of `subresource` if known, or its initial layout otherwise.
    pub fn layout_or_initial(&self, subresource: ImageSubresource) -> Option<ImageLayout> {
        self.layout(subresource)
            .or_else(|| self.initial_layout(subresource).map(|initial| initial.layout))
    }

    pub(crate) fn iter_initial(
        &self,
    ) -> impl Iterator<Item = (&Range<DeviceSize>, &InitialLayout)> {
        self.initial.iter()
    }

    pub(crate) fn iter_current(&self) -> impl Iterator<Item = (&Range<DeviceSize>, &ImageLayout)> {
        self.current.iter()
    }

    /// Merges the layouts of `other`, which was recorded after `self`, into `self`.
    ///
    /// Initial layouts of `other` are only taken for subresources that `self` has no initial
    /// layout for. Current layouts of `other` replace those of `self`.
    pub fn update_from(&mut self, other: &ImageLayoutMap) -> bool {
        if self.indexer != other.indexer {
            return false;
        }

        let mut updated = false;

        for (index_range, &initial) in other.initial.iter() {
            updated |= fill_gaps(&mut self.initial, index_range.clone(), initial);
        }

        for (index_range, &layout) in other.current.iter() {
            let changed = self.current.gaps(index_range).next().is_some()
                || self
                    .current
                    .overlapping(index_range)
                    .any(|(_, &current)| current != layout);

            if changed {
                updated = true;
                self.current.insert(index_range.clone(), layout);
            }
        }

        updated
    }
}

/// Inserts `value` into the parts of `index_range` that have no value yet. Returns whether
/// anything was inserted.
fn fill_gaps<V: Clone + Eq>(
    map: &mut RangeMap<DeviceSize, V>,
    index_range: Range<DeviceSize>,
    value: V,
) -> bool {
    let gaps: SmallVec<[Range<DeviceSize>; 4]> = map.gaps(&index_range).collect();

    for gap in &gaps {
        map.insert(gap.clone(), value.clone());
    }

    !gaps.is_empty()
}

/// A subresource whose recorded layout does not match the layout it is used in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LayoutMismatch {
    pub(crate) subresource: ImageSubresource,
    pub(crate) layout: ImageLayout,

    /// Whether `layout` is the current layout, rather than the initial layout.
    pub(crate) is_current: bool,
}

impl LayoutMismatch {
    pub(crate) fn describe(&self) -> &'static str {
        if self.is_current {
            "previous known"
        } else {
            "previously used"
        }
    }
}

/// Checks that a subresource can be used in layout `check`, given what is known about it.
///
/// `aspects` is the aspect mask the subresource is accessed with. If the current layout is
/// unknown, the check falls back to the initial layout, which also matches if it was recorded
/// through a depth or stencil view and agrees on that aspect. On shared-presentable images,
/// `SharedPresent` and `General` are interchangeable.
pub(crate) fn check_layout(
    entry: &LayoutEntry,
    check: ImageLayout,
    aspects: ImageAspects,
    shared_presentable: bool,
) -> Result<(), LayoutMismatch> {
    const DEPTH_OR_STENCIL: ImageAspects = ImageAspects::DEPTH.union(ImageAspects::STENCIL);

    match (entry.current, entry.initial) {
        (Some(current), _) => {
            if !layouts_equivalent(aspects, check, current, shared_presentable) {
                return Err(LayoutMismatch {
                    subresource: entry.subresource,
                    layout: current,
                    is_current: true,
                });
            }
        }
        (None, Some(initial)) => {
            if !layouts_equivalent(aspects, check, initial.layout, shared_presentable)
                && !(initial.aspects.intersects(DEPTH_OR_STENCIL)
                    && image_layout_matches(initial.aspects, check, initial.layout))
            {
                return Err(LayoutMismatch {
                    subresource: entry.subresource,
                    layout: initial.layout,
                    is_current: false,
                });
            }
        }
        (None, None) => (),
    }

    Ok(())
}

/// Returns the first subresource of `range` whose known layout does not match `check`.
pub(crate) fn first_layout_mismatch(
    map: &ImageLayoutMap,
    range: &ImageSubresourceRange,
    check: ImageLayout,
    aspects: ImageAspects,
    shared_presentable: bool,
) -> Option<LayoutMismatch> {
    map.for_range(range)
        .find_map(|entry| check_layout(&entry, check, aspects, shared_presentable).err())
}

/// The layouts of an image that submitted command buffers left behind.
#[derive(Clone, Debug)]
struct GlobalImageLayouts {
    /// The layout the image was created in, which applies to every subresource that no submitted
    /// command buffer transitioned.
    whole: ImageLayout,
    layouts: RangeMap<DeviceSize, ImageLayout>,
}

/// The device-wide map of image layouts, updated when command buffers are submitted.
#[derive(Debug, Default)]
pub struct GlobalImageLayoutMap {
    images: HashMap<ash::vk::Image, GlobalImageLayouts>,
}

/// The layouts left behind by the command buffers of a submission that was not yet recorded in
/// the [`GlobalImageLayoutMap`].
#[derive(Debug, Default)]
pub(crate) struct LayoutOverlay {
    images: HashMap<ash::vk::Image, RangeMap<DeviceSize, ImageLayout>>,
}

impl LayoutOverlay {
    /// Applies the current layouts of a command buffer on top of the overlay.
    pub(crate) fn record<'a>(
        &mut self,
        layout_maps: impl IntoIterator<Item = (&'a ash::vk::Image, &'a ImageLayoutMap)>,
    ) {
        for (&image, layout_map) in layout_maps {
            let layouts = self.images.entry(image).or_default();

            for (index_range, &layout) in layout_map.iter_current() {
                layouts.insert(index_range.clone(), layout);
            }
        }
    }
}

impl GlobalImageLayoutMap {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `image`, whose subresources are all in `initial_layout`.
    pub fn insert_image(&mut self, image: ash::vk::Image, initial_layout: ImageLayout) {
        self.images.insert(
            image,
            GlobalImageLayouts {
                whole: initial_layout,
                layouts: RangeMap::new(),
            },
        );
    }

    /// Stops tracking `image`.
    pub fn remove_image(&mut self, image: ash::vk::Image) {
        self.images.remove(&image);
    }

    #[inline]
    pub fn contains_image(&self, image: ash::vk::Image) -> bool {
        self.images.contains_key(&image)
    }

    /// Returns the layout that `subresource` of `image` was left in by submitted command buffers,
    /// or that the image was created in.
    pub fn layout(
        &self,
        image: &ImageState,
        subresource: ImageSubresource,
    ) -> Option<ImageLayout> {
        let global = self.images.get(&image.handle())?;
        let index = SubresourceIndexer::new(image).index_of(subresource)?;

        Some(global.layouts.get(&index).copied().unwrap_or(global.whole))
    }

    /// Checks the initial layouts of a command buffer that is about to be submitted, against the
    /// layouts left by command buffers submitted earlier in the same batch (`overlay`), and then
    /// against the layouts left by previous submissions.
    ///
    /// At most one error is returned per image.
    pub(crate) fn validate_command_buffer<'a>(
        &self,
        overlay: &LayoutOverlay,
        layout_maps: impl IntoIterator<Item = (&'a ash::vk::Image, &'a ImageLayoutMap)>,
        images: &HashMap<ash::vk::Image, ImageState>,
    ) -> SmallVec<[(ash::vk::Image, Box<ValidationError>); 2]> {
        let mut errors = SmallVec::new();

        'images: for (&image, layout_map) in layout_maps {
            let Some(image_state) = images.get(&image) else {
                continue;
            };
            let global = self.images.get(&image);
            let overlay = overlay.images.get(&image);

            for (index_range, initial) in layout_map.iter_initial() {
                let mut index = index_range.start;

                while index < index_range.end {
                    // Find the layout that applies at `index`, and how far it extends.
                    let (found, end) = match overlay.and_then(|o| o.get_key_value(&index)) {
                        Some((range, &layout)) => (Some(layout), range.end),
                        None => {
                            let overlay_end = overlay
                                .and_then(|o| o.overlapping(&(index..index_range.end)).next())
                                .map_or(index_range.end, |(range, _)| range.start);

                            match global {
                                Some(global) => match global.layouts.get_key_value(&index) {
                                    Some((range, &layout)) => {
                                        (Some(layout), range.end.min(overlay_end))
                                    }
                                    None => {
                                        let global_end = global
                                            .layouts
                                            .overlapping(&(index..overlay_end))
                                            .next()
                                            .map_or(overlay_end, |(range, _)| range.start);

                                        (Some(global.whole), global_end)
                                    }
                                },
                                None => (None, overlay_end),
                            }
                        }
                    };

                    if let Some(found) = found {
                        if !layouts_equivalent(
                            initial.aspects,
                            initial.layout,
                            found,
                            image_state.is_shared_presentable(),
                        ) {
                            let subresource = layout_map.indexer().subresource_at(index);

                            errors.push((
                                image,
                                Box::new(ValidationError {
                                    problem: format!(
                                        "the command buffer expects image {:?} (subresource: \
                                        aspect {:?}, mip level {}, array layer {}) to be in \
                                        layout {:?}, but its current layout is {:?}",
                                        image,
                                        subresource.aspects,
                                        subresource.mip_level,
                                        subresource.array_layer,
                                        initial.layout,
                                        found,
                                    )
                                    .into(),
                                    vuids: &["UNASSIGNED-CoreValidation-DrawState-InvalidImageLayout"],
                                    ..Default::default()
                                }),
                            ));

                            continue 'images;
                        }
                    }

                    index = end.min(index_range.end).max(index + 1);
                }
            }
        }

        errors
    }

    /// Records the current layouts of a submitted command buffer.
    pub(crate) fn record_command_buffer<'a>(
        &mut self,
        layout_maps: impl IntoIterator<Item = (&'a ash::vk::Image, &'a ImageLayoutMap)>,
    ) {
        for (image, layout_map) in layout_maps {
            let Some(global) = self.images.get_mut(image) else {
                continue;
            };

            for (index_range, &layout) in layout_map.iter_current() {
                global.layouts.insert(index_range.clone(), layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::Format,
        image::{ImageCreateInfo, ImageCreateFlags, ImageType, ImageUsage},
    };
    use ash::vk::Handle;

    fn image(format: Format, mip_levels: u32, array_layers: u32) -> ImageState {
        ImageState::new(
            ash::vk::Image::from_raw(1),
            ImageCreateInfo {
                format,
                extent: [16, 16, 1],
                mip_levels,
                array_layers,
                usage: ImageUsage::SAMPLED,
                ..Default::default()
            },
        )
    }

    fn range(
        aspects: ImageAspects,
        mip_levels: Range<u32>,
        array_layers: Range<u32>,
    ) -> ImageSubresourceRange {
        ImageSubresourceRange {
            aspects,
            mip_levels,
            array_layers,
        }
    }

    #[test]
    fn indexer_ranges() {
        let image = image(Format::D24_UNORM_S8_UINT, 3, 4);
        let indexer = SubresourceIndexer::new(&image);
        assert_eq!(indexer.range_size(), 2 * 3 * 4);

        let ranges: Vec<_> = indexer
            .iter_ranges(&range(ImageAspects::STENCIL, 1..3, 1..3))
            .collect();
        assert_eq!(ranges, vec![17..19, 21..23]);

        let subresource = ImageSubresource {
            aspects: ImageAspects::STENCIL,
            mip_level: 2,
            array_layer: 1,
        };
        let index = indexer.index_of(subresource).unwrap();
        assert_eq!(indexer.subresource_at(index), subresource);
    }

    #[test]
    fn initial_layout_first_wins() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 1);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();

        assert!(map.set_initial_layout(&full, ImageLayout::TransferSrcOptimal, None));
        assert!(!map.set_initial_layout(&full, ImageLayout::General, None));

        let subresource = ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer: 0,
        };
        assert_eq!(
            map.initial_layout(subresource).map(|initial| initial.layout),
            Some(ImageLayout::TransferSrcOptimal),
        );
        assert_eq!(map.layout(subresource), None);
    }

    #[test]
    fn set_layout_reports_changes() {
        let image = image(Format::R8G8B8A8_UNORM, 2, 2);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();
        let level_1 = range(ImageAspects::COLOR, 1..2, 0..2);

        assert!(map.set_layout(
            &full,
            ImageLayout::TransferDstOptimal,
            Some(ImageLayout::Undefined),
        ));
        assert!(!map.set_layout(&full, ImageLayout::TransferDstOptimal, None));
        assert!(map.set_layout(&level_1, ImageLayout::ShaderReadOnlyOptimal, None));

        // The initial layout is only recorded the first time.
        let subresource = ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 1,
            array_layer: 1,
        };
        assert_eq!(
            map.initial_layout(subresource).map(|initial| initial.layout),
            Some(ImageLayout::Undefined),
        );
        assert_eq!(map.layout(subresource), Some(ImageLayout::ShaderReadOnlyOptimal));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 1);
        let mut map = ImageLayoutMap::new(&image);

        assert!(!map.set_layout(
            &range(ImageAspects::COLOR, 0..2, 0..1),
            ImageLayout::General,
            None,
        ));
        assert!(map.is_empty());
    }

    #[test]
    fn for_range_order() {
        let image = image(Format::D24_UNORM_S8_UINT, 2, 2);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();
        map.set_layout(&full, ImageLayout::General, None);

        let order: Vec<_> = map
            .for_range(&full)
            .map(|entry| {
                (
                    entry.subresource.mip_level,
                    entry.subresource.array_layer,
                    entry.subresource.aspects,
                )
            })
            .collect();

        assert_eq!(
            order,
            vec![
                (0, 0, ImageAspects::DEPTH),
                (0, 0, ImageAspects::STENCIL),
                (0, 1, ImageAspects::DEPTH),
                (0, 1, ImageAspects::STENCIL),
                (1, 0, ImageAspects::DEPTH),
                (1, 0, ImageAspects::STENCIL),
                (1, 1, ImageAspects::DEPTH),
                (1, 1, ImageAspects::STENCIL),
            ],
        );

        // Subresources without any recorded layout are skipped.
        let empty = ImageLayoutMap::new(&image);
        assert_eq!(empty.for_range(&full).count(), 0);
    }

    #[test]
    fn check_layout_relaxed_depth() {
        let image = image(Format::D24_UNORM_S8_UINT, 1, 1);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();

        map.set_initial_layout(
            &full,
            ImageLayout::DepthStencilReadOnlyOptimal,
            Some(ImageAspects::DEPTH),
        );

        let entry = map
            .for_range(&range(ImageAspects::DEPTH, 0..1, 0..1))
            .next()
            .unwrap();
        assert!(check_layout(
            &entry,
            ImageLayout::DepthReadOnlyStencilAttachmentOptimal,
            ImageAspects::DEPTH | ImageAspects::STENCIL,
            false,
        )
        .is_ok());
        assert!(check_layout(
            &entry,
            ImageLayout::General,
            ImageAspects::DEPTH | ImageAspects::STENCIL,
            false,
        )
        .is_err());
    }

    #[test]
    fn check_layout_prefers_current() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 1);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();
        map.set_layout(&full, ImageLayout::TransferDstOptimal, Some(ImageLayout::General));

        let mismatch =
            first_layout_mismatch(&map, &full, ImageLayout::General, ImageAspects::COLOR, false)
                .unwrap();
        assert!(mismatch.is_current);
        assert_eq!(mismatch.layout, ImageLayout::TransferDstOptimal);
        assert_eq!(mismatch.describe(), "previous known");

        assert!(first_layout_mismatch(
            &map,
            &full,
            ImageLayout::TransferDstOptimal,
            ImageAspects::COLOR,
            false,
        )
        .is_none());
    }

    #[test]
    fn check_layout_shared_present() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 1);
        let mut map = ImageLayoutMap::new(&image);
        let full = image.full_range().clone();
        map.set_layout(&full, ImageLayout::General, None);

        let check = |shared_presentable| {
            first_layout_mismatch(
                &map,
                &full,
                ImageLayout::SharedPresent,
                ImageAspects::COLOR,
                shared_presentable,
            )
        };
        assert!(check(true).is_none());

        let mismatch = check(false).unwrap();
        assert!(mismatch.is_current);
        assert_eq!(mismatch.layout, ImageLayout::General);
    }

    #[test]
    fn update_from_secondary() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 2);
        let full = image.full_range().clone();
        let layer_1 = range(ImageAspects::COLOR, 0..1, 1..2);

        let mut primary = ImageLayoutMap::new(&image);
        primary.set_layout(&layer_1, ImageLayout::TransferSrcOptimal, Some(ImageLayout::General));

        let mut secondary = ImageLayoutMap::new(&image);
        secondary.set_layout(
            &full,
            ImageLayout::ShaderReadOnlyOptimal,
            Some(ImageLayout::Undefined),
        );

        assert!(primary.update_from(&secondary));

        let layer = |array_layer| ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer,
        };
        assert_eq!(
            primary.initial_layout(layer(1)).map(|initial| initial.layout),
            Some(ImageLayout::General),
        );
        assert_eq!(
            primary.initial_layout(layer(0)).map(|initial| initial.layout),
            Some(ImageLayout::Undefined),
        );
        assert_eq!(primary.layout(layer(1)), Some(ImageLayout::ShaderReadOnlyOptimal));
    }

    #[test]
    fn global_map_validation() {
        let image = image(Format::R8G8B8A8_UNORM, 1, 2);
        let handle = image.handle();
        let full = image.full_range().clone();
        let mut images = HashMap::default();
        images.insert(handle, image);
        let image = &images[&handle];

        let mut global = GlobalImageLayoutMap::new();
        global.insert_image(handle, ImageLayout::Undefined);

        // First command buffer: transitions from Undefined to TransferDstOptimal.
        let mut first = HashMap::default();
        let mut map = ImageLayoutMap::new(image);
        map.set_layout(&full, ImageLayout::TransferDstOptimal, Some(ImageLayout::Undefined));
        first.insert(handle, map);

        // Second command buffer: expects ShaderReadOnlyOptimal.
        let mut second = HashMap::default();
        let mut map = ImageLayoutMap::new(image);
        map.set_initial_layout(&full, ImageLayout::ShaderReadOnlyOptimal, None);
        second.insert(handle, map);

        let mut overlay = LayoutOverlay::default();
        assert!(global
            .validate_command_buffer(&overlay, &first, &images)
            .is_empty());
        overlay.record(&first);

        let errors = global.validate_command_buffer(&overlay, &second, &images);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].1.vuid(),
            "UNASSIGNED-CoreValidation-DrawState-InvalidImageLayout",
        );

        // Validation does not change the global map.
        let subresource = ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer: 1,
        };
        assert_eq!(global.layout(image, subresource), Some(ImageLayout::Undefined));

        global.record_command_buffer(&first);
        assert_eq!(
            global.layout(image, subresource),
            Some(ImageLayout::TransferDstOptimal),
        );
    }

    #[test]
    fn global_map_created_layout() {
        let image = ImageState::new(
            ash::vk::Image::from_raw(2),
            ImageCreateInfo {
                format: Format::R8G8B8A8_UNORM,
                image_type: ImageType::Dim2d,
                extent: [4, 4, 1],
                usage: ImageUsage::TRANSFER_SRC,
                flags: ImageCreateFlags::empty(),
                initial_layout: ImageLayout::Preinitialized,
                tiling: crate::image::ImageTiling::Linear,
                ..Default::default()
            },
        );
        let handle = image.handle();
        let full = image.full_range().clone();
        let mut images = HashMap::default();
        images.insert(handle, image);

        let mut global = GlobalImageLayoutMap::new();
        global.insert_image(handle, ImageLayout::Preinitialized);

        let mut cb = HashMap::default();
        let mut map = ImageLayoutMap::new(&images[&handle]);
        map.set_initial_layout(&full, ImageLayout::TransferSrcOptimal, None);
        cb.insert(handle, map);

        let errors = global.validate_command_buffer(&LayoutOverlay::default(), &cb, &images);
        assert_eq!(errors.len(), 1);

        global.remove_image(handle);
        assert!(!global.contains_image(handle));
        assert!(global
            .validate_command_buffer(&LayoutOverlay::default(), &cb, &images)
            .is_empty());
    }
}
