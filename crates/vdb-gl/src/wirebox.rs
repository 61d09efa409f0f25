//! Wireframe boxes for tree-node bounding regions.
//!
//! Every box occupies a fixed-size slot in three flat arrays: 8 corner
//! positions (24 floats), 8 copies of its color (24 floats) and 12 edges
//! (24 indices). Box `i` writes only its own slot, so a pre-sized batch can
//! be filled in any order, including from several threads at once.

use glam::{DVec3, Vec3};
use thiserror::Error;

use vdb_host::{CoordBBox, Transform};

use crate::api::{GlApi, PrimitiveTopology};
use crate::buffer::BufferObject;
use crate::error::GlError;

/// Corners per box.
pub const CORNERS_PER_BOX: usize = 8;
/// Position (or color) floats per box.
pub const FLOATS_PER_BOX: usize = CORNERS_PER_BOX * 3;
/// Line indices per box.
pub const INDICES_PER_BOX: usize = BOX_EDGES.len() * 2;

/// Corner pairs joined by the 12 box edges: bottom quad, top quad, then the
/// four verticals.
pub const BOX_EDGES: [[u32; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("box index {index} is out of range for a batch of {capacity} boxes")]
    OutOfRange { index: usize, capacity: usize },
}

/// Index-space corners of `bbox` grown by half a voxel on every side.
pub fn box_corners(bbox: &CoordBBox) -> [DVec3; CORNERS_PER_BOX] {
    let lo = bbox.min.as_dvec3() - DVec3::splat(0.5);
    let hi = bbox.max.as_dvec3() + DVec3::splat(0.5);
    [
        DVec3::new(lo.x, lo.y, lo.z),
        DVec3::new(lo.x, lo.y, hi.z),
        DVec3::new(hi.x, lo.y, hi.z),
        DVec3::new(hi.x, lo.y, lo.z),
        DVec3::new(lo.x, hi.y, lo.z),
        DVec3::new(lo.x, hi.y, hi.z),
        DVec3::new(hi.x, hi.y, hi.z),
        DVec3::new(hi.x, hi.y, lo.z),
    ]
}

/// Write one box into its slot.
///
/// `points`, `colors` and `indices` are the box's own slices, each exactly
/// 24 long. `base_vertex` is the number of vertices before this box.
///
/// # Panics
///
/// If any slice is shorter than 24.
pub fn write_box<T: Transform + ?Sized>(
    transform: &T,
    base_vertex: u32,
    bbox: &CoordBBox,
    color: Vec3,
    points: &mut [f32],
    colors: &mut [f32],
    indices: &mut [u32],
) {
    let points = &mut points[..FLOATS_PER_BOX];
    let colors = &mut colors[..FLOATS_PER_BOX];
    let indices = &mut indices[..INDICES_PER_BOX];

    for (corner, out) in box_corners(bbox).into_iter().zip(points.chunks_exact_mut(3)) {
        let world = transform.index_to_world(corner).as_vec3();
        out.copy_from_slice(&world.to_array());
    }

    for out in colors.chunks_exact_mut(3) {
        out.copy_from_slice(&color.to_array());
    }

    for (edge, out) in BOX_EDGES.iter().zip(indices.chunks_exact_mut(2)) {
        out[0] = base_vertex + edge[0];
        out[1] = base_vertex + edge[1];
    }
}

/// Writes boxes into caller-owned arrays sized for a fixed number of boxes.
///
/// The arrays are borrowed for the builder's lifetime and are never
/// resized by it.
pub struct WireBoxBuilder<'a, T: Transform + ?Sized> {
    transform: &'a T,
    indices: &'a mut [u32],
    points: &'a mut [f32],
    colors: &'a mut [f32],
}

impl<'a, T: Transform + ?Sized> WireBoxBuilder<'a, T> {
    pub fn new(
        transform: &'a T,
        indices: &'a mut [u32],
        points: &'a mut [f32],
        colors: &'a mut [f32],
    ) -> Self {
        Self {
            transform,
            indices,
            points,
            colors,
        }
    }

    /// Number of whole box slots available in all three arrays.
    pub fn capacity(&self) -> usize {
        (self.indices.len() / INDICES_PER_BOX)
            .min(self.points.len() / FLOATS_PER_BOX)
            .min(self.colors.len() / FLOATS_PER_BOX)
    }

    /// Write box `box_index`.
    ///
    /// # Panics
    ///
    /// If `box_index` is not below [`capacity`](Self::capacity).
    pub fn add(&mut self, box_index: usize, bbox: &CoordBBox, color: Vec3) {
        if let Err(err) = self.try_add(box_index, bbox, color) {
            panic!("{err}");
        }
    }

    /// Write box `box_index`, rejecting indices past the end of the arrays.
    pub fn try_add(
        &mut self,
        box_index: usize,
        bbox: &CoordBBox,
        color: Vec3,
    ) -> Result<(), BatchError> {
        let capacity = self.capacity();
        let out_of_range = BatchError::OutOfRange {
            index: box_index,
            capacity,
        };
        if box_index >= capacity {
            return Err(out_of_range);
        }
        let base_vertex = box_index
            .checked_mul(CORNERS_PER_BOX)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(out_of_range)?;

        let floats = box_index * FLOATS_PER_BOX..(box_index + 1) * FLOATS_PER_BOX;
        let indices = box_index * INDICES_PER_BOX..(box_index + 1) * INDICES_PER_BOX;
        write_box(
            self.transform,
            base_vertex,
            bbox,
            color,
            &mut self.points[floats.clone()],
            &mut self.colors[floats],
            &mut self.indices[indices],
        );
        Ok(())
    }
}

/// One box's slot in a [`BoxBatch`].
#[derive(Debug)]
pub struct BoxSlot<'a> {
    index: usize,
    points: &'a mut [f32],
    colors: &'a mut [f32],
    indices: &'a mut [u32],
}

impl BoxSlot<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn write<T: Transform + ?Sized>(&mut self, transform: &T, bbox: &CoordBBox, color: Vec3) {
        // Batch sizes are bounded by `BoxBatch::with_box_count`.
        let base_vertex = (self.index * CORNERS_PER_BOX) as u32;
        write_box(
            transform,
            base_vertex,
            bbox,
            color,
            self.points,
            self.colors,
            self.indices,
        );
    }
}

/// Owned index, position and color arrays for a fixed number of boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxBatch {
    indices: Vec<u32>,
    points: Vec<f32>,
    colors: Vec<f32>,
}

impl BoxBatch {
    /// Largest batch whose vertex indices fit in `u32`.
    pub const MAX_BOXES: usize = (u32::MAX as usize) / CORNERS_PER_BOX;

    /// Zero filled batch for `count` boxes.
    ///
    /// # Panics
    ///
    /// If `count` exceeds [`MAX_BOXES`](Self::MAX_BOXES).
    pub fn with_box_count(count: usize) -> Self {
        let mut batch = Self::default();
        batch.resize(count);
        batch
    }

    pub fn box_count(&self) -> usize {
        self.indices.len() / INDICES_PER_BOX
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resize to `count` boxes. New slots are zero filled.
    ///
    /// # Panics
    ///
    /// If `count` exceeds [`MAX_BOXES`](Self::MAX_BOXES).
    pub fn resize(&mut self, count: usize) {
        assert!(
            count <= Self::MAX_BOXES,
            "box batch of {count} boxes exceeds {}",
            Self::MAX_BOXES
        );
        self.indices.resize(count * INDICES_PER_BOX, 0);
        self.points.resize(count * FLOATS_PER_BOX, 0.0);
        self.colors.resize(count * FLOATS_PER_BOX, 0.0);
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn points(&self) -> &[f32] {
        &self.points
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    /// Builder writing into this batch through `transform`.
    pub fn builder<'a, T: Transform + ?Sized>(
        &'a mut self,
        transform: &'a T,
    ) -> WireBoxBuilder<'a, T> {
        WireBoxBuilder::new(transform, &mut self.indices, &mut self.points, &mut self.colors)
    }

    /// Disjoint per-box slots, in box order. Slots can be sent to other
    /// threads and written independently.
    pub fn box_slots_mut(&mut self) -> impl Iterator<Item = BoxSlot<'_>> {
        self.points
            .chunks_exact_mut(FLOATS_PER_BOX)
            .zip(self.colors.chunks_exact_mut(FLOATS_PER_BOX))
            .zip(self.indices.chunks_exact_mut(INDICES_PER_BOX))
            .enumerate()
            .map(|(index, ((points, colors), indices))| BoxSlot {
                index,
                points,
                colors,
                indices,
            })
    }

    /// Upload positions, colors and line indices into `buffers`.
    ///
    /// On failure the element buffer is discarded, so `buffers` is left
    /// invalid rather than drawing earlier indices over the new vertices.
    pub fn upload<G: GlApi>(&self, buffers: &mut BufferObject<G>) -> Result<(), GlError> {
        let result = buffers
            .gen_vertex_buffer(&self.points)
            .and_then(|()| buffers.gen_color_buffer(&self.colors))
            .and_then(|()| buffers.gen_index_buffer(&self.indices, PrimitiveTopology::Lines));
        if result.is_err() {
            buffers.discard_elements();
        }
        result
    }
}
