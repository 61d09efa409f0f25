//! Read-only view of the volumetric grid library.
//!
//! The plugin never owns voxel data. Everything it needs from a grid is
//! behind the [`Grid`] trait: naming and metadata for the node info report,
//! the index-to-world [`Transform`], and the bounding boxes of the tree's
//! nodes for the topology preview. [`GridSource`] is the container the host
//! hands to a node (one data block, several grids).

use std::sync::Arc;

use glam::{DAffine3, DVec3, IVec3};

/// Integer index-space coordinate.
pub type Coord = IVec3;

/// Inclusive integer bounding box in index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordBBox {
    pub min: Coord,
    pub max: Coord,
}

impl CoordBBox {
    pub const fn new(min: Coord, max: Coord) -> Self {
        Self { min, max }
    }

    /// Box covering `dim` voxels along each axis starting at `origin`.
    pub fn from_origin_dim(origin: Coord, dim: i32) -> Self {
        Self {
            min: origin,
            max: origin + IVec3::splat(dim - 1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Number of voxels along each axis (zero for an empty box).
    pub fn dim(&self) -> Coord {
        if self.is_empty() {
            IVec3::ZERO
        } else {
            self.max - self.min + IVec3::ONE
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &CoordBBox) -> CoordBBox {
        CoordBBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Maps index-space positions to world space.
pub trait Transform: Send + Sync {
    fn index_to_world(&self, ijk: DVec3) -> DVec3;
}

impl Transform for DAffine3 {
    fn index_to_world(&self, ijk: DVec3) -> DVec3 {
        self.transform_point3(ijk)
    }
}

/// Bounding box of one tree node together with its depth in the tree.
///
/// Depth 0 is the root level; `tree_depth - 1` is the leaf level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBox {
    pub depth: usize,
    pub bbox: CoordBBox,
}

/// A single grid as seen by the plugin.
pub trait Grid: Send + Sync {
    fn name(&self) -> &str;

    /// Value type name, e.g. `"float"` or `"vec3s"`.
    fn value_type(&self) -> &str;

    fn transform(&self) -> &dyn Transform;

    /// World-space size of one voxel along each axis.
    fn voxel_size(&self) -> DVec3;

    /// Approximate memory footprint in bytes.
    fn mem_usage(&self) -> u64;

    /// Bounding box of all active voxels, `None` for an empty grid.
    fn active_bbox(&self) -> Option<CoordBBox>;

    /// Number of node levels including root and leaf level.
    fn tree_depth(&self) -> usize;

    /// Calls `visitor` once per tree node below the root.
    fn visit_node_boxes(&self, visitor: &mut dyn FnMut(NodeBox));

    fn active_voxel_dim(&self) -> Coord {
        self.active_bbox()
            .map(|bbox| bbox.dim())
            .unwrap_or(IVec3::ZERO)
    }
}

/// Indexed, read-only collection of grids (one host data block).
pub trait GridSource {
    fn number_of_grids(&self) -> usize;

    /// Borrow grid `index`. Panics when `index >= number_of_grids()`.
    fn grid(&self, index: usize) -> &dyn Grid;

    /// Shared handle to grid `index`. Panics when out of range.
    fn grid_ptr(&self, index: usize) -> Arc<dyn Grid>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Plain list of shared grids.
#[derive(Clone, Default)]
pub struct GridCollection {
    grids: Vec<Arc<dyn Grid>>,
}

impl GridCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, grid: Arc<dyn Grid>) {
        self.grids.push(grid);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Grid>> {
        self.grids.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

impl FromIterator<Arc<dyn Grid>> for GridCollection {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Grid>>>(iter: I) -> Self {
        Self {
            grids: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for GridCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.grids.iter().map(|g| g.name()))
            .finish()
    }
}

impl GridSource for GridCollection {
    fn number_of_grids(&self) -> usize {
        self.grids.len()
    }

    fn grid(&self, index: usize) -> &dyn Grid {
        self.grids[index].as_ref()
    }

    fn grid_ptr(&self, index: usize) -> Arc<dyn Grid> {
        Arc::clone(&self.grids[index])
    }
}

/// Grid description made of metadata and a node layout, without voxel
/// values. Enough to drive selection, info reports and topology previews.
#[derive(Debug, Clone)]
pub struct TopologyGrid {
    name: String,
    value_type: String,
    transform: DAffine3,
    tree_depth: usize,
    nodes: Vec<NodeBox>,
    mem_usage: u64,
}

impl TopologyGrid {
    /// Standard 5-4-3 layout depth (root, two internal levels, leaf).
    pub const DEFAULT_TREE_DEPTH: usize = 4;

    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            transform: DAffine3::IDENTITY,
            tree_depth: Self::DEFAULT_TREE_DEPTH,
            nodes: Vec::new(),
            mem_usage: 0,
        }
    }

    pub fn with_transform(mut self, transform: DAffine3) -> Self {
        self.transform = transform;
        self
    }

    /// Uniform voxel size, no translation.
    pub fn with_voxel_size(mut self, voxel_size: f64) -> Self {
        self.transform = DAffine3::from_scale(DVec3::splat(voxel_size));
        self
    }

    pub fn with_tree_depth(mut self, depth: usize) -> Self {
        self.tree_depth = depth;
        self
    }

    pub fn with_mem_usage(mut self, bytes: u64) -> Self {
        self.mem_usage = bytes;
        self
    }

    pub fn with_node(mut self, depth: usize, bbox: CoordBBox) -> Self {
        self.nodes.push(NodeBox { depth, bbox });
        self
    }

    pub fn push_node(&mut self, depth: usize, bbox: CoordBBox) {
        self.nodes.push(NodeBox { depth, bbox });
    }

    pub fn nodes(&self) -> &[NodeBox] {
        &self.nodes
    }

    fn leaf_depth(&self) -> usize {
        self.tree_depth.saturating_sub(1)
    }
}

impl Grid for TopologyGrid {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> &str {
        &self.value_type
    }

    fn transform(&self) -> &dyn Transform {
        &self.transform
    }

    fn voxel_size(&self) -> DVec3 {
        let m = self.transform.matrix3;
        DVec3::new(m.x_axis.length(), m.y_axis.length(), m.z_axis.length())
    }

    fn mem_usage(&self) -> u64 {
        self.mem_usage
    }

    fn active_bbox(&self) -> Option<CoordBBox> {
        let leaf = self.leaf_depth();
        self.nodes
            .iter()
            .filter(|n| n.depth == leaf)
            .map(|n| n.bbox)
            .reduce(|a, b| a.union(&b))
    }

    fn tree_depth(&self) -> usize {
        self.tree_depth
    }

    fn visit_node_boxes(&self, visitor: &mut dyn FnMut(NodeBox)) {
        for node in &self.nodes {
            visitor(*node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_dim_is_inclusive() {
        let bbox = CoordBBox::new(IVec3::ZERO, IVec3::new(7, 7, 7));
        assert_eq!(bbox.dim(), IVec3::splat(8));
        assert_eq!(CoordBBox::from_origin_dim(IVec3::splat(8), 8), CoordBBox::new(IVec3::splat(8), IVec3::splat(15)));
    }

    #[test]
    fn empty_bbox_has_zero_dim() {
        let bbox = CoordBBox::new(IVec3::ONE, IVec3::ZERO);
        assert!(bbox.is_empty());
        assert_eq!(bbox.dim(), IVec3::ZERO);
    }

    #[test]
    fn active_bbox_is_union_of_leaves() {
        let grid = TopologyGrid::new("density", "float")
            .with_node(1, CoordBBox::from_origin_dim(IVec3::ZERO, 128))
            .with_node(3, CoordBBox::from_origin_dim(IVec3::ZERO, 8))
            .with_node(3, CoordBBox::from_origin_dim(IVec3::new(8, 0, 16), 8));

        let bbox = grid.active_bbox().unwrap();
        assert_eq!(bbox.min, IVec3::ZERO);
        assert_eq!(bbox.max, IVec3::new(15, 7, 23));
        assert_eq!(grid.active_voxel_dim(), IVec3::new(16, 8, 24));
    }

    #[test]
    fn voxel_size_follows_transform() {
        let grid = TopologyGrid::new("sdf", "float").with_voxel_size(0.25);
        assert_eq!(grid.voxel_size(), DVec3::splat(0.25));
        assert_eq!(
            grid.transform().index_to_world(DVec3::new(4.0, 8.0, -4.0)),
            DVec3::new(1.0, 2.0, -1.0)
        );
    }

    #[test]
    fn collection_indexes_grids() {
        let grids: GridCollection = [
            Arc::new(TopologyGrid::new("a", "float")) as Arc<dyn Grid>,
            Arc::new(TopologyGrid::new("b", "int32")),
        ]
        .into_iter()
        .collect();

        assert_eq!(grids.number_of_grids(), 2);
        assert_eq!(grids.grid(1).name(), "b");
        assert_eq!(grids.grid_ptr(0).value_type(), "float");
    }

    #[test]
    fn collection_grows_by_insert() {
        let mut grids = GridCollection::new();
        assert!(grids.is_empty());

        grids.insert(Arc::new(TopologyGrid::new("density", "float")));
        grids.insert(Arc::new(TopologyGrid::new("velocity", "vec3s")));

        assert!(!grids.is_empty());
        let names: Vec<_> = grids.iter().map(|g| g.name().to_owned()).collect();
        assert_eq!(names, ["density", "velocity"]);
    }

    #[test]
    fn pushed_nodes_are_visited_in_order() {
        let mut grid = TopologyGrid::new("density", "float").with_node(2, CoordBBox::from_origin_dim(IVec3::ZERO, 128));
        grid.push_node(3, CoordBBox::from_origin_dim(IVec3::splat(8), 8));

        assert_eq!(grid.nodes().len(), 2);
        assert_eq!(grid.nodes()[1].depth, 3);

        let mut depths = Vec::new();
        grid.visit_node_boxes(&mut |node| depths.push(node.depth));
        assert_eq!(depths, [2, 3]);
        assert_eq!(grid.active_bbox(), Some(grid.nodes()[1].bbox));
    }

    #[test]
    fn explicit_transform_replaces_voxel_size() {
        let transform = DAffine3::from_scale_rotation_translation(
            DVec3::new(0.5, 2.0, 1.0),
            glam::DQuat::IDENTITY,
            DVec3::new(10.0, 0.0, 0.0),
        );
        let grid = TopologyGrid::new("sdf", "float").with_voxel_size(4.0).with_transform(transform);

        assert_eq!(grid.voxel_size(), DVec3::new(0.5, 2.0, 1.0));
        assert_eq!(grid.transform().index_to_world(DVec3::new(2.0, 1.0, 0.0)), DVec3::new(11.0, 2.0, 0.0));
    }
}
