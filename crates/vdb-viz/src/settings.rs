//! Display options of the tree-topology preview.

use glam::Vec3;

/// Which node levels to draw and in which colors.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizeSettings {
    /// Draw the active-voxel bounding box of the grid.
    pub draw_bbox: bool,
    /// Draw root and internal nodes.
    pub draw_internal_nodes: bool,
    pub draw_leaf_nodes: bool,
    pub root_color: Vec3,
    pub upper_internal_color: Vec3,
    pub lower_internal_color: Vec3,
    pub leaf_color: Vec3,
    pub bbox_color: Vec3,
}

impl Default for VisualizeSettings {
    fn default() -> Self {
        Self {
            draw_bbox: true,
            draw_internal_nodes: true,
            draw_leaf_nodes: true,
            root_color: Vec3::new(0.045, 0.045, 0.045),
            upper_internal_color: Vec3::new(0.0432, 0.33, 0.0411),
            lower_internal_color: Vec3::new(0.871, 0.394, 0.01916),
            leaf_color: Vec3::new(0.00608, 0.2795, 0.625),
            bbox_color: Vec3::ONE,
        }
    }
}

impl VisualizeSettings {
    /// Color of a node at `depth` in a tree with `tree_depth` levels, or
    /// `None` when that level is hidden.
    ///
    /// The level right above the leaves uses the lower internal color; every
    /// other internal level uses the upper one.
    pub fn node_color(&self, depth: usize, tree_depth: usize) -> Option<Vec3> {
        let leaf = tree_depth.saturating_sub(1);
        if depth >= leaf {
            return self.draw_leaf_nodes.then_some(self.leaf_color);
        }
        if !self.draw_internal_nodes {
            return None;
        }
        Some(match depth {
            0 => self.root_color,
            d if d + 1 == leaf => self.lower_internal_color,
            _ => self.upper_internal_color,
        })
    }
}
