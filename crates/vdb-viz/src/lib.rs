//! Tree-topology preview for volumetric grids.
//!
//! Use [`TreeTopologyRenderer`] to draw the node boxes of a grid as colored
//! wireframes. Call [`TreeTopologyRenderer::build`] when the grid or the
//! [`VisualizeSettings`] change and [`TreeTopologyRenderer::render`] from the
//! host's draw callback.

pub mod renderer;
pub mod settings;
pub mod shaders;

pub use renderer::{build_previews, collect_boxes, TreeTopologyRenderer};
pub use settings::VisualizeSettings;
