//! Wireframe preview of a grid's tree nodes.

use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{debug, trace};

use vdb_gl::{BoxBatch, BufferObject, GlApi, ShaderProgram, SharedGl};
use vdb_host::{selected_grids, CoordBBox, Grid, GridSource};

use crate::settings::VisualizeSettings;
use crate::shaders::{WIRE_ATTRIBUTES, WIRE_FRAGMENT_SHADER, WIRE_VERTEX_SHADER};

/// Draws the node bounding boxes of one grid as colored lines.
pub struct TreeTopologyRenderer<G: GlApi> {
    buffers: BufferObject<G>,
    shader: ShaderProgram<G>,
    box_count: usize,
}

impl<G: GlApi> TreeTopologyRenderer<G> {
    pub fn new(gl: SharedGl<G>) -> Self {
        Self {
            buffers: BufferObject::new(Rc::clone(&gl)),
            shader: ShaderProgram::new(gl),
            box_count: 0,
        }
    }

    /// Number of boxes uploaded by the last [`build`](Self::build).
    pub fn box_count(&self) -> usize {
        self.box_count
    }

    /// True when there is geometry and a linked program to draw it with.
    pub fn is_valid(&self) -> bool {
        self.buffers.is_valid() && self.shader.is_valid()
    }

    pub fn buffers(&self) -> &BufferObject<G> {
        &self.buffers
    }

    pub fn shader(&self) -> &ShaderProgram<G> {
        &self.shader
    }

    /// Lay out and upload the node boxes of `grid` that `settings` selects.
    ///
    /// The wireframe program is compiled on first use and reused afterwards.
    pub fn build(&mut self, grid: &dyn Grid, settings: &VisualizeSettings) -> Result<()> {
        let boxes = collect_boxes(grid, settings);
        self.box_count = 0;

        if boxes.is_empty() {
            debug!(grid = grid.name(), "no node boxes to draw");
            self.buffers.clear();
            return Ok(());
        }

        let mut batch = BoxBatch::with_box_count(boxes.len());
        let mut builder = batch.builder(grid.transform());
        for (index, (bbox, color)) in boxes.iter().enumerate() {
            builder.add(index, bbox, *color);
        }

        batch
            .upload(&mut self.buffers)
            .with_context(|| format!("Failed to upload node boxes of '{}'", grid.name()))?;
        self.box_count = boxes.len();

        if !self.shader.is_valid() {
            self.build_shader()
                .context("Failed to build the wireframe shader")?;
        }

        debug!(grid = grid.name(), boxes = self.box_count, "built tree topology preview");
        Ok(())
    }

    /// Draw with the wireframe program. Leaves no program or buffer bound.
    pub fn render(&self) {
        self.shader.start_shading();
        self.buffers.render();
        self.shader.stop_shading();
    }

    /// Release all GL objects.
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.shader.clear();
        self.box_count = 0;
    }

    fn build_shader(&mut self) -> Result<()> {
        self.shader.set_vert_shader(WIRE_VERTEX_SHADER)?;
        self.shader.set_frag_shader(WIRE_FRAGMENT_SHADER)?;
        self.shader.build_with_attributes(&WIRE_ATTRIBUTES)?;
        trace!(program = self.shader.program(), "wireframe shader ready");
        Ok(())
    }
}

/// Node boxes of `grid` with their colors, in visit order, followed by the
/// active bounding box when enabled.
pub fn collect_boxes(grid: &dyn Grid, settings: &VisualizeSettings) -> Vec<(CoordBBox, Vec3)> {
    let tree_depth = grid.tree_depth();
    let mut boxes = Vec::new();
    grid.visit_node_boxes(&mut |node| {
        if let Some(color) = settings.node_color(node.depth, tree_depth) {
            boxes.push((node.bbox, color));
        }
    });

    if settings.draw_bbox {
        if let Some(bbox) = grid.active_bbox() {
            boxes.push((bbox, settings.bbox_color));
        }
    }
    boxes
}

/// One renderer per grid of `source` matched by `selection`.
///
/// Grids with nothing to draw still get a renderer; it simply draws nothing.
pub fn build_previews<G: GlApi>(
    gl: &SharedGl<G>,
    source: &dyn GridSource,
    selection: &str,
    settings: &VisualizeSettings,
) -> Result<Vec<TreeTopologyRenderer<G>>> {
    selected_grids(selection, source)
        .into_iter()
        .map(|grid| -> Result<TreeTopologyRenderer<G>> {
            let mut renderer = TreeTopologyRenderer::new(Rc::clone(gl));
            renderer.build(grid.as_ref(), settings)?;
            Ok(renderer)
        })
        .collect()
}
