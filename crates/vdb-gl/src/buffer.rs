//! GPU buffers (vertex, normal, color, index) of one renderable batch.
//!
//! Each slot owns at most one live GL buffer. Regenerating a slot deletes
//! its previous buffer first, so repeated uploads never leak. Failures leave
//! the slot empty, are returned to the caller and are also appended to the
//! object's [`ErrorLog`]. Dropping the object releases every buffer.

use std::fmt;
use std::rc::Rc;

use gl::types::{GLsizei, GLuint};
use tracing::{debug, trace, warn};

use crate::api::{
    BufferTarget, GlApi, PrimitiveTopology, ATTRIB_COLOR, ATTRIB_NORMAL, ATTRIB_POSITION,
    NO_OBJECT,
};
use crate::bytes::{slice_as_bytes, AsBytes};
use crate::error::{clear_gl_errors, take_gl_error, ErrorLog, GlError, GlErrorKind};

/// Floats per vertex for positions, normals and colors.
pub const COMPONENTS_PER_VERTEX: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Vertex,
    Normal,
    Index,
    Color,
}

impl Slot {
    fn target(self) -> BufferTarget {
        match self {
            Slot::Index => BufferTarget::ElementArray,
            _ => BufferTarget::Array,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Vertex => "vertex",
            Slot::Normal => "normal",
            Slot::Index => "index",
            Slot::Color => "color",
        })
    }
}

/// GPU buffers of one renderable batch.
pub struct BufferObject<G: GlApi> {
    gl: Rc<G>,
    vertex_buffer: GLuint,
    normal_buffer: GLuint,
    index_buffer: GLuint,
    color_buffer: GLuint,
    topology: PrimitiveTopology,
    element_count: GLsizei,
    error_log: ErrorLog,
}

impl<G: GlApi> fmt::Debug for BufferObject<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferObject")
            .field("vertex_buffer", &self.vertex_buffer)
            .field("normal_buffer", &self.normal_buffer)
            .field("index_buffer", &self.index_buffer)
            .field("color_buffer", &self.color_buffer)
            .field("topology", &self.topology)
            .field("element_count", &self.element_count)
            .finish()
    }
}

impl<G: GlApi> BufferObject<G> {
    /// Empty buffer set. No GL objects are created until a `gen_*` call.
    pub fn new(gl: Rc<G>) -> Self {
        Self {
            gl,
            vertex_buffer: NO_OBJECT,
            normal_buffer: NO_OBJECT,
            index_buffer: NO_OBJECT,
            color_buffer: NO_OBJECT,
            topology: PrimitiveTopology::Points,
            element_count: 0,
            error_log: ErrorLog::new(),
        }
    }

    /// True when there is something to draw: a non-zero element count and
    /// live vertex and index buffers.
    pub fn is_valid(&self) -> bool {
        self.element_count > 0
            && self.gl.is_buffer(self.index_buffer)
            && self.gl.is_buffer(self.vertex_buffer)
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Number of indices drawn by [`render`](Self::render).
    pub fn element_count(&self) -> usize {
        self.element_count as usize
    }

    pub fn vertex_buffer(&self) -> GLuint {
        self.vertex_buffer
    }

    pub fn normal_buffer(&self) -> GLuint {
        self.normal_buffer
    }

    pub fn index_buffer(&self) -> GLuint {
        self.index_buffer
    }

    pub fn color_buffer(&self) -> GLuint {
        self.color_buffer
    }

    /// Accumulated failure messages since the last [`clear`](Self::clear).
    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Upload element indices and record the topology used to draw them.
    ///
    /// Count and topology are only updated when the upload succeeds.
    pub fn gen_index_buffer(
        &mut self,
        indices: &[u32],
        topology: PrimitiveTopology,
    ) -> Result<(), GlError> {
        let Ok(count) = GLsizei::try_from(indices.len()) else {
            self.release(Slot::Index);
            return Err(self.fail(GlError::new(
                GlErrorKind::Upload,
                "Unable to upload index buffer data",
            )));
        };
        self.upload(Slot::Index, indices)?;
        self.element_count = count;
        self.topology = topology;
        Ok(())
    }

    /// Upload vertex positions, three floats per vertex.
    pub fn gen_vertex_buffer(&mut self, points: &[f32]) -> Result<(), GlError> {
        self.upload(Slot::Vertex, points)
    }

    /// Upload vertex normals, three floats per vertex.
    pub fn gen_normal_buffer(&mut self, normals: &[f32]) -> Result<(), GlError> {
        self.upload(Slot::Normal, normals)
    }

    /// Upload per-vertex RGB colors, three floats per vertex.
    pub fn gen_color_buffer(&mut self, colors: &[f32]) -> Result<(), GlError> {
        self.upload(Slot::Color, colors)
    }

    /// Draw the batch with the current program.
    ///
    /// Positions feed attribute [`ATTRIB_POSITION`], colors
    /// [`ATTRIB_COLOR`] and normals [`ATTRIB_NORMAL`]; the optional arrays
    /// are only enabled when their buffer is live. All arrays and buffer
    /// bindings touched here are released before returning.
    pub fn render(&self) {
        if !self.is_valid() {
            debug!(
                error_log = %self.error_log,
                "request to render empty or uninitialized buffer"
            );
            return;
        }

        let gl = &*self.gl;
        let uses_color = gl.is_buffer(self.color_buffer);
        let uses_normal = gl.is_buffer(self.normal_buffer);

        gl.bind_buffer(BufferTarget::Array, self.vertex_buffer);
        gl.enable_vertex_attrib_array(ATTRIB_POSITION);
        gl.vertex_attrib_pointer_f32(ATTRIB_POSITION, COMPONENTS_PER_VERTEX);

        if uses_color {
            gl.bind_buffer(BufferTarget::Array, self.color_buffer);
            gl.enable_vertex_attrib_array(ATTRIB_COLOR);
            gl.vertex_attrib_pointer_f32(ATTRIB_COLOR, COMPONENTS_PER_VERTEX);
        }

        if uses_normal {
            gl.bind_buffer(BufferTarget::Array, self.normal_buffer);
            gl.enable_vertex_attrib_array(ATTRIB_NORMAL);
            gl.vertex_attrib_pointer_f32(ATTRIB_NORMAL, COMPONENTS_PER_VERTEX);
        }

        gl.bind_buffer(BufferTarget::ElementArray, self.index_buffer);
        gl.draw_elements_u32(self.topology, self.element_count);
        trace!(topology = ?self.topology, count = self.element_count, "draw elements");

        if uses_normal {
            gl.disable_vertex_attrib_array(ATTRIB_NORMAL);
        }
        if uses_color {
            gl.disable_vertex_attrib_array(ATTRIB_COLOR);
        }
        gl.disable_vertex_attrib_array(ATTRIB_POSITION);

        gl.bind_buffer(BufferTarget::Array, NO_OBJECT);
        gl.bind_buffer(BufferTarget::ElementArray, NO_OBJECT);
    }

    /// Delete every live buffer and reset count, topology and error log.
    /// Safe to call repeatedly.
    pub fn clear(&mut self) {
        for slot in [Slot::Index, Slot::Vertex, Slot::Color, Slot::Normal] {
            self.release(slot);
        }
        self.topology = PrimitiveTopology::Points;
        self.element_count = 0;
        self.error_log.clear();
    }

    /// Delete the index buffer and reset the element count, leaving the set
    /// invalid. Other slots and the error log are kept.
    pub fn discard_elements(&mut self) {
        self.release(Slot::Index);
        self.topology = PrimitiveTopology::Points;
        self.element_count = 0;
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn handle_mut(&mut self, slot: Slot) -> &mut GLuint {
        match slot {
            Slot::Vertex => &mut self.vertex_buffer,
            Slot::Normal => &mut self.normal_buffer,
            Slot::Index => &mut self.index_buffer,
            Slot::Color => &mut self.color_buffer,
        }
    }

    fn release(&mut self, slot: Slot) {
        let gl = Rc::clone(&self.gl);
        let handle = self.handle_mut(slot);
        if *handle != NO_OBJECT && gl.is_buffer(*handle) {
            gl.delete_buffer(*handle);
        }
        *handle = NO_OBJECT;
    }

    fn fail(&mut self, err: GlError) -> GlError {
        warn!(kind = ?err.kind, "{}", err.message);
        self.error_log.append(&err.message);
        err
    }

    fn upload<T: AsBytes>(&mut self, slot: Slot, data: &[T]) -> Result<(), GlError> {
        self.release(slot);

        let gl = Rc::clone(&self.gl);
        let target = slot.target();

        let buffer = gl.gen_buffer();
        gl.bind_buffer(target, buffer);
        if !gl.is_buffer(buffer) {
            gl.bind_buffer(target, NO_OBJECT);
            return Err(self.fail(GlError::new(
                GlErrorKind::ResourceCreation,
                format!("Unable to create {slot} buffer"),
            )));
        }

        clear_gl_errors(&*gl);
        gl.buffer_data(target, slice_as_bytes(data));
        if let Some(code) = take_gl_error(&*gl) {
            gl.bind_buffer(target, NO_OBJECT);
            gl.delete_buffer(buffer);
            let mut err = GlError::new(
                GlErrorKind::Upload,
                format!("Unable to upload {slot} buffer data"),
            );
            err.code = Some(code);
            return Err(self.fail(err));
        }

        gl.bind_buffer(target, NO_OBJECT);
        *self.handle_mut(slot) = buffer;
        trace!(%slot, buffer, bytes = std::mem::size_of_val(data), "uploaded buffer");
        Ok(())
    }
}

impl<G: GlApi> Drop for BufferObject<G> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft::SoftGl;
    use crate::validate::bindings_released;

    fn setup() -> (Rc<SoftGl>, BufferObject<SoftGl>) {
        let gl = Rc::new(SoftGl::new());
        let buffers = BufferObject::new(Rc::clone(&gl));
        (gl, buffers)
    }

    fn triangle(buffers: &mut BufferObject<SoftGl>) {
        buffers
            .gen_vertex_buffer(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        buffers
            .gen_index_buffer(&[0, 1, 2], PrimitiveTopology::Triangles)
            .unwrap();
    }

    #[test]
    fn new_buffer_set_is_invalid() {
        let (gl, buffers) = setup();
        assert!(!buffers.is_valid());
        assert_eq!(buffers.topology(), PrimitiveTopology::Points);
        assert_eq!(gl.live_buffer_count(), 0);
    }

    #[test]
    fn valid_needs_vertices_indices_and_count() {
        let (_gl, mut buffers) = setup();
        buffers.gen_vertex_buffer(&[0.0; 9]).unwrap();
        assert!(!buffers.is_valid());

        buffers.gen_index_buffer(&[], PrimitiveTopology::Lines).unwrap();
        assert!(!buffers.is_valid());

        buffers.gen_index_buffer(&[0, 1], PrimitiveTopology::Lines).unwrap();
        assert!(buffers.is_valid());
        assert_eq!(buffers.element_count(), 2);
        assert_eq!(buffers.topology(), PrimitiveTopology::Lines);
    }

    #[test]
    fn regenerating_a_slot_does_not_leak() {
        let (gl, mut buffers) = setup();
        for _ in 0..5 {
            triangle(&mut buffers);
            buffers.gen_color_buffer(&[1.0; 9]).unwrap();
            buffers.gen_normal_buffer(&[0.0; 9]).unwrap();
        }
        assert_eq!(gl.live_buffer_count(), 4);
    }

    #[test]
    fn upload_stores_native_bytes() {
        let (gl, mut buffers) = setup();
        buffers.gen_index_buffer(&[7, 9], PrimitiveTopology::Lines).unwrap();
        let bytes = gl.buffer_contents(buffers.index_buffer()).unwrap();
        assert_eq!(bytes, [7u32.to_ne_bytes(), 9u32.to_ne_bytes()].concat());
    }

    #[test]
    fn allocation_failure_is_logged_and_slot_left_empty() {
        let (gl, mut buffers) = setup();
        gl.fail_next_buffer_alloc();

        let err = buffers.gen_vertex_buffer(&[0.0; 3]).unwrap_err();
        assert_eq!(err.kind, GlErrorKind::ResourceCreation);
        assert_eq!(err.message, "Unable to create vertex buffer");
        assert_eq!(buffers.vertex_buffer(), NO_OBJECT);
        assert_eq!(buffers.error_log().as_str(), "Unable to create vertex buffer");
    }

    #[test]
    fn upload_failure_deletes_partial_buffer() {
        let (gl, mut buffers) = setup();
        gl.fail_next_buffer_upload();

        let err = buffers
            .gen_index_buffer(&[0, 1], PrimitiveTopology::Lines)
            .unwrap_err();
        assert_eq!(err.kind, GlErrorKind::Upload);
        assert_eq!(err.code, Some(gl::OUT_OF_MEMORY));
        assert_eq!(buffers.index_buffer(), NO_OBJECT);
        assert_eq!(buffers.element_count(), 0);
        assert_eq!(buffers.topology(), PrimitiveTopology::Points);
        assert_eq!(gl.live_buffer_count(), 0);
        assert!(bindings_released(&*gl));
    }

    #[test]
    fn failures_accumulate_in_log() {
        let (gl, mut buffers) = setup();
        gl.fail_next_buffer_alloc();
        gl.fail_next_buffer_alloc();
        let _ = buffers.gen_index_buffer(&[0], PrimitiveTopology::Points);
        let _ = buffers.gen_color_buffer(&[0.0; 3]);
        assert_eq!(
            buffers.error_log().as_str(),
            "Unable to create index buffer\nUnable to create color buffer"
        );
    }

    #[test]
    fn failed_slot_keeps_other_slots_state() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        gl.fail_next_buffer_upload();
        assert!(buffers.gen_vertex_buffer(&[0.0; 9]).is_err());

        assert_eq!(buffers.element_count(), 3);
        assert_eq!(buffers.topology(), PrimitiveTopology::Triangles);
        assert!(!buffers.is_valid());
    }

    #[test]
    fn render_draws_and_releases_bindings() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        buffers.gen_color_buffer(&[1.0; 9]).unwrap();

        buffers.render();

        let draws = gl.draw_calls();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].topology, PrimitiveTopology::Triangles);
        assert_eq!(draws[0].indices, [0, 1, 2]);
        assert_eq!(
            draws[0].attributes,
            [
                (ATTRIB_POSITION, buffers.vertex_buffer()),
                (ATTRIB_COLOR, buffers.color_buffer()),
            ]
        );
        assert!(bindings_released(&*gl));
    }

    #[test]
    fn render_with_normals_enables_normal_array() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        buffers.gen_normal_buffer(&[0.0f32, 0.0, 1.0].repeat(3)).unwrap();

        buffers.render();

        let attributes = &gl.draw_calls()[0].attributes;
        assert_eq!(
            attributes,
            &[
                (ATTRIB_POSITION, buffers.vertex_buffer()),
                (ATTRIB_NORMAL, buffers.normal_buffer()),
            ]
        );
        assert!(gl.enabled_attribs().is_empty());
    }

    #[test]
    fn render_of_invalid_set_is_a_no_op() {
        let (gl, buffers) = setup();
        buffers.render();
        assert!(gl.draw_calls().is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        gl.fail_next_buffer_alloc();
        let _ = buffers.gen_color_buffer(&[0.0; 9]);

        buffers.clear();
        assert!(!buffers.is_valid());
        assert!(buffers.error_log().is_empty());
        assert_eq!(buffers.topology(), PrimitiveTopology::Points);
        assert_eq!(gl.live_buffer_count(), 0);

        buffers.clear();
        assert!(!buffers.is_valid());
        assert_eq!(gl.live_buffer_count(), 0);
        assert_eq!(gl.pending_errors(), 0);
    }

    #[test]
    fn discard_elements_keeps_log_and_vertex_data() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        gl.fail_next_buffer_alloc();
        let _ = buffers.gen_color_buffer(&[0.0; 9]);

        buffers.discard_elements();
        assert!(!buffers.is_valid());
        assert_eq!(buffers.index_buffer(), NO_OBJECT);
        assert_eq!(buffers.element_count(), 0);
        assert!(gl.is_buffer(buffers.vertex_buffer()));
        assert_eq!(buffers.error_log().as_str(), "Unable to create color buffer");
    }

    #[test]
    fn drop_releases_buffers() {
        let (gl, mut buffers) = setup();
        triangle(&mut buffers);
        assert_eq!(gl.live_buffer_count(), 2);
        drop(buffers);
        assert_eq!(gl.live_buffer_count(), 0);
    }
}
