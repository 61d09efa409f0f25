//! Check that the context is left the way the host expects after drawing.

use gl::types::GLuint;

use crate::api::{BufferTarget, GlApi, ATTRIB_COLOR, ATTRIB_NORMAL, ATTRIB_POSITION, NO_OBJECT};

/// Attribute locations the renderer may enable.
pub const RENDERER_ATTRIBS: [GLuint; 3] = [ATTRIB_POSITION, ATTRIB_COLOR, ATTRIB_NORMAL];

/// Bindings relevant to the preview renderer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingSnapshot {
    pub array_buffer: GLuint,
    pub element_buffer: GLuint,
    pub program: GLuint,
    /// Enabled arrays among [`RENDERER_ATTRIBS`].
    pub enabled_attribs: Vec<GLuint>,
}

impl BindingSnapshot {
    pub fn capture(gl: &impl GlApi) -> Self {
        Self {
            array_buffer: gl.bound_buffer(BufferTarget::Array),
            element_buffer: gl.bound_buffer(BufferTarget::ElementArray),
            program: gl.current_program(),
            enabled_attribs: RENDERER_ATTRIBS
                .into_iter()
                .filter(|&index| gl.is_vertex_attrib_array_enabled(index))
                .collect(),
        }
    }

    /// Nothing bound, nothing enabled.
    pub fn is_released(&self) -> bool {
        self.array_buffer == NO_OBJECT
            && self.element_buffer == NO_OBJECT
            && self.program == NO_OBJECT
            && self.enabled_attribs.is_empty()
    }
}

/// True when no buffer, program or renderer attribute array is left bound.
pub fn bindings_released(gl: &impl GlApi) -> bool {
    let snapshot = BindingSnapshot::capture(gl);
    if !snapshot.is_released() {
        tracing::debug!(?snapshot, "GL bindings left behind");
    }
    snapshot.is_released()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft::SoftGl;

    #[test]
    fn fresh_context_is_released() {
        let gl = SoftGl::new();
        assert_eq!(BindingSnapshot::capture(&gl), BindingSnapshot::default());
        assert!(bindings_released(&gl));
    }

    #[test]
    fn enabled_array_is_reported() {
        let gl = SoftGl::new();
        gl.enable_vertex_attrib_array(ATTRIB_COLOR);
        gl.enable_vertex_attrib_array(7);

        let snapshot = BindingSnapshot::capture(&gl);
        assert_eq!(snapshot.enabled_attribs, [ATTRIB_COLOR]);
        assert!(!bindings_released(&gl));
    }

    #[test]
    fn bound_buffer_is_reported() {
        let gl = SoftGl::new();
        let buffer = gl.gen_buffer();
        gl.bind_buffer(BufferTarget::ElementArray, buffer);
        assert_eq!(BindingSnapshot::capture(&gl).element_buffer, buffer);

        gl.bind_buffer(BufferTarget::ElementArray, NO_OBJECT);
        assert!(bindings_released(&gl));
    }
}
