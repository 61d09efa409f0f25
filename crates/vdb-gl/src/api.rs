//! The set of OpenGL entry points the preview renderer relies on.
//!
//! [`GlApi`] is deliberately narrow: buffer objects, generic vertex
//! attribute arrays, indexed draws, shaders and programs. [`crate::RawGl`]
//! forwards to the driver; [`crate::SoftGl`] models the same objects in
//! process for headless use.

use std::fmt;
use std::rc::Rc;

use gl::types::{GLenum, GLint, GLsizei, GLuint};

/// Object name meaning "no object".
pub const NO_OBJECT: GLuint = 0;

/// Attribute location of vertex positions.
pub const ATTRIB_POSITION: GLuint = 0;
/// Attribute location of per-vertex colors.
pub const ATTRIB_COLOR: GLuint = 1;
/// Attribute location of vertex normals.
pub const ATTRIB_NORMAL: GLuint = 2;

/// Buffer binding points used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

impl BufferTarget {
    pub fn as_raw(self) -> GLenum {
        match self {
            BufferTarget::Array => gl::ARRAY_BUFFER,
            BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
        }
    }

    pub(crate) fn binding_query(self) -> GLenum {
        match self {
            BufferTarget::Array => gl::ARRAY_BUFFER_BINDING,
            BufferTarget::ElementArray => gl::ELEMENT_ARRAY_BUFFER_BINDING,
        }
    }
}

/// Primitive topology of an indexed draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PrimitiveTopology {
    #[default]
    Points = 0x0000,
    Lines = 0x0001,
    LineLoop = 0x0002,
    LineStrip = 0x0003,
    Triangles = 0x0004,
    TriangleStrip = 0x0005,
    TriangleFan = 0x0006,
}

impl PrimitiveTopology {
    pub fn as_raw(self) -> GLenum {
        self as GLenum
    }
}

/// Programmable pipeline stage of a shader object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn as_raw(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// OpenGL capability set used by [`crate::BufferObject`] and
/// [`crate::ShaderProgram`].
///
/// All calls act on the context current on the calling thread. Object names
/// follow GL conventions: `0` is never a live object.
pub trait GlApi {
    /// Pops the oldest pending error flag (`gl::NO_ERROR` when none).
    fn get_error(&self) -> GLenum;

    // Buffers

    /// Reserves a buffer name. The object is created on first bind.
    fn gen_buffer(&self) -> GLuint;
    fn is_buffer(&self, buffer: GLuint) -> bool;
    fn bind_buffer(&self, target: BufferTarget, buffer: GLuint);
    /// Replaces the whole store of the buffer bound to `target`.
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn delete_buffer(&self, buffer: GLuint);
    fn bound_buffer(&self, target: BufferTarget) -> GLuint;

    // Vertex attribute arrays

    fn enable_vertex_attrib_array(&self, index: GLuint);
    fn disable_vertex_attrib_array(&self, index: GLuint);
    fn is_vertex_attrib_array_enabled(&self, index: GLuint) -> bool;
    /// Sources attribute `index` from the bound array buffer as tightly
    /// packed `f32` tuples of `components` values.
    fn vertex_attrib_pointer_f32(&self, index: GLuint, components: GLint);

    /// Draws `count` `u32` indices from the bound element buffer.
    fn draw_elements_u32(&self, mode: PrimitiveTopology, count: GLsizei);

    // Shaders

    /// Creates a shader object, returning `0` on failure.
    fn create_shader(&self, stage: ShaderStage) -> GLuint;
    fn is_shader(&self, shader: GLuint) -> bool;
    fn shader_source(&self, shader: GLuint, source: &str);
    fn compile_shader(&self, shader: GLuint);
    fn shader_compile_status(&self, shader: GLuint) -> bool;
    fn shader_info_log(&self, shader: GLuint) -> String;
    fn delete_shader(&self, shader: GLuint);

    // Programs

    /// Creates a program object, returning `0` on failure.
    fn create_program(&self) -> GLuint;
    fn is_program(&self, program: GLuint) -> bool;
    fn attached_shaders(&self, program: GLuint) -> Vec<GLuint>;
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    /// `name` must not contain NUL bytes.
    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str);
    fn link_program(&self, program: GLuint);
    fn program_link_status(&self, program: GLuint) -> bool;
    fn program_info_log(&self, program: GLuint) -> String;
    fn delete_program(&self, program: GLuint);
    fn use_program(&self, program: GLuint);
    fn current_program(&self) -> GLuint;
}

/// Shared handle to a GL binding.
///
/// `Rc` keeps every object that holds one on the thread that created it,
/// which is the thread owning the GL context.
pub type SharedGl<G> = Rc<G>;
