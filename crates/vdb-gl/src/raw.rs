//! Raw OpenGL binding over the host-provided GL context.

use std::ffi::CString;
use std::marker::PhantomData;
use std::sync::Once;

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};

use crate::api::{BufferTarget, GlApi, PrimitiveTopology, ShaderStage};

static GL_INIT_ONCE: Once = Once::new();

/// [`GlApi`] implementation calling straight into the driver.
///
/// Not `Send`: the value stays on the thread whose context was current
/// when it was loaded.
#[derive(Debug, Clone, Copy)]
pub struct RawGl {
    _not_send: PhantomData<*const ()>,
}

impl RawGl {
    /// Load GL function pointers (exactly once per process) and return a
    /// binding for the current context.
    ///
    /// # Safety
    ///
    /// The host must have made an OpenGL context current on this thread, and
    /// every later call through the returned value must happen on this thread
    /// while that context is still current.
    pub unsafe fn load() -> Self {
        GL_INIT_ONCE.call_once(|| {
            gl_loader::init_gl();
            gl::load_with(|s| gl_loader::get_proc_address(s).cast());
            tracing::debug!("GL function pointers loaded");
        });

        Self {
            _not_send: PhantomData,
        }
    }
}

fn read_info_log(len: GLint, fetch: impl FnOnce(GLsizei, *mut GLchar)) -> String {
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    fetch(len, buf.as_mut_ptr().cast());
    while buf.last() == Some(&0) {
        buf.pop();
    }
    String::from_utf8_lossy(&buf).into_owned()
}

// SAFETY (all methods below): `RawGl` can only be obtained through
// `RawGl::load`, whose contract guarantees a current context on this thread.
impl GlApi for RawGl {
    fn get_error(&self) -> GLenum {
        unsafe { gl::GetError() }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut buffer = 0;
        unsafe { gl::GenBuffers(1, &mut buffer) };
        buffer
    }

    fn is_buffer(&self, buffer: GLuint) -> bool {
        buffer != 0 && unsafe { gl::IsBuffer(buffer) } == gl::TRUE
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GLuint) {
        unsafe { gl::BindBuffer(target.as_raw(), buffer) };
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe {
            gl::BufferData(
                target.as_raw(),
                data.len() as GLsizeiptr,
                data.as_ptr().cast(),
                gl::STATIC_DRAW,
            );
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) };
    }

    fn bound_buffer(&self, target: BufferTarget) -> GLuint {
        let mut buffer: GLint = 0;
        unsafe { gl::GetIntegerv(target.binding_query(), &mut buffer) };
        buffer as GLuint
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::EnableVertexAttribArray(index) };
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        unsafe { gl::DisableVertexAttribArray(index) };
    }

    fn is_vertex_attrib_array_enabled(&self, index: GLuint) -> bool {
        let mut enabled: GLint = 0;
        unsafe { gl::GetVertexAttribiv(index, gl::VERTEX_ATTRIB_ARRAY_ENABLED, &mut enabled) };
        enabled != 0
    }

    fn vertex_attrib_pointer_f32(&self, index: GLuint, components: GLint) {
        unsafe {
            gl::VertexAttribPointer(index, components, gl::FLOAT, gl::FALSE, 0, std::ptr::null());
        }
    }

    fn draw_elements_u32(&self, mode: PrimitiveTopology, count: GLsizei) {
        unsafe { gl::DrawElements(mode.as_raw(), count, gl::UNSIGNED_INT, std::ptr::null()) };
    }

    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        unsafe { gl::CreateShader(stage.as_raw()) }
    }

    fn is_shader(&self, shader: GLuint) -> bool {
        shader != 0 && unsafe { gl::IsShader(shader) } == gl::TRUE
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let ptr = source.as_ptr().cast::<GLchar>();
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) };
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) };
    }

    fn shader_compile_status(&self, shader: GLuint) -> bool {
        let mut status = gl::FALSE as GLint;
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
        read_info_log(len, |len, buf| unsafe {
            gl::GetShaderInfoLog(shader, len, std::ptr::null_mut(), buf)
        })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) };
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn is_program(&self, program: GLuint) -> bool {
        program != 0 && unsafe { gl::IsProgram(program) } == gl::TRUE
    }

    fn attached_shaders(&self, program: GLuint) -> Vec<GLuint> {
        let mut shaders: [GLuint; 2] = [0; 2];
        let mut count: GLsizei = 0;
        unsafe { gl::GetAttachedShaders(program, 2, &mut count, shaders.as_mut_ptr()) };
        shaders[..count.clamp(0, 2) as usize].to_vec()
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) };
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) };
    }

    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        let Ok(name) = CString::new(name) else {
            tracing::warn!("attribute name contains a NUL byte");
            return;
        };
        unsafe { gl::BindAttribLocation(program, index, name.as_ptr()) };
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) };
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        let mut status = gl::FALSE as GLint;
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status == gl::TRUE as GLint
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len: GLint = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
        read_info_log(len, |len, buf| unsafe {
            gl::GetProgramInfoLog(program, len, std::ptr::null_mut(), buf)
        })
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) };
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) };
    }

    fn current_program(&self) -> GLuint {
        let mut program: GLint = 0;
        unsafe { gl::GetIntegerv(gl::CURRENT_PROGRAM, &mut program) };
        program as GLuint
    }
}
