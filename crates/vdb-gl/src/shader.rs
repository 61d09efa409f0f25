//! Shader program built from a vertex and a fragment shader.
//!
//! Shaders are compiled as soon as their source is set. [`ShaderProgram::build`]
//! then attaches whichever stages compiled and links them. A failed step
//! never leaves a half built program behind: the program handle is deleted
//! and the failure is returned and appended to the [`ErrorLog`].

use std::fmt;
use std::rc::Rc;

use gl::types::GLuint;
use tracing::{debug, trace, warn};

use crate::api::{GlApi, ShaderStage, NO_OBJECT};
use crate::error::{clear_gl_errors, take_gl_error, ErrorLog, GlError, GlErrorKind};

/// A GLSL program built from one vertex and one fragment shader.
pub struct ShaderProgram<G: GlApi> {
    gl: Rc<G>,
    program: GLuint,
    vert_shader: GLuint,
    frag_shader: GLuint,
    error_log: ErrorLog,
}

impl<G: GlApi> fmt::Debug for ShaderProgram<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderProgram")
            .field("program", &self.program)
            .field("vert_shader", &self.vert_shader)
            .field("frag_shader", &self.frag_shader)
            .finish()
    }
}

impl<G: GlApi> ShaderProgram<G> {
    pub fn new(gl: Rc<G>) -> Self {
        Self {
            gl,
            program: NO_OBJECT,
            vert_shader: NO_OBJECT,
            frag_shader: NO_OBJECT,
            error_log: ErrorLog::new(),
        }
    }

    /// True when a linked program is live.
    pub fn is_valid(&self) -> bool {
        self.program != NO_OBJECT
            && self.gl.is_program(self.program)
            && self.gl.program_link_status(self.program)
    }

    pub fn program(&self) -> GLuint {
        self.program
    }

    pub fn vert_shader(&self) -> GLuint {
        self.vert_shader
    }

    pub fn frag_shader(&self) -> GLuint {
        self.frag_shader
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    /// Compile `source` as the vertex stage, reusing the live shader object.
    pub fn set_vert_shader(&mut self, source: &str) -> Result<(), GlError> {
        self.set_shader(ShaderStage::Vertex, source)
    }

    /// Compile `source` as the fragment stage, reusing the live shader object.
    pub fn set_frag_shader(&mut self, source: &str) -> Result<(), GlError> {
        self.set_shader(ShaderStage::Fragment, source)
    }

    /// Link the compiled stages without explicit attribute locations.
    pub fn build(&mut self) -> Result<(), GlError> {
        self.build_with_attributes::<&str>(&[])
    }

    /// Link the compiled stages, binding `attributes[n]` to location `n`.
    ///
    /// An existing program object is reused after detaching its shaders.
    /// Shader objects are never deleted here.
    pub fn build_with_attributes<S: AsRef<str>>(
        &mut self,
        attributes: &[S],
    ) -> Result<(), GlError> {
        let gl = Rc::clone(&self.gl);

        if self.program != NO_OBJECT && gl.is_program(self.program) {
            self.detach_all();
        } else {
            self.program = gl.create_program();
            if self.program == NO_OBJECT || !gl.is_program(self.program) {
                self.program = NO_OBJECT;
                return Err(self.fail(GlError::new(
                    GlErrorKind::ResourceCreation,
                    "Unable to create shader program.",
                )));
            }
        }

        for (location, name) in attributes.iter().enumerate() {
            let name = name.as_ref();
            let message = format!("Unable to bind shader program attribute '{name}'.");
            let Ok(location) = GLuint::try_from(location) else {
                self.discard_program();
                return Err(self.fail(GlError::new(GlErrorKind::AttributeBinding, message)));
            };
            if name.contains('\0') {
                self.discard_program();
                return Err(self.fail(GlError::new(GlErrorKind::AttributeBinding, message)));
            }

            clear_gl_errors(&*gl);
            gl.bind_attrib_location(self.program, location, name);
            if let Some(code) = take_gl_error(&*gl) {
                self.discard_program();
                return Err(self.fail(GlError::with_code(
                    GlErrorKind::AttributeBinding,
                    message,
                    code,
                )));
            }
        }

        for (stage, shader) in [
            (ShaderStage::Vertex, self.vert_shader),
            (ShaderStage::Fragment, self.frag_shader),
        ] {
            if shader == NO_OBJECT || !gl.is_shader(shader) {
                continue;
            }
            clear_gl_errors(&*gl);
            gl.attach_shader(self.program, shader);
            if let Some(code) = take_gl_error(&*gl) {
                self.detach_all();
                self.discard_program();
                return Err(self.fail(GlError::with_code(
                    GlErrorKind::Attach,
                    format!("Unable to attach {stage} shader."),
                    code,
                )));
            }
        }

        gl.link_program(self.program);
        if !gl.program_link_status(self.program) {
            let log = gl.program_info_log(self.program);
            self.detach_all();
            self.discard_program();
            return Err(self.fail(
                GlError::new(GlErrorKind::Link, "Unable to link shader program.")
                    .with_info_log(&log),
            ));
        }

        debug!(program = self.program, "linked shader program");
        Ok(())
    }

    /// Make the program current. No-op when it is not valid.
    pub fn start_shading(&self) {
        if self.is_valid() {
            self.gl.use_program(self.program);
        }
    }

    /// Reset the current program. No-op when it is not valid.
    pub fn stop_shading(&self) {
        if self.is_valid() {
            self.gl.use_program(NO_OBJECT);
        }
    }

    /// Delete the program and both shaders and reset the error log.
    pub fn clear(&mut self) {
        if self.program != NO_OBJECT && self.gl.is_program(self.program) {
            self.detach_all();
        }
        self.discard_program();

        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            self.discard_shader(stage);
        }
        self.error_log.clear();
    }

    fn shader_mut(&mut self, stage: ShaderStage) -> &mut GLuint {
        match stage {
            ShaderStage::Vertex => &mut self.vert_shader,
            ShaderStage::Fragment => &mut self.frag_shader,
        }
    }

    fn set_shader(&mut self, stage: ShaderStage, source: &str) -> Result<(), GlError> {
        let gl = Rc::clone(&self.gl);

        let mut shader = *self.shader_mut(stage);
        if shader == NO_OBJECT || !gl.is_shader(shader) {
            shader = gl.create_shader(stage);
            if shader == NO_OBJECT || !gl.is_shader(shader) {
                *self.shader_mut(stage) = NO_OBJECT;
                return Err(self.fail(GlError::new(
                    GlErrorKind::ResourceCreation,
                    format!("Unable to create {stage} shader."),
                )));
            }
        }
        *self.shader_mut(stage) = shader;

        clear_gl_errors(&*gl);
        gl.shader_source(shader, source);
        if let Some(code) = take_gl_error(&*gl) {
            self.discard_shader(stage);
            return Err(self.fail(GlError::with_code(
                GlErrorKind::ShaderSource,
                format!("Unable to set {stage} shader sources."),
                code,
            )));
        }

        gl.compile_shader(shader);
        if !gl.shader_compile_status(shader) {
            let log = gl.shader_info_log(shader);
            self.discard_shader(stage);
            return Err(self.fail(
                GlError::new(GlErrorKind::Compile, format!("Unable to compile {stage} shader."))
                    .with_info_log(&log),
            ));
        }

        trace!(%stage, shader, "compiled shader");
        Ok(())
    }

    fn detach_all(&self) {
        for shader in self.gl.attached_shaders(self.program) {
            self.gl.detach_shader(self.program, shader);
        }
    }

    fn discard_program(&mut self) {
        if self.program != NO_OBJECT && self.gl.is_program(self.program) {
            self.gl.delete_program(self.program);
        }
        self.program = NO_OBJECT;
    }

    fn discard_shader(&mut self, stage: ShaderStage) {
        let gl = Rc::clone(&self.gl);
        let shader = self.shader_mut(stage);
        if *shader != NO_OBJECT && gl.is_shader(*shader) {
            gl.delete_shader(*shader);
        }
        *shader = NO_OBJECT;
    }

    fn fail(&mut self, err: GlError) -> GlError {
        warn!(kind = ?err.kind, "{}", err.message);
        self.error_log.append(&err.message);
        err
    }
}

impl<G: GlApi> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        self.clear();
    }
}
