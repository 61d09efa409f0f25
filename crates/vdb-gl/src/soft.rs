//! In-process model of the GL objects the renderer touches.
//!
//! [`SoftGl`] keeps buffer stores, shader and program objects, bindings and
//! enabled attribute arrays in memory and records every draw. It lets the
//! buffer and shader managers run without a GPU (tests, batch tools) and
//! exposes the object counts needed to check for leaks. Failures can be
//! injected to exercise the recovery paths.
//!
//! Shader "compilation" only checks that the source declares `void main`
//! and has no `#error` directive.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use gl::types::{GLenum, GLint, GLsizei, GLuint};

use crate::api::{BufferTarget, GlApi, PrimitiveTopology, ShaderStage};
use crate::error::GlErrorCode;

/// Highest attribute location accepted by `bind_attrib_location`.
pub const MAX_VERTEX_ATTRIBS: GLuint = 16;

/// One recorded `draw_elements_u32` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub topology: PrimitiveTopology,
    pub count: GLsizei,
    /// Indices read from the bound element buffer.
    pub indices: Vec<u32>,
    /// `(location, buffer)` for every enabled attribute array.
    pub attributes: Vec<(GLuint, GLuint)>,
    pub program: GLuint,
}

/// Failures to inject into matching calls.
///
/// Each counter fails that many calls. The `skip_*` counters let the given
/// number of matching calls succeed before the failures start.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    pub buffer_alloc: usize,
    pub skip_buffer_alloc: usize,
    pub buffer_upload: usize,
    pub skip_buffer_upload: usize,
    pub shader_create: usize,
    pub program_create: usize,
    pub attach: usize,
    pub link: usize,
}

#[derive(Debug)]
struct SoftShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct SoftProgram {
    attached: Vec<GLuint>,
    linked: bool,
    log: String,
    attrib_bindings: BTreeMap<GLuint, String>,
}

#[derive(Debug, Default)]
struct State {
    next_name: GLuint,
    errors: Vec<GLenum>,
    reserved_buffers: BTreeSet<GLuint>,
    buffers: BTreeMap<GLuint, Vec<u8>>,
    array_binding: GLuint,
    element_binding: GLuint,
    enabled_attribs: BTreeSet<GLuint>,
    attrib_sources: BTreeMap<GLuint, GLuint>,
    shaders: BTreeMap<GLuint, SoftShader>,
    programs: BTreeMap<GLuint, SoftProgram>,
    current_program: GLuint,
    draws: Vec<DrawCall>,
    fail: FailurePlan,
}

impl State {
    fn next_name(&mut self) -> GLuint {
        self.next_name += 1;
        self.next_name
    }

    fn raise(&mut self, code: GlErrorCode) {
        self.errors.push(code.as_raw());
    }

    fn binding_mut(&mut self, target: BufferTarget) -> &mut GLuint {
        match target {
            BufferTarget::Array => &mut self.array_binding,
            BufferTarget::ElementArray => &mut self.element_binding,
        }
    }
}

fn take(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

fn take_after(skip: &mut usize, counter: &mut usize) -> bool {
    if *counter == 0 {
        return false;
    }
    if *skip > 0 {
        *skip -= 1;
        return false;
    }
    take(counter)
}

/// Software stand-in for a GL context.
#[derive(Debug, Default)]
pub struct SoftGl {
    state: RefCell<State>,
}

impl SoftGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending failure plan.
    pub fn inject(&self, plan: FailurePlan) {
        self.state.borrow_mut().fail = plan;
    }

    pub fn fail_next_buffer_alloc(&self) {
        self.state.borrow_mut().fail.buffer_alloc += 1;
    }

    pub fn fail_next_buffer_upload(&self) {
        self.state.borrow_mut().fail.buffer_upload += 1;
    }

    pub fn fail_next_shader_create(&self) {
        self.state.borrow_mut().fail.shader_create += 1;
    }

    pub fn fail_next_program_create(&self) {
        self.state.borrow_mut().fail.program_create += 1;
    }

    pub fn fail_next_attach(&self) {
        self.state.borrow_mut().fail.attach += 1;
    }

    pub fn fail_next_link(&self) {
        self.state.borrow_mut().fail.link += 1;
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn buffer_contents(&self, buffer: GLuint) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn shader_source_of(&self, shader: GLuint) -> Option<String> {
        self.state.borrow().shaders.get(&shader).map(|s| s.source.clone())
    }

    pub fn shader_stage_of(&self, shader: GLuint) -> Option<ShaderStage> {
        self.state.borrow().shaders.get(&shader).map(|s| s.stage)
    }

    /// Attribute name bound to `location` on `program`, if any.
    pub fn attrib_binding(&self, program: GLuint, location: GLuint) -> Option<String> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.attrib_bindings.get(&location).cloned())
    }

    pub fn enabled_attribs(&self) -> Vec<GLuint> {
        self.state.borrow().enabled_attribs.iter().copied().collect()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    pub fn pending_errors(&self) -> usize {
        self.state.borrow().errors.len()
    }
}

impl GlApi for SoftGl {
    fn get_error(&self) -> GLenum {
        let mut state = self.state.borrow_mut();
        if state.errors.is_empty() {
            gl::NO_ERROR
        } else {
            state.errors.remove(0)
        }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        let fail = &mut state.fail;
        if take_after(&mut fail.skip_buffer_alloc, &mut fail.buffer_alloc) {
            return 0;
        }
        let name = state.next_name();
        state.reserved_buffers.insert(name);
        name
    }

    fn is_buffer(&self, buffer: GLuint) -> bool {
        self.state.borrow().buffers.contains_key(&buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GLuint) {
        let mut state = self.state.borrow_mut();
        if buffer != 0 {
            if state.reserved_buffers.remove(&buffer) {
                state.buffers.insert(buffer, Vec::new());
            } else if !state.buffers.contains_key(&buffer) {
                state.raise(GlErrorCode::InvalidOperation);
                return;
            }
        }
        *state.binding_mut(target) = buffer;
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let bound = *state.binding_mut(target);
        if bound == 0 {
            state.raise(GlErrorCode::InvalidOperation);
            return;
        }
        let fail = &mut state.fail;
        if take_after(&mut fail.skip_buffer_upload, &mut fail.buffer_upload) {
            state.raise(GlErrorCode::OutOfMemory);
            return;
        }
        if let Some(store) = state.buffers.get_mut(&bound) {
            *store = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        let mut state = self.state.borrow_mut();
        state.reserved_buffers.remove(&buffer);
        if state.buffers.remove(&buffer).is_none() {
            return;
        }
        if state.array_binding == buffer {
            state.array_binding = 0;
        }
        if state.element_binding == buffer {
            state.element_binding = 0;
        }
        state.attrib_sources.retain(|_, b| *b != buffer);
    }

    fn bound_buffer(&self, target: BufferTarget) -> GLuint {
        *self.state.borrow_mut().binding_mut(target)
    }

    fn enable_vertex_attrib_array(&self, index: GLuint) {
        self.state.borrow_mut().enabled_attribs.insert(index);
    }

    fn disable_vertex_attrib_array(&self, index: GLuint) {
        self.state.borrow_mut().enabled_attribs.remove(&index);
    }

    fn is_vertex_attrib_array_enabled(&self, index: GLuint) -> bool {
        self.state.borrow().enabled_attribs.contains(&index)
    }

    fn vertex_attrib_pointer_f32(&self, index: GLuint, components: GLint) {
        let mut state = self.state.borrow_mut();
        if !(1..=4).contains(&components) || index >= MAX_VERTEX_ATTRIBS {
            state.raise(GlErrorCode::InvalidValue);
            return;
        }
        let source = state.array_binding;
        state.attrib_sources.insert(index, source);
    }

    fn draw_elements_u32(&self, mode: PrimitiveTopology, count: GLsizei) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if count < 0 {
            state.raise(GlErrorCode::InvalidValue);
            return;
        }
        let Some(store) = state.buffers.get(&state.element_binding) else {
            state.raise(GlErrorCode::InvalidOperation);
            return;
        };
        let indices: Vec<u32> = store
            .chunks_exact(4)
            .take(count as usize)
            .map(|chunk| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(chunk);
                u32::from_ne_bytes(raw)
            })
            .collect();
        let attributes = state
            .enabled_attribs
            .iter()
            .map(|&index| (index, state.attrib_sources.get(&index).copied().unwrap_or(0)))
            .collect();
        let program = state.current_program;
        state.draws.push(DrawCall {
            topology: mode,
            count,
            indices,
            attributes,
            program,
        });
    }

    fn create_shader(&self, stage: ShaderStage) -> GLuint {
        let mut state = self.state.borrow_mut();
        if take(&mut state.fail.shader_create) {
            return 0;
        }
        let name = state.next_name();
        state.shaders.insert(
            name,
            SoftShader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        name
    }

    fn is_shader(&self, shader: GLuint) -> bool {
        self.state.borrow().shaders.contains_key(&shader)
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(s) = state.shaders.get_mut(&shader) {
            s.source = source.to_string();
        } else {
            state.raise(GlErrorCode::InvalidValue);
        }
    }

    fn compile_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        let Some(s) = state.shaders.get_mut(&shader) else {
            state.raise(GlErrorCode::InvalidValue);
            return;
        };
        let error = if !s.source.contains("void main") {
            Some("0:1: error: missing entry point 'main'")
        } else if s.source.contains("#error") {
            Some("0:1: error: #error directive")
        } else {
            None
        };
        s.compiled = error.is_none();
        s.log = error.map(str::to_string).unwrap_or_default();
    }

    fn shader_compile_status(&self, shader: GLuint) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_some() {
            for program in state.programs.values_mut() {
                program.attached.retain(|&s| s != shader);
            }
        }
    }

    fn create_program(&self) -> GLuint {
        let mut state = self.state.borrow_mut();
        if take(&mut state.fail.program_create) {
            return 0;
        }
        let name = state.next_name();
        state.programs.insert(name, SoftProgram::default());
        name
    }

    fn is_program(&self, program: GLuint) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    fn attached_shaders(&self, program: GLuint) -> Vec<GLuint> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        if take(&mut state.fail.attach) {
            state.raise(GlErrorCode::OutOfMemory);
            return;
        }
        if !state.shaders.contains_key(&shader) {
            state.raise(GlErrorCode::InvalidValue);
            return;
        }
        let outcome = match state.programs.get_mut(&program) {
            Some(p) if p.attached.contains(&shader) => Some(GlErrorCode::InvalidOperation),
            Some(p) => {
                p.attached.push(shader);
                None
            }
            None => Some(GlErrorCode::InvalidValue),
        };
        if let Some(code) = outcome {
            state.raise(code);
        }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        let mut state = self.state.borrow_mut();
        let detached = match state.programs.get_mut(&program) {
            Some(p) if p.attached.contains(&shader) => {
                p.attached.retain(|&s| s != shader);
                true
            }
            _ => false,
        };
        if !detached {
            state.raise(GlErrorCode::InvalidOperation);
        }
    }

    fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) {
        let mut state = self.state.borrow_mut();
        if index >= MAX_VERTEX_ATTRIBS {
            state.raise(GlErrorCode::InvalidValue);
            return;
        }
        if name.starts_with("gl_") {
            state.raise(GlErrorCode::InvalidOperation);
            return;
        }
        if let Some(p) = state.programs.get_mut(&program) {
            p.attrib_bindings.insert(index, name.to_string());
        } else {
            state.raise(GlErrorCode::InvalidValue);
        }
    }

    fn link_program(&self, program: GLuint) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let injected = take(&mut state.fail.link);
        let Some(p) = state.programs.get_mut(&program) else {
            state.raise(GlErrorCode::InvalidValue);
            return;
        };

        let error = if injected {
            Some("error: out of resources".to_string())
        } else if p.attached.is_empty() {
            Some("error: no shaders attached".to_string())
        } else if let Some(bad) = p
            .attached
            .iter()
            .find(|&&s| !state.shaders.get(&s).is_some_and(|shader| shader.compiled))
        {
            Some(format!("error: shader {bad} is not compiled"))
        } else {
            None
        };

        p.linked = error.is_none();
        p.log = error.unwrap_or_default();
    }

    fn program_link_status(&self, program: GLuint) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn delete_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_some() && state.current_program == program {
            state.current_program = 0;
        }
    }

    fn use_program(&self, program: GLuint) {
        let mut state = self.state.borrow_mut();
        if program != 0 && !state.programs.get(&program).is_some_and(|p| p.linked) {
            state.raise(GlErrorCode::InvalidOperation);
            return;
        }
        state.current_program = program;
    }

    fn current_program(&self) -> GLuint {
        self.state.borrow().current_program
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_object_is_created_on_first_bind() {
        let gl = SoftGl::new();
        let buffer = gl.gen_buffer();
        assert!(!gl.is_buffer(buffer));
        gl.bind_buffer(BufferTarget::Array, buffer);
        assert!(gl.is_buffer(buffer));
        assert_eq!(gl.bound_buffer(BufferTarget::Array), buffer);

        gl.delete_buffer(buffer);
        assert!(!gl.is_buffer(buffer));
        assert_eq!(gl.bound_buffer(BufferTarget::Array), 0);
    }

    #[test]
    fn injected_upload_failure_raises_out_of_memory() {
        let gl = SoftGl::new();
        let buffer = gl.gen_buffer();
        gl.bind_buffer(BufferTarget::Array, buffer);
        gl.fail_next_buffer_upload();
        gl.buffer_data(BufferTarget::Array, &[1, 2, 3]);
        assert_eq!(gl.get_error(), gl::OUT_OF_MEMORY);
        assert_eq!(gl.get_error(), gl::NO_ERROR);
        assert_eq!(gl.buffer_contents(buffer), Some(Vec::new()));
    }

    #[test]
    fn planned_failure_skips_leading_calls() {
        let gl = SoftGl::new();
        gl.inject(FailurePlan {
            buffer_alloc: 1,
            skip_buffer_alloc: 2,
            ..Default::default()
        });
        assert_ne!(gl.gen_buffer(), 0);
        assert_ne!(gl.gen_buffer(), 0);
        assert_eq!(gl.gen_buffer(), 0);
        assert_ne!(gl.gen_buffer(), 0);
    }

    #[test]
    fn compile_requires_entry_point() {
        let gl = SoftGl::new();
        let shader = gl.create_shader(ShaderStage::Fragment);
        gl.shader_source(shader, "uniform float x;");
        gl.compile_shader(shader);
        assert!(!gl.shader_compile_status(shader));
        assert!(gl.shader_info_log(shader).contains("main"));
    }

    #[test]
    fn link_fails_without_shaders() {
        let gl = SoftGl::new();
        let program = gl.create_program();
        gl.link_program(program);
        assert!(!gl.program_link_status(program));
        assert_eq!(gl.program_info_log(program), "error: no shaders attached");
    }

    #[test]
    fn reserved_attribute_prefix_is_rejected() {
        let gl = SoftGl::new();
        let program = gl.create_program();
        gl.bind_attrib_location(program, 0, "gl_Vertex");
        assert_eq!(gl.get_error(), gl::INVALID_OPERATION);
        gl.bind_attrib_location(program, 1, "I_Color");
        assert_eq!(gl.attrib_binding(program, 1).as_deref(), Some("I_Color"));
    }
}
