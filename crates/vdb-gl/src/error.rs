//! Failure reporting for GL resource management.
//!
//! Every fallible operation returns a [`GlError`] describing what went wrong
//! at that call. The owning object also appends the message to its
//! [`ErrorLog`], which keeps the newline separated history of a whole batch
//! until the object is cleared.

use std::fmt;

use gl::types::GLenum;
use num_derive::FromPrimitive;
use thiserror::Error;

use crate::api::GlApi;

/// Broad class of a GL resource failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlErrorKind {
    /// The driver refused to create a buffer, shader or program object.
    ResourceCreation,
    /// Data upload into a buffer object failed.
    Upload,
    /// Shader source could not be handed to the driver.
    ShaderSource,
    /// Shader compilation failed.
    Compile,
    /// A vertex attribute could not be bound to its location.
    AttributeBinding,
    /// A shader could not be attached to the program.
    Attach,
    /// Program linking failed.
    Link,
}

/// One GL resource failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GlError {
    pub kind: GlErrorKind,
    pub message: String,
    /// Raw driver error flag, when the failure was detected through one.
    pub code: Option<GLenum>,
}

impl GlError {
    pub fn new(kind: GlErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    /// Failure detected through a driver error flag. The decoded flag is
    /// appended to the message on its own line.
    pub fn with_code(kind: GlErrorKind, message: impl Into<String>, code: GLenum) -> Self {
        let mut message = message.into();
        message.push('\n');
        message.push_str(describe_error(code));
        Self {
            kind,
            message,
            code: Some(code),
        }
    }

    /// Appends the driver's info log, if any, on its own line.
    pub(crate) fn with_info_log(mut self, log: &str) -> Self {
        let log = log.trim_end_matches(['\0', '\n']);
        if !log.is_empty() {
            self.message.push('\n');
            self.message.push_str(log);
        }
        self
    }
}

/// Driver error flags as returned by `glGetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum GlErrorCode {
    InvalidEnum = 0x0500,
    InvalidValue = 0x0501,
    InvalidOperation = 0x0502,
    StackOverflow = 0x0503,
    StackUnderflow = 0x0504,
    OutOfMemory = 0x0505,
    InvalidFramebufferOperation = 0x0506,
}

impl GlErrorCode {
    pub fn from_raw(code: GLenum) -> Option<Self> {
        num_traits::FromPrimitive::from_u32(code)
    }

    pub fn as_raw(self) -> GLenum {
        self as GLenum
    }

    pub fn description(self) -> &'static str {
        match self {
            GlErrorCode::InvalidEnum => "Invalid Enumerate",
            GlErrorCode::InvalidValue => "Invalid Value",
            GlErrorCode::InvalidOperation => "Invalid Operation",
            GlErrorCode::StackOverflow => "Stack Overflow",
            GlErrorCode::StackUnderflow => "Stack Underflow",
            GlErrorCode::OutOfMemory => "Out of Memory",
            GlErrorCode::InvalidFramebufferOperation => "Invalid Framebuffer Operation",
        }
    }
}

/// Human-readable text for a raw `glGetError` value.
pub fn describe_error(code: GLenum) -> &'static str {
    GlErrorCode::from_raw(code)
        .map(GlErrorCode::description)
        .unwrap_or("Unknown OpenGL Error")
}

/// Discards every pending error flag so the next check only sees errors
/// raised after this point.
pub fn clear_gl_errors(gl: &impl GlApi) {
    // Bounded: a lost context may report errors forever.
    for _ in 0..32 {
        if gl.get_error() == gl::NO_ERROR {
            break;
        }
    }
}

/// Pops one pending error flag, `None` when there is none.
pub fn take_gl_error(gl: &impl GlApi) -> Option<GLenum> {
    match gl.get_error() {
        gl::NO_ERROR => None,
        code => Some(code),
    }
}

/// Newline separated, append-only failure history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog(String);

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: &str) {
        if !self.0.is_empty() {
            self.0.push('\n');
        }
        self.0.push_str(message);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for ErrorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
