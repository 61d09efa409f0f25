//! OpenGL resource helpers for previewing volumetric grids.
//!
//! - [`BufferObject`] owns the vertex, normal, color and index buffers of
//!   one renderable batch and draws it with a single indexed call.
//! - [`ShaderProgram`] compiles a vertex/fragment pair and links it.
//! - [`BoxBatch`] and [`WireBoxBuilder`] lay out wireframe boxes for tree
//!   nodes, ready to upload as `LINES`.
//!
//! Everything GL goes through the [`GlApi`] trait. [`RawGl`] calls the
//! driver of the host's current context; [`SoftGl`] is an in-process model
//! used when no context is available.
//!
//! ### Warning
//!
//! GL objects belong to the thread whose context created them. The handle
//! types hold an `Rc` to their binding and so cannot leave that thread.

pub mod api;
pub mod buffer;
pub mod bytes;
pub mod error;
mod raw;
pub mod shader;
pub mod soft;
pub mod validate;
pub mod wirebox;

pub use api::{BufferTarget, GlApi, PrimitiveTopology, ShaderStage, SharedGl};
pub use buffer::BufferObject;
pub use error::{ErrorLog, GlError, GlErrorCode, GlErrorKind};
pub use raw::RawGl;
pub use shader::ShaderProgram;
pub use soft::SoftGl;
pub use validate::{bindings_released, BindingSnapshot};
pub use wirebox::{BatchError, BoxBatch, BoxSlot, WireBoxBuilder};
