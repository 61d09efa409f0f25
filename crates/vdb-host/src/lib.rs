//! Host-side plumbing for the volumetric grid preview plugin.
//!
//! - [`grid`] is the read-only view of the grid library: [`Grid`],
//!   [`GridSource`] and the index-to-world [`Transform`].
//! - [`selection`] resolves a node's grid selection string.
//! - [`frame`] substitutes frame numbers into file name templates.
//! - [`info`] formats the grid summary shown on nodes.
//! - [`registry`] registers node types with the host on load.
//! - [`logging`] installs the `tracing` subscriber.

pub mod frame;
pub mod grid;
pub mod info;
pub mod logging;
pub mod registry;
pub mod selection;

pub use frame::{insert_frame_number, FrameTime, NumberingScheme};
pub use grid::{Coord, CoordBBox, Grid, GridCollection, GridSource, NodeBox, TopologyGrid, Transform};
pub use info::{format_bytes, grid_info_report};
pub use registry::{NodeInfo, NodeKind, NodeRegistry, PluginHost, PluginSession};
pub use selection::{contains_grid, get_grids, grid_names, partition_grids, selected_grids};
