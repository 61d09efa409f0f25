//! Human-readable grid summary shown in a node's info attribute.

use std::fmt::Write as _;

use crate::grid::GridSource;

/// Formats a byte count with a binary unit suffix.
///
/// Values below 1 KB are written as a plain integer, larger values with
/// three decimals. Both are right aligned to eight columns.
pub fn format_bytes(bytes: u64) -> String {
    let width = 8;
    let precision = 3;
    const UNITS: [(u32, &str); 4] = [(40, "TB"), (30, "GB"), (20, "MB"), (10, "KB")];

    for (shift, unit) in UNITS {
        if bytes >> shift != 0 {
            let value = bytes as f64 / (1u64 << shift) as f64;
            return format!("{value:>width$.precision$} {unit}");
        }
    }
    format!("{bytes:>width$} Bytes")
}

/// Multi-line report listing every grid with voxel size, value type and
/// active voxel dimensions, followed by the total memory usage.
pub fn grid_info_report(source: &dyn GridSource) -> String {
    let mut out = String::new();
    let count = source.number_of_grids();
    let _ = writeln!(out, "\nOutput {count} VDB(s)");

    let mut mem_usage = 0u64;
    for n in 0..count {
        let grid = source.grid(n);
        mem_usage += grid.mem_usage();
        let dim = grid.active_voxel_dim();

        let _ = write!(out, "[{n}]");
        if !grid.name().is_empty() {
            let _ = write!(out, " '{}'", grid.name());
        }
        let _ = writeln!(
            out,
            " voxel size: {}, type: {}, dim: {}x{}x{}",
            grid.voxel_size().x,
            grid.value_type(),
            dim.x,
            dim.y,
            dim.z
        );
    }

    let _ = writeln!(out, "\nApproximate Memory Usage:{}", format_bytes(mem_usage));
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::IVec3;

    use super::*;
    use crate::grid::{CoordBBox, Grid, GridCollection, TopologyGrid};

    #[test]
    fn bytes_below_one_kilobyte() {
        assert_eq!(format_bytes(512), "     512 Bytes");
    }

    #[test]
    fn bytes_use_binary_units() {
        assert_eq!(format_bytes(1536), "   1.500 KB");
        assert_eq!(format_bytes(3 << 20), "   3.000 MB");
        assert_eq!(format_bytes(5 << 30), "   5.000 GB");
    }

    #[test]
    fn report_lists_each_grid() {
        let density = TopologyGrid::new("density", "float")
            .with_voxel_size(0.5)
            .with_mem_usage(2048)
            .with_node(3, CoordBBox::from_origin_dim(IVec3::ZERO, 8));
        let unnamed = TopologyGrid::new("", "vec3s").with_mem_usage(1024);
        let source: GridCollection = [
            Arc::new(density) as Arc<dyn Grid>,
            Arc::new(unnamed),
        ]
        .into_iter()
        .collect();

        let report = grid_info_report(&source);
        let expected = "\nOutput 2 VDB(s)\n\
            [0] 'density' voxel size: 0.5, type: float, dim: 8x8x8\n\
            [1] voxel size: 1, type: vec3s, dim: 0x0x0\n\
            \nApproximate Memory Usage:   3.000 KB\n";
        assert_eq!(report, expected);
    }
}
