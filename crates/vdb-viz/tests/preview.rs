use std::rc::Rc;
use std::sync::Arc;

use glam::IVec3;
use vdb_gl::api::{ATTRIB_COLOR, ATTRIB_POSITION};
use vdb_gl::{bindings_released, SoftGl};
use vdb_host::{grid_info_report, CoordBBox, Grid, GridCollection, TopologyGrid};
use vdb_viz::{build_previews, VisualizeSettings};

fn scene() -> GridCollection {
    let density = TopologyGrid::new("density", "float")
        .with_voxel_size(0.5)
        .with_mem_usage(2048)
        .with_node(1, CoordBBox::from_origin_dim(IVec3::ZERO, 4096))
        .with_node(2, CoordBBox::from_origin_dim(IVec3::ZERO, 128))
        .with_node(3, CoordBBox::from_origin_dim(IVec3::ZERO, 8));
    let velocity = TopologyGrid::new("velocity", "vec3s")
        .with_mem_usage(1024)
        .with_node(3, CoordBBox::from_origin_dim(IVec3::splat(-8), 8));

    [
        Arc::new(density) as Arc<dyn Grid>,
        Arc::new(velocity) as Arc<dyn Grid>,
    ]
    .into_iter()
    .collect()
}

#[test]
fn previews_selected_grids_headless() {
    let gl = Rc::new(SoftGl::new());
    let grids = scene();

    let previews = build_previews(&gl, &grids, "den*", &VisualizeSettings::default()).unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].box_count(), 4);

    for preview in &previews {
        preview.render();
    }

    let draws = gl.draw_calls();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].count, 4 * 24);
    let locations: Vec<_> = draws[0].attributes.iter().map(|&(loc, _)| loc).collect();
    assert_eq!(locations, [ATTRIB_POSITION, ATTRIB_COLOR]);
    assert!(bindings_released(&*gl));
}

#[test]
fn every_grid_gets_a_preview_and_releases_on_drop() {
    let gl = Rc::new(SoftGl::new());
    let grids = scene();

    let previews = build_previews(&gl, &grids, "*", &VisualizeSettings::default()).unwrap();
    assert_eq!(previews.len(), 2);
    assert!(previews.iter().all(|p| p.is_valid()));
    assert_eq!(gl.live_program_count(), 2);

    drop(previews);
    assert_eq!(gl.live_buffer_count(), 0);
    assert_eq!(gl.live_program_count(), 0);
    assert_eq!(gl.live_shader_count(), 0);
}

#[test]
fn selection_by_index_and_report() {
    let gl = Rc::new(SoftGl::new());
    let grids = scene();

    let previews = build_previews(&gl, &grids, "1", &VisualizeSettings::default()).unwrap();
    assert_eq!(previews.len(), 1);
    // One leaf plus the active bounding box.
    assert_eq!(previews[0].box_count(), 2);

    let report = grid_info_report(&grids);
    assert!(report.starts_with("\nOutput 2 VDB(s)\n"));
    assert!(report.contains("[1] 'velocity'"));
    assert!(report.ends_with("Approximate Memory Usage:   3.000 KB\n"));
}
