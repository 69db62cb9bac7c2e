//! Geometry realization for one support.
//!
//! A built geometry is the minimal in-memory block a support contributes
//! to the output: a point buffer, a locally renumbered connectivity, and
//! the counts. When the support covers its whole group the buffers are
//! shared from the snapshot instead of copied.

use std::sync::Arc;

use crate::algs::partition::WorkerLayout;
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::support::catalog::SupportCatalog;
use crate::support::remap;
use crate::support::support::SupportState;
use crate::topology::element::{Domain, ElementKind};
use crate::topology::ids::SupportId;
use crate::topology::mesh::MeshModel;

/// One realized geometry block.
#[derive(Debug, Clone)]
pub struct Geometry {
    kind: ElementKind,
    dim: usize,
    /// Interleaved coordinates of the block's points.
    points: Arc<Vec<f64>>,
    /// Point indices local to this block, `kind.node_count()` per cell.
    connectivity: Arc<Vec<usize>>,
    cell_count: usize,
    point_count: usize,
}

impl Geometry {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn points(&self) -> &Arc<Vec<f64>> {
        &self.points
    }

    pub fn connectivity(&self) -> &Arc<Vec<usize>> {
        &self.connectivity
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// True when the point buffer is shared with the snapshot rather than
    /// gathered.
    pub fn shares_points_with(&self, snapshot_coords: &Arc<Vec<f64>>) -> bool {
        Arc::ptr_eq(&self.points, snapshot_coords)
    }
}

/// Realizes the geometry of one support.
///
/// Cell-domain supports keep the cells of their family (restricted by
/// profile and worker block) and renumber connectivity through the
/// used-point map; node-domain supports emit one vertex cell per kept
/// node. The shallow path (unprofiled sole family using all points)
/// shares the snapshot buffers.
pub fn build_geometry(
    model: &MeshModel,
    source: &dyn SupportSource,
    catalog: &mut SupportCatalog,
    layout: WorkerLayout,
    id: SupportId,
) -> Result<Geometry, MeshSupportError> {
    let support = catalog.get(id)?;
    if support.is_invalid() {
        return Err(MeshSupportError::InvalidSupport(id));
    }
    let key = *support.key();
    let used = catalog.used_points(model, source, layout, id)?;

    let mesh = model.mesh(key.mesh)?;
    let snapshot = mesh.snapshot(key.snapshot)?;
    let group = snapshot.group(key.group)?;
    let coords = snapshot.coordinates(source, mesh.name())?;
    let dim = snapshot.dim();

    let geometry = match group.domain() {
        Domain::Cell => {
            let conn = group.connectivity(source, mesh.name())?;
            let sole = catalog.family_is_sole(model, source, &key)?;
            if key.profile.is_none() && sole && used.use_all() && layout.is_serial() {
                Geometry {
                    kind: group.kind(),
                    dim,
                    points: Arc::clone(coords),
                    connectivity: Arc::clone(conn),
                    cell_count: group.count(),
                    point_count: snapshot.point_count(),
                }
            } else {
                let nodes_per = group.kind().node_count();
                let mut local_conn = Vec::new();
                let mut cell_count = 0usize;
                remap::for_each_kept_cell(model, source, &key, layout, |element| {
                    for &pid in &conn[element * nodes_per..(element + 1) * nodes_per] {
                        let local = used.local_index(pid).ok_or(
                            MeshSupportError::PointOutOfRange {
                                index: pid,
                                count: snapshot.point_count(),
                            },
                        )?;
                        local_conn.push(local);
                    }
                    cell_count += 1;
                    Ok(())
                })?;
                Geometry {
                    kind: group.kind(),
                    dim,
                    points: gather_points(coords, dim, &used),
                    connectivity: Arc::new(local_conn),
                    cell_count,
                    point_count: used.used_count(),
                }
            }
        }
        Domain::Node => {
            let point_count = used.used_count();
            Geometry {
                kind: ElementKind::Node,
                dim,
                points: gather_points(coords, dim, &used),
                connectivity: Arc::new((0..point_count).collect()),
                cell_count: point_count,
                point_count,
            }
        }
    };

    catalog.advance(id, SupportState::Built);
    Ok(geometry)
}

#[cfg(test)]
impl Geometry {
    /// Zero-sized block for cache tests.
    pub(crate) fn empty(kind: ElementKind, dim: usize) -> Self {
        Self {
            kind,
            dim,
            points: Arc::new(Vec::new()),
            connectivity: Arc::new(Vec::new()),
            cell_count: 0,
            point_count: 0,
        }
    }
}

fn gather_points(
    coords: &Arc<Vec<f64>>,
    dim: usize,
    used: &crate::support::remap::UsedPoints,
) -> Arc<Vec<f64>> {
    if used.use_all() {
        return Arc::clone(coords);
    }
    let mut points = Vec::with_capacity(used.used_count() * dim);
    for global in used.globals() {
        points.extend_from_slice(&coords[global * dim..(global + 1) * dim]);
    }
    Arc::new(points)
}
