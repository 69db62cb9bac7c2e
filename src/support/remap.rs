//! Used-point computation and the compacted local numbering.
//!
//! For a support that keeps only part of its element group, the points its
//! kept elements touch must be renumbered densely for the output block.
//! The renumbering is a strictly increasing bijection from the kept global
//! point indices onto `[0, used_count)`.

use hashbrown::HashMap;

use crate::algs::partition::WorkerLayout;
use crate::io::SupportSource;
use crate::mesh_error::MeshSupportError;
use crate::support::support::SupportKey;
use crate::topology::element::Domain;
use crate::topology::mesh::MeshModel;

/// Kept-point set of one support.
#[derive(Debug, Clone)]
pub struct UsedPoints {
    use_all: bool,
    used_count: usize,
    /// Kept global point indices, ascending. Empty when `use_all`.
    globals: Vec<usize>,
    /// Dense global→local renumbering. Empty when `use_all`.
    local_of_global: HashMap<usize, usize>,
}

impl UsedPoints {
    /// Every point of the snapshot is used; no map is materialized.
    pub fn all(point_count: usize) -> Self {
        Self {
            use_all: true,
            used_count: point_count,
            globals: Vec::new(),
            local_of_global: HashMap::new(),
        }
    }

    fn from_flags(flags: &[bool]) -> Self {
        if flags.iter().all(|&f| f) {
            return Self::all(flags.len());
        }
        let globals: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter_map(|(g, &f)| f.then_some(g))
            .collect();
        let local_of_global = globals
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();
        Self {
            use_all: false,
            used_count: globals.len(),
            globals,
            local_of_global,
        }
    }

    pub fn use_all(&self) -> bool {
        self.use_all
    }

    pub fn used_count(&self) -> usize {
        self.used_count
    }

    /// True when `global` is touched by a kept element.
    pub fn keep_point(&self, global: usize) -> bool {
        if self.use_all {
            global < self.used_count
        } else {
            self.local_of_global.contains_key(&global)
        }
    }

    /// Local (output) index of a kept global point.
    pub fn local_index(&self, global: usize) -> Option<usize> {
        if self.use_all {
            (global < self.used_count).then_some(global)
        } else {
            self.local_of_global.get(&global).copied()
        }
    }

    /// Kept global indices in ascending order.
    pub fn globals(&self) -> UsedGlobals<'_> {
        if self.use_all {
            UsedGlobals::All(0..self.used_count)
        } else {
            UsedGlobals::Sparse(self.globals.iter())
        }
    }
}

/// Iterator over kept global point indices, ascending.
pub enum UsedGlobals<'a> {
    All(std::ops::Range<usize>),
    Sparse(std::slice::Iter<'a, usize>),
}

impl Iterator for UsedGlobals<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            UsedGlobals::All(r) => r.next(),
            UsedGlobals::Sparse(it) => it.next().copied(),
        }
    }
}

/// Whether element `e` of the support's group is kept.
///
/// Profile membership is *not* checked here: callers iterate the profile
/// itself, which already restricts the walk to members.
pub fn keep_cell(
    model: &MeshModel,
    source: &dyn SupportSource,
    key: &SupportKey,
    element: usize,
) -> Result<bool, MeshSupportError> {
    let mesh = model.mesh(key.mesh)?;
    let group = mesh.snapshot(key.snapshot)?.group(key.group)?;
    Ok(group.family_id(source, mesh.name(), element)? == key.family)
}

/// Visits the support's kept elements (family ∩ profile ∩ worker block)
/// in ascending global order.
///
/// Geometry building and field gathers share this walk so their output
/// ordering always agrees.
pub(crate) fn for_each_kept_cell(
    model: &MeshModel,
    source: &dyn SupportSource,
    key: &SupportKey,
    layout: WorkerLayout,
    mut visit: impl FnMut(usize) -> Result<(), MeshSupportError>,
) -> Result<(), MeshSupportError> {
    let mesh = model.mesh(key.mesh)?;
    let group = mesh.snapshot(key.snapshot)?.group(key.group)?;
    let block = layout.block(group.count());
    match key.profile {
        Some(profile_id) => {
            let profile = model.profiles().get(profile_id)?;
            for &value in profile.indices(source)? {
                let element = value - 1;
                if element >= group.count() {
                    return Err(MeshSupportError::ProfileOutOfRange {
                        name: profile.name().to_string(),
                        value,
                        count: group.count(),
                    });
                }
                if !block.contains(&element) {
                    continue;
                }
                if group.family_id(source, mesh.name(), element)? == key.family {
                    visit(element)?;
                }
            }
        }
        None => {
            for element in block {
                if group.family_id(source, mesh.name(), element)? == key.family {
                    visit(element)?;
                }
            }
        }
    }
    Ok(())
}

/// Computes the kept-point set of one support.
///
/// Fast path: an unprofiled support whose family is alone on its group
/// uses every point without a sweep. The general path flag-marks the
/// points incident to kept elements, then either proves all points marked
/// or builds the dense renumbering in increasing global order.
///
/// In a multi-worker layout the sweep is restricted to this worker's
/// contiguous element block.
///
/// # Errors
/// `PointOutOfRange` when a kept element references a point outside the
/// snapshot's point range; the caller marks the support invalid.
pub fn compute_used_points(
    model: &MeshModel,
    source: &dyn SupportSource,
    key: &SupportKey,
    layout: WorkerLayout,
    sole_family: bool,
) -> Result<UsedPoints, MeshSupportError> {
    let mesh = model.mesh(key.mesh)?;
    let snapshot = mesh.snapshot(key.snapshot)?;
    let group = snapshot.group(key.group)?;
    let point_count = snapshot.point_count();

    if key.profile.is_none() && sole_family && layout.is_serial() {
        return Ok(UsedPoints::all(point_count));
    }

    let mut flags = vec![false; point_count];
    let block = layout.block(group.count());

    let profile = match key.profile {
        Some(id) => Some(model.profiles().get(id)?),
        None => None,
    };
    let profile_indices = match profile {
        Some(p) => Some(p.indices(source)?),
        None => None,
    };

    let connectivity = match group.domain() {
        Domain::Cell => Some(group.connectivity(source, mesh.name())?),
        Domain::Node => None,
    };
    let nodes_per = group.kind().node_count();

    let mut mark = |element: usize| -> Result<(), MeshSupportError> {
        match &connectivity {
            Some(conn) => {
                for &pid in &conn[element * nodes_per..(element + 1) * nodes_per] {
                    if pid >= point_count {
                        return Err(MeshSupportError::PointOutOfRange {
                            index: pid,
                            count: point_count,
                        });
                    }
                    flags[pid] = true;
                }
            }
            None => {
                if element >= point_count {
                    return Err(MeshSupportError::PointOutOfRange {
                        index: element,
                        count: point_count,
                    });
                }
                flags[element] = true;
            }
        }
        Ok(())
    };

    match profile_indices {
        Some(indices) => {
            for &value in indices {
                let element = value - 1;
                if element >= group.count() {
                    return Err(MeshSupportError::ProfileOutOfRange {
                        name: profile.map(|p| p.name().to_string()).unwrap_or_default(),
                        value,
                        count: group.count(),
                    });
                }
                if !block.contains(&element) {
                    continue;
                }
                if group.family_id(source, mesh.name(), element)? == key.family {
                    mark(element)?;
                }
            }
        }
        None => {
            for element in block {
                if group.family_id(source, mesh.name(), element)? == key.family {
                    mark(element)?;
                }
            }
        }
    }

    Ok(UsedPoints::from_flags(&flags))
}
