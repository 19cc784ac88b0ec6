use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    config::EngineConfig,
    cursor::{CellRange, CellView},
    field::ScalarField,
    grid::SampleGrid,
    interp::edge_crossing,
    mesh::MeshData,
    tables::{CORNER_POINT_INDICES, EDGE_TABLE, TRI_TABLE},
    types::{Point, Value, Vertex},
};

/// Upper bound of vertices a single cell can emit (5 triangles).
pub const MAX_CELL_VERTICES: usize = 15;

/// Computes the marching cubes state bitmask for a cell.
///
/// Each of the 8 corners maps to one bit. A bit is set when the corner's value
/// is **at or above** the isovalue (i.e. "inside" the metaball surface):
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// state bits:   [_][_][_][_][_][_][_][_]
///                                      ^-- corner 0 inside?
/// ```
///
/// NaN densities compare false and count as outside.
#[inline]
pub fn get_state(densities: &[Value; 8], isovalue: Value) -> u8 {
    densities
        .iter()
        .enumerate()
        .fold(0u8, |state, (i, &d)| state | (((d >= isovalue) as u8) << i))
}

/// Interpolates the crossing point along each edge of the cell that the surface passes through.
///
/// `edges_mask` is a 12-bit field from `EDGE_TABLE`; a set bit means that edge is active.
#[inline]
pub fn get_edge_points(
    edges_mask: u16,
    cell: &CellView<'_>,
    isovalue: Value,
    config: &EngineConfig,
) -> [Option<Point>; 12] {
    let mut edge_points: [Option<Point>; 12] = [None; 12];

    for (i, [a, b]) in CORNER_POINT_INDICES.iter().enumerate() {
        if (edges_mask & (1 << i)) == 0 {
            continue;
        }

        let sa = cell.at(*a);
        let sb = cell.at(*b);
        edge_points[i] = Some(edge_crossing(
            (&sa.position, sa.density),
            (&sb.position, sb.density),
            isovalue,
            config.denominator_floor,
            config.edge_policy,
        ));
    }

    edge_points
}

/// Pushes one vertex per `TRI_TABLE[state]` entry, each with a gradient normal.
///
/// `TRI_TABLE[state]` contains edge indices in groups of three, terminated by `-1`:
/// ```text
/// TRI_TABLE[state] = [e0, e1, e2,  e3, e4, e5,  -1, ...]
///                     \___tri0__/   \___tri1__/
/// ```
/// Returns the number of vertices pushed.
#[inline]
pub fn triangle_verts_from_state(
    edge_points: &[Option<Point>; 12],
    state: u8,
    field: &ScalarField,
    normal_epsilon: Value,
    out: &mut Vec<Vertex>,
) -> usize {
    let before = out.len();
    out.extend(
        TRI_TABLE[state as usize]
            .iter()
            .take_while(|&&e| e != -1)
            // EDGE_TABLE and TRI_TABLE agree, so every referenced edge was interpolated.
            .filter_map(|&e| edge_points[e as usize])
            .map(|p| Vertex::new(p, field.normal(&p, normal_epsilon))),
    );
    out.len() - before
}

/// Runs one marching cubes step. Returns the number of vertices emitted.
///
/// ```text
/// 1. cell.densities()            →  8 scalar values
/// 2. get_state                   →  256-entry lookup key (0x00 / 0xFF: done)
/// 3. EDGE_TABLE[state]           →  bitmask of intersected edges
/// 4. get_edge_points             →  up to 12 interpolated points
/// 5. triangle_verts_from_state   →  triangle vertices from TRI_TABLE
/// ```
#[inline]
pub fn march_cell(
    cell: &CellView<'_>,
    field: &ScalarField,
    isovalue: Value,
    config: &EngineConfig,
    out: &mut Vec<Vertex>,
) -> usize {
    let state = get_state(&cell.densities(), isovalue);
    if state == 0x00 || state == 0xFF {
        return 0;
    }

    let edges_mask = EDGE_TABLE[state as usize];
    let edge_points = get_edge_points(edges_mask, cell, isovalue, config);
    triangle_verts_from_state(&edge_points, state, field, config.normal_epsilon, out)
}

/// Marches every cell in `cells`, appending to `out` in traversal order.
pub fn march_cells<'a>(
    cells: impl IntoIterator<Item = CellView<'a>>,
    field: &ScalarField,
    isovalue: Value,
    config: &EngineConfig,
    out: &mut Vec<Vertex>,
) {
    for cell in cells {
        march_cell(&cell, field, isovalue, config, out);
    }
}

/// Runs the marching cubes algorithm over an already sampled grid and refills `mesh`.
///
/// With `config.parallel`, work is split over z layers using Rayon. Each layer fills its own
/// bucket and the buckets are merged in z order, so the output matches the sequential walk
/// exactly.
///
/// `size_hint` is used to pre-size the vertex buffer.
pub fn run_marching_cubes(
    grid: &SampleGrid,
    field: &ScalarField,
    isovalue: Value,
    config: &EngineConfig,
    size_hint: usize,
    mesh: &mut MeshData,
) {
    mesh.clear();

    if !config.parallel {
        let mut vertices = Vec::with_capacity(size_hint);
        march_cells(grid.cells(), field, isovalue, config, &mut vertices);
        mesh.extend_triangles(vertices);
        return;
    }

    let res = grid.resolution();
    let per_z: Vec<Vec<Vertex>> = (0..res)
        .into_par_iter()
        .map(|z| {
            let mut local: Vec<Vertex> = Vec::with_capacity(res * res * MAX_CELL_VERTICES);
            march_cells(CellRange::slab(grid, z..z + 1), field, isovalue, config, &mut local);
            local
        })
        .collect();

    // Merge per-Z slices into a single vertex buffer
    let total: usize = per_z.iter().map(|v| v.len()).sum();
    let mut vertices: Vec<Vertex> = Vec::with_capacity(total.max(size_hint));
    for mut v in per_z {
        vertices.append(&mut v);
    }

    mesh.extend_triangles(vertices);
}
