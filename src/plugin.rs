use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};

use crate::{engine::MetaballEngine, mesh::MeshData};

/// System sets for the metaball pipeline.
///
/// ```text
/// MetaballsSet::Advance  →  [your animation systems]  →  MetaballsSet::Refresh
/// ```
///
/// Systems that move balls by hand should run `.before(MetaballsSet::Refresh)` and call
/// [`MetaballEngine::make_dirty`].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetaballsSet {
    /// Integrates kinetic balls by the frame delta (when enabled).
    Advance,
    /// Rebuilds dirty engines and swaps in the new [`Mesh3d`].
    Refresh,
}

/// A metaball engine attached to an entity. Its mesh is kept in sync by [`MetaballsPlugin`].
#[derive(Component)]
#[require(Transform)]
pub struct MetaballSurface(pub MetaballEngine);

/// Runtime configuration for the metaball pipeline.
///
/// Inserted as a resource by [`MetaballsPlugin`]:
///
/// ```rust,ignore
/// fn pause(mut config: ResMut<MetaballsConfig>) {
///     config.auto_advance = false;
/// }
/// ```
#[derive(Resource)]
pub struct MetaballsConfig {
    /// Advance kinetic balls by `Time::delta_secs` every frame. Default: `true`.
    pub auto_advance: bool,
}

impl Default for MetaballsConfig {
    fn default() -> Self {
        Self { auto_advance: true }
    }
}

/// Bevy plugin that keeps every [`MetaballSurface`] rendered.
///
/// Rebuilds only happen for dirty engines, on the main thread. The engine itself spreads the
/// work over Rayon.
#[derive(Default)]
pub struct MetaballsPlugin {
    /// Initial value for [`MetaballsConfig::auto_advance`].
    pub auto_advance: Option<bool>,
}

impl Plugin for MetaballsPlugin {
    fn build(&self, app: &mut App) {
        let auto_advance = self
            .auto_advance
            .unwrap_or(MetaballsConfig::default().auto_advance);
        log::debug!("installing metaballs plugin (auto_advance: {auto_advance})");
        app.insert_resource(MetaballsConfig { auto_advance })
            .configure_sets(Update, (MetaballsSet::Advance, MetaballsSet::Refresh).chain())
            .add_systems(
                Update,
                (
                    advance_surfaces.in_set(MetaballsSet::Advance),
                    refresh_surfaces.in_set(MetaballsSet::Refresh),
                ),
            );
    }
}

/// Moves kinetic balls forward by the frame delta.
fn advance_surfaces(
    config: Res<MetaballsConfig>,
    time: Res<Time>,
    mut query: Query<&mut MetaballSurface>,
) {
    if !config.auto_advance {
        return;
    }
    let dt = time.delta_secs();
    for mut surface in query.iter_mut() {
        surface.0.advance(dt);
    }
}

/// Rebuilds dirty engines and replaces the entity's [`Mesh3d`], dropping the old asset.
fn refresh_surfaces(
    mut commands: Commands,
    mut query: Query<(Entity, &mut MetaballSurface, Option<&Mesh3d>)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, mut surface, previous) in query.iter_mut() {
        if !surface.0.is_dirty() {
            continue;
        }

        let bevy_mesh = to_bevy_mesh(surface.0.refresh());
        if let Some(previous) = previous {
            meshes.remove(&previous.0);
        }
        commands.entity(entity).insert(Mesh3d(meshes.add(bevy_mesh)));
    }
}

/// Copies a [`MeshData`] into a Bevy triangle-list [`Mesh`].
pub fn to_bevy_mesh(data: &MeshData) -> Mesh {
    let positions: Vec<[f32; 3]> = data.vertices.iter().map(|v| v.position).collect();
    let normals: Vec<[f32; 3]> = data.vertices.iter().map(|v| v.normal).collect();

    let mut bevy_mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    bevy_mesh.insert_indices(Indices::U32(data.indices.clone()));
    bevy_mesh
}
