use bevy::prelude::*;
use marching_metaballs::{
    MetaballsPlugin,
    plugin::{MetaballSurface, MetaballsSet},
    prelude::{MetaballEngine, MetaballHandle, Point, Shape, Vector},
};

/// A sheet with a blob pushing through it from one side and a negative blob
/// pulling at it from the other.
#[derive(Component)]
struct Oscillating {
    pushed: MetaballHandle,
    pulled: MetaballHandle,
}

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, MetaballsPlugin::default()))
        .add_systems(Startup, setup)
        .add_systems(Update, oscillate.before(MetaballsSet::Refresh))
        .run();
}

fn setup(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(6.0, 4.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight::default(),
        Transform::from_xyz(3.0, 8.0, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let mut engine = MetaballEngine::new(Point::origin(), 6.0, 48, 1.0)?;
    engine.add_metaball(Point::origin(), Shape::plane(Vector::y(), 0.0));
    let blob = Shape::blob(1.0, Vector::new(0.6, 0.6, 3.0));
    let pushed = engine.add_metaball(Point::new(1.0, 1.0, 1.0), blob.clone());
    let pulled = engine.subtract_metaball(Point::new(1.0, 1.0, 1.0), blob);

    commands.spawn((
        MetaballSurface(engine),
        Oscillating { pushed, pulled },
        MeshMaterial3d(materials.add(Color::srgb(0.9, 0.4, 0.2))),
    ));
    Ok(())
}

fn oscillate(time: Res<Time>, mut query: Query<(&mut MetaballSurface, &Oscillating)>) -> Result {
    let s = time.elapsed_secs().sin();
    for (mut surface, handles) in query.iter_mut() {
        let engine = &mut surface.0;
        engine.get_metaball_mut(handles.pushed)?.center = Point::new(0.0, 0.0, 2.5 * s);
        engine.get_metaball_mut(handles.pulled)?.center = Point::new(0.0, 0.0, -2.5 * s);
        engine.make_dirty();
    }
    Ok(())
}
