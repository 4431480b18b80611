//! Loading whole entity lumps into a scene

use crate::assets::ModelCatalog;
use crate::config::SceneConfig;
use crate::ecs::components::{Renderable, Transform};
use crate::ecs::{EntitySystemMetaDataBuilder, LoadReport, Scene};
use crate::foundation::math::Vec3;
use std::sync::Arc;

const MAP: &str = r#"
{
"classname" "worldspawn"
"wad" "halflife.wad"
}
{
"classname" "info_target"
"targetname" "camera_spot"
"origin" "128 -64 32"
"angles" "0 90 0"
}
// sprite with a model nobody shipped
{
"classname" "env_sprite"
"model" "sprites/missing.spr"
}
{
"classname" "env_sprite"
"model" "sprites/glow01.spr"
"scale" "0.5"
}
{
"origin" "0 0 0"
}
{
"classname" "monster_alien_grunt"
}
{
"classname" "func_wall"
"model" "*3"
}
"#;

fn scene(config: SceneConfig) -> Scene {
    let metadata = EntitySystemMetaDataBuilder::new().with_builtins().unwrap().build().unwrap();
    let models: ModelCatalog = ["sprites/glow01.spr", "*3"].into_iter().collect();
    Scene::new(Arc::new(metadata), Box::new(models), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_continues_past_failures() {
        let mut scene = scene(SceneConfig::default());

        let report = scene.load_entities(MAP).unwrap();

        assert_eq!(report, LoadReport { spawned: 4, failed: 3 });
        assert_eq!(scene.len(), 4);

        let camera = scene.find_by_target_name("camera_spot").unwrap();
        let transform = scene.entity(camera).unwrap().get::<Transform>().unwrap();
        assert_eq!(*transform.origin(), Vec3::new(128.0, -64.0, 32.0));
        assert_eq!(*transform.angles(), Vec3::new(0.0, 90.0, 0.0));

        let sprites: Vec<_> = scene
            .iter()
            .filter_map(|(_, entity)| entity.get::<Renderable>())
            .collect();
        assert_eq!(sprites.len(), 2);
    }

    #[test]
    fn test_load_with_fallback_model() {
        let mut scene = scene(SceneConfig::default().with_fallback_model("sprites/glow01.spr"));

        let report = scene.load_entities(MAP).unwrap();
        assert_eq!(report, LoadReport { spawned: 5, failed: 2 });
    }

    #[test]
    fn test_load_respects_entity_limit() {
        let mut scene = scene(SceneConfig::default().with_max_entities(2));

        let report = scene.load_entities(MAP).unwrap();
        assert_eq!(report.spawned, 2);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_syntax_error_aborts_load() {
        let mut scene = scene(SceneConfig::default());

        assert!(scene.load_entities("{ \"classname\" ").is_err());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_loaded_entities_activate_on_start() {
        let mut scene = scene(SceneConfig::default());
        scene.load_entities(MAP).unwrap();

        scene.start();
        assert!(scene.iter().all(|(_, entity)| entity.is_activated()));
    }
}
