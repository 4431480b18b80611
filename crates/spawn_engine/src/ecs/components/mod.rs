//! Built-in components and entity classes

pub mod collider;
pub mod renderable;
pub mod transform;

pub use collider::{Collider, Solid};
pub use renderable::{RenderFx, RenderMode, Renderable, START_HIDDEN};
pub use transform::Transform;

use super::factory::ComponentListFactory;
use super::metadata::EntitySystemMetaDataBuilder;
use super::MetaDataError;

/// Register the built-in enums, components and entity classes
///
/// | Class         | Components                        |
/// |---------------|-----------------------------------|
/// | `worldspawn`  | [`Transform`]                     |
/// | `info_target` | [`Transform`]                     |
/// | `env_sprite`  | [`Transform`], [`Renderable`]     |
/// | `func_wall`   | [`Transform`], [`Renderable`]     |
pub fn register_builtins(builder: EntitySystemMetaDataBuilder) -> Result<EntitySystemMetaDataBuilder, MetaDataError> {
    let builder = builder
        .with_enum::<RenderMode>()?
        .with_enum::<RenderFx>()?
        .with_enum::<Solid>()?
        .with_component::<Transform>()
        .with_component::<Renderable>()
        .with_component::<Collider>();

    Ok(builder
        .with_factory("worldspawn", ComponentListFactory::new().with::<Transform>())
        .with_factory("info_target", ComponentListFactory::new().with::<Transform>())
        .with_factory(
            "env_sprite",
            ComponentListFactory::new().with::<Transform>().with::<Renderable>(),
        )
        .with_factory(
            "func_wall",
            ComponentListFactory::new().with::<Transform>().with::<Renderable>(),
        ))
}
