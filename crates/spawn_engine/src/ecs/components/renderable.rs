//! Renderable component

use std::sync::Arc;

use crate::assets::Model;
use crate::ecs::component::{Component, InitContext, KeyValueFields};
use crate::ecs::network::NetworkHook;
use crate::foundation::math::Vec3;
use crate::key_value_enum;

key_value_enum! {
    /// How the model is blended
    #[derive(Default)]
    pub enum RenderMode {
        /// Opaque
        #[default]
        Normal = 0,
        /// Solid colour, scaled by render amount
        TransColor = 1,
        /// Texture blended by render amount
        TransTexture = 2,
        /// Additive, scaled with distance
        Glow = 3,
        /// Alpha tested
        TransAlpha = 4,
        /// Additive
        TransAdd = 5,
    }
}

key_value_enum! {
    /// Render effect
    #[derive(Default)]
    pub enum RenderFx {
        /// No effect
        #[default]
        None = 0,
        /// Slow pulse
        PulseSlow = 1,
        /// Fast pulse
        PulseFast = 2,
        /// Slow wide pulse
        PulseSlowWide = 3,
        /// Fast wide pulse
        PulseFastWide = 4,
        /// Slow fade away
        FadeSlow = 5,
        /// Fast fade away
        FadeFast = 6,
        /// Slow solid
        SolidSlow = 7,
        /// Fast solid
        SolidFast = 8,
        /// Slow strobe
        StrobeSlow = 9,
        /// Fast strobe
        StrobeFast = 10,
        /// Faster strobe
        StrobeFaster = 11,
        /// Slow flicker
        FlickerSlow = 12,
        /// Fast flicker
        FlickerFast = 13,
        /// No dissipation
        NoDissipation = 14,
        /// Distort
        Distort = 15,
        /// Hologram
        Hologram = 16,
        /// Dead player
        DeadPlayer = 17,
        /// Explode
        Explode = 18,
        /// Glow shell
        GlowShell = 19,
        /// Clamp minimum scale
        ClampMinScale = 20,
    }
}

/// Spawn flag that keeps the entity invisible until something shows it
pub const START_HIDDEN: u32 = 1;

/// A visible model
#[derive(Debug, Clone, Default)]
pub struct Renderable {
    model_name: String,
    model: Option<Arc<Model>>,
    render_mode: RenderMode,
    render_amount: i32,
    render_color: Vec3,
    render_fx: RenderFx,
    start_hidden: bool,
    visible: bool,
    network: NetworkHook,
}

impl Renderable {
    /// Name of the model keyvalue
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resolved model
    pub const fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// Blend mode
    pub const fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Set the blend mode
    pub fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
        self.network.notify("rendermode");
    }

    /// Blend amount, 0-255
    pub const fn render_amount(&self) -> i32 {
        self.render_amount
    }

    /// Set the blend amount
    pub fn set_render_amount(&mut self, render_amount: i32) {
        self.render_amount = render_amount.clamp(0, 255);
        self.network.notify("renderamt");
    }

    /// Render colour, 0-255 per channel
    pub const fn render_color(&self) -> &Vec3 {
        &self.render_color
    }

    /// Set the render colour
    pub fn set_render_color(&mut self, render_color: Vec3) {
        self.render_color = render_color;
        self.network.notify("rendercolor");
    }

    /// Render effect
    pub const fn render_fx(&self) -> RenderFx {
        self.render_fx
    }

    /// Set the render effect
    pub fn set_render_fx(&mut self, render_fx: RenderFx) {
        self.render_fx = render_fx;
        self.network.notify("renderfx");
    }

    /// Whether the model is drawn
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the model
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.network.notify("effects");
    }
}

impl Component for Renderable {
    fn describe(fields: &mut KeyValueFields<Self>) {
        fields
            .required("model", |renderable: &mut Self, value: String| renderable.model_name = value)
            .field("rendermode", |renderable: &mut Self, value: RenderMode| renderable.render_mode = value)
            .field("renderamt", |renderable: &mut Self, value: i32| {
                renderable.render_amount = value.clamp(0, 255);
            })
            .field("rendercolor", |renderable: &mut Self, value: Vec3| renderable.render_color = value)
            .field("renderfx", |renderable: &mut Self, value: RenderFx| renderable.render_fx = value)
            .spawn_flag(START_HIDDEN, |renderable: &mut Self, value| renderable.start_hidden = value);
    }

    fn initialize(&mut self, context: &mut InitContext<'_>) -> bool {
        match context.load_model(&self.model_name) {
            Some(model) => self.model = Some(model),
            None => {
                log::error!("{}: couldn't load model \"{}\"", context.class_name(), self.model_name);
                return false;
            }
        }

        self.visible = !self.start_hidden;
        true
    }

    fn attach_network(&mut self, hook: NetworkHook) {
        self.network = hook;
    }
}
