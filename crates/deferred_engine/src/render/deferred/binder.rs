//! Shader constant setup for the deferred passes
//!
//! Every pass has a named-uniform variant and a constant-buffer variant.
//! The constant-buffer variants return the struct they uploaded.

use crate::foundation::math::{mat4_to_array, Mat4, Mat4Ext, Vec3};
use crate::render::backend::RenderCoordinator;
use crate::render::constant_buffers::{DeferredMainCB, GBufferMainCB, GBufferReliefCB, ShadowMainCB};
use crate::render::flags::RendererFlags;
use crate::render::shader::{ShaderClass, ShaderConstant};
use crate::render::texture_layer::{ReliefLayer, TextureLayer};
use crate::scene::CameraState;

/// Per-draw inputs shared by all passes
#[derive(Clone, Copy)]
pub struct PassContext<'a> {
    /// Renderer matrix state
    pub renderer: &'a dyn RenderCoordinator,
    /// Active camera
    pub camera: &'a CameraState,
    /// Screen size in pixels
    pub screen: (u32, u32),
}

/// Fills shader constants for the G-buffer, deferred, shadow and forward passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredShaderBinder {
    flags: RendererFlags,
    light_grid_row_size: u32,
}

impl DeferredShaderBinder {
    /// Binder for a renderer compiled with `flags`
    pub fn new(flags: RendererFlags) -> Self {
        Self {
            flags,
            light_grid_row_size: 0,
        }
    }

    /// Renderer flags
    pub fn flags(&self) -> RendererFlags {
        self.flags
    }

    /// Replace the renderer flags
    pub fn set_flags(&mut self, flags: RendererFlags) {
        self.flags = flags;
    }

    /// Tiles per light grid row
    pub fn light_grid_row_size(&self) -> u32 {
        self.light_grid_row_size
    }

    /// Set the tiles per light grid row
    pub fn set_light_grid_row_size(&mut self, row_size: u32) {
        self.light_grid_row_size = row_size;
    }

    /// Relief layer to ray-march, if the flags and layers enable one
    fn active_relief(&self, layers: &[Option<TextureLayer>]) -> Option<ReliefLayer> {
        if !self.flags.contains(RendererFlags::PARALLAX_MAPPING) {
            return None;
        }
        match layers.get(self.flags.height_map_layer()).copied().flatten() {
            Some(TextureLayer::Relief(relief)) if relief.enabled => Some(relief),
            _ => None,
        }
    }

    fn has_light_map(&self, layers: &[Option<TextureLayer>]) -> bool {
        let height_map = self.flags.height_map_layer();
        let required = if self.flags.contains(RendererFlags::PARALLAX_MAPPING) {
            height_map + 2
        } else {
            height_map + 1
        };
        layers.len() >= required
    }

    // === G-buffer pass ===

    /// Object constants of the G-buffer pass
    pub fn gbuffer_object(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
        set_object_constants(context, shaders);
    }

    /// Object constant buffer of the G-buffer pass (slot 0)
    pub fn gbuffer_object_cb(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) -> GBufferMainCB {
        let buffer = GBufferMainCB {
            wvp_matrix: mat4_to_array(&context.renderer.setup_wvp_matrix()),
            world_matrix: mat4_to_array(&context.renderer.world_matrix()),
            view_position: context.camera.position.push(1.0).into(),
        };
        let bytes = bytemuck::bytes_of(&buffer);
        shaders.vertex.set_constant_buffer(0, bytes);
        shaders.pixel.set_constant_buffer(0, bytes);
        buffer
    }

    /// Surface constants of the G-buffer pass
    pub fn gbuffer_surface(&self, layers: &[Option<TextureLayer>], shaders: &mut ShaderClass<'_>) {
        if self.flags.contains(RendererFlags::USE_TEXTURE_MATRIX) {
            shaders
                .vertex
                .set_constant("TextureMatrix", ShaderConstant::Mat4(Mat4::identity()));
        }

        if self.flags.contains(RendererFlags::HAS_LIGHT_MAP) {
            shaders
                .pixel
                .set_constant("EnableLightMap", ShaderConstant::Bool(self.has_light_map(layers)));
        }

        match self.active_relief(layers) {
            Some(relief) => {
                shaders.pixel.set_constant("EnablePOM", ShaderConstant::Bool(true));
                shaders.pixel.set_constant("MinSamplesPOM", ShaderConstant::Int(relief.min_samples));
                shaders.pixel.set_constant("MaxSamplesPOM", ShaderConstant::Int(relief.max_samples));
                shaders
                    .pixel
                    .set_constant("HeightMapScale", ShaderConstant::Float(relief.height_map_scale));
                shaders
                    .pixel
                    .set_constant("ParallaxViewRange", ShaderConstant::Float(relief.view_range));
            }
            // Always written so a previous draw's setting cannot leak
            None => shaders.pixel.set_constant("EnablePOM", ShaderConstant::Bool(false)),
        }

        shaders.pixel.set_constant("SpecularFactor", ShaderConstant::Float(1.0));
    }

    /// Relief constant buffer of the G-buffer pass (slot 1)
    pub fn gbuffer_surface_cb(&self, layers: &[Option<TextureLayer>], shaders: &mut ShaderClass<'_>) -> GBufferReliefCB {
        let mut buffer = GBufferReliefCB {
            specular_factor: 1.0,
            height_map_scale: 0.0,
            parallax_view_range: 0.0,
            pad0: 0.0,
            enable_pom: 0,
            min_samples_pom: 0,
            max_samples_pom: 0,
            pad1: 0,
        };

        if let Some(relief) = self.active_relief(layers) {
            buffer.height_map_scale = relief.height_map_scale;
            buffer.parallax_view_range = relief.view_range;
            buffer.enable_pom = 1;
            buffer.min_samples_pom = relief.min_samples;
            buffer.max_samples_pom = relief.max_samples;
        }

        shaders.pixel.set_constant_buffer(1, bytemuck::bytes_of(&buffer));
        buffer
    }

    // === Deferred lighting pass ===

    /// Constants of the deferred lighting pass
    pub fn deferred(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
        shaders.vertex.set_constant(
            "ProjectionMatrix",
            ShaderConstant::Mat4(context.renderer.projection_matrix()),
        );
        shaders.vertex.set_constant(
            "InvViewProjection",
            ShaderConstant::Mat4(inverse_view_projection(context.camera)),
        );
        shaders
            .pixel
            .set_constant("ViewPosition", ShaderConstant::Vec3(context.camera.global_matrix.translation_part()));

        if self.flags.contains(RendererFlags::TILED_SHADING) {
            shaders
                .pixel
                .set_constant("LightGridRowSize", ShaderConstant::Int(self.light_grid_row_size as i32));
        }
    }

    /// Constant buffer of the deferred lighting pass (slot 0)
    pub fn deferred_cb(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) -> DeferredMainCB {
        let screen = Vec3::new(context.screen.0 as f32, context.screen.1 as f32, 1.0);
        let buffer = DeferredMainCB {
            projection_matrix: mat4_to_array(&context.renderer.projection_matrix()),
            inv_view_projection: mat4_to_array(&inverse_view_projection(context.camera)),
            world_matrix: mat4_to_array(&Mat4::new_nonuniform_scaling(&screen)),
            view_position: context.camera.global_matrix.translation_part().into(),
            light_grid_row_size: self.light_grid_row_size,
        };
        let bytes = bytemuck::bytes_of(&buffer);
        shaders.vertex.set_constant_buffer(0, bytes);
        shaders.pixel.set_constant_buffer(0, bytes);
        buffer
    }

    // === Shadow pass ===

    /// Constants of the shadow map pass
    pub fn shadow(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
        shaders.vertex.set_constant(
            "WorldViewProjectionMatrix",
            ShaderConstant::Mat4(context.renderer.setup_wvp_matrix()),
        );
        shaders
            .vertex
            .set_constant("WorldMatrix", ShaderConstant::Mat4(context.renderer.world_matrix()));
        shaders
            .pixel
            .set_constant("ViewPosition", ShaderConstant::Vec3(context.camera.position));
    }

    /// Constant buffer of the shadow map pass (slot 0)
    pub fn shadow_cb(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) -> ShadowMainCB {
        let buffer = ShadowMainCB {
            world_view_projection_matrix: mat4_to_array(&context.renderer.setup_wvp_matrix()),
            world_matrix: mat4_to_array(&context.renderer.world_matrix()),
            texture_matrix: mat4_to_array(&context.renderer.texture_matrix()),
            view_position: context.camera.position.push(1.0).into(),
        };
        let bytes = bytemuck::bytes_of(&buffer);
        shaders.vertex.set_constant_buffer(0, bytes);
        shaders.pixel.set_constant_buffer(0, bytes);
        buffer
    }

    // === Debug and forward passes ===

    /// Constants of the virtual point light debug overlay
    pub fn debug_vpl(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
        shaders.vertex.set_constant(
            "WorldViewProjectionMatrix",
            ShaderConstant::Mat4(context.renderer.setup_wvp_matrix()),
        );
    }

    /// Object constants of the forward pass
    pub fn forward_object(&self, context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
        set_object_constants(context, shaders);
    }
}

fn set_object_constants(context: &PassContext<'_>, shaders: &mut ShaderClass<'_>) {
    let view_position = ShaderConstant::Vec3(context.camera.position);
    shaders.vertex.set_constant(
        "WorldViewProjectionMatrix",
        ShaderConstant::Mat4(context.renderer.setup_wvp_matrix()),
    );
    shaders
        .vertex
        .set_constant("WorldMatrix", ShaderConstant::Mat4(context.renderer.world_matrix()));
    shaders.vertex.set_constant("ViewPosition", view_position);
    shaders.pixel.set_constant("ViewPosition", view_position);
}

/// Inverse of projection times the rotation-only view matrix
///
/// The camera translation is removed before inverting so the result maps
/// NDC to a view direction relative to the camera.
pub fn inverse_view_projection(camera: &CameraState) -> Mat4 {
    let rotation_only = camera.global_matrix.with_translation(&Vec3::zeros());
    let view = rotation_only.try_inverse().unwrap_or_else(|| {
        log::warn!("Camera {:?} rotation is singular, using identity view", camera.node);
        Mat4::identity()
    });

    (camera.projection_lh() * view).try_inverse().unwrap_or_else(|| {
        log::warn!("View-projection of camera {:?} is singular, using identity", camera.node);
        Mat4::identity()
    })
}
