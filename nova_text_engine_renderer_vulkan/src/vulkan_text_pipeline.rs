/// TextPipeline - instanced triangle pipeline for glyph rendering
///
/// One graphics pipeline drawing 3 vertices per instance, where each
/// instance is one right triangle of a glyph quad (32 bytes: screen base,
/// screen sides, UV base, UV sides). The vertex shader reconstructs the
/// corners from `gl_VertexIndex`, so no index or per-vertex buffer exists.
///
/// Text color arrives as a vec4 push constant; the atlas is a single
/// combined image sampler. Viewport and scissor are dynamic so the pipeline
/// survives swapchain rebuilds.

use ash::vk;
use std::sync::Arc;

use nova_text_engine::novatext::{Error, Result};
use nova_text_engine::{engine_err, engine_info};

use crate::vulkan_context::GpuContext;
use crate::vulkan_upload::FontAtlasTexture;

/// Reference vertex shader (compile to SPIR-V and pass to `TextPipeline::new`)
pub const TEXT_VERT_GLSL: &str = r#"
#version 450

layout(location = 0) in vec2 inScreenBase;
layout(location = 1) in vec2 inScreenSide;
layout(location = 2) in vec2 inUvBase;
layout(location = 3) in vec2 inUvSide;

layout(location = 0) out vec2 vUV;

vec2 tri_corner(vec2 base, vec2 side, int i) {
    if (i == 0) return base;
    if (i == 1) return base + vec2(side.x, 0.0);
    return base + vec2(0.0, side.y);
}

void main() {
    int corner = gl_VertexIndex % 3;
    gl_Position = vec4(tri_corner(inScreenBase, inScreenSide, corner), 0.0, 1.0);
    vUV = tri_corner(inUvBase, inUvSide, corner);
}
"#;

/// Reference fragment shader (compile to SPIR-V and pass to `TextPipeline::new`)
pub const TEXT_FRAG_GLSL: &str = r#"
#version 450

layout(location = 0) in vec2 vUV;
layout(location = 0) out vec4 outColor;

layout(push_constant) uniform PushConstants {
    vec4 color;
} pc;

layout(set = 0, binding = 0) uniform sampler2D atlas;

void main() {
    float coverage = texture(atlas, vUV).r;
    outColor = vec4(pc.color.rgb, pc.color.a * coverage);
}
"#;

/// Byte stride of one glyph-triangle instance (4 packed vec2s)
pub const INSTANCE_STRIDE: u32 = 32;

pub struct TextPipeline {
    context: Arc<GpuContext>,

    sampler: vk::Sampler,
    descriptor_set_layout: vk::DescriptorSetLayout,
    descriptor_pool: vk::DescriptorPool,
    descriptor_set: vk::DescriptorSet,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

impl TextPipeline {
    /// Build the pipeline against `render_pass` and bind `atlas` into its
    /// descriptor set.
    ///
    /// `vert_spirv`/`frag_spirv` are compiled SPIR-V for the reference
    /// shaders above (or compatible replacements). `filter` selects the
    /// atlas sampling mode, NEAREST for pixel fonts, LINEAR for scaled text.
    pub fn new(
        context: Arc<GpuContext>,
        render_pass: vk::RenderPass,
        atlas: &FontAtlasTexture,
        vert_spirv: &[u8],
        frag_spirv: &[u8],
        filter: vk::Filter,
    ) -> Result<Self> {
        let mut this = Self {
            context,
            sampler: vk::Sampler::null(),
            descriptor_set_layout: vk::DescriptorSetLayout::null(),
            descriptor_pool: vk::DescriptorPool::null(),
            descriptor_set: vk::DescriptorSet::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
        };

        match this.build(render_pass, atlas, vert_spirv, frag_spirv, filter) {
            Ok(()) => Ok(this),
            Err(e) => {
                this.destroy();
                Err(e)
            }
        }
    }

    fn build(
        &mut self,
        render_pass: vk::RenderPass,
        atlas: &FontAtlasTexture,
        vert_spirv: &[u8],
        frag_spirv: &[u8],
        filter: vk::Filter,
    ) -> Result<()> {
        unsafe {
            let device = &self.context.device;

            // --- sampler ---
            let sampler_info = vk::SamplerCreateInfo::default()
                .mag_filter(filter)
                .min_filter(filter)
                .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
                .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
                .anisotropy_enable(false)
                .max_anisotropy(1.0)
                .compare_enable(false)
                .compare_op(vk::CompareOp::ALWAYS)
                .min_lod(0.0)
                .max_lod(0.0)
                .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
                .unnormalized_coordinates(false);

            self.sampler = device
                .create_sampler(&sampler_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create atlas sampler: {:?}", e))?;

            // --- descriptor set: single combined image sampler ---
            let bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)];

            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            self.descriptor_set_layout = device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create descriptor set layout: {:?}", e))?;

            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 1,
            }];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);
            self.descriptor_pool = device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create descriptor pool: {:?}", e))?;

            let set_layouts = [self.descriptor_set_layout];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(self.descriptor_pool)
                .set_layouts(&set_layouts);
            self.descriptor_set = device
                .allocate_descriptor_sets(&allocate_info)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to allocate descriptor set: {:?}", e))?[0];

            let image_info = [vk::DescriptorImageInfo::default()
                .sampler(self.sampler)
                .image_view(atlas.view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)];
            let writes = [vk::WriteDescriptorSet::default()
                .dst_set(self.descriptor_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&image_info)];
            device.update_descriptor_sets(&writes, &[]);

            // --- pipeline layout: vec4 color push constant ---
            let push_constant_ranges = [vk::PushConstantRange {
                stage_flags: vk::ShaderStageFlags::FRAGMENT,
                offset: 0,
                size: std::mem::size_of::<[f32; 4]>() as u32,
            }];
            let layout_create_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&set_layouts)
                .push_constant_ranges(&push_constant_ranges);
            self.pipeline_layout = device
                .create_pipeline_layout(&layout_create_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create pipeline layout: {:?}", e))?;

            // --- shader modules (only needed until pipeline creation) ---
            let vert_module = Self::create_shader_module(device, vert_spirv)?;
            let frag_module = match Self::create_shader_module(device, frag_spirv) {
                Ok(m) => m,
                Err(e) => {
                    device.destroy_shader_module(vert_module, None);
                    return Err(e);
                }
            };

            let result = self.create_pipeline(render_pass, vert_module, frag_module);

            device.destroy_shader_module(vert_module, None);
            device.destroy_shader_module(frag_module, None);
            self.pipeline = result?;
        }

        engine_info!(
            "novatext::vulkan::pipeline",
            "Created text pipeline ({}x{} atlas, filter {:?})",
            atlas.width,
            atlas.height,
            filter
        );
        Ok(())
    }

    fn create_shader_module(device: &ash::Device, code: &[u8]) -> Result<vk::ShaderModule> {
        if code.is_empty() || code.len() % 4 != 0 {
            return Err(Error::InvalidResource(format!(
                "Shader code must be non-empty and 4-byte aligned (size: {} bytes)",
                code.len()
            )));
        }

        unsafe {
            let code_u32 =
                std::slice::from_raw_parts(code.as_ptr() as *const u32, code.len() / 4);
            let create_info = vk::ShaderModuleCreateInfo::default().code(code_u32);
            device
                .create_shader_module(&create_info, None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create shader module: {:?}", e))
        }
    }

    fn create_pipeline(
        &self,
        render_pass: vk::RenderPass,
        vert_module: vk::ShaderModule,
        frag_module: vk::ShaderModule,
    ) -> Result<vk::Pipeline> {
        unsafe {
            let shader_stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::VERTEX)
                    .module(vert_module)
                    .name(c"main"),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(vk::ShaderStageFlags::FRAGMENT)
                    .module(frag_module)
                    .name(c"main"),
            ];

            // One instance-rate binding: 4 packed vec2s per triangle
            let vertex_bindings = [vk::VertexInputBindingDescription {
                binding: 0,
                stride: INSTANCE_STRIDE,
                input_rate: vk::VertexInputRate::INSTANCE,
            }];
            let vertex_attributes = [
                vk::VertexInputAttributeDescription {
                    location: 0,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: 0,
                },
                vk::VertexInputAttributeDescription {
                    location: 1,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: 8,
                },
                vk::VertexInputAttributeDescription {
                    location: 2,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: 16,
                },
                vk::VertexInputAttributeDescription {
                    location: 3,
                    binding: 0,
                    format: vk::Format::R32G32_SFLOAT,
                    offset: 24,
                },
            ];
            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&vertex_attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false);

            // Viewport state (dynamic)
            let viewports = [vk::Viewport::default()];
            let scissors = [vk::Rect2D::default()];
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewports(&viewports)
                .scissors(&scissors);

            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            // Standard alpha blending over the cleared background
            let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .alpha_blend_op(vk::BlendOp::ADD);

            let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state =
                vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(self.pipeline_layout)
                .render_pass(render_pass)
                .subpass(0);

            let pipelines = self
                .context
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
                .map_err(|e| engine_err!("novatext::vulkan::pipeline", "Failed to create graphics pipeline: {:?}", e.1))?;

            Ok(pipelines[0])
        }
    }

    /// Record a text draw into an already-begun render pass.
    ///
    /// Binds the pipeline, atlas set and the instance buffer at `offset`,
    /// sets viewport/scissor to `extent`, pushes `color` and issues one
    /// instanced draw of 3 vertices.
    pub fn record_draw(
        &self,
        cb: vk::CommandBuffer,
        extent: vk::Extent2D,
        buffer: vk::Buffer,
        offset: u64,
        instance_count: u32,
        color: [f32; 4],
    ) {
        if instance_count == 0 {
            return;
        }

        unsafe {
            let device = &self.context.device;

            device.cmd_bind_pipeline(cb, vk::PipelineBindPoint::GRAPHICS, self.pipeline);

            let viewport = vk::Viewport::default()
                .width(extent.width as f32)
                .height(extent.height as f32)
                .min_depth(0.0)
                .max_depth(1.0);
            device.cmd_set_viewport(cb, 0, &[viewport]);
            device.cmd_set_scissor(cb, 0, &[vk::Rect2D::default().extent(extent)]);

            device.cmd_bind_descriptor_sets(
                cb,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                0,
                &[self.descriptor_set],
                &[],
            );
            device.cmd_bind_vertex_buffers(cb, 0, &[buffer], &[offset]);
            device.cmd_push_constants(
                cb,
                self.pipeline_layout,
                vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&color),
            );

            device.cmd_draw(cb, 3, instance_count, 0, 0);
        }
    }

    fn destroy(&mut self) {
        unsafe {
            let device = &self.context.device;
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
                self.pipeline = vk::Pipeline::null();
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout, None);
                self.pipeline_layout = vk::PipelineLayout::null();
            }
            if self.descriptor_pool != vk::DescriptorPool::null() {
                // Frees the set allocated from it
                device.destroy_descriptor_pool(self.descriptor_pool, None);
                self.descriptor_pool = vk::DescriptorPool::null();
                self.descriptor_set = vk::DescriptorSet::null();
            }
            if self.descriptor_set_layout != vk::DescriptorSetLayout::null() {
                device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
                self.descriptor_set_layout = vk::DescriptorSetLayout::null();
            }
            if self.sampler != vk::Sampler::null() {
                device.destroy_sampler(self.sampler, None);
                self.sampler = vk::Sampler::null();
            }
        }
    }
}

impl Drop for TextPipeline {
    fn drop(&mut self) {
        self.destroy();
    }
}
