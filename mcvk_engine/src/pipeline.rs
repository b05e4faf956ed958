/// Render pipeline - render pass, pipeline layout and graphics pipeline
///
/// One color attachment, one graphics subpass, no vertex input, dynamic
/// viewport and scissor, alpha blending. The attachment format must be the
/// swapchain image format.

use crate::context::LogicalContext;
use crate::device::{
    BlendFactor, BlendOp, ColorAttachmentDesc, ColorBlendDesc, ColorWriteMask, CullMode,
    FrontFace, GraphicsPipelineDesc, ImageLayout, LoadOp, PipelineHandle, PipelineLayoutHandle,
    PixelFormat, PolygonMode, PrimitiveTopology, RasterizationDesc, RenderPassDesc,
    RenderPassHandle, ShaderModuleHandle, ShaderStage, ShaderStageDesc, StoreOp, UniqueHandle,
};
use crate::error::Result;
use crate::shader::{ShaderBytecode, SHADER_ENTRY_POINT};
use crate::{engine_diagnostic, engine_init_err, lifecycle_assert};

const SOURCE: &str = "mcvk::pipeline";

/// Render pass for a single color attachment of `format`
///
/// Cleared on load, stored for presentation, transitioned from undefined
/// to present-source.
pub fn render_pass_desc(format: PixelFormat) -> RenderPassDesc {
    RenderPassDesc {
        color_attachment: ColorAttachmentDesc {
            format,
            samples: 1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::PresentSrc,
        },
        subpass_layout: ImageLayout::ColorAttachmentOptimal,
        external_dependency: true,
    }
}

/// Fixed graphics pipeline state around the given shader modules
pub fn graphics_pipeline_desc(
    vertex: ShaderModuleHandle,
    fragment: ShaderModuleHandle,
    layout: PipelineLayoutHandle,
    render_pass: RenderPassHandle,
) -> GraphicsPipelineDesc {
    GraphicsPipelineDesc {
        stages: vec![
            ShaderStageDesc {
                stage: ShaderStage::Vertex,
                module: vertex,
                entry_point: SHADER_ENTRY_POINT.to_string(),
            },
            ShaderStageDesc {
                stage: ShaderStage::Fragment,
                module: fragment,
                entry_point: SHADER_ENTRY_POINT.to_string(),
            },
        ],
        topology: PrimitiveTopology::TriangleList,
        primitive_restart: false,
        viewport_count: 1,
        scissor_count: 1,
        rasterization: RasterizationDesc {
            depth_clamp: false,
            rasterizer_discard: false,
            polygon_mode: PolygonMode::Fill,
            line_width: 1.0,
            cull_mode: CullMode::Back,
            front_face: FrontFace::Clockwise,
            depth_bias: false,
        },
        samples: 1,
        blend: ColorBlendDesc {
            enable: true,
            src_color: BlendFactor::SrcAlpha,
            dst_color: BlendFactor::OneMinusSrcAlpha,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            write_mask: ColorWriteMask::all(),
        },
        layout,
        render_pass,
        subpass: 0,
    }
}

pub struct RenderPipeline {
    // Destruction order: pipeline, layout, render pass
    pipeline: UniqueHandle<PipelineHandle>,
    layout: UniqueHandle<PipelineLayoutHandle>,
    render_pass: UniqueHandle<RenderPassHandle>,
    format: PixelFormat,
}

impl RenderPipeline {
    /// Build the render pass and graphics pipeline for images of `format`
    ///
    /// Shader modules only live for the duration of this call. Any
    /// failure is unrecoverable.
    pub fn create(context: &LogicalContext, format: PixelFormat, shaders: &ShaderBytecode) -> Result<Self> {
        let token = context
            .token()
            .ok_or_else(|| engine_init_err!(SOURCE, "Cannot build a pipeline on a destroyed context"))?;
        let backend = token.backend();
        let device = token.device();

        let render_pass = backend
            .create_render_pass(device, &render_pass_desc(format))
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create render pass: {}", e))?;
        let render_pass = UniqueHandle::new(token.clone(), render_pass);

        let vertex = backend
            .create_shader_module(device, &shaders.vertex)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create vertex shader module: {}", e))?;
        let vertex = UniqueHandle::new(token.clone(), vertex);

        let fragment = backend
            .create_shader_module(device, &shaders.fragment)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create fragment shader module: {}", e))?;
        let fragment = UniqueHandle::new(token.clone(), fragment);

        let layout = backend
            .create_pipeline_layout(device)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create pipeline layout: {}", e))?;
        let layout = UniqueHandle::new(token.clone(), layout);

        let desc = graphics_pipeline_desc(vertex.get(), fragment.get(), layout.get(), render_pass.get());
        let pipeline = backend
            .create_graphics_pipeline(device, &desc)
            .map_err(|e| engine_init_err!(SOURCE, "Failed to create graphics pipeline: {}", e))?;
        let pipeline = UniqueHandle::new(token, pipeline);

        // Modules are baked into the pipeline
        drop(fragment);
        drop(vertex);

        engine_diagnostic!(SOURCE, "Graphics pipeline created for {:?}", format);

        Ok(Self { pipeline, layout, render_pass, format })
    }

    pub fn pipeline(&self) -> PipelineHandle {
        self.pipeline.get()
    }

    pub fn layout(&self) -> PipelineLayoutHandle {
        self.layout.get()
    }

    pub fn render_pass(&self) -> RenderPassHandle {
        self.render_pass.get()
    }

    /// Color attachment format
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_live(&self) -> bool {
        self.pipeline.is_live()
    }

    /// Destroy pipeline, layout and render pass
    ///
    /// Each handle must still be live: destroying twice is a lifecycle violation.
    pub fn destroy(&mut self) {
        lifecycle_assert!(self.pipeline.is_live(), SOURCE, "destroying a null pipeline");
        self.pipeline.release();
        lifecycle_assert!(self.layout.is_live(), SOURCE, "destroying a null pipeline layout");
        self.layout.release();
        lifecycle_assert!(self.render_pass.is_live(), SOURCE, "destroying a null render pass");
        self.render_pass.release();
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.pipeline.release();
        self.layout.release();
        self.render_pass.release();
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
