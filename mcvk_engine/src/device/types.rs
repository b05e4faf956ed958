/// Plain data exchanged with a [`GraphicsBackend`](super::GraphicsBackend)
///
/// Capability snapshots flow out of the backend, creation descriptors flow in.
/// All fixed-function state is described here as data so the engine decides
/// it and the backend only translates it.

use bitflags::bitflags;
use super::handles::*;

// ===== ACCELERATOR CAPABILITIES =====

/// Physical accelerator class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Discrete,
    Integrated,
    /// Virtual, CPU, or unknown
    Other,
}

impl DeviceClass {
    /// Ranking used when comparing accelerators (higher is better)
    pub fn rating(self) -> u32 {
        match self {
            DeviceClass::Discrete => 2,
            DeviceClass::Integrated => 1,
            DeviceClass::Other => 0,
        }
    }
}

/// One memory heap of an accelerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryHeap {
    pub size: u64,
    pub device_local: bool,
}

/// Static properties and features of a physical accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorProperties {
    pub name: String,
    pub class: DeviceClass,
    pub geometry_shader: bool,
    pub max_image_dimension_2d: u32,
    pub memory_heaps: Vec<MemoryHeap>,
}

/// Capabilities of one queue family against a given surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyProperties {
    pub graphics: bool,
    /// Can present to the surface the query was made against
    pub presentation: bool,
}

// ===== SURFACE / PRESENTATION =====

/// Pixel format of swapchain images and color attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum PixelFormat {
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    /// Any other backend format, by raw value
    Other(i32),
}

/// Color space of presented images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    /// Any other backend color space, by raw value
    Other(i32),
}

/// Format + color space pair supported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: PixelFormat,
    pub color_space: ColorSpace,
}

/// Presentation scheduling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    /// Always supported
    Fifo,
    FifoRelaxed,
}

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Surface limits reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// Width `u32::MAX` means the extent is picked by the application
    pub current_extent: Extent2D,
    pub min_image_extent: Extent2D,
    pub max_image_extent: Extent2D,
}

/// How swapchain images are shared between queue families
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharingMode {
    /// One family owns the images at a time
    Exclusive,
    /// The listed families access the images concurrently
    Concurrent(Vec<u32>),
}

impl SharingMode {
    /// Families listed in the swapchain creation info (empty when exclusive)
    pub fn queue_family_indices(&self) -> &[u32] {
        match self {
            SharingMode::Exclusive => &[],
            SharingMode::Concurrent(families) => families,
        }
    }
}

// ===== CREATION DESCRIPTORS =====

/// One queue family requested at device creation
#[derive(Debug, Clone, PartialEq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub priorities: Vec<f32>,
}

/// Logical device creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDesc {
    pub queues: Vec<QueueRequest>,
    pub geometry_shader: bool,
    /// Enable the swapchain device extension
    pub swapchain: bool,
}

/// Swapchain creation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub surface: SurfaceHandle,
    pub min_image_count: u32,
    pub format: SurfaceFormat,
    pub extent: Extent2D,
    pub present_mode: PresentMode,
    pub sharing_mode: SharingMode,
    /// Images are used as color attachments, alpha is opaque, obscured
    /// pixels are clipped and the current surface transform is kept
    pub clipped: bool,
}

/// Color attachment load operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// Color attachment store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layouts used by the render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Undefined,
    ColorAttachmentOptimal,
    PresentSrc,
}

/// Single color attachment description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAttachmentDesc {
    pub format: PixelFormat,
    pub samples: u32,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Render pass with one color attachment and one graphics subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub color_attachment: ColorAttachmentDesc,
    /// Layout of the attachment while the subpass runs
    pub subpass_layout: ImageLayout,
    /// Add an external -> subpass 0 dependency on color-attachment output
    pub external_dependency: bool,
}

/// Programmable stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// One shader stage of a graphics pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStageDesc {
    pub stage: ShaderStage,
    pub module: ShaderModuleHandle,
    pub entry_point: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    TriangleList,
    TriangleStrip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
    Min,
    Max,
}

bitflags! {
    /// Color channels written by the blend stage
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u8 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
    }
}

/// Blend state of the single color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBlendDesc {
    pub enable: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub alpha_op: BlendOp,
    pub write_mask: ColorWriteMask,
}

/// Rasterizer state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationDesc {
    pub depth_clamp: bool,
    pub rasterizer_discard: bool,
    pub polygon_mode: PolygonMode,
    pub line_width: f32,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias: bool,
}

/// Complete graphics pipeline description
///
/// The pipeline has no vertex input; viewport and scissor are dynamic.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsPipelineDesc {
    pub stages: Vec<ShaderStageDesc>,
    pub topology: PrimitiveTopology,
    pub primitive_restart: bool,
    pub viewport_count: u32,
    pub scissor_count: u32,
    pub rasterization: RasterizationDesc,
    pub samples: u32,
    pub blend: ColorBlendDesc,
    pub layout: PipelineLayoutHandle,
    pub render_pass: RenderPassHandle,
    pub subpass: u32,
}

// ===== COMMAND RECORDING =====

/// Pipeline stage a submission waits at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    TopOfPipe,
    ColorAttachmentOutput,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub extent: Extent2D,
}

/// RGBA clear color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor(pub [f32; 4]);

impl ClearColor {
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
}

/// Render pass begin parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassBegin {
    pub render_pass: RenderPassHandle,
    pub framebuffer: FramebufferHandle,
    pub render_area: Rect2D,
    pub clear_color: ClearColor,
}

/// Queue submission of one command buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitDesc {
    pub wait_semaphores: Vec<(SemaphoreHandle, PipelineStage)>,
    pub command_buffers: Vec<CommandBufferHandle>,
    pub signal_semaphores: Vec<SemaphoreHandle>,
    /// Signaled when the submission completes
    pub fence: FenceHandle,
}

/// Presentation of one swapchain image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentDesc {
    pub wait_semaphores: Vec<SemaphoreHandle>,
    pub swapchain: SwapchainHandle,
    pub image_index: u32,
}

/// Result of a successful image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    pub index: u32,
    /// The swapchain still works but no longer matches the surface exactly
    pub suboptimal: bool,
}
