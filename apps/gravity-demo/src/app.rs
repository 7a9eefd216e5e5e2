//! Demo application: per-image uniforms and pre-recorded render commands.

use anyhow::Context as _;
use ash::vk;
use gpu_allocator::MemoryLocation;
use gravity_app::{AppContext, Event, FrameContext, GravityApp, KeyName};
use gravity_gpu::command::{begin_command_buffer, end_command_buffer};
use gravity_gpu::{DepthBuffer, GpuBuffer};
use tracing::{debug, info, warn};

use crate::cube::{CubeUniforms, Spin, SPIN_STEP};

const CLEAR_COLOR: [f32; 4] = [0.2, 0.2, 0.2, 1.0];

pub struct DemoApp {
    spin: Spin,
    render_pass: vk::RenderPass,
    /// One uniform block per swapchain image, indexed by image index.
    uniforms: Vec<GpuBuffer>,
}

impl DemoApp {
    fn create_render_pass(
        device: &ash::Device,
        color_format: vk::Format,
    ) -> anyhow::Result<vk::RenderPass> {
        let attachments = [
            vk::AttachmentDescription::default()
                .format(color_format)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::STORE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            vk::AttachmentDescription::default()
                .format(DepthBuffer::FORMAT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(vk::AttachmentLoadOp::CLEAR)
                .store_op(vk::AttachmentStoreOp::DONT_CARE)
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];
        let color_refs = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
        let depth_ref = vk::AttachmentReference::default()
            .attachment(1)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref)];
        // The image may still be read by the presentation engine when the
        // acquire semaphore signals.
        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);
        let render_pass = unsafe { device.create_render_pass(&info, None) }
            .context("failed to create render pass")?;
        Ok(render_pass)
    }

    /// Record the commands for image `index` once; they are resubmitted
    /// every time the image is acquired.
    fn record(&self, ctx: &AppContext, index: u32) -> anyhow::Result<()> {
        let device = ctx.device();
        let cmd = ctx.swapchain.render_command_buffer(index)?;
        let framebuffer = ctx.swapchain.framebuffer(index)?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];
        let begin = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent: ctx.extent(),
            })
            .clear_values(&clear_values);

        unsafe {
            begin_command_buffer(device, cmd, vk::CommandBufferUsageFlags::SIMULTANEOUS_USE)?;
            device.cmd_begin_render_pass(cmd, &begin, vk::SubpassContents::INLINE);
            device.cmd_end_render_pass(cmd);
        }
        ctx.swapchain.insert_present_commands(cmd, index)?;
        unsafe { end_command_buffer(device, cmd)? };
        Ok(())
    }

    fn write_uniforms(&self, ctx: &AppContext, index: u32) -> anyhow::Result<()> {
        let buffer = self
            .uniforms
            .get(index as usize)
            .with_context(|| format!("no uniform buffer for image {index}"))?;
        let uniforms = CubeUniforms::new(self.spin.mvp(ctx.aspect_ratio()));
        buffer.write(std::slice::from_ref(&uniforms))?;
        Ok(())
    }
}

impl GravityApp for DemoApp {
    fn init(ctx: &mut AppContext) -> anyhow::Result<Self> {
        info!(
            "Cube demo on {} ({} swapchain images requested)",
            ctx.gpu.capabilities().device_name,
            ctx.config.swapchain.image_count
        );
        Ok(Self {
            spin: Spin::default(),
            render_pass: vk::RenderPass::null(),
            uniforms: Vec::new(),
        })
    }

    fn setup(&mut self, ctx: &mut AppContext, _setup_cmd: vk::CommandBuffer) -> anyhow::Result<()> {
        let depth_view = ctx
            .depth()
            .map(|depth| depth.view)
            .context("setup called without a depth buffer")?;

        self.render_pass =
            Self::create_render_pass(ctx.device(), ctx.swapchain.swapchain_format())?;
        ctx.swapchain
            .attach_render_pass_and_depth_buffer(self.render_pass, depth_view)?;

        let image_count = ctx.swapchain.image_count();
        {
            let mut allocator = ctx.gpu.allocator().lock();
            for index in 0..image_count {
                let buffer = allocator.create_buffer(
                    CubeUniforms::SIZE,
                    vk::BufferUsageFlags::UNIFORM_BUFFER,
                    MemoryLocation::CpuToGpu,
                    &format!("cube_uniforms_{index}"),
                )?;
                self.uniforms.push(buffer);
            }
        }

        for index in 0..image_count {
            self.write_uniforms(ctx, index)?;
            self.record(ctx, index)?;
        }
        debug!("Recorded {image_count} render command buffers");
        Ok(())
    }

    fn draw(&mut self, ctx: &AppContext, frame: &FrameContext) -> anyhow::Result<()> {
        self.spin.advance(frame.dt);
        self.write_uniforms(ctx, frame.image_index)
    }

    fn release_size_dependent(&mut self, ctx: &mut AppContext) {
        if !self.uniforms.is_empty() {
            let mut allocator = ctx.gpu.allocator().lock();
            for mut buffer in self.uniforms.drain(..) {
                if let Err(e) = allocator.free_buffer(&mut buffer) {
                    warn!("Failed to free uniform buffer: {e}");
                }
            }
        }
        if self.render_pass != vk::RenderPass::null() {
            unsafe { ctx.device().destroy_render_pass(self.render_pass, None) };
            self.render_pass = vk::RenderPass::null();
        }
    }

    fn handle_event(&mut self, _ctx: &mut AppContext, event: &Event) -> bool {
        let delta = match event {
            Event::KeyPress(KeyName::ArrowLeft) => -SPIN_STEP,
            Event::KeyPress(KeyName::ArrowRight) => SPIN_STEP,
            _ => return false,
        };
        self.spin.adjust(delta);
        info!("Spin speed {:.0} deg/s", self.spin.speed);
        true
    }
}
