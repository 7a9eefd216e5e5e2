//! Ordering of the size-dependent setup around the application's `setup`.
//!
//! [`SetupLifecycle`] owns the depth buffer and the setup command buffer and
//! drives a [`SetupDevice`] through swapchain creation, the one-shot setup
//! submission and teardown.

use ash::vk;

/// GPU operations the setup lifecycle is built from.
pub(crate) trait SetupDevice {
    type Depth;

    /// Create or recreate the swapchain. Returns `false` when the surface
    /// has zero area and no images exist.
    fn create_swapchain(&mut self) -> anyhow::Result<bool>;

    /// Allocate a setup command buffer and begin recording into it.
    fn begin_setup_commands(&mut self) -> anyhow::Result<vk::CommandBuffer>;

    /// Create a depth buffer for the current extent, recording its layout
    /// transition into `cmd`.
    fn create_depth(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<Self::Depth>;

    fn destroy_depth(&mut self, depth: Self::Depth);

    /// End `cmd`, submit it and block until it has executed.
    fn submit_and_wait(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<()>;

    fn free_setup_commands(&mut self, cmd: vk::CommandBuffer);

    fn release_setup_pool(&mut self);

    /// Release the swapchain's per-image resources. On resize the surface
    /// and swapchain handle survive for recreation.
    fn release_swapchain(&mut self, is_resize: bool) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub(crate) struct SetupLifecycle<D> {
    depth: Option<D>,
    setup_cmd: vk::CommandBuffer,
    prepared: bool,
}

impl<D> Default for SetupLifecycle<D> {
    fn default() -> Self {
        Self {
            depth: None,
            setup_cmd: vk::CommandBuffer::null(),
            prepared: false,
        }
    }
}

impl<D> SetupLifecycle<D> {
    pub(crate) const fn depth(&self) -> Option<&D> {
        self.depth.as_ref()
    }

    pub(crate) const fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub(crate) const fn setup_command_buffer(&self) -> vk::CommandBuffer {
        self.setup_cmd
    }

    /// Create the swapchain, start the setup command buffer and create the
    /// depth buffer.
    ///
    /// A surface with zero area leaves the lifecycle unprepared without a
    /// depth buffer. The setup command buffer is still started so the
    /// following [`Self::post_setup`] has something to retire.
    pub(crate) fn pre_setup<B>(&mut self, device: &mut B) -> anyhow::Result<()>
    where
        B: SetupDevice<Depth = D>,
    {
        let attached = device.create_swapchain()?;
        self.setup_cmd = device.begin_setup_commands()?;

        if !attached {
            tracing::info!("Window has zero area, skipping depth buffer");
            self.prepared = false;
            return Ok(());
        }

        self.depth = Some(device.create_depth(self.setup_cmd)?);
        self.prepared = true;
        Ok(())
    }

    /// Submit the setup command buffer, wait for it and free it.
    pub(crate) fn post_setup<B>(&mut self, device: &mut B) -> anyhow::Result<()>
    where
        B: SetupDevice<Depth = D>,
    {
        let cmd = std::mem::replace(&mut self.setup_cmd, vk::CommandBuffer::null());
        if cmd == vk::CommandBuffer::null() {
            return Ok(());
        }
        device.submit_and_wait(cmd)?;
        device.free_setup_commands(cmd);
        Ok(())
    }

    /// Tear down the depth buffer, the setup command pool and the swapchain
    /// resources. The device must be idle.
    pub(crate) fn cleanup<B>(&mut self, device: &mut B, is_resize: bool) -> anyhow::Result<()>
    where
        B: SetupDevice<Depth = D>,
    {
        if let Some(depth) = self.depth.take() {
            device.destroy_depth(depth);
        }
        device.release_setup_pool();
        self.setup_cmd = vk::CommandBuffer::null();
        self.prepared = false;
        device.release_swapchain(is_resize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FakeDepth(u64);

    /// Records the calls made by the lifecycle and tracks what is alive.
    #[derive(Debug, Default)]
    struct RecordingDevice {
        zero_area: bool,
        calls: Vec<&'static str>,
        next_handle: u64,
        live_command_buffers: Vec<vk::CommandBuffer>,
        live_depth: Option<FakeDepth>,
        pool: bool,
        surface: bool,
        swapchain: bool,
        submitted: Vec<vk::CommandBuffer>,
    }

    impl RecordingDevice {
        fn new(zero_area: bool) -> Self {
            Self {
                zero_area,
                surface: true,
                ..Self::default()
            }
        }

        fn next(&mut self) -> u64 {
            self.next_handle += 1;
            self.next_handle
        }
    }

    impl SetupDevice for RecordingDevice {
        type Depth = FakeDepth;

        fn create_swapchain(&mut self) -> anyhow::Result<bool> {
            self.calls.push("create_swapchain");
            anyhow::ensure!(self.surface, "surface already destroyed");
            self.swapchain = !self.zero_area;
            Ok(self.swapchain)
        }

        fn begin_setup_commands(&mut self) -> anyhow::Result<vk::CommandBuffer> {
            self.calls.push("begin_setup_commands");
            self.pool = true;
            let cmd = vk::CommandBuffer::from_raw(self.next());
            self.live_command_buffers.push(cmd);
            Ok(cmd)
        }

        fn create_depth(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<FakeDepth> {
            self.calls.push("create_depth");
            assert!(self.live_command_buffers.contains(&cmd));
            assert!(self.live_depth.is_none(), "depth buffer created twice");
            let depth = FakeDepth(self.next());
            self.live_depth = Some(depth);
            Ok(depth)
        }

        fn destroy_depth(&mut self, depth: FakeDepth) {
            self.calls.push("destroy_depth");
            assert_eq!(self.live_depth.take(), Some(depth));
        }

        fn submit_and_wait(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<()> {
            self.calls.push("submit_and_wait");
            assert!(self.live_command_buffers.contains(&cmd));
            self.submitted.push(cmd);
            Ok(())
        }

        fn free_setup_commands(&mut self, cmd: vk::CommandBuffer) {
            self.calls.push("free_setup_commands");
            let before = self.live_command_buffers.len();
            self.live_command_buffers.retain(|&live| live != cmd);
            assert_eq!(self.live_command_buffers.len() + 1, before);
        }

        fn release_setup_pool(&mut self) {
            self.calls.push("release_setup_pool");
            self.pool = false;
            self.live_command_buffers.clear();
        }

        fn release_swapchain(&mut self, is_resize: bool) -> anyhow::Result<()> {
            self.calls.push(if is_resize { "resize" } else { "destroy" });
            if !is_resize {
                self.swapchain = false;
                self.surface = false;
            }
            Ok(())
        }
    }

    #[test]
    fn prepares_depth_buffer_for_visible_window() {
        let mut device = RecordingDevice::new(false);
        let mut setup = SetupLifecycle::default();

        setup.pre_setup(&mut device).unwrap();
        assert!(setup.is_prepared());
        assert_eq!(setup.depth(), device.live_depth.as_ref());
        assert_ne!(setup.setup_command_buffer(), vk::CommandBuffer::null());
        assert_eq!(
            device.calls,
            ["create_swapchain", "begin_setup_commands", "create_depth"]
        );
    }

    #[test]
    fn zero_area_surface_stays_unprepared() {
        let mut device = RecordingDevice::new(true);
        let mut setup = SetupLifecycle::default();

        setup.pre_setup(&mut device).unwrap();
        assert!(!setup.is_prepared());
        assert!(setup.depth().is_none());
        assert!(device.live_depth.is_none());
        assert!(!device.calls.contains(&"create_depth"));

        // The setup commands are still retired.
        setup.post_setup(&mut device).unwrap();
        assert_eq!(device.submitted.len(), 1);
        assert!(device.live_command_buffers.is_empty());
    }

    #[test]
    fn post_setup_submits_then_frees_command_buffer() {
        let mut device = RecordingDevice::new(false);
        let mut setup = SetupLifecycle::default();
        setup.pre_setup(&mut device).unwrap();
        let cmd = setup.setup_command_buffer();

        setup.post_setup(&mut device).unwrap();
        assert_eq!(device.submitted, [cmd]);
        assert!(device.live_command_buffers.is_empty());
        assert_eq!(
            &device.calls[3..],
            ["submit_and_wait", "free_setup_commands"]
        );
        assert_eq!(setup.setup_command_buffer(), vk::CommandBuffer::null());

        // Nothing left to submit.
        setup.post_setup(&mut device).unwrap();
        assert_eq!(device.submitted.len(), 1);
    }

    #[test]
    fn resize_cleanup_keeps_surface_and_swapchain() {
        let mut device = RecordingDevice::new(false);
        let mut setup = SetupLifecycle::default();
        setup.pre_setup(&mut device).unwrap();
        setup.post_setup(&mut device).unwrap();
        device.calls.clear();

        setup.cleanup(&mut device, true).unwrap();
        assert_eq!(
            device.calls,
            ["destroy_depth", "release_setup_pool", "resize"]
        );
        assert!(!setup.is_prepared());
        assert!(setup.depth().is_none());
        assert!(device.surface);
        assert!(device.swapchain);
        assert!(!device.pool);

        // The kept surface allows the next cycle.
        setup.pre_setup(&mut device).unwrap();
        assert!(setup.is_prepared());
    }

    #[test]
    fn final_cleanup_destroys_surface_and_swapchain() {
        let mut device = RecordingDevice::new(false);
        let mut setup = SetupLifecycle::default();
        setup.pre_setup(&mut device).unwrap();
        setup.post_setup(&mut device).unwrap();

        setup.cleanup(&mut device, false).unwrap();
        assert_eq!(device.calls.last(), Some(&"destroy"));
        assert!(!device.surface);
        assert!(!device.swapchain);
        assert!(device.live_depth.is_none());
        assert!(setup.pre_setup(&mut device).is_err());
    }

    #[test]
    fn cleanup_without_setup_only_releases_swapchain() {
        let mut device = RecordingDevice::new(true);
        let mut setup: SetupLifecycle<FakeDepth> = SetupLifecycle::default();

        setup.cleanup(&mut device, false).unwrap();
        assert_eq!(device.calls, ["release_setup_pool", "destroy"]);
    }
}
