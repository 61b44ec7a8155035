use hosting_core::CollisionPolicy;
use hosting_ui_graphics::Size;

/// Construction-time options for a [`HostingController`](crate::HostingController).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostingOptions {
    /// Taps that land on no mounted view fall through the container.
    pub allow_tap_passthrough: bool,
    /// Size used for builds until the first [`set_bounds`] call, letting the
    /// first update build asynchronously before anything was measured.
    ///
    /// [`set_bounds`]: crate::HostingController::set_bounds
    pub initial_size: Option<Size>,
    pub collision_policy: CollisionPolicy,
}

impl Default for HostingOptions {
    fn default() -> Self {
        Self {
            allow_tap_passthrough: false,
            initial_size: None,
            collision_policy: CollisionPolicy::default(),
        }
    }
}

impl HostingOptions {
    pub fn with_initial_size(mut self, size: Size) -> Self {
        self.initial_size = Some(size);
        self
    }

    pub fn with_tap_passthrough(mut self, allow: bool) -> Self {
        self.allow_tap_passthrough = allow;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }
}
