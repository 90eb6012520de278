use std::time::Duration;

/// Tunables shared by the frame pipeline, the view transform and the tools.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Maximum number of decoded frames kept per dataset.
    pub cache_capacity: usize,
    /// How many frames past the requested one `prefetch` queues.
    pub prefetch_ahead: u32,
    /// Sleep between polls of an empty prefetch queue.
    pub worker_idle: Duration,
    /// Pointer tolerance for handles, edges and rims, in screen pixels.
    pub hit_tolerance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Zoom factor applied per wheel line.
    pub wheel_zoom_step: f32,
    pub cine_fps: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 24,
            prefetch_ahead: 12,
            worker_idle: Duration::from_millis(5),
            hit_tolerance: 8.0,
            min_zoom: 1.0,
            max_zoom: 12.0,
            wheel_zoom_step: 1.15,
            cine_fps: 15,
        }
    }
}

impl ViewerConfig {
    pub fn cine_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.cine_fps.max(1)))
    }
}
