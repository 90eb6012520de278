use crate::config::ViewerConfig;
use crate::geometry::{ImagePoint, ScreenPoint};

/// Axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Zoom and pan state of one viewer, and the mapping between screen pixels
/// and image pixels it implies.
///
/// The image is aspect-fit into the viewport at zoom 1 and centred; the
/// translation is measured in screen pixels from that centred position.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    viewport: (f32, f32),
    image: Option<(u32, u32)>,
    zoom: f32,
    translation: ScreenPoint,
    min_zoom: f32,
    max_zoom: f32,
    wheel_step: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl ViewTransform {
    pub fn new(config: &ViewerConfig) -> Self {
        let min_zoom = config.min_zoom.max(f32::EPSILON);
        Self {
            viewport: (0.0, 0.0),
            image: None,
            zoom: 1.0_f32.clamp(min_zoom, config.max_zoom.max(min_zoom)),
            translation: ScreenPoint::default(),
            min_zoom,
            max_zoom: config.max_zoom.max(min_zoom),
            wheel_step: config.wheel_zoom_step,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn translation(&self) -> ScreenPoint {
        self.translation
    }

    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width.max(0.0), height.max(0.0));
        self.clamp_pan();
    }

    /// Sets the pixel dimensions of the displayed image (`None` when the
    /// dataset carries no geometry) and resets zoom and pan.
    pub fn set_image_size(&mut self, size: Option<(u32, u32)>) {
        self.image = size.filter(|(columns, rows)| *columns > 0 && *rows > 0);
        self.reset();
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0_f32.clamp(self.min_zoom, self.max_zoom);
        self.translation = ScreenPoint::default();
        self.clamp_pan();
    }

    fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.viewport.0 / 2.0, self.viewport.1 / 2.0)
    }

    /// Aspect-fit scale at zoom 1.
    pub fn base_scale(&self) -> Option<f32> {
        let (columns, rows) = self.image?;
        let (width, height) = self.viewport;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some((width / columns as f32).min(height / rows as f32))
    }

    /// Screen pixels per image pixel.
    pub fn effective_scale(&self) -> Option<f32> {
        self.base_scale()
            .map(|base| base * self.zoom)
            .filter(|scale| scale.is_finite() && *scale > 0.0)
    }

    fn origin(&self, scale: f32) -> Option<ScreenPoint> {
        let (columns, rows) = self.image?;
        let center = self.center();
        Some(ScreenPoint::new(
            center.x - columns as f32 * scale / 2.0 + self.translation.x,
            center.y - rows as f32 * scale / 2.0 + self.translation.y,
        ))
    }

    pub fn image_to_screen(&self, point: ImagePoint) -> Option<ScreenPoint> {
        let scale = self.effective_scale()?;
        let origin = self.origin(scale)?;
        Some(ScreenPoint::new(
            origin.x + point.x * scale,
            origin.y + point.y * scale,
        ))
    }

    pub fn screen_to_image(&self, point: ScreenPoint) -> Option<ImagePoint> {
        let scale = self.effective_scale()?;
        let origin = self.origin(scale)?;
        Some(ImagePoint::new(
            (point.x - origin.x) / scale,
            (point.y - origin.y) / scale,
        ))
    }

    /// Where the whole image lands on screen.
    pub fn image_rect(&self) -> Option<ScreenRect> {
        let (columns, rows) = self.image?;
        let scale = self.effective_scale()?;
        let origin = self.origin(scale)?;
        Some(ScreenRect {
            x: origin.x,
            y: origin.y,
            width: columns as f32 * scale,
            height: rows as f32 * scale,
        })
    }

    /// Changes the zoom so that the image point under `anchor` stays under
    /// `anchor`, subject to the pan clamp.
    pub fn zoom_at(&mut self, anchor: ScreenPoint, zoom: f32) {
        let target = zoom.clamp(self.min_zoom, self.max_zoom);
        if !target.is_finite() || target == self.zoom {
            return;
        }

        let k = target / self.zoom;
        let offset = anchor - self.center();
        self.translation = ScreenPoint::new(
            (1.0 - k) * offset.x + k * self.translation.x,
            (1.0 - k) * offset.y + k * self.translation.y,
        );
        self.zoom = target;
        self.clamp_pan();
    }

    /// Zooms by one multiplicative step per wheel line; positive lines zoom in.
    pub fn zoom_by_wheel(&mut self, anchor: ScreenPoint, lines: f32) {
        let target = self.zoom * self.wheel_step.powf(lines);
        self.zoom_at(anchor, target);
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.translation = ScreenPoint::new(self.translation.x + dx, self.translation.y + dy);
        self.clamp_pan();
    }

    fn clamp_pan(&mut self) {
        let scale = match self.effective_scale() {
            Some(scale) if self.zoom > 1.0 => scale,
            _ => {
                self.translation = ScreenPoint::default();
                return;
            }
        };
        let Some((columns, rows)) = self.image else {
            return;
        };

        let limit_x = ((columns as f32 * scale - self.viewport.0) / 2.0).max(0.0);
        let limit_y = ((rows as f32 * scale - self.viewport.1) / 2.0).max(0.0);
        self.translation = ScreenPoint::new(
            self.translation.x.clamp(-limit_x, limit_x),
            self.translation.y.clamp(-limit_y, limit_y),
        );
    }
}
