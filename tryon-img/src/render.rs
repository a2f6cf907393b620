use crate::detector::OverlayStatus;
use crate::error::{Result, TryOnError};
use crate::placement::{OverlayGeometry, Placement, PlacementState};
use crate::shapes::{Point, Rect, RoundedRect};
use crate::surface::Surface;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{Level, span, trace};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub frame_color: [u8; 4],
    pub lens_tint: [u8; 4],
    pub placeholder_color: [u8; 4],
    pub stroke_width: f32,
    /// Lens corner radius as a share of the lens's shorter side.
    pub corner_radius: f32,
    /// Rotate the glasses with the eye line instead of keeping them level.
    pub follow_tilt: bool,
    pub show_status: bool,
    pub status_font_size: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            frame_color: [20, 20, 20, 255],
            lens_tint: [90, 140, 200, 90],
            placeholder_color: [160, 160, 160, 200],
            stroke_width: 4.,
            corner_radius: 0.3,
            follow_tilt: false,
            show_status: true,
            status_font_size: 16.,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlassesRenderer {
    style: OverlayStyle,
}

impl GlassesRenderer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Replaces whatever the surface held with the frame and, when placed, the glasses.
    pub fn render<S: Surface>(
        &self,
        surface: &mut S,
        frame: &RgbaImage,
        placement: &Placement,
    ) -> Result<PlacementState> {
        let span = span!(Level::DEBUG, "render");
        let _guard = span.enter();

        self.passthrough(surface, frame)?;

        match placement {
            Placement::Placed(g) => {
                trace!("Drawing glasses at {g:?}");
                self.draw_glasses(surface, g, Rgba(self.style.frame_color));
            }
            Placement::NotPlaced => self.draw_status(surface, "No face detected"),
            Placement::LandmarksIncomplete => self.draw_status(surface, "Align your face"),
        }

        Ok(placement.state())
    }

    /// Frame with a static glasses graphic, for when the detector is unavailable.
    pub fn render_placeholder<S: Surface>(
        &self,
        surface: &mut S,
        frame: &RgbaImage,
        status: &OverlayStatus,
    ) -> Result<PlacementState> {
        self.passthrough(surface, frame)?;

        let g = OverlayGeometry::placeholder(frame.width(), frame.height());
        self.draw_glasses(surface, &g, Rgba(self.style.placeholder_color));
        self.draw_status(surface, status.message());

        Ok(PlacementState::NotPlaced)
    }

    fn passthrough<S: Surface>(&self, surface: &mut S, frame: &RgbaImage) -> Result<()> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(TryOnError::FrameNotReady { width, height });
        }

        surface.resize(width, height);
        surface.clear();
        surface.draw_image(frame);
        Ok(())
    }

    fn draw_glasses<S: Surface>(&self, surface: &mut S, g: &OverlayGeometry, color: Rgba<u8>) {
        let theta = if self.style.follow_tilt { g.tilt } else { 0. };
        let origin = g.center();
        let turn = |mut p: Point| {
            if theta != 0. {
                p.rotate(origin, theta);
            }
            p
        };
        let stroke = self.style.stroke_width;

        for lens in [g.left_lens(), g.right_lens()] {
            let c = turn(lens.center());
            let rect = Rect::from_center(c.x, c.y, lens.w, lens.h);
            let shape =
                RoundedRect::new(rect, lens.w.min(lens.h) * self.style.corner_radius).rotated(theta);

            surface.fill_rounded_rect(shape, Rgba(self.style.lens_tint));
            surface.stroke_rounded_rect(shape, color, stroke);
        }

        let bridge = g.bridge();
        let bridge_y = bridge.top() + bridge.h * 0.3;
        surface.stroke_line(
            turn(Point::new(bridge.left(), bridge_y)),
            turn(Point::new(bridge.right(), bridge_y)),
            color,
            stroke,
        );

        for (from, to) in g.temples() {
            surface.stroke_line(turn(from), turn(to), color, stroke);
        }
    }

    fn draw_status<S: Surface>(&self, surface: &mut S, message: &str) {
        if !self.style.show_status {
            return;
        }

        let size = self.style.status_font_size;
        let pad = size * 0.5;
        let dot = size * 0.6;
        let width = pad * 3. + dot + message.chars().count() as f32 * size * 0.55;
        let badge = Rect::from_tl(8., 8., width, size + pad * 2.);

        surface.fill_rounded_rect(RoundedRect::new(badge, badge.h / 2.), Rgba([0, 0, 0, 150]));
        surface.fill_rounded_rect(
            RoundedRect::new(
                Rect::from_center(badge.left() + pad + dot / 2., badge.y, dot, dot),
                dot / 2.,
            ),
            Rgba([230, 60, 60, 255]),
        );
        surface.fill_text(
            message,
            Point::new(badge.left() + pad * 2. + dot, badge.top() + pad),
            size,
            Rgba([255, 255, 255, 255]),
        );
    }
}
