use super::point::Point;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    // centerpoint
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn from_center(xc: f32, yc: f32, w: f32, h: f32) -> Rect {
        Rect { x: xc, y: yc, w, h }
    }

    pub fn from_tl(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect {
            x: x + w / 2.,
            y: y + h / 2.,
            w,
            h,
        }
    }

    pub fn left(&self) -> f32 {
        self.x - self.w / 2.
    }
    pub fn right(&self) -> f32 {
        self.x + self.w / 2.
    }
    pub fn top(&self) -> f32 {
        self.y - self.h / 2.
    }
    pub fn bottom(&self) -> f32 {
        self.y + self.h / 2.
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }
}

/// A rectangle with rounded corners, optionally rotated about its center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radius: f32,
    pub rotation: f32,
}

impl RoundedRect {
    pub fn new(rect: Rect, radius: f32) -> Self {
        Self {
            rect,
            radius,
            rotation: 0.,
        }
    }

    pub fn rotated(mut self, theta: f32) -> Self {
        self.rotation = theta;
        self
    }

    pub fn radius(&self) -> f32 {
        self.radius
            .max(0.)
            .min(self.rect.w.abs() / 2.)
            .min(self.rect.h.abs() / 2.)
    }

    /// Outline approximated as a polygon, clockwise from the top-left arc.
    pub fn outline(&self, segments_per_corner: usize) -> Vec<Point> {
        let r = self.radius();
        let segments = segments_per_corner.max(1);
        let (l, t, rt, b) = (
            self.rect.left(),
            self.rect.top(),
            self.rect.right(),
            self.rect.bottom(),
        );

        // corner arc centers with their starting angles (screen coordinates, y down)
        let corners = [
            (Point::new(l + r, t + r), std::f32::consts::PI),
            (Point::new(rt - r, t + r), 1.5 * std::f32::consts::PI),
            (Point::new(rt - r, b - r), 0.),
            (Point::new(l + r, b - r), 0.5 * std::f32::consts::PI),
        ];

        let mut points = Vec::with_capacity(4 * (segments + 1));
        for (c, start) in corners {
            if r == 0. {
                points.push(c);
                continue;
            }
            for s in 0..=segments {
                let theta = start + std::f32::consts::FRAC_PI_2 * s as f32 / segments as f32;
                points.push(Point::new(c.x + r * theta.cos(), c.y + r * theta.sin()));
            }
        }

        if self.rotation != 0. {
            let origin = self.rect.center();
            for p in points.iter_mut() {
                p.rotate(origin, self.rotation);
            }
        }

        points
    }
}
