#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.,
            y: (self.y + other.y) / 2.,
        }
    }

    /// Angle of the line from self to other, in radians.
    pub fn angle_to(&self, other: &Point) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    pub fn rotate(&mut self, origin: Point, theta: f32) -> Point {
        let x = self.x - origin.x;
        let y = self.y - origin.y;

        let rot_x = x * theta.cos() - y * theta.sin();
        let rot_y = x * theta.sin() + y * theta.cos();

        self.x = rot_x + origin.x;
        self.y = rot_y + origin.y;

        *self
    }
}

impl From<Point> for imageproc::point::Point<i32> {
    fn from(p: Point) -> imageproc::point::Point<i32> {
        imageproc::point::Point::new(p.x.round() as i32, p.y.round() as i32)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Point {
        Point { x, y }
    }
}
