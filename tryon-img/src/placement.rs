use crate::keypoints::{Anchors, FaceKeypoints};
use crate::shapes::{Point, Rect};
use tracing::trace;

const WIDTH_PER_EYE_DISTANCE: f32 = 2.5;
const HEIGHT_PER_WIDTH: f32 = 0.4;
const LENS_SHARE: f32 = 0.45;
const TEMPLE_SHARE: f32 = 0.15;

/// Bounding box of the glasses overlay, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGeometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Roll of the eye line in radians, positive when the right eye sits lower.
    pub tilt: f32,
}

impl OverlayGeometry {
    pub fn from_anchors(left_eye: Point, right_eye: Point, nose_bridge: Point) -> Self {
        let eye_distance = left_eye.distance_to(&right_eye);
        let width = eye_distance * WIDTH_PER_EYE_DISTANCE;
        let height = width * HEIGHT_PER_WIDTH;
        let eye_center = left_eye.midpoint(&right_eye);

        OverlayGeometry {
            x: eye_center.x - width / 2.,
            y: nose_bridge.y - height / 2.,
            width,
            height,
            tilt: left_eye.angle_to(&right_eye),
        }
    }

    /// Static geometry used when no detector is available.
    pub fn placeholder(frame_width: u32, frame_height: u32) -> Self {
        let width = frame_width as f32 * 0.35;
        let height = width * HEIGHT_PER_WIDTH;
        OverlayGeometry {
            x: (frame_width as f32 - width) / 2.,
            y: frame_height as f32 * 0.4 - height / 2.,
            width,
            height,
            tilt: 0.,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_tl(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn left_lens(&self) -> Rect {
        Rect::from_tl(self.x, self.y, self.width * LENS_SHARE, self.height)
    }

    pub fn right_lens(&self) -> Rect {
        let w = self.width * LENS_SHARE;
        Rect::from_tl(self.x + self.width - w, self.y, w, self.height)
    }

    pub fn bridge(&self) -> Rect {
        let l = self.left_lens();
        let r = self.right_lens();
        Rect::from_tl(l.right(), self.y, r.left() - l.right(), self.height)
    }

    /// Outer (from, to) segments for the left and right temples at lens mid-height.
    pub fn temples(&self) -> [(Point, Point); 2] {
        let mid_y = self.y + self.height / 2.;
        let reach = self.width * TEMPLE_SHARE;
        let right_edge = self.x + self.width;
        [
            (Point::new(self.x, mid_y), Point::new(self.x - reach, mid_y)),
            (
                Point::new(right_edge, mid_y),
                Point::new(right_edge + reach, mid_y),
            ),
        ]
    }
}

impl From<Anchors> for OverlayGeometry {
    fn from(a: Anchors) -> Self {
        OverlayGeometry::from_anchors(a.left_eye, a.right_eye, a.nose_bridge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementState {
    NotPlaced,
    LandmarksIncomplete,
    Placed,
}

impl PlacementState {
    pub fn label(&self) -> &'static str {
        match self {
            PlacementState::NotPlaced => "not-placed",
            PlacementState::LandmarksIncomplete => "landmarks-incomplete",
            PlacementState::Placed => "placed",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    NotPlaced,
    LandmarksIncomplete,
    Placed(OverlayGeometry),
}

impl Placement {
    pub fn state(&self) -> PlacementState {
        match self {
            Placement::NotPlaced => PlacementState::NotPlaced,
            Placement::LandmarksIncomplete => PlacementState::LandmarksIncomplete,
            Placement::Placed(_) => PlacementState::Placed,
        }
    }

    pub fn geometry(&self) -> Option<OverlayGeometry> {
        match self {
            Placement::Placed(g) => Some(*g),
            _ => None,
        }
    }
}

/// Places the overlay on the first detected face. Other faces are ignored.
pub fn place(faces: &[FaceKeypoints]) -> Placement {
    let Some(face) = faces.first() else {
        return Placement::NotPlaced;
    };

    let Some(anchors) = face.anchors() else {
        trace!("Face detected without eye/nose anchors");
        return Placement::LandmarksIncomplete;
    };

    let eye_distance = anchors.left_eye.distance_to(&anchors.right_eye);
    if !(eye_distance > 0. && eye_distance.is_finite()) {
        trace!("Degenerate eye distance {eye_distance}");
        return Placement::LandmarksIncomplete;
    }

    Placement::Placed(anchors.into())
}
