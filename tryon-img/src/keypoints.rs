use crate::shapes::Point;

/// Indices into a detector's keypoint list for the landmarks the overlay
/// is anchored to. Swap this out together with the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub left_eye_corner: usize,
    pub right_eye_corner: usize,
    pub nose_bridge: usize,
}

impl Topology {
    /// 468 point face mesh.
    pub const FACE_MESH: Topology = Topology {
        left_eye_corner: 33,
        right_eye_corner: 263,
        nose_bridge: 6,
    };
}

impl Default for Topology {
    fn default() -> Self {
        Topology::FACE_MESH
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchors {
    pub left_eye: Point,
    pub right_eye: Point,
    pub nose_bridge: Point,
}

/// Keypoints of one detected face, in frame pixel space.
#[derive(Debug, Clone, Default)]
pub struct FaceKeypoints {
    points: Vec<Point>,
    topology: Topology,
}

impl FaceKeypoints {
    pub fn new(points: Vec<Point>) -> Self {
        Self::with_topology(points, Topology::FACE_MESH)
    }

    pub fn with_topology(points: Vec<Point>, topology: Topology) -> Self {
        Self { points, topology }
    }

    fn at(&self, idx: usize) -> Option<Point> {
        self.points.get(idx).copied().filter(Point::is_finite)
    }

    pub fn left_eye_corner(&self) -> Option<Point> {
        self.at(self.topology.left_eye_corner)
    }

    pub fn right_eye_corner(&self) -> Option<Point> {
        self.at(self.topology.right_eye_corner)
    }

    pub fn nose_bridge(&self) -> Option<Point> {
        self.at(self.topology.nose_bridge)
    }

    pub fn anchors(&self) -> Option<Anchors> {
        Some(Anchors {
            left_eye: self.left_eye_corner()?,
            right_eye: self.right_eye_corner()?,
            nose_bridge: self.nose_bridge()?,
        })
    }
}
