//! Convex shapes posed in a reference frame
//!
//! A [`FrameShape`] is a convex primitive placed in its frame by a pose
//! (`frame_from_shape`). Capsules and cylinders extend along their local z
//! axis and are centred on the pose origin. Point queries take points
//! expressed in the shape's own frame and fail with `FrameMismatch`
//! otherwise.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use geoframe::transform::EPSILON;
use geoframe::{FrameHolder, FrameId, FramePoint3, FrameTree, Transform};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use parry3d_f64::shape::{Shape, SharedShape};

use crate::bounding_box::FrameBoundingBox;
use crate::error::{check_positive, ShapeError, ShapeResult};

/// Geometry of a shape in its own local coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// Single point at the shape origin
    Point,
    Sphere {
        radius: f64,
    },
    /// Box with the given full edge lengths, centred on the origin
    Cuboid {
        size: Vector3<f64>,
    },
    /// Segment of `length` along z swept by a sphere of `radius`
    Capsule {
        length: f64,
        radius: f64,
    },
    Cylinder {
        length: f64,
        radius: f64,
    },
    /// Wedge on a `size.x` by `size.y` base in the z = 0 plane, rising to
    /// `size.z` at x = `size.x`
    Ramp {
        size: Vector3<f64>,
    },
    /// Convex hull of the given vertices
    ConvexPolytope {
        vertices: Vec<Point3<f64>>,
    },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Sphere { .. } => "sphere",
            ShapeKind::Cuboid { .. } => "cuboid",
            ShapeKind::Capsule { .. } => "capsule",
            ShapeKind::Cylinder { .. } => "cylinder",
            ShapeKind::Ramp { .. } => "ramp",
            ShapeKind::ConvexPolytope { .. } => "convex polytope",
        }
    }
}

/// Convex shape bound to a reference frame
#[derive(Clone)]
pub struct FrameShape {
    frame: FrameId,
    pose: Transform,
    kind: ShapeKind,
    collider: SharedShape,
    /// Pose of the collider in shape coordinates
    collider_offset: Transform,
}

impl FrameShape {
    /// Point at the origin of `pose`
    pub fn point(frame: FrameId, pose: Transform) -> Self {
        Self::from_parts(frame, pose, ShapeKind::Point, SharedShape::ball(0.0))
    }

    pub fn sphere(frame: FrameId, pose: Transform, radius: f64) -> ShapeResult<Self> {
        let radius = check_positive("sphere radius", radius)?;
        Ok(Self::from_parts(
            frame,
            pose,
            ShapeKind::Sphere { radius },
            SharedShape::ball(radius),
        ))
    }

    /// Box with full edge lengths `size`
    pub fn cuboid(frame: FrameId, pose: Transform, size: Vector3<f64>) -> ShapeResult<Self> {
        check_positive("cuboid size x", size.x)?;
        check_positive("cuboid size y", size.y)?;
        check_positive("cuboid size z", size.z)?;
        let half = size / 2.0;
        Ok(Self::from_parts(
            frame,
            pose,
            ShapeKind::Cuboid { size },
            SharedShape::cuboid(half.x, half.y, half.z),
        ))
    }

    /// Capsule whose segment of `length` runs along local z
    pub fn capsule(frame: FrameId, pose: Transform, length: f64, radius: f64) -> ShapeResult<Self> {
        let length = check_positive("capsule length", length)?;
        let radius = check_positive("capsule radius", radius)?;
        let half = length / 2.0;
        Ok(Self::from_parts(
            frame,
            pose,
            ShapeKind::Capsule { length, radius },
            SharedShape::capsule(Point3::new(0.0, 0.0, -half), Point3::new(0.0, 0.0, half), radius),
        ))
    }

    /// Cylinder of `length` along local z
    pub fn cylinder(
        frame: FrameId,
        pose: Transform,
        length: f64,
        radius: f64,
    ) -> ShapeResult<Self> {
        let length = check_positive("cylinder length", length)?;
        let radius = check_positive("cylinder radius", radius)?;
        let mut shape = Self::from_parts(
            frame,
            pose,
            ShapeKind::Cylinder { length, radius },
            SharedShape::cylinder(length / 2.0, radius),
        );
        // Collider cylinders run along y
        shape.collider_offset = Transform::from_parts(
            nalgebra::Translation3::identity(),
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2),
        );
        Ok(shape)
    }

    /// Ramp with full dimensions `size`, the slope rising along local x
    pub fn ramp(frame: FrameId, pose: Transform, size: Vector3<f64>) -> ShapeResult<Self> {
        check_positive("ramp size x", size.x)?;
        check_positive("ramp size y", size.y)?;
        check_positive("ramp size z", size.z)?;
        let half_y = size.y / 2.0;
        let vertices = [
            Point3::new(0.0, -half_y, 0.0),
            Point3::new(0.0, half_y, 0.0),
            Point3::new(size.x, -half_y, 0.0),
            Point3::new(size.x, half_y, 0.0),
            Point3::new(size.x, -half_y, size.z),
            Point3::new(size.x, half_y, size.z),
        ];
        let collider = SharedShape::convex_hull(&vertices)
            .ok_or(ShapeError::DegeneratePolytope(vertices.len()))?;
        Ok(Self::from_parts(frame, pose, ShapeKind::Ramp { size }, collider))
    }

    /// Convex hull of `vertices`
    ///
    /// Fails with `DegeneratePolytope` when the vertices do not span a volume.
    pub fn convex_polytope(
        frame: FrameId,
        pose: Transform,
        vertices: Vec<Point3<f64>>,
    ) -> ShapeResult<Self> {
        if !spans_volume(&vertices) {
            return Err(ShapeError::DegeneratePolytope(vertices.len()));
        }
        let collider = SharedShape::convex_hull(&vertices)
            .ok_or(ShapeError::DegeneratePolytope(vertices.len()))?;
        Ok(Self::from_parts(
            frame,
            pose,
            ShapeKind::ConvexPolytope { vertices },
            collider,
        ))
    }

    fn from_parts(frame: FrameId, pose: Transform, kind: ShapeKind, collider: SharedShape) -> Self {
        Self {
            frame,
            pose,
            kind,
            collider,
            collider_offset: Transform::identity(),
        }
    }

    /// Pose of the shape in its frame (`frame_from_shape`)
    pub fn pose(&self) -> &Transform {
        &self.pose
    }

    pub fn set_pose(&mut self, pose: Transform) {
        self.pose = pose;
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    /// Shape origin expressed in the shape's frame
    pub fn position(&self) -> FramePoint3 {
        FramePoint3::new(self.frame, Point3::from(self.pose.translation.vector))
    }

    /// The same shape expressed in `target`; the original is not modified
    pub fn expressed_in(&self, tree: &FrameTree, target: FrameId) -> ShapeResult<FrameShape> {
        let target_from_frame = tree.resolve_transform(self.frame, target)?;
        Ok(FrameShape {
            frame: target,
            pose: target_from_frame * self.pose,
            ..self.clone()
        })
    }

    pub fn volume(&self) -> f64 {
        match &self.kind {
            ShapeKind::Point => 0.0,
            ShapeKind::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            ShapeKind::Cuboid { size } => size.product(),
            ShapeKind::Capsule { length, radius } => {
                PI * radius.powi(2) * length + 4.0 / 3.0 * PI * radius.powi(3)
            }
            ShapeKind::Cylinder { length, radius } => PI * radius.powi(2) * length,
            ShapeKind::Ramp { size } => size.product() / 2.0,
            ShapeKind::ConvexPolytope { .. } => self.collider.mass_properties(1.0).mass(),
        }
    }

    /// Whether `point` lies inside or on the surface
    pub fn is_point_inside(&self, point: &FramePoint3) -> ShapeResult<bool> {
        point.check_expressed_in(self.frame)?;
        if self.kind == ShapeKind::Point {
            return Ok(nalgebra::distance(self.position().value(), point.value()) <= EPSILON);
        }
        Ok(self
            .collider
            .contains_point(&self.collider_pose(), point.value()))
    }

    /// Distance from `point` to the surface, negative inside the shape
    pub fn signed_distance(&self, point: &FramePoint3) -> ShapeResult<f64> {
        point.check_expressed_in(self.frame)?;
        if self.kind == ShapeKind::Point {
            return Ok(nalgebra::distance(self.position().value(), point.value()));
        }
        let projection = self
            .collider
            .project_point(&self.collider_pose(), point.value(), false);
        let distance = nalgebra::distance(&projection.point, point.value());
        Ok(if projection.is_inside {
            -distance
        } else {
            distance
        })
    }

    /// Closest point of the shape to `point`, `None` when `point` is inside
    pub fn project_point(&self, point: &FramePoint3) -> ShapeResult<Option<FramePoint3>> {
        point.check_expressed_in(self.frame)?;
        if self.kind == ShapeKind::Point {
            return Ok(Some(self.position()));
        }
        let projection = self
            .collider
            .project_point(&self.collider_pose(), point.value(), true);
        if projection.is_inside {
            return Ok(None);
        }
        Ok(Some(FramePoint3::new(self.frame, projection.point)))
    }

    /// Axis-aligned bounding box in the shape's frame
    pub fn bounding_box(&self) -> FrameBoundingBox {
        let aabb = self.collider.compute_aabb(&self.collider_pose());
        FrameBoundingBox::from_corners(self.frame, aabb.mins, aabb.maxs)
    }

    /// Collider and its pose in the shape's frame, for the narrow phase
    pub(crate) fn collider(&self) -> (&dyn Shape, Transform) {
        (&*self.collider, self.collider_pose())
    }

    fn collider_pose(&self) -> Transform {
        self.pose * self.collider_offset
    }
}

impl FrameHolder for FrameShape {
    fn frame(&self) -> FrameId {
        self.frame
    }
}

impl fmt::Debug for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameShape")
            .field("frame", &self.frame)
            .field("pose", &self.pose)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Whether the points contain four that are not coplanar
fn spans_volume(points: &[Point3<f64>]) -> bool {
    let Some(&origin) = points.first() else {
        return false;
    };
    let farthest = |score: &dyn Fn(&Point3<f64>) -> f64| {
        points
            .iter()
            .map(|p| (score(p), *p))
            .fold((0.0, origin), |best, cur| if cur.0 > best.0 { cur } else { best })
    };

    let (d1, p1) = farthest(&|p| (p - origin).norm());
    if d1 <= EPSILON {
        return false;
    }
    let axis = (p1 - origin) / d1;
    let (d2, p2) = farthest(&|p| (p - origin).cross(&axis).norm());
    if d2 <= EPSILON {
        return false;
    }
    let normal = (p1 - origin).cross(&(p2 - origin)).normalize();
    let (d3, _) = farthest(&|p| (p - origin).dot(&normal).abs());
    d3 > EPSILON
}
