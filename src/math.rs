//! Vector math, value scaling and ray intersection helpers
//!
//! Positions are plain `[f32; 3]` arrays so they can be handed to any
//! renderer without conversion.

/// A point or direction in world space (metres, Y-up)
pub type Vec3 = [f32; 3];

/// The world origin
pub const ORIGIN: Vec3 = [0.0, 0.0, 0.0];

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(v: Vec3, s: f32) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(v: Vec3) -> f32 {
    dot(v, v).sqrt()
}

pub fn distance(a: Vec3, b: Vec3) -> f32 {
    length(sub(a, b))
}

pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Component-wise linear interpolation
pub fn lerp3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

/// Whether every component is a finite number
pub fn is_finite(v: Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// A closed numeric interval used by the scaling helpers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub min: f32,
    pub max: f32,
}

impl Domain {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f32 {
        self.min + (self.max - self.min) / 2.0
    }

    /// True when min and max coincide (no extent to scale from)
    pub fn is_degenerate(&self) -> bool {
        (self.max - self.min).abs() <= f32::EPSILON
    }
}

/// Linearly rescale `value` from `domain` into `range`.
///
/// A degenerate domain maps every value to the midpoint of `range`.
pub fn to_range(value: f32, domain: Domain, range: Domain) -> f32 {
    if domain.is_degenerate() {
        return range.midpoint();
    }
    ((value - domain.min) / (domain.max - domain.min)) * (range.max - range.min) + range.min
}

/// Rescale with an empty band of width `gap` at the centre of `range`.
///
/// Domain and range are split at their midpoints and each half is scaled on
/// its own, so values never land inside the central band. A degenerate
/// domain maps to the upper edge of the band.
pub fn to_range_with_gap(value: f32, domain: Domain, range: Domain, gap: f32) -> f32 {
    if domain.is_degenerate() {
        return range.midpoint() + gap / 2.0;
    }
    let half_domain = domain.midpoint();
    let half_range = range.midpoint();
    if value < half_domain {
        to_range(
            value,
            Domain::new(domain.min, half_domain),
            Domain::new(range.min, half_range - gap / 2.0),
        )
    } else {
        to_range(
            value,
            Domain::new(half_domain, domain.max),
            Domain::new(half_range + gap / 2.0, range.max),
        )
    }
}

/// 3D bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox3D {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox3D {
    /// Create an empty bounding box
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY, f32::INFINITY],
            max: [f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    /// Build the box enclosing all given points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include_point(*p);
        }
        bounds
    }

    /// Include a point in the bounding box
    pub fn include_point(&mut self, p: Vec3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(p[axis]);
            self.max[axis] = self.max[axis].max(p[axis]);
        }
    }

    /// Extent along one axis (0 = x, 1 = y, 2 = z)
    pub fn domain(&self, axis: usize) -> Domain {
        Domain::new(self.min[axis], self.max[axis])
    }
}

/// A half-line with a normalized direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize(direction),
        }
    }

    /// Ray from `origin` passing through `target`
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, sub(target, origin))
    }

    pub fn at(&self, t: f32) -> Vec3 {
        add(self.origin, scale(self.direction, t))
    }

    /// Distance along the ray to the nearest sphere surface in front of the origin
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = sub(self.origin, center);
        let b = dot(oc, self.direction);
        let c = dot(oc, oc) - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }

    /// Distance along the ray to a rectangle, if the ray crosses it
    pub fn intersect_quad(&self, quad: &Quad) -> Option<f32> {
        let normal = cross(quad.right, quad.up);
        let denom = dot(normal, self.direction);
        if denom.abs() <= 1e-6 {
            return None;
        }
        let t = dot(sub(quad.center, self.origin), normal) / denom;
        if t < 0.0 {
            return None;
        }
        let local = sub(self.at(t), quad.center);
        let inside = dot(local, quad.right).abs() <= quad.half_width
            && dot(local, quad.up).abs() <= quad.half_height;
        inside.then_some(t)
    }
}

/// A flat rectangle in world space; `right` and `up` must be orthonormal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub center: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub half_width: f32,
    pub half_height: f32,
}
