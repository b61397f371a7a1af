//! 2D sketches and the solids lifted from them
//!
//! A [`Sketch`] is an ordered list of lines, arcs and circles. Its 2D signed
//! distance is the nearest-element distance, signed by the parity of a
//! horizontal ray cast towards `+x` when the sketch is closed. Because the
//! sign comes from parity, extra closed loops inside an outline (circles,
//! polygons) become holes.

use super::primitives::intersect_exact;
use super::{Field, FieldKind, Metadata, Sdf};
use crate::error::{Error, Result, ensure_finite, ensure_positive};
use crate::math::Aabb;
use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// One piece of a sketch profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SketchElement {
    Line {
        start: Vec2,
        end: Vec2,
    },
    /// Counter-clockwise arc from `start_angle` to `end_angle` (radians)
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
    },
}

impl SketchElement {
    fn validate(&self) -> Result<()> {
        let finite = |v: Vec2| v.is_finite();
        match *self {
            Self::Line { start, end } => {
                if !finite(start) || !finite(end) {
                    return Err(Error::invalid("sketch line endpoints must be finite"));
                }
                if start.distance_squared(end) <= f32::EPSILON * f32::EPSILON {
                    return Err(Error::invalid(format!(
                        "sketch line endpoints coincide at {start}"
                    )));
                }
            }
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                if !finite(center) {
                    return Err(Error::invalid("sketch arc center must be finite"));
                }
                ensure_positive("sketch arc radius", radius)?;
                ensure_finite("sketch arc start angle", start_angle)?;
                ensure_finite("sketch arc end angle", end_angle)?;
                if arc_sweep(start_angle, end_angle) <= 0.0 {
                    return Err(Error::invalid("sketch arc must sweep a non-zero angle"));
                }
            }
            Self::Circle { center, radius } => {
                if !finite(center) {
                    return Err(Error::invalid("sketch circle center must be finite"));
                }
                ensure_positive("sketch circle radius", radius)?;
            }
        }
        Ok(())
    }

    /// Unsigned distance from `p` to the element
    pub fn distance(&self, p: Vec2) -> f32 {
        match *self {
            Self::Line { start, end } => segment_distance(p, start, end),
            Self::Circle { center, radius } => ((p - center).length() - radius).abs(),
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let v = p - center;
                if angle_in_sweep(v.y.atan2(v.x), start_angle, end_angle) {
                    (v.length() - radius).abs()
                } else {
                    let (a, b) = arc_endpoints(center, radius, start_angle, end_angle);
                    p.distance(a).min(p.distance(b))
                }
            }
        }
    }

    /// Whether a ray from `p` towards `+x` crosses this element an odd number of times
    fn toggles_parity(&self, p: Vec2) -> bool {
        match *self {
            Self::Line { start, end } => ray_crosses_segment(p, start, end),
            Self::Circle { center, radius } => (p - center).length() < radius,
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                // Arc crossings = chord crossings XOR membership of the
                // region enclosed by the arc and its chord
                let (a, b) = arc_endpoints(center, radius, start_angle, end_angle);
                let mid_angle = start_angle + arc_sweep(start_angle, end_angle) * 0.5;
                let mid = center + Vec2::from_angle(mid_angle) * radius;
                let chord = b - a;
                let in_segment = (p - center).length() < radius
                    && chord.perp_dot(p - a) * chord.perp_dot(mid - a) > 0.0;
                ray_crosses_segment(p, a, b) != in_segment
            }
        }
    }

    /// Min and max corners of the element's 2D extent
    fn extent(&self) -> (Vec2, Vec2) {
        match *self {
            Self::Line { start, end } => (start.min(end), start.max(end)),
            Self::Circle { center, radius } => (center - radius, center + radius),
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let (a, b) = arc_endpoints(center, radius, start_angle, end_angle);
                let (mut min, mut max) = (a.min(b), a.max(b));
                // Axis extremes the arc sweeps through
                for quarter in 0..4 {
                    let angle = quarter as f32 * TAU * 0.25;
                    if angle_in_sweep(angle, start_angle, end_angle) {
                        let p = center + Vec2::from_angle(angle) * radius;
                        min = min.min(p);
                        max = max.max(p);
                    }
                }
                (min, max)
            }
        }
    }
}

/// A 2D profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    pub elements: Vec<SketchElement>,
    pub closed: bool,
}

impl Sketch {
    /// Empty, open sketch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an element
    pub fn push(mut self, element: SketchElement) -> Result<Self> {
        element.validate()?;
        self.elements.push(element);
        Ok(self)
    }

    /// Mark the sketch as a closed profile, enabling inside/outside
    pub fn close(mut self) -> Self {
        self.closed = true;
        self
    }

    /// Closed polygon through `points`, with an implicit closing edge
    pub fn polygon(points: &[Vec2]) -> Result<Self> {
        if points.len() < 3 {
            return Err(Error::invalid(format!(
                "polygon needs at least 3 points, got {}",
                points.len()
            )));
        }
        let mut sketch = Self::new();
        for (i, &start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            sketch = sketch.push(SketchElement::Line { start, end })?;
        }
        Ok(sketch.close())
    }

    /// Closed axis-aligned rectangle
    pub fn rectangle(center: Vec2, size: Vec2) -> Result<Self> {
        ensure_positive("rectangle width", size.x)?;
        ensure_positive("rectangle height", size.y)?;
        let h = size * 0.5;
        Self::polygon(&[
            center + Vec2::new(-h.x, -h.y),
            center + Vec2::new(h.x, -h.y),
            center + Vec2::new(h.x, h.y),
            center + Vec2::new(-h.x, h.y),
        ])
    }

    /// Closed circle
    pub fn circle(center: Vec2, radius: f32) -> Result<Self> {
        Ok(Self::new()
            .push(SketchElement::Circle { center, radius })?
            .close())
    }

    /// 2D extent as `(min, max)`, or `None` when empty
    pub fn bounds(&self) -> Option<(Vec2, Vec2)> {
        self.elements
            .iter()
            .map(SketchElement::extent)
            .reduce(|(amin, amax), (bmin, bmax)| (amin.min(bmin), amax.max(bmax)))
    }

    /// 2D signed distance; unsigned for open sketches
    pub fn distance(&self, p: Vec2) -> f32 {
        let d = self
            .elements
            .iter()
            .map(|e| e.distance(p))
            .fold(f32::INFINITY, f32::min);
        if self.closed && self.contains(p) {
            -d
        } else {
            d
        }
    }

    /// Ray-casting parity test
    pub fn contains(&self, p: Vec2) -> bool {
        self.elements
            .iter()
            .filter(|e| e.toggles_parity(p))
            .count()
            % 2
            == 1
    }

    fn ensure_solid(&self, op: &str) -> Result<(Vec2, Vec2)> {
        if !self.closed {
            return Err(Error::invalid(format!("{op} needs a closed sketch")));
        }
        self.bounds()
            .ok_or_else(|| Error::invalid(format!("{op} needs a non-empty sketch")))
    }
}

// ============================================================================
// Constructor functions (ergonomic API)
// ============================================================================

/// Extrude a closed XY profile from `z = 0` to `z = height`
pub fn extrude(sketch: Sketch, height: f32) -> Result<Field> {
    let extent = sketch.ensure_solid("extrude")?;
    ensure_positive("extrude height", height)?;
    Ok(Field::new(Extrude {
        sketch,
        height,
        extent,
    }))
}

/// Revolve a closed profile in the (radius, z) half-plane about the Z axis
pub fn revolve(sketch: Sketch) -> Result<Field> {
    let extent = sketch.ensure_solid("revolve")?;
    Ok(Field::new(Revolve { sketch, extent }))
}

// ============================================================================
// Lifted solids
// ============================================================================

/// Linear extrusion along +Z
#[derive(Debug, Clone)]
pub struct Extrude {
    sketch: Sketch,
    pub height: f32,
    extent: (Vec2, Vec2),
}

impl Sdf for Extrude {
    fn distance(&self, p: Vec3) -> f32 {
        let half = self.height * 0.5;
        let profile = self.sketch.distance(p.truncate());
        let cap = (p.z - half).abs() - half;
        intersect_exact(profile, cap)
    }

    fn bounds(&self) -> Option<Aabb> {
        let (min, max) = self.extent;
        Some(Aabb::new(min.extend(0.0), max.extend(self.height)))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Extrude)
            .param("height", self.height)
            .param("elements", self.sketch.elements.len() as u32)
    }
}

/// Revolution about the Z axis
#[derive(Debug, Clone)]
pub struct Revolve {
    sketch: Sketch,
    extent: (Vec2, Vec2),
}

impl Sdf for Revolve {
    fn distance(&self, p: Vec3) -> f32 {
        let q = Vec2::new(p.truncate().length(), p.z);
        self.sketch.distance(q)
    }

    fn bounds(&self) -> Option<Aabb> {
        let (min, max) = self.extent;
        let r = min.x.abs().max(max.x.abs());
        Some(Aabb::new(
            Vec3::new(-r, -r, min.y),
            Vec3::new(r, r, max.y),
        ))
    }

    fn metadata(&self) -> Metadata {
        Metadata::leaf(FieldKind::Revolve).param("elements", self.sketch.elements.len() as u32)
    }
}

// ============================================================================
// 2D helpers
// ============================================================================

fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let t = ((p - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Half-open crossing rule so shared vertices are counted once
fn ray_crosses_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    if (a.y > p.y) == (b.y > p.y) {
        return false;
    }
    let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
    p.x < x
}

/// Counter-clockwise sweep in `(0, TAU]`
fn arc_sweep(start: f32, end: f32) -> f32 {
    let sweep = (end - start).rem_euclid(TAU);
    if sweep == 0.0 && end != start { TAU } else { sweep }
}

fn angle_in_sweep(angle: f32, start: f32, end: f32) -> bool {
    (angle - start).rem_euclid(TAU) <= arc_sweep(start, end)
}

fn arc_endpoints(center: Vec2, radius: f32, start: f32, end: f32) -> (Vec2, Vec2) {
    (
        center + Vec2::from_angle(start) * radius,
        center + Vec2::from_angle(end) * radius,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    // ------------------------------------------------------------------------
    // 2D distance and sign
    // ------------------------------------------------------------------------

    #[test]
    fn rectangle_distance_is_signed() {
        let r = Sketch::rectangle(Vec2::ZERO, Vec2::new(4.0, 2.0)).unwrap();
        assert_relative_eq!(r.distance(Vec2::ZERO), -1.0);
        assert_relative_eq!(r.distance(Vec2::new(5.0, 0.0)), 3.0);
        assert_relative_eq!(r.distance(Vec2::new(2.0, 0.5)), 0.0);
        assert_relative_eq!(r.distance(Vec2::new(1.5, 0.0)), -0.5);
    }

    #[test]
    fn triangle_parity() {
        let t = Sketch::polygon(&[Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)]).unwrap();
        assert!(t.contains(Vec2::new(1.0, 1.0)));
        assert!(!t.contains(Vec2::new(3.0, 3.0)));
        // Just above the bottom edge
        assert!(t.contains(Vec2::new(0.5, 0.0001)));
        assert!(!t.contains(Vec2::new(-1.0, 0.0001)));
    }

    #[test]
    fn open_sketch_is_unsigned() {
        let s = Sketch::new()
            .push(SketchElement::Line {
                start: Vec2::ZERO,
                end: Vec2::new(2.0, 0.0),
            })
            .unwrap();
        assert_relative_eq!(s.distance(Vec2::new(1.0, -3.0)), 3.0);
        assert_relative_eq!(s.distance(Vec2::new(1.0, 3.0)), 3.0);
    }

    #[test]
    fn circle_inside_a_rectangle_is_a_hole() {
        let plate = Sketch::rectangle(Vec2::ZERO, Vec2::new(10.0, 10.0))
            .unwrap()
            .push(SketchElement::Circle {
                center: Vec2::ZERO,
                radius: 2.0,
            })
            .unwrap();
        assert_relative_eq!(plate.distance(Vec2::ZERO), 2.0);
        assert_relative_eq!(plate.distance(Vec2::new(3.0, 0.0)), -1.0);
    }

    #[test]
    fn half_disc_from_line_and_arc() {
        // Left half of the unit disc
        let d = Sketch::new()
            .push(SketchElement::Line {
                start: Vec2::new(0.0, -1.0),
                end: Vec2::new(0.0, 1.0),
            })
            .unwrap()
            .push(SketchElement::Arc {
                center: Vec2::ZERO,
                radius: 1.0,
                start_angle: FRAC_PI_2,
                end_angle: PI + FRAC_PI_2,
            })
            .unwrap()
            .close();
        assert_relative_eq!(d.distance(Vec2::new(-0.5, 0.0)), -0.5, epsilon = 1e-5);
        assert!(d.distance(Vec2::new(0.5, 0.0)) > 0.0);
        assert!(d.distance(Vec2::new(-0.5, 0.6)) < 0.0);
        // Past the arc's end the nearest point is an endpoint
        assert_relative_eq!(d.distance(Vec2::new(1.0, 1.0)), 1.0, epsilon = 1e-5);

        let (min, max) = d.bounds().unwrap();
        assert_relative_eq!(min.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(max.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(max.y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn degenerate_elements_are_rejected() {
        assert!(Sketch::polygon(&[Vec2::ZERO, Vec2::X]).is_err());
        assert!(Sketch::circle(Vec2::ZERO, 0.0).is_err());
        assert!(Sketch::rectangle(Vec2::ZERO, Vec2::new(1.0, 0.0)).is_err());
        assert!(
            Sketch::new()
                .push(SketchElement::Line {
                    start: Vec2::ONE,
                    end: Vec2::ONE
                })
                .is_err()
        );
    }

    // ------------------------------------------------------------------------
    // Extrude and revolve
    // ------------------------------------------------------------------------

    #[test]
    fn extrude_has_flat_caps() {
        let r = Sketch::rectangle(Vec2::ZERO, Vec2::new(4.0, 2.0)).unwrap();
        let e = extrude(r, 3.0).unwrap();
        // Above the top cap, anywhere over the profile
        assert_relative_eq!(e.evaluate(Vec3::new(0.0, 0.0, 3.5)), 0.5);
        assert_relative_eq!(e.evaluate(Vec3::new(1.5, 0.5, 3.5)), 0.5);
        // Inside: nearest is the long side
        assert_relative_eq!(e.evaluate(Vec3::new(0.0, 0.0, 1.5)), -1.0);
        // Beyond the top edge
        assert_relative_eq!(
            e.evaluate(Vec3::new(3.0, 0.0, 4.0)),
            2.0f32.sqrt(),
            epsilon = 1e-6
        );
        let b = e.bounds().unwrap();
        assert_relative_eq!(b.min.z, 0.0);
        assert_relative_eq!(b.max.z, 3.0);
        assert_relative_eq!(b.max.x, 2.0);
    }

    #[test]
    fn revolve_square_profile_into_ring() {
        let profile = Sketch::rectangle(Vec2::new(3.0, 0.0), Vec2::new(2.0, 2.0)).unwrap();
        let ring = revolve(profile).unwrap();
        assert_relative_eq!(ring.evaluate(Vec3::new(3.0, 0.0, 0.0)), -1.0);
        assert_relative_eq!(ring.evaluate(Vec3::new(0.0, -3.0, 0.0)), -1.0, epsilon = 1e-6);
        assert_relative_eq!(ring.evaluate(Vec3::ZERO), 2.0);
        let b = ring.bounds().unwrap();
        assert_relative_eq!(b.max.x, 4.0);
        assert_relative_eq!(b.min.y, -4.0);
        assert_relative_eq!(b.max.z, 1.0);
    }

    #[test]
    fn lifting_requires_closed_non_empty_sketch() {
        let open = Sketch::new()
            .push(SketchElement::Line {
                start: Vec2::ZERO,
                end: Vec2::X,
            })
            .unwrap();
        assert!(extrude(open.clone(), 1.0).is_err());
        assert!(revolve(open).is_err());
        assert!(extrude(Sketch::new().close(), 1.0).is_err());
        let square = Sketch::rectangle(Vec2::ZERO, Vec2::ONE).unwrap();
        assert!(extrude(square, 0.0).is_err());
    }
}
