// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sampler - turns normalized segments into ordered point sequences
//!
//! Every parent curve is first evaluated in a local frame (origin at the
//! segment start, heading 0) and then placed with the segment placement.
//! Reversed segments (negative signed length) traverse their parent curve
//! backwards, which flips the sign of the travelled curvature.

use crate::classifier::PatternKind;
use crate::config::SamplingConfig;
use crate::model::{CurveKind, PlanPoint, ProfilePoint, Segment};
use nalgebra::{Point2, Rotation2, Vector2};

/// Position tolerance for shared segment joints
const JOINT_EPSILON: f64 = 1e-6;

/// Below this heading change a spiral is evaluated as an arc
const SPIRAL_FLAT_LIMIT: f64 = 1e-9;

/// Local state along a parent curve, relative to the segment start
#[derive(Debug, Clone, Copy, PartialEq)]
struct LocalState {
    position: Vector2<f64>,
    heading: f64,
    curvature: f64,
}

impl LocalState {
    fn straight(u: f64) -> Self {
        Self {
            position: Vector2::new(u, 0.0),
            heading: 0.0,
            curvature: 0.0,
        }
    }
}

/// Constant curvature `k` over arc length `u`
fn arc(k: f64, u: f64) -> LocalState {
    if k.abs() < 1e-12 {
        return LocalState::straight(u);
    }
    let angle = k * u;
    LocalState {
        position: Vector2::new(angle.sin() / k, (1.0 - angle.cos()) / k),
        heading: angle,
        curvature: k,
    }
}

/// Curvature `k0 + k1 * u` over arc length `u`, via Fresnel integrals
fn spiral(k0: f64, k1: f64, u: f64) -> LocalState {
    if k1 < 0.0 {
        let mirrored = spiral(-k0, -k1, u);
        return LocalState {
            position: Vector2::new(mirrored.position.x, -mirrored.position.y),
            heading: -mirrored.heading,
            curvature: -mirrored.curvature,
        };
    }

    let alpha = 0.5 * k1;
    let heading = k0 * u + alpha * u * u;
    let curvature = k0 + k1 * u;
    if alpha * u * u < SPIRAL_FLAT_LIMIT {
        let mut state = arc(k0 + alpha * u, u);
        state.heading = heading;
        state.curvature = curvature;
        return state;
    }

    // heading = alpha * (u + shift)^2 + delta
    let shift = k0 / (2.0 * alpha);
    let delta = -k0 * k0 / (4.0 * alpha);
    let scale = (2.0 * alpha / std::f64::consts::PI).sqrt();
    let (s0, c0) = fresnel::fresnl(scale * shift);
    let (s1, c1) = fresnel::fresnl(scale * (u + shift));
    let fac = (std::f64::consts::PI / (2.0 * alpha)).sqrt();
    let (sin_d, cos_d) = delta.sin_cos();

    LocalState {
        position: Vector2::new(
            fac * ((c1 - c0) * cos_d - (s1 - s0) * sin_d),
            fac * ((s1 - s0) * cos_d + (c1 - c0) * sin_d),
        ),
        heading,
        curvature,
    }
}

/// Value, first and second derivative of a polynomial at `t`
fn polynomial(coefficients: &[f64], t: f64) -> (f64, f64, f64) {
    let mut value = 0.0;
    let mut d1 = 0.0;
    let mut d2 = 0.0;
    for &c in coefficients.iter().rev() {
        d2 = d2 * t + 2.0 * d1;
        d1 = d1 * t + value;
        value = value * t + c;
    }
    (value, d1, d2)
}

/// Local state of a segment's parent curve at distance `u` from its start
fn local_state(segment: &Segment, u: f64) -> Option<LocalState> {
    let sign = segment.traversal_sign();
    let state = match &segment.kind {
        CurveKind::Line => LocalState::straight(u),
        CurveKind::Circle { radius } => arc(sign / radius, u),
        CurveKind::Clothoid { constant } => {
            // Parent curvature is t / (A * |A|) at parameter t
            let rate = 1.0 / (constant * constant.abs());
            spiral(sign * segment.segment_start * rate, rate, u)
        }
        CurveKind::Polynomial {
            coefficients_x,
            coefficients_y,
        } => {
            let t0 = segment.segment_start;
            let t = t0 + sign * u;
            let (x0, dx0, _) = polynomial(coefficients_x, t0);
            let (y0, dy0, _) = polynomial(coefficients_y, t0);
            let (x, dx, ddx) = polynomial(coefficients_x, t);
            let (y, dy, ddy) = polynomial(coefficients_y, t);

            // Turn the parent frame so the start tangent lies on +x
            let start_heading = if dx0.hypot(dy0) > f64::EPSILON {
                (sign * dy0).atan2(sign * dx0)
            } else {
                0.0
            };
            let unturn = Rotation2::new(-start_heading);
            let tangent = unturn * Vector2::new(sign * dx, sign * dy);
            let speed = dx.hypot(dy);
            LocalState {
                position: unturn * Vector2::new(x - x0, y - y0),
                heading: tangent.y.atan2(tangent.x),
                curvature: if speed > f64::EPSILON {
                    sign * (dx * ddy - dy * ddx) / speed.powi(3)
                } else {
                    0.0
                },
            }
        }
        CurveKind::Unknown => return None,
    };
    Some(state)
}

/// Place a local state with the segment's start point and heading
fn place(segment: &Segment, heading: f64, state: LocalState) -> (Point2<f64>, f64) {
    let origin = Point2::new(segment.start_point[0], segment.start_point[1]);
    let rotation = Rotation2::new(heading);
    (origin + rotation * state.position, heading + state.heading)
}

/// Plan position, heading and curvature at distance `u` into a horizontal segment
pub fn plan_state(segment: &Segment, u: f64) -> Option<(Point2<f64>, f64, f64)> {
    let state = local_state(segment, u)?;
    let (point, heading) = place(segment, segment.start_direction, state);
    Some((point, heading, state.curvature))
}

/// Profile point at distance `u` into a vertical segment.
///
/// Lines and polynomials are parameterized by horizontal distance; circles
/// and clothoids are plane curves in (distance, elevation) by arc length.
pub fn profile_state(
    segment: &Segment,
    u: f64,
    pattern: Option<PatternKind>,
) -> Option<ProfilePoint> {
    let [d0, z0] = segment.start_point;
    match &segment.kind {
        CurveKind::Line => Some(ProfilePoint {
            distance_along: d0 + u,
            elevation: z0 + u * segment.start_direction,
            slope: segment.start_direction,
        }),
        CurveKind::Polynomial { coefficients_y, .. } => {
            let base = if pattern == Some(PatternKind::Civil3d) {
                0.0
            } else {
                z0
            };
            let (value, slope, _) = polynomial(coefficients_y, u);
            Some(ProfilePoint {
                distance_along: d0 + u,
                elevation: base + value,
                slope,
            })
        }
        CurveKind::Circle { .. } | CurveKind::Clothoid { .. } => {
            let state = local_state(segment, u)?;
            let (point, heading) = place(segment, segment.start_direction.atan(), state);
            Some(ProfilePoint {
                distance_along: point.x,
                elevation: point.y,
                slope: heading.tan(),
            })
        }
        CurveKind::Unknown => None,
    }
}

/// Sample a horizontal segment with `count` points (at least two)
pub fn sample_plan(segment: &Segment, count: usize) -> Vec<PlanPoint> {
    if !segment.is_resolved() {
        return Vec::new();
    }
    parameters(segment.length, count)
        .filter_map(|u| {
            let (point, _, curvature) = plan_state(segment, u)?;
            Some(PlanPoint {
                distance_along: segment.start_distance_along + u,
                x: point.x,
                y: point.y,
                curvature,
            })
        })
        .collect()
}

/// Sample a vertical segment with `count` points (at least two)
pub fn sample_profile(
    segment: &Segment,
    count: usize,
    pattern: Option<PatternKind>,
) -> Vec<ProfilePoint> {
    if !segment.is_resolved() {
        return Vec::new();
    }
    parameters(segment.length, count)
        .filter_map(|u| profile_state(segment, u, pattern))
        .collect()
}

/// `count` evenly spaced parameters over `[0, length]`, both ends exact
fn parameters(length: f64, count: usize) -> impl Iterator<Item = f64> {
    let count = count.max(2);
    let last = count - 1;
    (0..count).map(move |i| {
        if i == last {
            length
        } else {
            length * i as f64 / last as f64
        }
    })
}

/// Split a curve's point budget across its segments by length.
///
/// The budget is capped at `max_point_budget`. Unresolved segments get no
/// points; resolved ones get at least the configured minimum for their kind.
pub fn point_counts(segments: &[Segment], config: &SamplingConfig) -> Vec<usize> {
    let total: f64 = segments
        .iter()
        .filter(|s| s.is_resolved())
        .map(|s| s.length)
        .sum();

    segments
        .iter()
        .map(|segment| {
            if !segment.is_resolved() {
                return 0;
            }
            let minimum = if segment.kind.is_curved() {
                config.min_curve_points
            } else {
                config.min_line_points
            }
            .max(2);
            let share = if total > 0.0 {
                (config.budget() as f64 * segment.length / total).round() as usize
            } else {
                0
            };
            share.max(minimum)
        })
        .collect()
}

/// Sampled point that can be joined to a neighbour's sequence
pub trait Sample: Copy {
    fn distance_along(&self) -> f64;

    /// Same location as `other` within the joint tolerance
    fn coincides(&self, other: &Self) -> bool;
}

impl Sample for PlanPoint {
    fn distance_along(&self) -> f64 {
        self.distance_along
    }

    fn coincides(&self, other: &Self) -> bool {
        (self.distance_along - other.distance_along).abs() < JOINT_EPSILON
            && (self.x - other.x).hypot(self.y - other.y) < JOINT_EPSILON
    }
}

impl Sample for ProfilePoint {
    fn distance_along(&self) -> f64 {
        self.distance_along
    }

    fn coincides(&self, other: &Self) -> bool {
        (self.distance_along - other.distance_along).abs() < JOINT_EPSILON
            && (self.elevation - other.elevation).abs() < JOINT_EPSILON
    }
}

/// Append a segment's samples, dropping a first point that repeats the joint
pub fn append_joined<P: Sample>(points: &mut Vec<P>, segment_points: Vec<P>) {
    let mut iter = segment_points.into_iter().peekable();
    if let (Some(last), Some(first)) = (points.last(), iter.peek()) {
        if last.coincides(first) {
            iter.next();
        }
    }
    points.extend(iter);
}
