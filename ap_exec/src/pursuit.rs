//! # Pursuit geometry
//!
//! Pure computations used by the follower: curvature to a goal point (with
//! and without a trailer), goal selection on the route polyline, and speed
//! interpolation. Nothing in here touches the follower state, all functions
//! take their inputs explicitly and have no side effects.
//!
//! ## Frames and signs
//!
//! Points are either in the local ENU-like frame or in the vehicle frame
//! (vehicle at the origin, heading along +x, y to the left). Positive
//! curvature commands a turn to the right (clockwise viewed from above),
//! matching the steering sign convention in [`veh_if::dems::VehicleDems`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use nalgebra::{Point2, Rotation2, Vector2};

// Internal
use util::maths::{clamp, lin_map, wrap_to_pi};
use veh_if::{kin::VehicleKin, pose::PosPoint};

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// The horizontal position of a point as a `Point2`.
pub fn xy(point: &PosPoint) -> Point2<f64> {
    Point2::new(point.x_m, point.y_m)
}

/// Transform a point from the local frame into the vehicle frame given the
/// vehicle's pose.
pub fn enu_to_vehicle_frame(pose: &PosPoint, point: &Point2<f64>) -> Point2<f64> {
    let delta = point - xy(pose);

    Point2::from(Rotation2::new(-pose.yaw_rad()) * delta)
}

/// Curvature taking the vehicle to a point expressed in the vehicle frame.
///
/// This is the classic pure pursuit law `κ = 2·y / (x² + y²)`, negated to
/// match the steering sign convention (positive is a right-hand turn, so a
/// goal to the left demands negative curvature).
///
/// Singular at the origin: callers must guard against a goal coincident with
/// the vehicle.
pub fn curv_to_point_in_vehicle_frame(point: &Point2<f64>) -> f64 {
    let distance_squared = point.x.powi(2) + point.y.powi(2);

    -(2.0 * point.y) / distance_squared
}

/// Curvature taking the vehicle to a point expressed in the local frame.
pub fn curv_to_point_in_enu(pose: &PosPoint, point: &Point2<f64>) -> f64 {
    curv_to_point_in_vehicle_frame(&enu_to_vehicle_frame(pose, point))
}

/// Curvature taking a trailer-towing vehicle to a point expressed in the
/// vehicle frame.
///
/// The law steers the hitch angle towards a desired hitch angle derived from
/// the bearing error to the goal. Direction of travel selects both the
/// reference frame and the gain:
///
/// - forwards (`speed_ms > 0`) reasons from the vehicle's own pose with gain
///   `k = +1`,
/// - backwards reasons from the trailer's pose (projected back along the
///   hitch by the trailer wheelbase) with gain `k = -2.5`, and divides the
///   bearing term by the pursuit radius.
///
/// Forward steering dampens hitch-angle growth directly, reverse steering
/// must actively correct the jack-knife tendency, hence the sign and frame
/// asymmetry. The gains are tuned constants, not derived quantities.
///
/// `trailer_wheelbase_m` and `pursuit_radius_m` must be strictly positive.
pub fn curv_to_point_trailered(
    point: &Point2<f64>,
    hitch_angle_rad: f64,
    trailer_wheelbase_m: f64,
    pursuit_radius_m: f64,
    speed_ms: f64,
) -> f64 {
    let l2 = trailer_wheelbase_m;

    let desired_hitch_rad;
    let gain;

    if speed_ms > 0.0 {
        // Bearing error from the vehicle's heading (+x) to the goal
        let theta_err = point.y.atan2(point.x);

        desired_hitch_rad = (2.0 * l2 * theta_err.sin()).atan();
        gain = 1.0;
    } else {
        // Trailer pose in the vehicle frame, projected back along the hitch
        let trailer_yaw = -hitch_angle_rad;
        let trailer_pos = Point2::new(-l2 * trailer_yaw.cos(), -l2 * trailer_yaw.sin());

        // Bearing error from the trailer's heading to the goal
        let theta_err = wrap_to_pi(
            (point.y - trailer_pos.y).atan2(point.x - trailer_pos.x) - trailer_yaw,
        );

        desired_hitch_rad = (2.0 * l2 * theta_err.sin() / pursuit_radius_m).atan();
        gain = -2.5;
    }

    gain * (hitch_angle_rad - desired_hitch_rad) - hitch_angle_rad.sin() / l2
}

/// Curvature taking the vehicle to a point expressed in the vehicle frame,
/// selecting the curvature law from the vehicle's kinematic class.
///
/// `trailer_hitch_angle_rad` is only read for trailered vehicles, and a
/// missing measurement is treated as a straight trailer.
pub fn curv_to_goal(
    kin: &VehicleKin,
    point: &Point2<f64>,
    trailer_hitch_angle_rad: Option<f64>,
    pursuit_radius_m: f64,
    speed_ms: f64,
) -> f64 {
    match *kin {
        VehicleKin::Ackermann { .. } | VehicleKin::Differential => {
            curv_to_point_in_vehicle_frame(point)
        }
        VehicleKin::Trailered {
            trailer_wheelbase_m,
            ..
        } => curv_to_point_trailered(
            point,
            trailer_hitch_angle_rad.unwrap_or(0.0),
            trailer_wheelbase_m,
            pursuit_radius_m,
            speed_ms,
        ),
    }
}

/// Intersect the pursuit circle with the route polyline and return the
/// intersection furthest along the route, together with the index of the
/// segment it lies on.
///
/// Segments are scanned from `start_segment` (the segment from waypoint
/// `start_segment` to `start_segment + 1`) over at most `max_segments`
/// segments. Within a segment the intersection further along the segment
/// wins, across segments the later segment wins. `None` is returned when the
/// circle does not cross any scanned segment.
pub fn goal_on_route(
    points: &[PosPoint],
    start_segment: usize,
    max_segments: usize,
    center: &Point2<f64>,
    radius_m: f64,
) -> Option<(Point2<f64>, usize)> {
    if points.len() < 2 {
        return None;
    }

    let end_segment = (start_segment + max_segments).min(points.len() - 1);

    let mut goal: Option<(Point2<f64>, usize)> = None;

    for i in start_segment..end_segment {
        let a = xy(&points[i]);
        let b = xy(&points[i + 1]);

        // Quadratic in t for |a + t·(b - a) - center| = radius
        let d: Vector2<f64> = b - a;
        let f: Vector2<f64> = a - center;

        let qa = d.dot(&d);

        // Skip zero-length segments
        if qa < 1e-12 {
            continue;
        }

        let qb = 2.0 * f.dot(&d);
        let qc = f.dot(&f) - radius_m.powi(2);

        let discriminant = qb.powi(2) - 4.0 * qa * qc;

        if discriminant < 0.0 {
            continue;
        }

        let sqrt_disc = discriminant.sqrt();

        // Prefer the larger root, it lies further along the segment
        let mut t = (-qb + sqrt_disc) / (2.0 * qa);
        if !(0.0..=1.0).contains(&t) {
            t = (-qb - sqrt_disc) / (2.0 * qa);
        }
        if !(0.0..=1.0).contains(&t) {
            continue;
        }

        goal = Some((a + d * t, i));
    }

    goal
}

/// Target speed at a goal lying on the segment between two waypoints,
/// linearly interpolated between the waypoints' target speeds by the goal's
/// distance along the segment.
///
/// At (or beyond) either end of the segment the corresponding waypoint's
/// speed is returned. A degenerate zero-length segment returns the next
/// waypoint's speed.
pub fn interpolated_speed(goal: &Point2<f64>, last_wp: &PosPoint, next_wp: &PosPoint) -> f64 {
    let segment_length_m = last_wp.distance_2d_to(next_wp);

    if segment_length_m < 1e-9 {
        return next_wp.speed_ms;
    }

    // Distance of the goal back along the segment from the next waypoint:
    // zero at the next waypoint, the full segment length at the last
    let dist_m = clamp(&(goal - xy(next_wp)).norm(), &0.0, &segment_length_m);

    lin_map(
        (0.0, segment_length_m),
        (next_wp.speed_ms, last_wp.speed_ms),
        dist_m,
    )
}

/// Approach speed towards a follow-point target at the given distance.
///
/// Full speed from twice the standoff distance outwards, ramping linearly
/// down to zero at (and inside) the standoff distance. A zero standoff
/// disables the ramp.
pub fn follow_point_speed(distance_m: f64, standoff_m: f64, full_speed_ms: f64) -> f64 {
    if standoff_m <= 0.0 {
        return full_speed_ms;
    }

    // Linear ramp from zero at the standoff up to full speed at twice the
    // standoff
    let speed_ms = lin_map(
        (standoff_m, 2.0 * standoff_m),
        (0.0, full_speed_ms),
        distance_m,
    );

    clamp(&speed_ms, &0.0, &full_speed_ms)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn wp(x_m: f64, y_m: f64, speed_ms: f64) -> PosPoint {
        PosPoint {
            x_m,
            y_m,
            speed_ms,
            ..Default::default()
        }
    }

    #[test]
    fn test_curv_sign_convention() {
        // Goal ahead-left demands a left (negative) turn
        assert!(curv_to_point_in_vehicle_frame(&Point2::new(1.0, 1.0)) < 0.0);

        // Goal ahead-right demands a right (positive) turn
        assert!(curv_to_point_in_vehicle_frame(&Point2::new(1.0, -1.0)) > 0.0);

        // Goal straight ahead demands no turn at all
        assert_eq!(curv_to_point_in_vehicle_frame(&Point2::new(2.0, 0.0)), 0.0);

        // Goal one meter to the left: curvature magnitude 2/d² = 2
        assert!(
            (curv_to_point_in_vehicle_frame(&Point2::new(0.0, 1.0)) + 2.0).abs() < 1e-12
        );
    }

    #[test]
    fn test_curv_enu_agrees_with_vehicle_frame() {
        // Vehicle at (3, -2) facing +y (yaw 90°). A goal at (2, -1) in the
        // local frame is at (1, 1) in the vehicle frame.
        let pose = PosPoint {
            x_m: 3.0,
            y_m: -2.0,
            yaw_deg: 90.0,
            ..Default::default()
        };

        let vf = enu_to_vehicle_frame(&pose, &Point2::new(2.0, -1.0));
        assert!((vf.x - 1.0).abs() < 1e-9);
        assert!((vf.y - 1.0).abs() < 1e-9);

        let curv_enu = curv_to_point_in_enu(&pose, &Point2::new(2.0, -1.0));
        let curv_vf = curv_to_point_in_vehicle_frame(&Point2::new(1.0, 1.0));
        assert!((curv_enu - curv_vf).abs() < 1e-9);
    }

    #[test]
    fn test_trailer_law_continuity() {
        let l2 = 0.715;
        let radius = 1.0;

        // Straight trailer, goal on the axis of travel: no steering at all
        assert!(
            curv_to_point_trailered(&Point2::new(5.0, 0.0), 0.0, l2, radius, 1.0).abs()
                < 1e-12
        );
        assert!(
            curv_to_point_trailered(&Point2::new(-5.0, 0.0), 0.0, l2, radius, -1.0).abs()
                < 1e-12
        );

        // Bent hitch with zero bearing error: only the hitch terms remain.
        // Forwards the gain is +1...
        let hitch = 0.1;
        let curv =
            curv_to_point_trailered(&Point2::new(5.0, 0.0), hitch, l2, radius, 1.0);
        assert!((curv - (hitch - hitch.sin() / l2)).abs() < 1e-12);

        // ...and backwards, with the goal on the trailer's own axis, -2.5
        let trailer_yaw = -hitch;
        let goal = Point2::new(
            -l2 * trailer_yaw.cos() + 5.0 * trailer_yaw.cos(),
            -l2 * trailer_yaw.sin() + 5.0 * trailer_yaw.sin(),
        );
        let curv = curv_to_point_trailered(&goal, hitch, l2, radius, -1.0);
        assert!((curv - (-2.5 * hitch - hitch.sin() / l2)).abs() < 1e-12);
    }

    #[test]
    fn test_trailer_radius_only_affects_reverse() {
        let l2 = 0.715;
        let goal = Point2::new(2.0, 1.5);
        let hitch = 0.2;

        let fwd_r1 = curv_to_point_trailered(&goal, hitch, l2, 1.0, 1.0);
        let fwd_r2 = curv_to_point_trailered(&goal, hitch, l2, 2.0, 1.0);
        assert_eq!(fwd_r1, fwd_r2);

        let rev_r1 = curv_to_point_trailered(&goal, hitch, l2, 1.0, -1.0);
        let rev_r2 = curv_to_point_trailered(&goal, hitch, l2, 2.0, -1.0);
        assert!((rev_r1 - rev_r2).abs() > 1e-6);
    }

    #[test]
    fn test_curv_dispatch_by_kinematics() {
        let goal = Point2::new(2.0, 1.0);

        let plain = curv_to_goal(
            &VehicleKin::Ackermann { wheelbase_m: 0.32 },
            &goal,
            None,
            1.0,
            1.0,
        );
        assert_eq!(plain, curv_to_point_in_vehicle_frame(&goal));
        assert_eq!(
            curv_to_goal(&VehicleKin::Differential, &goal, None, 1.0, 1.0),
            plain
        );

        let trailered = curv_to_goal(
            &VehicleKin::Trailered {
                wheelbase_m: 0.32,
                trailer_wheelbase_m: 0.715,
            },
            &goal,
            Some(0.1),
            1.0,
            1.0,
        );
        assert_eq!(
            trailered,
            curv_to_point_trailered(&goal, 0.1, 0.715, 1.0, 1.0)
        );
    }

    #[test]
    fn test_goal_on_route_lies_on_circle() {
        let points = [wp(0.0, 0.0, 1.0), wp(10.0, 0.0, 1.0)];
        let center = Point2::new(2.0, 0.5);

        let (goal, segment) = goal_on_route(&points, 0, 8, &center, 1.0).unwrap();

        assert_eq!(segment, 0);
        assert!(goal.y.abs() < 1e-12);
        // The goal sits on the pursuit circle...
        assert!(((goal - center).norm() - 1.0).abs() < 1e-9);
        // ...on the far side of the vehicle (the larger root)
        assert!(goal.x > center.x);
    }

    #[test]
    fn test_goal_on_route_prefers_furthest_segment() {
        let points = [wp(0.0, 0.0, 1.0), wp(2.0, 0.0, 1.0), wp(2.0, 2.0, 1.0)];
        let center = Point2::new(2.0, 0.0);

        // Both segments cross the circle, the goal must lie on the later one
        let (goal, segment) = goal_on_route(&points, 0, 8, &center, 1.0).unwrap();
        assert_eq!(segment, 1);
        assert!((goal.x - 2.0).abs() < 1e-9);
        assert!((goal.y - 1.0).abs() < 1e-9);

        // With the window capped to one segment only the first is scanned
        let (goal, segment) = goal_on_route(&points, 0, 1, &center, 1.0).unwrap();
        assert_eq!(segment, 0);
        assert!((goal.x - 1.0).abs() < 1e-9);

        // A circle crossing nothing yields no goal
        assert!(goal_on_route(&points, 0, 8, &Point2::new(50.0, 50.0), 1.0).is_none());
    }

    #[test]
    fn test_interpolated_speed() {
        let last = wp(0.0, 0.0, 1.0);
        let next = wp(4.0, 0.0, 3.0);

        assert!((interpolated_speed(&Point2::new(0.0, 0.0), &last, &next) - 1.0).abs() < 1e-9);
        assert!((interpolated_speed(&Point2::new(4.0, 0.0), &last, &next) - 3.0).abs() < 1e-9);
        assert!((interpolated_speed(&Point2::new(2.0, 0.0), &last, &next) - 2.0).abs() < 1e-9);

        // Degenerate segment falls back to the next waypoint's speed
        let there = wp(1.0, 1.0, 2.5);
        assert_eq!(
            interpolated_speed(&Point2::new(1.0, 1.0), &there, &there),
            2.5
        );
    }

    #[test]
    fn test_follow_point_speed_ramp() {
        // Zero inside the standoff, linear ramp up to twice the standoff
        assert_eq!(follow_point_speed(0.0, 3.0, 2.0), 0.0);
        assert_eq!(follow_point_speed(3.0, 3.0, 2.0), 0.0);
        assert!((follow_point_speed(4.5, 3.0, 2.0) - 1.0).abs() < 1e-9);
        assert!((follow_point_speed(6.0, 3.0, 2.0) - 2.0).abs() < 1e-9);
        assert_eq!(follow_point_speed(9.0, 3.0, 2.0), 2.0);

        // A zero standoff disables the ramp entirely
        assert_eq!(follow_point_speed(0.5, 0.0, 2.0), 2.0);
    }
}
