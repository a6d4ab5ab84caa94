//! # Pursuit Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point2;

use ap_lib::pursuit;
use veh_if::{kin::VehicleKin, pose::PosPoint};

fn pursuit_benchmark(c: &mut Criterion) {
    // ---- Build a winding route ----

    // 200 waypoints along a sine wave, half a meter apart in x
    let route: Vec<PosPoint> = (0..200)
        .map(|i| {
            let x = i as f64 * 0.5;
            PosPoint {
                x_m: x,
                y_m: (x * 0.3).sin() * 2.0,
                speed_ms: 1.5,
                ..Default::default()
            }
        })
        .collect();

    let pose = PosPoint {
        x_m: 25.0,
        y_m: 1.0,
        yaw_deg: 15.0,
        ..Default::default()
    };

    let center = Point2::new(pose.x_m, pose.y_m);

    // Bench the pursuit circle intersection over the lookahead window
    c.bench_function("pursuit::goal_on_route", |b| {
        b.iter(|| pursuit::goal_on_route(&route, 49, 8, &center, 1.0))
    });

    // Bench the full whole-route scan, the worst case after a route reset
    c.bench_function("pursuit::goal_on_route::whole_route", |b| {
        b.iter(|| pursuit::goal_on_route(&route, 0, route.len(), &center, 1.0))
    });

    // Bench the curvature laws
    let goal = Point2::new(26.0, 1.5);

    c.bench_function("pursuit::curv_to_point_in_enu", |b| {
        b.iter(|| pursuit::curv_to_point_in_enu(&pose, &goal))
    });

    let kin = VehicleKin::Trailered {
        wheelbase_m: 0.32,
        trailer_wheelbase_m: 0.715,
    };
    let goal_vf = Point2::new(0.9, 0.4);

    c.bench_function("pursuit::curv_to_goal::trailered", |b| {
        b.iter(|| pursuit::curv_to_goal(&kin, &goal_vf, Some(0.1), 1.0, 1.5))
    });
}

criterion_group!(benches, pursuit_benchmark);
criterion_main!(benches);
