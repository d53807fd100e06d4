//! Trajectory planning and scan micro-benchmark.
//!
//! Measures:
//! - `TrajectoryEngine::plan` per profile family
//! - one READY scan of ten STD_ABS axes, every command pending

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use axisd_common::control_unit::state::ReferenceMode;
use axisd_control_unit::control::profile::{MoveRequest, ProfileFamily, TrajectoryEngine};
use axisd_control_unit::cycle::{ControlCore, CoreSettings};
use axisd_control_unit::protocol::codec::{Frames, encode_frame, push_fixed_point, push_i32s};
use axisd_control_unit::protocol::tag::Tag;
use axisd_hal::drivers::simulation::SimulationDriver;

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");
    for family in [
        ProfileFamily::Parabolic,
        ProfileFamily::MinimumJerk,
        ProfileFamily::EnergyOptimal,
    ] {
        let engine = TrajectoryEngine::new(family);
        let mut step = 0u64;
        group.bench_function(format!("{family:?}"), |b| {
            b.iter(|| {
                step += 1;
                let request = MoveRequest {
                    reference: ReferenceMode::Absolute,
                    value: (step % 2000) as f64,
                    set_point: 250.0,
                    default_distance: 1000.0,
                    default_duration: 1.0,
                };
                engine.plan(black_box(&request))
            });
        });
    }
    group.finish();
}

fn apply(core: &mut ControlCore, tag: Tag, payload: &[u8]) {
    let mut bytes = Vec::new();
    encode_frame(tag, payload, &mut bytes);
    for frame in Frames::new(&bytes) {
        let _ = core.apply_frame(&frame);
    }
}

fn bench_scan(c: &mut Criterion) {
    let mut core = ControlCore::new(
        Box::new(SimulationDriver::new()),
        None,
        CoreSettings::default(),
    );
    let mut types = Vec::new();
    push_i32s(&mut types, &[2; 10]);
    for axis in 0..10u8 {
        let name = format!("AX{axis}");
        let tag = Tag::from_u8(Tag::AxisName0 as u8 + axis).unwrap_or(Tag::AxisName0);
        apply(&mut core, tag, name.as_bytes());
    }
    apply(&mut core, Tag::AxisType, &types);
    apply(&mut core, Tag::SystemInit, &[]);
    core.tick();

    let mut targets = [0.0f32; 10];
    c.bench_function("scan_ten_axes", |b| {
        b.iter(|| {
            for target in &mut targets {
                *target = if *target == 100.0 { 200.0 } else { 100.0 };
            }
            let mut payload = Vec::with_capacity(40);
            push_fixed_point(&mut payload, &targets);
            apply(&mut core, Tag::CommandFloats, &payload);
            black_box(core.tick())
        });
    });
}

criterion_group!(benches, bench_plan, bench_scan);
criterion_main!(benches);
