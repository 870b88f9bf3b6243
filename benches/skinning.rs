//! Skinning & playback benchmarks
//!
//! - CPU skinning throughput for growing vertex counts
//! - One manager update (sample, blend, pose resolve) for a 64-joint chain

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use glam::{Affine3A, Quat, Vec3};

use sinew::animation::{
    AnimationClip, AnimationManager, ClipSource, SimpleAnimationApplier, TransformChannel,
};
use sinew::settings::ClipPlayback;
use sinew::skeleton::{Joint, Skeleton, SkeletonPose};
use sinew::skinning::{MeshData, SkinnedMesh, VertexBuffer};
use sinew::utils::time::ManualClock;

const JOINTS: usize = 64;

fn chain_skeleton() -> Arc<Skeleton> {
    let joints = (0..JOINTS)
        .map(|i| {
            Joint::new(format!("j{i}"), i, i.checked_sub(1))
                .with_bind_pose(Affine3A::from_translation(Vec3::Y * i as f32))
        })
        .collect();
    Arc::new(Skeleton::new("bench", joints).expect("valid chain"))
}

fn posed(skeleton: &Arc<Skeleton>) -> SkeletonPose {
    let mut pose = SkeletonPose::new(skeleton.clone());
    for (i, local) in pose.local_joint_transforms_mut().iter_mut().enumerate() {
        *local = Affine3A::from_rotation_translation(
            Quat::from_rotation_z(0.01 * i as f32),
            if i == 0 { Vec3::ZERO } else { Vec3::Y },
        );
    }
    pose.update_transforms();
    pose
}

fn skin(vertex_count: usize) -> SkinnedMesh {
    let points: Vec<Vec3> = (0..vertex_count)
        .map(|i| Vec3::new((i % 7) as f32, (i % JOINTS) as f32, 0.5))
        .collect();
    let joints = (0..vertex_count)
        .map(|i| {
            let j = (i % JOINTS) as u16;
            [j, (j + 1) % JOINTS as u16, 0, 0]
        })
        .collect();
    let weights = vec![[0.6, 0.4, 0.0, 0.0]; vertex_count];
    let bind = MeshData::new(
        VertexBuffer::from_points(&points),
        Some(VertexBuffer::from_points(&vec![Vec3::Z; vertex_count])),
    );
    SkinnedMesh::new("bench", bind, joints, weights).expect("consistent skin")
}

fn bench_cpu_skinning(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_skinning");
    let pose = posed(&chain_skeleton());

    for vertex_count in [1_000, 10_000, 50_000] {
        let mut mesh = skin(vertex_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(vertex_count),
            &vertex_count,
            |b, _| b.iter(|| mesh.apply_pose(black_box(&pose))),
        );
    }

    group.finish();
}

fn bench_manager_update(c: &mut Criterion) {
    let skeleton = chain_skeleton();
    let times = vec![0.0, 0.5, 1.0];
    let channels = (0..JOINTS)
        .map(|i| {
            TransformChannel::joint(
                i,
                times.clone(),
                vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_x(0.2),
                    Quat::IDENTITY,
                ],
                vec![Vec3::Y; 3],
                vec![Vec3::ONE; 3],
            )
            .expect("valid channel")
            .into()
        })
        .collect();
    let clip = Arc::new(AnimationClip::new("sway", channels));

    let clock = Arc::new(ManualClock::new(0.0));
    let mut manager = AnimationManager::new(clock.clone(), SkeletonPose::new(skeleton));
    manager.set_applier(SimpleAnimationApplier::new());
    manager.add_clip(clip.clone());
    manager.set_blend_root(ClipSource::new(clip.clone()).into());
    manager.configure_clip(&clip, &ClipPlayback::looping());

    c.bench_function("manager_update_64_joints", |b| {
        b.iter(|| {
            clock.advance(1.0 / 60.0);
            manager.update().expect("applier is set");
        });
    });
}

criterion_group!(benches, bench_cpu_skinning, bench_manager_update);
criterion_main!(benches);
