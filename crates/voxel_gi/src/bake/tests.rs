//! Pipeline-level tests running real scenes through the CPU device

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_abs_diff_eq;

use crate::bake::{
    BakeContext, BakePipeline, BounceLightSolver, BufferCombinator, DirectLight, EnvironmentLight, NullObserver,
    SceneVolumes,
};
use crate::capture::{CaptureAxis, OverdrawPolicy, SliceChannel, SliceRasterizer};
use crate::compute::{slots, ComputeKernel, CpuDevice, DispatchContext, KernelLibrary, KernelParams, Uniforms};
use crate::core::{
    BakeError, BakeResult, BakeSettings, BakeStage, CombineMode, DeviceSettings, LightingSettings, OutputSettings,
    VolumeSettings,
};
use crate::foundation::math::{Transform, UVec3, Vec3, Vec4};
use crate::kernels::{VoxelizeSliceKernel, DIRECT_SURFACE, GAUSSIAN_BLUR, VOXELIZE_SLICE};
use crate::meta::{MetaBufferProvider, SurfaceMetaProvider};
use crate::scene::{EnvironmentMap, Material, Mesh, Renderable, Scene, SceneLight};
use crate::volume::io::read_volume;
use crate::volume::{AccumulationBuffer, BakeManifest, Volume, VolumeGrid, VolumeRole};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("voxel_gi_bake_{}_{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn provider() -> SurfaceMetaProvider {
    SurfaceMetaProvider::new(16)
}

/// Small cube filling the middle of one voxel of a unit-voxel grid
fn voxel_cube(name: &str, grid: &VolumeGrid, coord: UVec3, material: Material) -> Renderable {
    Renderable::new(
        name,
        Arc::new(Mesh::cuboid(Vec3::repeat(0.25))),
        material,
        Transform::from_position(grid.voxel_center(&coord)),
    )
}

/// Settings for a `resolution`^3 grid of unit voxels centered at the origin
fn settings(resolution: u32, tag: &str) -> BakeSettings {
    BakeSettings::new()
        .with_volume(VolumeSettings::new(Vec3::zeros(), Vec3::repeat(resolution as f32), 1.0))
        .with_lighting(LightingSettings::default().with_bounces(1).with_samples(4).with_seed(7))
        .with_output(OutputSettings::new(scratch_dir(tag), "test"))
}

fn pipeline(settings: BakeSettings) -> BakePipeline {
    BakePipeline::new(settings).unwrap().with_observer(Box::new(NullObserver))
}

#[test]
fn test_two_cubed_volume_lights_only_the_occupied_voxel() {
    let settings = settings(2, "two_cubed");
    let grid = settings.volume.grid(None).unwrap();
    let origin = UVec3::new(0, 0, 0);

    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, origin, Material::diffuse(Vec3::repeat(1.0))));
    // the +X capture runs first, so the voxel keeps the normal of the -X face
    scene.add_light(SceneLight::directional(Vec3::new(1.0, -1.0, -1.0), Vec3::repeat(1.0), 1.0));

    let mut pipeline = pipeline(settings);
    let volumes = pipeline.voxelize(&scene, &provider()).unwrap();
    assert_eq!(volumes.occupied_count(), 1);
    assert!(volumes.albedo.is_occupied(&origin));

    let direct = pipeline.solve_direct(&scene).unwrap();
    let lit = direct.surface.get(&origin);
    assert!(lit.x > 0.0 && lit.y > 0.0 && lit.z > 0.0);
    assert_abs_diff_eq!(lit.w, 1.0);
    for index in 1..direct.surface.len() {
        assert_eq!(direct.surface.texels()[index], Vec4::zeros(), "voxel {index}");
    }
}

#[test]
fn test_zero_lights_leaves_only_emission() {
    let settings = settings(3, "emission");
    let grid = settings.volume.grid(None).unwrap();
    let glowing = UVec3::new(1, 2, 0);

    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube(
        "lamp",
        &grid,
        glowing,
        Material::diffuse(Vec3::repeat(0.5)).with_emission(Vec3::new(1.0, 0.5, 0.0), 2.0),
    ));

    let mut pipeline = pipeline(settings);
    pipeline.voxelize(&scene, &provider()).unwrap();
    let direct = pipeline.solve_direct(&scene).unwrap();

    assert_abs_diff_eq!(direct.surface.get(&glowing), Vec4::new(2.0, 1.0, 0.0, 1.0), epsilon = 1e-3);
    assert_eq!(direct.surface.occupied_count(), 1);
    let volumetric = direct.volumetric.as_ref().unwrap();
    for texel in volumetric.texels() {
        assert_eq!(texel.xyz(), Vec3::zeros());
        assert_eq!(texel.w, 1.0);
    }
}

#[test]
fn test_single_voxel_lands_at_its_coordinate_on_every_axis() {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::new(3.0, 4.0, 5.0), UVec3::new(3, 4, 5)).unwrap();
    let provider = provider();

    for coord in [UVec3::new(0, 1, 2), UVec3::new(2, 0, 4), UVec3::new(1, 3, 0)] {
        let renderable = voxel_cube("marker", &grid, coord, Material::diffuse(Vec3::repeat(1.0)));
        let metas = vec![provider.extract(&renderable).unwrap()];

        for axis in CaptureAxis::ALL {
            let rasterizer = SliceRasterizer::new(axis, &grid, &metas);
            let mut slice = rasterizer.new_slice();
            let mut target = AccumulationBuffer::new(grid.resolution);

            for layer in 0..axis.layers(&grid.resolution) {
                rasterizer.render(layer, &mut slice);
                let params = KernelParams {
                    capture_axis: axis,
                    capture_layer: layer,
                    overdraw: OverdrawPolicy::FirstWriteWins,
                    channel: SliceChannel::Albedo,
                    ..KernelParams::default()
                };
                let mut ctx = DispatchContext::new(Uniforms::for_grid(&grid), &mut target)
                    .with_params(params)
                    .with_slice(&slice);
                VoxelizeSliceKernel.execute(&mut ctx).unwrap();
            }

            let volume = target.into_volume();
            assert_eq!(volume.occupied_count(), 1, "{axis:?} at {coord:?}");
            assert!(volume.is_occupied(&coord), "{axis:?} misplaced {coord:?}");
        }
    }
}

#[test]
fn test_first_write_wins_and_blend_through_the_voxelizer() {
    let coord = UVec3::new(1, 1, 1);
    let mut first = settings(3, "overdraw_first");
    let grid = first.volume.grid(None).unwrap();
    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, coord, Material::diffuse(Vec3::new(0.2, 0.4, 0.6))));

    first.voxelize = first.voxelize.clone().with_overdraw(OverdrawPolicy::FirstWriteWins);
    let mut pipeline_first = pipeline(first.clone());
    let volumes = pipeline_first.voxelize(&scene, &provider()).unwrap();
    // +X sees the -X face first
    assert_abs_diff_eq!(volumes.normal.get(&coord), Vec4::new(-1.0, 0.0, 0.0, 1.0), epsilon = 1e-3);

    let mut blend = first;
    blend.voxelize = blend.voxelize.clone().with_overdraw(OverdrawPolicy::Blend);
    let mut pipeline_blend = pipeline(blend);
    let volumes = pipeline_blend.voxelize(&scene, &provider()).unwrap();
    // every axis sees the opposite face of its partner, the mean cancels
    assert_abs_diff_eq!(volumes.normal.get(&coord), Vec4::new(0.0, 0.0, 0.0, 1.0), epsilon = 1e-3);
    assert_abs_diff_eq!(volumes.albedo.get(&coord).x, 0.2, epsilon = 1.0 / 255.0);
    assert_eq!(volumes.occupied_count(), 1);
}

#[test]
fn test_throttle_drains_every_window() {
    let mut settings = settings(3, "throttle");
    settings.device = DeviceSettings::default().with_readback_limit(3).with_watchdog(Some(3));
    settings.lighting.bounce_surface_samples = 7;
    settings.lighting.volumetric = false;
    let grid = settings.volume.grid(None).unwrap();

    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, UVec3::new(1, 0, 1), Material::default()));
    scene.add_light(SceneLight::directional(-Vec3::y(), Vec3::repeat(1.0), 1.0));

    let mut pipeline = pipeline(settings);
    pipeline.voxelize(&scene, &provider()).unwrap();
    pipeline.solve_direct(&scene).unwrap();

    let drains = pipeline.context().scheduler().drains();
    let dispatches = pipeline.context().device_stats().dispatches;
    pipeline.solve_bounce().unwrap();

    // 7 samples with a window of 3: two full windows and the final drain
    assert_eq!(pipeline.context().device_stats().dispatches - dispatches, 7);
    assert_eq!(pipeline.context().scheduler().drains() - drains, 3);
    assert!(pipeline.context().device_stats().max_pending <= 3);
}

#[test]
fn test_watchdog_fires_without_throttle() {
    let mut settings = settings(4, "watchdog");
    settings.device = DeviceSettings::default().with_readback_limit(64).with_watchdog(Some(4));
    let grid = settings.volume.grid(None).unwrap();

    let mut scene = Scene::new();
    scene.add_renderable(Renderable::new(
        "block",
        Arc::new(Mesh::cuboid(Vec3::repeat(1.0))),
        Material::default(),
        Transform::from_position(grid.center),
    ));

    let mut pipeline = pipeline(settings);
    let err = pipeline.voxelize(&scene, &provider()).unwrap_err();
    assert!(matches!(err, BakeError::DeviceLost { limit: 4, .. }), "{err}");
    assert!(pipeline.volumes().is_none());
}

#[test]
fn test_missing_kernel_aborts_before_dispatch() {
    let mut library = KernelLibrary::builtin();
    library.remove(VOXELIZE_SLICE);
    let settings = settings(2, "missing_voxelize");
    let grid = settings.volume.grid(None).unwrap();
    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, UVec3::new(0, 0, 0), Material::default()));

    let mut pipeline = pipeline(settings).with_library(library);
    let err = pipeline.voxelize(&scene, &provider()).unwrap_err();
    assert!(matches!(err, BakeError::KernelNotFound { ref name } if name == VOXELIZE_SLICE));
    assert_eq!(pipeline.context().device_stats().dispatches, 0);
}

#[test]
fn test_missing_kernel_mid_bake_persists_nothing() {
    let mut library = KernelLibrary::builtin();
    library.remove(DIRECT_SURFACE);
    let settings = settings(2, "missing_direct");
    let directory = settings.output.directory.clone();
    let grid = settings.volume.grid(None).unwrap();
    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, UVec3::new(0, 0, 0), Material::default()));

    let mut pipeline = pipeline(settings).with_library(library);
    let err = pipeline.run(&scene, &provider()).unwrap_err();
    assert!(matches!(err, BakeError::KernelNotFound { .. }));
    assert_eq!(std::fs::read_dir(&directory).unwrap().count(), 0);

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn test_invalid_destination_stops_before_any_dispatch() {
    let mut settings = settings(2, "bad_destination");
    settings.output.name = "nested/name".to_string();
    let mut scene = Scene::new();
    scene.add_light(SceneLight::directional(-Vec3::y(), Vec3::repeat(1.0), 1.0));

    let mut pipeline = pipeline(settings);
    let err = pipeline.run(&scene, &provider()).unwrap_err();
    assert!(matches!(err, BakeError::InvalidDestination(_)));
    assert_eq!(pipeline.context().device_stats().dispatches, 0);
}

#[test]
fn test_stages_require_their_inputs() {
    let settings = settings(2, "stage_order");
    let scene = Scene::new();
    let mut pipeline = pipeline(settings);

    let missing = |err: BakeError| match err {
        BakeError::MissingStageInput { stage, requires } => (stage, requires),
        other => panic!("unexpected error {other}"),
    };

    assert_eq!(
        missing(pipeline.solve_direct(&scene).unwrap_err()),
        (BakeStage::Direct, BakeStage::Voxelize)
    );
    assert_eq!(
        missing(pipeline.solve_bounce().unwrap_err()),
        (BakeStage::Bounce, BakeStage::Voxelize)
    );

    pipeline.voxelize(&scene, &provider()).unwrap();
    assert_eq!(
        missing(pipeline.solve_bounce().unwrap_err()),
        (BakeStage::Bounce, BakeStage::Direct)
    );
    assert_eq!(missing(pipeline.combine().unwrap_err()), (BakeStage::Combine, BakeStage::Direct));
    assert_eq!(missing(pipeline.persist().unwrap_err()), (BakeStage::Persist, BakeStage::Combine));
}

#[test]
fn test_environment_is_skipped_without_a_map() {
    let settings = settings(2, "no_sky");
    let scene = Scene::new();
    let mut pipeline = pipeline(settings);
    pipeline.voxelize(&scene, &provider()).unwrap();
    assert!(pipeline.solve_environment(&scene).unwrap().is_none());
}

#[test]
fn test_full_run_writes_every_volume() {
    let settings = settings(4, "full_run");
    let directory = settings.output.directory.clone();
    let grid = settings.volume.grid(None).unwrap();

    let mut scene = Scene::new();
    scene.add_renderable(Renderable::new(
        "floor",
        Arc::new(Mesh::quad(4.0, 4.0)),
        Material::diffuse(Vec3::repeat(0.8)),
        Transform::from_position(Vec3::new(0.0, -1.5, 0.0)),
    ));
    scene.add_renderable(voxel_cube(
        "lamp",
        &grid,
        UVec3::new(2, 2, 2),
        Material::diffuse(Vec3::repeat(1.0)).with_emission(Vec3::repeat(1.0), 1.0),
    ));
    scene.add_light(SceneLight::point(Vec3::new(0.0, 1.0, 0.0), Vec3::repeat(1.0), 2.0, 10.0));
    scene.set_environment(EnvironmentMap::uniform(Vec3::new(0.1, 0.2, 0.4)));

    let mut pipeline = pipeline(settings);
    let manifest_path = pipeline.run(&scene, &provider()).unwrap();

    let manifest = BakeManifest::load(&manifest_path).unwrap();
    assert_eq!(manifest.name, "test");
    assert_eq!(manifest.grid, grid);
    for role in VolumeRole::ALL {
        let entry = manifest.entry(role).unwrap_or_else(|| panic!("{role:?} not persisted"));
        assert_eq!(entry.format, role.format());
        assert!(directory.join(&entry.file).is_file());
    }

    let albedo = read_volume(directory.join(&manifest.entry(VolumeRole::Albedo).unwrap().file)).unwrap();
    let combined = read_volume(directory.join(&manifest.entry(VolumeRole::CombinedSurface).unwrap().file)).unwrap();
    assert_eq!(combined.volume.occupied_count(), albedo.volume.occupied_count());
    assert!(combined.volume.texels().iter().all(|t| t.x >= 0.0 && t.y >= 0.0 && t.z >= 0.0));

    let volumetric =
        read_volume(directory.join(&manifest.entry(VolumeRole::CombinedVolumetric).unwrap().file)).unwrap();
    assert!(volumetric.volume.texels().iter().all(|t| t.w == 1.0));

    let _ = std::fs::remove_dir_all(&directory);
}

#[test]
fn test_custom_context_is_used() {
    let device = CpuDevice::new().with_watchdog(Some(1));
    let context = BakeContext::new(Box::new(device), KernelLibrary::builtin(), 1);
    let settings = settings(2, "custom_context");
    let grid = settings.volume.grid(None).unwrap();
    let mut scene = Scene::new();
    scene.add_renderable(voxel_cube("cube", &grid, UVec3::new(1, 1, 1), Material::default()));

    // a window of one keeps the strict watchdog quiet
    let mut pipeline = pipeline(settings).with_context(context);
    pipeline.voxelize(&scene, &provider()).unwrap();
    let stats = pipeline.context().device_stats();
    assert_eq!(stats.max_pending, 1);
    assert_eq!(stats.synchronizations, stats.dispatches);
}

fn context() -> BakeContext {
    let mut cx = BakeContext::from_settings(&DeviceSettings::default());
    cx.set_observer(Box::new(NullObserver));
    cx
}

fn red_sum(volume: &Volume) -> f32 {
    volume.texels().iter().map(|t| t.x).sum()
}

/// Two facing 4x4 walls: x = 0 facing +X and x = 3 facing -X
fn corridor() -> SceneVolumes {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(4.0), UVec3::repeat(4)).unwrap();
    let mut albedo = Volume::new(grid.resolution);
    let mut normal = Volume::new(grid.resolution);
    for y in 0..4 {
        for z in 0..4 {
            for (x, facing) in [(0, 1.0), (3, -1.0)] {
                albedo.set(&UVec3::new(x, y, z), Vec4::new(0.8, 0.8, 0.8, 1.0));
                normal.set(&UVec3::new(x, y, z), Vec4::new(facing, 0.0, 0.0, 1.0));
            }
        }
    }
    SceneVolumes {
        emissive: Volume::new(grid.resolution),
        grid,
        albedo,
        normal,
    }
}

/// Radiance 1 on the x = 0 wall only
fn left_wall_lit(volumes: &SceneVolumes) -> Volume {
    let mut lit = Volume::new(volumes.grid.resolution);
    for y in 0..4 {
        for z in 0..4 {
            lit.set(&UVec3::new(0, y, z), Vec4::new(1.0, 1.0, 1.0, 1.0));
        }
    }
    lit
}

#[test]
fn test_each_bounce_adds_light() {
    let volumes = corridor();
    let direct = DirectLight {
        surface: left_wall_lit(&volumes),
        volumetric: None,
    };

    let sums: Vec<f32> = (1..=3)
        .map(|bounces| {
            let solver = BounceLightSolver {
                bounces,
                surface_samples: 16,
                seed: 3,
                ..BounceLightSolver::default()
            };
            red_sum(&solver.solve(&mut context(), &volumes, &direct, None).unwrap().surface)
        })
        .collect();

    // the first bounce only reaches the unlit wall, the second carries it back
    assert!(sums[0] > 0.0, "{sums:?}");
    assert!(sums[1] > sums[0], "{sums:?}");
    assert!(sums[2] > sums[1], "{sums:?}");
}

#[test]
fn test_later_bounces_read_the_previous_bounce() {
    let volumes = corridor();
    let direct = DirectLight {
        surface: left_wall_lit(&volumes),
        volumetric: None,
    };
    let solver = BounceLightSolver {
        bounces: 1,
        surface_samples: 16,
        seed: 11,
        ..BounceLightSolver::default()
    };

    // the lit wall only faces the unlit one, which has nothing to give yet
    let first = solver.solve(&mut context(), &volumes, &direct, None).unwrap();
    assert_eq!(wall_sum(&first.surface, 0), 0.0);
    assert!(wall_sum(&first.surface, 3) > 0.0);

    let second = BounceLightSolver { bounces: 2, ..solver }
        .solve(&mut context(), &volumes, &direct, None)
        .unwrap();
    assert!(wall_sum(&second.surface, 0) > 0.0);
}

/// Red sum over the wall at `x`
fn wall_sum(volume: &Volume, x: u32) -> f32 {
    (0..4)
        .flat_map(|y| (0..4).map(move |z| UVec3::new(x, y, z)))
        .map(|coord| volume.get(&coord).x)
        .sum()
}

#[test]
fn test_environment_light_seeds_the_first_bounce() {
    let volumes = corridor();
    let dark = DirectLight {
        surface: Volume::new(volumes.grid.resolution),
        volumetric: None,
    };
    let sky = EnvironmentLight {
        surface: left_wall_lit(&volumes),
        volumetric: None,
    };
    let solver = BounceLightSolver {
        bounces: 1,
        surface_samples: 16,
        seed: 5,
        ..BounceLightSolver::default()
    };

    let unlit = solver.solve(&mut context(), &volumes, &dark, None).unwrap();
    assert_eq!(red_sum(&unlit.surface), 0.0);

    let seeded = solver.solve(&mut context(), &volumes, &dark, Some(&sky)).unwrap();
    assert!(red_sum(&seeded.surface) > 0.0);

    // sky light in the seed bounces exactly like the same direct light
    let lit = DirectLight {
        surface: left_wall_lit(&volumes),
        volumetric: None,
    };
    let reference = solver.solve(&mut context(), &volumes, &lit, None).unwrap();
    assert_eq!(seeded.surface, reference.surface);
}

#[test]
fn test_bounce_environment_light_flag() {
    let base = settings(4, "bounce_sky");
    let grid = base.volume.grid(None).unwrap();
    let mut scene = Scene::new();
    scene.add_renderable(Renderable::new(
        "floor",
        Arc::new(Mesh::quad(4.0, 4.0)),
        Material::diffuse(Vec3::repeat(0.8)),
        Transform::from_position(Vec3::new(0.0, -1.5, 0.0)),
    ));
    scene.add_renderable(voxel_cube("block", &grid, UVec3::new(2, 2, 2), Material::diffuse(Vec3::repeat(1.0))));
    scene.set_environment(EnvironmentMap::uniform(Vec3::new(0.5, 0.5, 0.5)));

    let bounce_sum = |seeded: bool| {
        let mut settings = base.clone();
        settings.lighting = settings.lighting.clone().with_samples(16);
        settings.lighting.bounce_environment_light = seeded;
        let mut pipeline = pipeline(settings);
        pipeline.voxelize(&scene, &provider()).unwrap();
        pipeline.solve_direct(&scene).unwrap();
        pipeline.solve_environment(&scene).unwrap();
        let bounce = pipeline.solve_bounce().unwrap().unwrap();
        red_sum(&bounce.surface)
    };

    // no lights and no emission: only the sky can feed the bounce
    assert_eq!(bounce_sum(false), 0.0);
    assert!(bounce_sum(true) > 0.0);
}

/// Blur pass stand-in recording its axis: `x = 10 * input + axis + 1`
struct AxisTraceKernel;

impl ComputeKernel for AxisTraceKernel {
    fn name(&self) -> &'static str {
        GAUSSIAN_BLUR
    }

    fn execute(&self, ctx: &mut DispatchContext<'_>) -> BakeResult<()> {
        let input = ctx.input(GAUSSIAN_BLUR, slots::INPUT_A)?;
        let axis = ctx.params.blur_axis as f32;
        let out = ctx.write().volume_mut();
        for (texel, source) in out.texels_mut().iter_mut().zip(input.texels()) {
            *texel = Vec4::new(source.x * 10.0 + axis + 1.0, 0.0, 0.0, 1.0);
        }
        Ok(())
    }
}

#[test]
fn test_blur_passes_run_x_then_y_then_z() {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(2.0), UVec3::repeat(2)).unwrap();
    let mut library = KernelLibrary::builtin();
    library.register(Arc::new(AxisTraceKernel));
    let mut cx = BakeContext::new(Box::new(CpuDevice::new()), library, 64);
    cx.set_observer(Box::new(NullObserver));

    let out = BufferCombinator::new(grid)
        .blur(&mut cx, &Volume::new(grid.resolution), 1)
        .unwrap();

    // each pass reads the resolved output of the one before it
    assert!(out.texels().iter().all(|t| t.x == 123.0), "{:?}", out.texels()[0]);
    assert_eq!(cx.device_stats().dispatches, 3);
    // the window never fills, so every drain is a pass barrier
    assert_eq!(cx.scheduler().drains(), 3);
}

#[test]
fn test_blur_radius_zero_returns_input() {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(3.0), UVec3::repeat(3)).unwrap();
    let mut volume = Volume::new(grid.resolution);
    volume.set(&UVec3::new(1, 2, 0), Vec4::new(4.0, 2.0, 1.0, 1.0));

    let mut cx = context();
    let out = BufferCombinator::new(grid).blur(&mut cx, &volume, 0).unwrap();
    assert_eq!(out, volume);
    assert_eq!(cx.device_stats().dispatches, 0);
}

#[test]
fn test_blur_spreads_a_spike_over_all_axes() {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(5.0), UVec3::repeat(5)).unwrap();
    let mut volume = Volume::new(grid.resolution);
    volume.set(&UVec3::new(2, 2, 2), Vec4::new(1.0, 0.0, 0.0, 0.0));

    let out = BufferCombinator::new(grid).blur(&mut context(), &volume, 1).unwrap();
    let corner = out.get(&UVec3::new(3, 3, 3)).x;
    assert!(corner > 0.0);
    assert_abs_diff_eq!(out.get(&UVec3::new(1, 1, 1)).x, corner, epsilon = 1e-6);
    assert!(out.get(&UVec3::new(2, 2, 2)).x > corner);
    assert_abs_diff_eq!(red_sum(&out), 1.0, epsilon = 1e-5);
}

#[test]
fn test_average_weighs_every_input_equally() {
    let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(2.0), UVec3::repeat(2)).unwrap();
    let a = Volume::filled(grid.resolution, Vec4::new(3.0, 3.0, 3.0, 1.0));
    let b = Volume::filled(grid.resolution, Vec4::new(6.0, 6.0, 6.0, 1.0));
    let c = Volume::filled(grid.resolution, Vec4::new(9.0, 9.0, 9.0, 1.0));
    let combinator = BufferCombinator::new(grid);
    let mut cx = context();

    let mean = combinator.combine_all(&mut cx, CombineMode::Average, &[&a, &b, &c]).unwrap();
    for texel in mean.texels() {
        assert_abs_diff_eq!(*texel, Vec4::new(6.0, 6.0, 6.0, 1.0), epsilon = 1e-5);
    }

    let sum = combinator.combine_all(&mut cx, CombineMode::Add, &[&a, &b, &c]).unwrap();
    assert_eq!(sum.get(&UVec3::new(1, 1, 1)), Vec4::new(18.0, 18.0, 18.0, 3.0));
}
