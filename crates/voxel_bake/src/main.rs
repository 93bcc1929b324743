//! Command-line light baker
//!
//! Loads a RON scene description and optional bake settings (TOML or RON),
//! runs every bake stage and writes the volumes plus a manifest.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};

use voxel_gi::foundation::logging;
use voxel_gi::prelude::*;

mod scene_file;
use scene_file::SceneDescription;

const DEFAULT_SETTINGS_FILE: &str = "bake.toml";

fn main() -> Result<()> {
    let matches = Command::new("voxel_bake")
        .about("Bakes direct, bounce and environment light of a scene into voxel volumes")
        .arg(
            Arg::new("scene")
                .value_name("SCENE")
                .help("Scene description (.ron)")
                .required(true),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("FILE")
                .help("Bake settings (.toml or .ron), defaults are used when missing")
                .default_value(DEFAULT_SETTINGS_FILE),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for the baked volumes"),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Base name of every written file"),
        )
        .arg(
            Arg::new("bounces")
                .short('b')
                .long("bounces")
                .value_name("COUNT")
                .help("Number of light bounces")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("density")
                .short('d')
                .long("density")
                .value_name("UNITS")
                .help("Voxel edge length in world units")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(
            Arg::new("samples")
                .long("samples")
                .value_name("COUNT")
                .help("Samples per voxel of every bounce and environment pass")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Random seed of the sampling passes")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("fit")
                .long("fit")
                .value_name("PADDING")
                .help("Fit the volume to the scene bounds with this margin")
                .value_parser(clap::value_parser!(f32)),
        )
        .arg(
            Arg::new("save-settings")
                .long("save-settings")
                .value_name("FILE")
                .help("Write the effective settings to a file and exit"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log progress of every stage")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    logging::init_with_level(if matches.get_flag("verbose") { "debug" } else { "info" });

    let settings_path = matches
        .get_one::<String>("settings")
        .map_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE), PathBuf::from);
    let mut settings = BakeSettings::load_or_default(&settings_path)
        .with_context(|| format!("Failed to load settings {}", settings_path.display()))?;
    apply_overrides(&mut settings, &matches);

    if let Some(path) = matches.get_one::<String>("save-settings") {
        settings
            .save_to_file(path)
            .with_context(|| format!("Failed to write settings {path}"))?;
        log::info!("Wrote settings to {}", path);
        return Ok(());
    }

    let scene_path = PathBuf::from(matches.get_one::<String>("scene").context("Missing scene argument")?);
    let description = SceneDescription::load(&scene_path)?;
    let base = scene_path.parent().unwrap_or_else(|| Path::new("."));
    let scene = description.build(base)?;

    let mut pipeline = BakePipeline::new(settings).context("Invalid bake settings")?;
    let provider = SurfaceMetaProvider::new(pipeline.settings().voxelize.meta_texture_resolution);
    let manifest = pipeline.run(&scene, &provider).context("Bake failed")?;

    println!("Baked {}", manifest.display());
    Ok(())
}

/// Command-line values take precedence over the settings file
fn apply_overrides(settings: &mut BakeSettings, matches: &ArgMatches) {
    if let Some(output) = matches.get_one::<String>("output") {
        settings.output.directory = PathBuf::from(output);
    }
    if let Some(name) = matches.get_one::<String>("name") {
        settings.output.name.clone_from(name);
    }
    if let Some(bounces) = matches.get_one::<u32>("bounces") {
        settings.lighting.bounces = *bounces;
    }
    if let Some(density) = matches.get_one::<f32>("density") {
        settings.volume.voxel_density = *density;
    }
    if let Some(samples) = matches.get_one::<u32>("samples") {
        settings.lighting = settings.lighting.clone().with_samples(*samples);
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        settings.lighting.seed = *seed;
    }
    if let Some(padding) = matches.get_one::<f32>("fit") {
        settings.volume = settings.volume.clone().with_fit_to_scene(*padding);
    }
}
