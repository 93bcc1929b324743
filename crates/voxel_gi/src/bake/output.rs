//! Writing baked volumes and the bake manifest

use std::path::PathBuf;

use crate::core::{BakeResult, OutputSettings};
use crate::volume::io::{volume_file_name, write_volume};
use crate::volume::{BakeManifest, ManifestEntry, Volume, VolumeGrid, VolumeRole};

/// Writes volumes of one bake into the output directory
///
/// Every written volume is recorded in a [`BakeManifest`], saved next to the
/// volumes by [`VolumeWriter::finish`].
#[derive(Debug)]
pub struct VolumeWriter<'a> {
    settings: &'a OutputSettings,
    manifest: BakeManifest,
}

impl<'a> VolumeWriter<'a> {
    /// Writer for volumes of `grid`
    ///
    /// The destination is validated (and created) here, before anything is
    /// written.
    pub fn new(settings: &'a OutputSettings, grid: VolumeGrid) -> BakeResult<Self> {
        settings.validate_destination()?;
        Ok(Self {
            settings,
            manifest: BakeManifest::new(settings.name.clone(), grid),
        })
    }

    /// Write `volume` in the storage format of `role`
    pub fn write(&mut self, role: VolumeRole, volume: &Volume) -> BakeResult<()> {
        let file = volume_file_name(&self.settings.name, role);
        let format = role.format();
        write_volume(self.settings.path(&file), volume, &self.manifest.grid, format)?;
        self.manifest.entries.push(ManifestEntry { role, file, format });
        Ok(())
    }

    /// Write `volume` if present
    pub fn write_optional(&mut self, role: VolumeRole, volume: Option<&Volume>) -> BakeResult<()> {
        match volume {
            Some(volume) => self.write(role, volume),
            None => Ok(()),
        }
    }

    /// Volumes written so far
    pub fn written(&self) -> usize {
        self.manifest.entries.len()
    }

    /// Save the manifest, returning its path
    pub fn finish(self) -> BakeResult<PathBuf> {
        let path = self.manifest.save(&self.settings.directory)?;
        log::info!("Wrote {} volumes, manifest {}", self.manifest.entries.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{UVec3, Vec3, Vec4};
    use crate::volume::io::read_volume;
    use crate::volume::TexelFormat;
    use approx::assert_abs_diff_eq;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("voxel_gi_output_{}_{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_writer_records_manifest() {
        let dir = scratch_dir("manifest");
        let settings = OutputSettings::new(&dir, "room");
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(2.0), UVec3::new(2, 2, 2)).unwrap();
        let volume = Volume::filled(grid.resolution, Vec4::new(0.25, 0.5, 2.0, 1.0));

        let mut writer = VolumeWriter::new(&settings, grid).unwrap();
        writer.write(VolumeRole::DirectSurface, &volume).unwrap();
        writer.write_optional(VolumeRole::DirectVolumetric, None).unwrap();
        assert_eq!(writer.written(), 1);
        let path = writer.finish().unwrap();

        let manifest = BakeManifest::load(&path).unwrap();
        let entry = manifest.entry(VolumeRole::DirectSurface).unwrap();
        assert_eq!(entry.file, "room_directSurface.vxv");
        assert_eq!(entry.format, TexelFormat::RgbaHalf);
        assert!(manifest.entry(VolumeRole::DirectVolumetric).is_none());

        let persisted = read_volume(dir.join(&entry.file)).unwrap();
        assert_abs_diff_eq!(persisted.volume.get(&UVec3::new(1, 1, 1)).z, 2.0, epsilon = 1e-3);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_writer_rejects_bad_name() {
        let dir = scratch_dir("bad_name");
        let settings = OutputSettings::new(&dir, "a/b");
        let grid = VolumeGrid::with_resolution(Vec3::zeros(), Vec3::repeat(1.0), UVec3::new(1, 1, 1)).unwrap();
        assert!(VolumeWriter::new(&settings, grid).is_err());
        assert!(!dir.exists());
    }
}
