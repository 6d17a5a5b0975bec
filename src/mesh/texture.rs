//! Texture bitmap path resolution.
//!
//! A texture named `ROAD` is looked up as `TEX16O/ROAD.DDS` first and then as
//! `TEX16A/ROAD.DDS`. The second directory holds bitmaps with an alpha
//! channel; materials using them are alpha-tested. When neither exists the
//! bare `ROAD.DDS` is used.

use std::path::{Path, PathBuf};

use tracing::trace;

/// Answers whether a texture file exists. Paths are relative to the texture root.
pub trait TextureProbe {
    fn exists(&self, relative: &Path) -> bool;
}

impl<F> TextureProbe for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, relative: &Path) -> bool {
        self(relative)
    }
}

/// Probes the filesystem below `root`.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TextureProbe for FsProbe {
    fn exists(&self, relative: &Path) -> bool {
        self.root.join(relative).is_file()
    }
}

/// The two probe directories, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDirs {
    pub opaque: String,
    pub alpha: String,
}

impl Default for TextureDirs {
    fn default() -> Self {
        Self {
            opaque: "TEX16O".to_string(),
            alpha: "TEX16A".to_string(),
        }
    }
}

/// Where a texture path was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSource {
    Opaque,
    AlphaTested,
    /// Neither directory had the file.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTexture {
    /// Path as written to the material file, always with `/` separators.
    pub path: String,
    pub source: TextureSource,
}

impl ResolvedTexture {
    pub fn is_alpha_tested(&self) -> bool {
        self.source == TextureSource::AlphaTested
    }
}

impl TextureDirs {
    pub fn resolve(&self, probe: &impl TextureProbe, texture_name: &str) -> ResolvedTexture {
        let file_name = format!("{texture_name}.DDS");
        let candidates = [
            (&self.opaque, TextureSource::Opaque),
            (&self.alpha, TextureSource::AlphaTested),
        ];
        for (dir, source) in candidates {
            if probe.exists(&Path::new(dir).join(&file_name)) {
                trace!("texture {texture_name} found in {dir}");
                return ResolvedTexture {
                    path: format!("{dir}/{file_name}"),
                    source,
                };
            }
        }
        trace!("texture {texture_name} not found, using bare file name");
        ResolvedTexture {
            path: file_name,
            source: TextureSource::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_directory_wins() {
        let dirs = TextureDirs::default();
        let resolved = dirs.resolve(&|_: &Path| true, "ROAD");
        assert_eq!(resolved.path, "TEX16O/ROAD.DDS");
        assert!(!resolved.is_alpha_tested());
    }

    #[test]
    fn alpha_directory_is_second() {
        let dirs = TextureDirs::default();
        let probe = |path: &Path| path.starts_with("TEX16A");
        let resolved = dirs.resolve(&probe, "FENCE");
        assert_eq!(resolved.path, "TEX16A/FENCE.DDS");
        assert!(resolved.is_alpha_tested());
    }

    #[test]
    fn falls_back_to_bare_name() {
        let resolved = TextureDirs::default().resolve(&|_: &Path| false, "SKY");
        assert_eq!(resolved.path, "SKY.DDS");
        assert_eq!(resolved.source, TextureSource::Missing);
    }

    #[test]
    fn fs_probe_checks_below_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("TEX16A")).unwrap();
        std::fs::write(dir.path().join("TEX16A/LEAF.DDS"), b"DDS ").unwrap();

        let probe = FsProbe::new(dir.path());
        let dirs = TextureDirs::default();
        assert!(dirs.resolve(&probe, "LEAF").is_alpha_tested());
        assert_eq!(dirs.resolve(&probe, "BARK").path, "BARK.DDS");
    }
}
