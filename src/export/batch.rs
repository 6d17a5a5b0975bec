//! File-level entry points used by the command line tool.
//!
//! Each function handles exactly one input file. [`run_batch`] applies one of
//! them to many files and keeps going after failures.

use std::path::{Path, PathBuf};

use rootcause::Report;
use tracing::{info, warn};

use crate::export::{ExportError, ExportOptions, log, obj};
use crate::mesh::extract::MeshExtractor;
use crate::mesh::texture::FsProbe;
use crate::models::library::{Catalog, LibraryKind};
use crate::models::scene::SceneDocument;

fn read_file(path: &Path) -> Result<Vec<u8>, Report<ExportError>> {
    std::fs::read(path).map_err(|e| Report::new(ExportError::io(path, e)))
}

fn write_file(path: &Path, contents: &str) -> Result<(), Report<ExportError>> {
    std::fs::write(path, contents).map_err(|e| Report::new(ExportError::io(path, e)))
}

fn open_scene(path: &Path) -> Result<SceneDocument, Report<ExportError>> {
    let bytes = read_file(path)?;
    SceneDocument::open(bytes).map_err(|e| Report::new(ExportError::Dlp(e)))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write the text dump of a DLP file. Returns the `.log` path.
pub fn dump_scene(path: &Path, options: &ExportOptions) -> Result<PathBuf, Report<ExportError>> {
    let doc = open_scene(path)?;
    let text = log::scene_log(&doc, &path.display().to_string()).map_err(Report::new)?;
    let out_path = options.output_path(path, "log");
    write_file(&out_path, &text)?;
    Ok(out_path)
}

/// Convert a DLP file to `.obj` + `.mtl`. Returns both paths.
pub fn export_scene_obj(
    path: &Path,
    options: &ExportOptions,
) -> Result<(PathBuf, PathBuf), Report<ExportError>> {
    let doc = open_scene(path)?;
    let probe = FsProbe::new(options.texture_root_for(path));
    let mesh = MeshExtractor::new(&probe)
        .with_dirs(options.texture_dirs().clone())
        .convert(&doc)
        .map_err(|e| Report::new(ExportError::Dlp(e)))?;

    let obj_path = options.output_path(path, "obj");
    let mtl_path = options.output_path(path, "mtl");
    let obj_text = obj::write_obj(&mesh, &display_name(&mtl_path)).map_err(Report::new)?;
    let mtl_text = obj::write_mtl(&mesh).map_err(Report::new)?;
    write_file(&obj_path, &obj_text)?;
    write_file(&mtl_path, &mtl_text)?;
    Ok((obj_path, mtl_path))
}

/// Catalog kind from the file stem, e.g. `MATERIAL.DB` or `texture.csv`.
pub fn catalog_kind(path: &Path) -> Result<LibraryKind, Report<ExportError>> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.parse().map_err(|source| {
        Report::new(ExportError::UnknownCatalog {
            path: path.display().to_string(),
            source,
        })
    })
}

/// Write the text dump (and optionally a CSV table) of a library catalog.
/// `kind` overrides the kind guessed from the file name.
pub fn dump_catalog(
    path: &Path,
    kind: Option<LibraryKind>,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>, Report<ExportError>> {
    let kind = match kind {
        Some(kind) => kind,
        None => catalog_kind(path)?,
    };
    let catalog = Catalog::open(kind, read_file(path)?)
        .map_err(|e| Report::new(ExportError::Dlp(e)))?;

    let mut written = Vec::new();
    let log_path = options.output_path(path, "log");
    write_file(&log_path, &log::catalog_log(&catalog).map_err(Report::new)?)?;
    written.push(log_path);

    if options.write_csv() {
        written.push(write_csv_table(path, &catalog, options)?);
    }
    Ok(written)
}

#[cfg(feature = "csv")]
fn write_csv_table(
    path: &Path,
    catalog: &Catalog,
    options: &ExportOptions,
) -> Result<PathBuf, Report<ExportError>> {
    let csv_path = options.output_path(path, "csv");
    let table = crate::export::catalog_csv::write_catalog_csv(catalog).map_err(Report::new)?;
    write_file(&csv_path, &table)?;
    Ok(csv_path)
}

#[cfg(not(feature = "csv"))]
fn write_csv_table(
    path: &Path,
    _catalog: &Catalog,
    _options: &ExportOptions,
) -> Result<PathBuf, Report<ExportError>> {
    Err(Report::new(ExportError::Csv(format!(
        "cannot write a table for {}: built without the `csv` feature",
        path.display()
    ))))
}

/// Rebuild a binary catalog from a CSV table. Returns the `.DB` path.
/// `kind` overrides the kind guessed from the file name.
#[cfg(feature = "csv")]
pub fn pack_catalog(
    path: &Path,
    kind: Option<LibraryKind>,
    options: &ExportOptions,
) -> Result<PathBuf, Report<ExportError>> {
    let kind = match kind {
        Some(kind) => kind,
        None => catalog_kind(path)?,
    };
    let text = std::fs::read_to_string(path).map_err(|e| Report::new(ExportError::io(path, e)))?;
    let catalog =
        crate::export::catalog_csv::read_catalog_csv(kind, &text).map_err(Report::new)?;
    let bytes = catalog.save().map_err(|e| Report::new(ExportError::Dlp(e)))?;

    let db_path = options.output_path(path, "DB");
    std::fs::write(&db_path, bytes).map_err(|e| Report::new(ExportError::io(&db_path, e)))?;
    Ok(db_path)
}

/// Expand directories into the `*.dlp` files below them (any case).
/// Plain files are passed through. A directory without any is skipped with a
/// warning; only an empty overall result is an error.
#[cfg(feature = "bin")]
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Report<ExportError>> {
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let dir = glob::Pattern::escape(&input.to_string_lossy());
        let pattern = format!("{dir}/**/*.dlp");
        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("skipping {}: {e}", input.display());
                continue;
            }
        };
        let before = files.len();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable entry: {e}"),
            }
        }
        if files.len() == before {
            warn!("no DLP files found in {}", input.display());
        }
    }
    if files.is_empty() {
        use itertools::Itertools;
        let searched = inputs.iter().map(|input| input.display()).join(", ");
        return Err(Report::new(ExportError::NoInputs(searched)));
    }
    Ok(files)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run `job` over every path in order. A failure is logged and does not stop
/// the remaining files.
pub fn run_batch<T>(
    paths: &[PathBuf],
    mut job: impl FnMut(&Path) -> Result<T, Report<ExportError>>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (i, path) in paths.iter().enumerate() {
        info!("[{}/{}] {}", i + 1, paths.len(), path.display());
        match job(path) {
            Ok(_) => summary.succeeded += 1,
            Err(report) => {
                warn!("{}: {report}", path.display());
                summary.failed += 1;
            }
        }
    }
    info!(
        "finished: {} succeeded, {} failed",
        summary.succeeded, summary.failed
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::tests::sample_document;

    fn write_sample(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, sample_document().save().unwrap()).unwrap();
        path
    }

    #[test]
    fn dump_writes_log_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path(), "SCENE.DLP");
        let log_path = dump_scene(&input, &ExportOptions::default()).unwrap();
        assert_eq!(log_path, dir.path().join("SCENE.log"));
        let text = std::fs::read_to_string(log_path).unwrap();
        assert!(text.ends_with("# EOF\n"));
    }

    #[test]
    fn obj_export_probes_texture_root() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_sample(dir.path(), "SCENE.DLP");
        let textures = dir.path().join("tex");
        std::fs::create_dir_all(textures.join("TEX16A")).unwrap();
        std::fs::write(textures.join("TEX16A/decal.DDS"), b"DDS ").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();

        let options = ExportOptions::builder()
            .output_dir(&out)
            .texture_root(&textures)
            .build();
        let (obj_path, mtl_path) = export_scene_obj(&input, &options).unwrap();
        assert_eq!(obj_path, out.join("SCENE.obj"));

        let obj_text = std::fs::read_to_string(obj_path).unwrap();
        assert!(obj_text.contains("mtllib SCENE.mtl\n"));
        assert!(obj_text.contains("usemtl paint|decal\n"));
        let mtl_text = std::fs::read_to_string(mtl_path).unwrap();
        assert!(mtl_text.contains("map_d TEX16A/decal.DDS\n"));
    }

    #[test]
    fn broken_file_is_reported_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_sample(dir.path(), "GOOD.DLP");
        let bad = dir.path().join("BAD.DLP");
        std::fs::write(&bad, b"DLP").unwrap();
        let missing = dir.path().join("MISSING.DLP");

        let options = ExportOptions::default();
        let summary = run_batch(&[bad, good, missing], |path| dump_scene(path, &options));
        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 1,
                failed: 2
            }
        );
        assert!(dir.path().join("GOOD.log").exists());
        assert!(!dir.path().join("BAD.log").exists());
    }

    #[test]
    fn catalog_kind_from_name() {
        assert_eq!(
            catalog_kind(Path::new("mtl/PHYSICS.DB")).unwrap(),
            LibraryKind::Physics
        );
        assert!(catalog_kind(Path::new("mtl/SOUNDS.DB")).is_err());
    }

    #[cfg(feature = "csv")]
    #[test]
    fn catalog_dump_with_csv() {
        use crate::models::library::TextureRecord;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TEXTURE.DB");
        let catalog = Catalog::Textures(vec![TextureRecord {
            name: "ROAD".to_string(),
            ..Default::default()
        }]);
        std::fs::write(&path, catalog.save().unwrap()).unwrap();

        let options = ExportOptions::builder().write_csv(true).build();
        let written = dump_catalog(&path, None, &options).unwrap();
        assert_eq!(written[0], dir.path().join("TEXTURE.log"));
        let log_text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(log_text.starts_with("# Texture library\n"));
        assert_eq!(
            std::fs::read_to_string(&written[1]).unwrap(),
            "name,flags,unk1,unk2\nROAD,0,0,0\n"
        );
    }

    #[cfg(feature = "bin")]
    #[test]
    fn discovers_dlp_files_in_any_case() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        write_sample(dir.path(), "A.DLP");
        write_sample(&dir.path().join("sub"), "b.dlp");
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        let single = write_sample(dir.path(), "C.Dlp");

        let mut found = discover_inputs(&[dir.path().to_path_buf()]).unwrap();
        found.sort();
        let names: Vec<_> = found.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, ["A.DLP", "C.Dlp", "b.dlp"]);

        assert_eq!(discover_inputs(&[single.clone()]).unwrap(), [single]);

        let empty = tempfile::tempdir().unwrap();
        assert!(discover_inputs(&[empty.path().to_path_buf()]).is_err());
    }

    #[cfg(feature = "bin")]
    #[test]
    fn empty_directory_does_not_stop_discovery() {
        let empty = tempfile::tempdir().unwrap();
        let full = tempfile::tempdir().unwrap();
        let scene = write_sample(full.path(), "A.DLP");

        let found = discover_inputs(&[
            empty.path().to_path_buf(),
            full.path().to_path_buf(),
        ])
        .unwrap();
        assert_eq!(found, [scene]);
    }

    #[cfg(feature = "csv")]
    #[test]
    fn edited_table_packs_back_into_a_catalog() {
        use crate::models::library::MaterialRecord;
        use crate::models::types::ColorRGBA;

        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("MATERIAL.DB");
        let catalog = Catalog::Materials(vec![MaterialRecord {
            name: "paint".to_string(),
            diffuse: ColorRGBA {
                r: 1.0,
                g: 0.0,
                b: 1.0,
                a: 1.0,
            },
            shininess: 4.0,
            ..Default::default()
        }]);
        let original = catalog.save().unwrap();
        std::fs::write(&db_path, &original).unwrap();

        let options = ExportOptions::builder().write_csv(true).build();
        let written = dump_catalog(&db_path, None, &options).unwrap();
        let csv_path = dir.path().join("MATERIAL.csv");
        assert_eq!(written[1], csv_path);

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let options = ExportOptions::builder().output_dir(&out).build();
        let packed = pack_catalog(&csv_path, None, &options).unwrap();
        assert_eq!(packed, out.join("MATERIAL.DB"));
        assert_eq!(std::fs::read(&packed).unwrap(), original);

        let edited = std::fs::read_to_string(&csv_path)
            .unwrap()
            .replace("paint", "gloss");
        std::fs::write(&csv_path, edited).unwrap();
        pack_catalog(&csv_path, Some(LibraryKind::Material), &options).unwrap();
        let rebuilt = Catalog::open(LibraryKind::Material, std::fs::read(&packed).unwrap()).unwrap();
        let Catalog::Materials(records) = rebuilt else {
            panic!("expected materials");
        };
        assert_eq!(records[0].name, "gloss");
    }
}
