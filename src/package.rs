//! Materialize an emitted file map on disk and pack it for submission.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::dart::to_snake_case;
use crate::emit::FileMap;
use crate::error::BuildError;
use crate::model::Snapshot;

/// Directory name the project lands under: `<snake app name>_<app id>`.
/// Stable across runs so re-generation overwrites in place.
pub fn project_dir_name(snap: &Snapshot) -> String {
    format!(
        "{}_{}",
        to_snake_case(&snap.application.name),
        snap.application.id
    )
}

/// Write every emitted file under `out_root/<project dir>`, creating parent
/// directories as needed. Returns the project root that was written.
pub fn materialize(snap: &Snapshot, files: &FileMap, out_root: &Path) -> Result<PathBuf> {
    let project_root = out_root.join(project_dir_name(snap));
    for (rel, contents) in files {
        let path = project_root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(project_root)
}

/// Pack the file map into a zip archive in memory.
///
/// Entries are written in map order with the crate's fixed default
/// timestamp, so the same file map always produces the same bytes.
pub fn archive(files: &FileMap) -> Result<Vec<u8>, BuildError> {
    let buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(buffer);

    let file_options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (rel, contents) in files {
        zip.start_file(rel, file_options.clone())
            .map_err(|e| BuildError::Archive(e.to_string()))?;
        zip.write_all(contents.as_bytes())
            .map_err(|e| BuildError::Archive(e.to_string()))?;
    }

    let result = zip.finish().map_err(|e| BuildError::Archive(e.to_string()))?;
    Ok(result.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> FileMap {
        let mut files = FileMap::new();
        files.insert("pubspec.yaml".to_string(), "name: demo\n".to_string());
        files.insert("lib/main.dart".to_string(), "void main() {}\n".to_string());
        files
    }

    fn snap() -> Snapshot {
        serde_json::from_str(
            r#"{
                "application": {"id": 7, "name": "Corner Shop", "package_name": "com.example.shop"},
                "theme": {"name": "Default"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn materialize_writes_the_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let root = materialize(&snap(), &files(), tmp.path()).unwrap();

        assert!(root.ends_with("corner_shop_7"));
        assert_eq!(fs::read_to_string(root.join("pubspec.yaml")).unwrap(), "name: demo\n");
        assert_eq!(
            fs::read_to_string(root.join("lib/main.dart")).unwrap(),
            "void main() {}\n"
        );
    }

    #[test]
    fn archive_is_byte_stable() {
        let a = archive(&files()).unwrap();
        let b = archive(&files()).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn archive_round_trips() {
        let bytes = archive(&files()).unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 2);
        let names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["lib/main.dart", "pubspec.yaml"]);
    }
}
