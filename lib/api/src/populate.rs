//! Bulk import of artworks from an image folder

use artbox_core::{NewArtwork, Result};
use artbox_mesh::MeshBuilder;
use artbox_storage::ArtworkStore;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Extensions picked up by an import, compared case-insensitively
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PopulateReport {
    pub processed: usize,
    pub skipped: usize,
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by path
///
/// A missing folder has no images.
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Title from a file stem: `_` and `-` become spaces, words are capitalised
pub fn title_from_stem(stem: &str) -> String {
    stem.replace(['_', '-'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Import every image in `dir` that is not already in the store
///
/// Files are matched to existing records by filename. Unreadable files and
/// images the mesh builder rejects are skipped and counted.
pub fn populate_from_folder(
    store: &ArtworkStore,
    mesh: &MeshBuilder,
    dir: &Path,
) -> Result<PopulateReport> {
    let known: HashSet<String> = store.list().iter().map(|r| r.filename.clone()).collect();
    let mut report = PopulateReport::default();

    for path in find_images(dir)? {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => {
                report.skipped += 1;
                continue;
            }
        };
        if known.contains(&filename) {
            continue;
        }

        let image_data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                warn!(file = %path.display(), "Skipping unreadable image: {}", e);
                report.skipped += 1;
                continue;
            }
        };
        let model = match mesh.build(&image_data) {
            Ok(model) => model,
            Err(e) => {
                warn!(file = %path.display(), "Skipping image: {}", e);
                report.skipped += 1;
                continue;
            }
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let mut new = NewArtwork::new(title_from_stem(stem), filename, image_data);
        new.model_data = Some(model);

        let record = store.insert(new)?;
        info!(id = %record.id, name = %record.name, "Imported artwork");
        report.processed += 1;
    }

    Ok(report)
}
