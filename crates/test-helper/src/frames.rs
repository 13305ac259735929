//! Reading captured frames back from an output directory.

use std::{fs, path::Path};

use image::DynamicImage;

/// File names in `directory`, sorted by the sequence number in `frame-<sequence>.<ext>`.
///
/// Files that are not frames are listed last, sorted by name.
pub fn frame_files(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();

    names.sort_by_key(|name| (sequence_of(name).unwrap_or(u32::MAX), name.clone()));

    names
}

/// The sequence number of a frame file name.
pub fn sequence_of(name: &str) -> Option<u32> {
    let (stem, _extension) = name.strip_prefix("frame-")?.split_once('.')?;
    stem.parse().ok()
}

/// Decodes a frame file.
pub fn open_frame(directory: &Path, name: &str) -> DynamicImage {
    image::open(directory.join(name)).unwrap()
}
