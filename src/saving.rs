use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;

use crate::store::Library;

pub fn save_library(library: &Library, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = std::io::BufWriter::new(encoder);

    serialize_into(&mut writer, library)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

pub fn load_library(filename: &str) -> std::io::Result<Library> {
    let file = File::open(filename)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let library: Library = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentDraft, LabelDraft};

    #[test]
    fn library_round_trips_through_disk() {
        let mut library = Library::new();
        library
            .create_content(
                "1-1".to_string(),
                ContentDraft {
                    title: "ももたろう".to_string(),
                    level: "中級前半".to_string(),
                    level_code: "beginner".to_string(),
                    text: "むかし、むかし、あるところに。".to_string(),
                    explanation: None,
                    word_count: None,
                    character_count: None,
                    images: vec![],
                    thumbnail: None,
                    questions: vec![],
                },
            )
            .unwrap();
        library
            .create_label(
                "l1".to_string(),
                LabelDraft {
                    name: Some("昔話".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        library.set_about("このサイトについて".to_string(), None);
        library.site_info();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.bin.gz");
        let path = path.to_str().unwrap();

        save_library(&library, path).unwrap();
        let loaded = load_library(path).unwrap();

        assert_eq!(loaded.contents, library.contents);
        assert_eq!(loaded.levels, library.levels);
        assert_eq!(loaded.labels, library.labels);
        assert_eq!(loaded.about, library.about);
        assert_eq!(loaded.site_info, library.site_info);
    }

    #[test]
    fn loading_a_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin.gz");
        assert!(load_library(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn loading_garbage_reports_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin.gz");
        std::fs::write(&path, b"not a gzip stream").unwrap();
        assert!(load_library(path.to_str().unwrap()).is_err());
    }
}
