use std::time::{Duration, UNIX_EPOCH};

use image::Rgba;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "kindledash_store_{name}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn tiny() -> RgbaImage {
    RgbaImage::from_pixel(2, 2, Rgba([9, 8, 7, 255]))
}

fn names(entries: &[ArtifactEntry]) -> Vec<String> {
    entries.iter().map(|e| e.file_name.clone()).collect()
}

#[test]
fn write_raw_names_file_and_stamps_mtime() {
    let store = ArtifactStore::new(temp_dir("write_raw"));
    let name = store.write_raw("news", at(1_000), &tiny()).unwrap();
    assert_eq!(name.file_name(), "news_1000.png");

    let entries = store.entries().unwrap();
    assert_eq!(names(&entries), vec!["news_1000.png".to_owned()]);
    assert_eq!(entries[0].modified, at(1_000));
    assert!(entries[0].len > 0);
    assert_eq!(load_image(&entries[0].path).unwrap(), tiny());
}

#[test]
fn write_raw_bumps_timestamp_on_collision() {
    let store = ArtifactStore::new(temp_dir("bump"));
    let a = store.write_raw("news", at(50), &tiny()).unwrap();
    let b = store.write_raw("news", at(50), &tiny()).unwrap();
    assert_eq!(a.timestamp(), 50);
    assert_eq!(b.timestamp(), 51);

    // A processed artifact also reserves its raw identity.
    store.write_processed(&ArtifactName::raw("news", 52), at(52), &tiny()).unwrap();
    let c = store.write_raw("news", at(52), &tiny()).unwrap();
    assert_eq!(c.timestamp(), 53);
}

#[test]
fn pending_is_raw_without_processed_counterpart() {
    let dir = temp_dir("pending");
    let store = ArtifactStore::new(&dir);
    let b = store.write_raw("b", at(20), &tiny()).unwrap();
    let a = store.write_raw("a", at(20), &tiny()).unwrap();
    let done = store.write_raw("a", at(10), &tiny()).unwrap();
    store.write_processed(&done, at(11), &tiny()).unwrap();
    std::fs::write(dir.join("notes.txt"), b"x").unwrap();
    std::fs::write(dir.join(".a_30.png.1.0.tmp"), b"").unwrap();

    let pending = store.pending().unwrap();
    assert_eq!(names(&pending), vec![a.file_name(), b.file_name()]);
}

#[test]
fn newest_processed_uses_embedded_timestamp() {
    let store = ArtifactStore::new(temp_dir("newest"));
    // Written out of order: the later capture gets the older mtime.
    store
        .write_processed(&ArtifactName::raw("w", 300), at(100), &tiny())
        .unwrap();
    store
        .write_processed(&ArtifactName::raw("w", 200), at(400), &tiny())
        .unwrap();
    store
        .write_processed(&ArtifactName::raw("other", 900), at(900), &tiny())
        .unwrap();
    store.write_raw("w", at(999), &tiny()).unwrap();

    let newest = store.newest_processed("w").unwrap().unwrap();
    assert_eq!(newest.file_name, "O_w_300.png");
    assert!(store.newest_processed("missing").unwrap().is_none());
}

#[test]
fn publish_copy_replaces_and_refuses_empty_sources() {
    let dir = temp_dir("publish");
    let src = dir.join("src.png");
    let dest = dir.join("current.png");
    std::fs::write(&src, b"first").unwrap();
    publish_copy(&src, &dest, at(5)).unwrap();
    std::fs::write(&src, b"second").unwrap();
    publish_copy(&src, &dest, at(6)).unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"second");
    assert_eq!(std::fs::metadata(&dest).unwrap().modified().unwrap(), at(6));

    let empty = dir.join("empty.png");
    std::fs::write(&empty, b"").unwrap();
    assert!(publish_copy(&empty, &dest, at(7)).is_err());
    assert_eq!(std::fs::read(&dest).unwrap(), b"second");

    let leftovers: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn entries_of_missing_directory_is_an_error() {
    let store = ArtifactStore::new(temp_dir("missing").join("nope"));
    assert!(store.entries().is_err());
}

#[test]
fn slide_named_o_is_pending_after_capture() {
    let dir = temp_dir("slide_o");
    let cfg = crate::config::model::PipelineConfig::from_json_str(
        r#"{"slides":[{"name":"O","url":"u"}]}"#,
    )
    .unwrap();
    let slide = &cfg.slides[0].name;
    assert_eq!(slide, &crate::artifact::naming::artifact_key("O"));

    let store = ArtifactStore::new(&dir);
    let raw = store.write_raw(slide, at(1_000), &tiny()).unwrap();
    assert_eq!(names(&store.pending().unwrap()), vec![raw.file_name()]);

    store.write_processed(&raw, at(1_001), &tiny()).unwrap();
    assert!(store.pending().unwrap().is_empty());
    let newest = store.newest_processed(slide).unwrap().unwrap();
    assert_eq!(newest.file_name, raw.processed().file_name());
    std::fs::remove_dir_all(&dir).ok();
}
