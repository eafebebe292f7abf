use super::*;

#[test]
fn raw_and_processed_names_follow_the_scheme() {
    let raw = ArtifactName::raw("weather", 1_700_000_000);
    assert_eq!(raw.file_name(), "weather_1700000000.png");
    assert_eq!(raw.processed().file_name(), "O_weather_1700000000.png");
    assert_eq!(raw.processed().raw_source(), raw);
}

#[test]
fn parse_recovers_kind_slide_and_timestamp() {
    let p = ArtifactName::parse("O_my_slide_42.png").unwrap();
    assert_eq!(p.kind(), ArtifactKind::Processed);
    assert_eq!(p.slide(), "my_slide");
    assert_eq!(p.timestamp(), 42);

    let r = ArtifactName::parse("my_slide_42.png").unwrap();
    assert_eq!(r.kind(), ArtifactKind::Raw);
    assert_eq!(r.slide(), "my_slide");
    assert_eq!(r.processed(), p);
}

#[test]
fn parse_rejects_foreign_files() {
    for name in [
        "weather.png",
        "weather_.png",
        "_42.png",
        "weather_42.jpg",
        "weather_4x2.png",
        "weather_-42.png",
        ".weather_42.png.123.0.tmp",
        ".weather_42.png",
        "O_.png",
        "currentimage.png",
    ] {
        assert_eq!(ArtifactName::parse(name), None, "{name}");
    }
}

#[test]
fn file_name_parse_is_lossless_for_keys() {
    for slide in ["a", "a_b_c", "Wetter-Köln", "v1.2"] {
        let raw = ArtifactName::raw(artifact_key(slide), 7);
        assert_eq!(ArtifactName::parse(&raw.file_name()), Some(raw.clone()));
        let processed = raw.processed();
        assert_eq!(
            ArtifactName::parse(&processed.file_name()),
            Some(processed.clone())
        );
    }
}

#[test]
fn artifact_key_escapes_unsafe_names() {
    assert_eq!(artifact_key("weather"), "weather");
    assert_eq!(artifact_key(" Bus Times "), "Bus-Times");
    assert_eq!(artifact_key("../etc/passwd"), "_..-etc-passwd");
    assert_eq!(artifact_key("O_clock"), "_O_clock");
    assert_eq!(artifact_key("O"), "_O");
    assert_eq!(artifact_key("Oslo"), "Oslo");
    assert_eq!(artifact_key(".hidden"), "_.hidden");
    assert_eq!(artifact_key("   "), "slide");
}

#[test]
fn escaped_processed_lookalike_parses_as_raw() {
    let raw = ArtifactName::raw(artifact_key("O_clock"), 5);
    let parsed = ArtifactName::parse(&raw.file_name()).unwrap();
    assert_eq!(parsed.kind(), ArtifactKind::Raw);
    assert_eq!(parsed.slide(), "_O_clock");
}

#[test]
fn single_letter_o_key_stays_a_raw_artifact() {
    let raw = ArtifactName::raw(artifact_key("O"), 1_000);
    assert_eq!(raw.file_name(), "_O_1000.png");
    let parsed = ArtifactName::parse(&raw.file_name()).unwrap();
    assert_eq!(parsed.kind(), ArtifactKind::Raw);
    assert_eq!(parsed.slide(), "_O");
    assert_eq!(
        ArtifactName::parse(&raw.processed().file_name()),
        Some(raw.processed())
    );
}

#[test]
fn unix_secs_truncates_and_clamps() {
    let t = UNIX_EPOCH + std::time::Duration::from_millis(12_999);
    assert_eq!(unix_secs(t), 12);
    assert_eq!(unix_secs(UNIX_EPOCH - std::time::Duration::from_secs(1)), 0);
}
