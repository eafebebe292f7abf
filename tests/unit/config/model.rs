use super::*;

#[test]
fn empty_document_uses_documented_defaults() {
    let cfg = PipelineConfig::from_json_str("{}").unwrap();
    assert!(cfg.slides.is_empty());
    assert_eq!(cfg.global.resolution(), DEFAULT_RESOLUTION);
    assert_eq!(cfg.global.slide_frequency(), Duration::from_secs(60));
    assert_eq!(cfg.global.default_interval(), Duration::from_secs(5 * 60));
    assert_eq!(cfg.global.max_retries(), 3);
    assert_eq!(cfg.global.transforms(), GlobalTransforms::default());
    assert_eq!(cfg.global.timezone(), StampZone::Utc);
    assert_eq!(cfg.overlay.font_size(), FontSize::Medium);
    assert_eq!(cfg.overlay.align(), Align::Center);
    assert_eq!(cfg.overlay.position(), Position::None);
}

#[test]
fn full_document_round_trips_the_fields_the_pipeline_reads() {
    let cfg = PipelineConfig::from_json_str(
        r#"{
            "global": {
                "resolution": "1024x758",
                "slideFrequency": 30,
                "invert": true,
                "grayscale": true,
                "boostContrast": true,
                "convertbw": false,
                "defaultInterval": 2,
                "maxRetries": 1,
                "timezone": "+02:00",
                "cacheDuration": 10
            },
            "overlay": { "fontSize": "large", "align": "right", "position": "bottom" },
            "slides": [
                { "name": "weather", "url": "https://example.com/w", "interval": 1, "showTime": true },
                { "name": "calendar", "url": "https://example.com/c", "enabled": false }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(
        cfg.global.resolution(),
        Resolution {
            width: 1024,
            height: 758
        }
    );
    assert_eq!(cfg.global.slide_frequency(), Duration::from_secs(30));
    assert_eq!(cfg.global.max_retries(), 1);
    assert_eq!(cfg.global.cache_duration(), Some(Duration::from_secs(600)));
    assert_eq!(
        cfg.global.transforms(),
        GlobalTransforms {
            invert: true,
            grayscale: true,
            boost_contrast: true,
            black_white: false,
        }
    );
    assert_eq!(
        cfg.global.timezone(),
        StampZone::Fixed(chrono::FixedOffset::east_opt(7200).unwrap())
    );
    assert_eq!(cfg.overlay.font_size(), FontSize::Large);
    assert_eq!(cfg.overlay.align(), Align::Right);
    assert_eq!(cfg.overlay.position(), Position::Bottom);

    let weather = cfg.slide("weather").unwrap();
    assert_eq!(weather.interval(&cfg.global), Duration::from_secs(60));
    assert_eq!(weather.show_time, Some(true));
    let calendar = cfg.slide("calendar").unwrap();
    assert_eq!(calendar.interval(&cfg.global), Duration::from_secs(120));
    assert_eq!(cfg.enabled_slide_names(), vec!["weather".to_string()]);
}

#[test]
fn malformed_resolution_falls_back_to_800x600() {
    let cfg = PipelineConfig::from_json_str(r#"{ "global": { "resolution": "abcx def" } }"#)
        .unwrap();
    assert_eq!(cfg.global.resolution(), DEFAULT_RESOLUTION);

    assert_eq!(Resolution::parse("800"), None);
    assert_eq!(Resolution::parse("0x600"), None);
    assert_eq!(Resolution::parse("99999x10"), None);
    assert_eq!(
        Resolution::parse(" 640 X 480 "),
        Some(Resolution {
            width: 640,
            height: 480
        })
    );
}

#[test]
fn slide_resolution_override_wins_when_valid() {
    let global = GlobalConfig {
        resolution: Some("1200x800".to_string()),
        ..GlobalConfig::default()
    };
    let mut slide = SlideSpec::new("a", "https://a");
    assert_eq!(slide.resolution(&global).width, 1200);

    slide.resolution = Some("300x200".to_string());
    assert_eq!(slide.resolution(&global).width, 300);

    slide.resolution = Some("garbage".to_string());
    assert_eq!(slide.resolution(&global).width, 1200);
}

#[test]
fn wrong_field_types_are_treated_as_absent() {
    let cfg = PipelineConfig::from_json_str(
        r#"{
            "global": { "slideFrequency": "fast", "maxRetries": -2, "invert": "yes" },
            "overlay": { "fontSize": 12, "position": ["top"] },
            "slides": [ { "name": "a", "url": "https://a", "interval": "soon", "enabled": "no" } ]
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.global.slide_frequency(), Duration::from_secs(60));
    assert_eq!(cfg.global.max_retries(), 3);
    assert!(!cfg.global.transforms().invert);
    assert_eq!(cfg.overlay.font_size(), FontSize::Medium);
    assert_eq!(cfg.overlay.position(), Position::None);

    let a = cfg.slide("a").unwrap();
    assert!(a.is_enabled());
    assert_eq!(a.interval(&cfg.global), Duration::from_secs(300));
}

#[test]
fn non_positive_periods_fall_back() {
    let cfg = PipelineConfig::from_json_str(
        r#"{ "global": { "slideFrequency": 0, "defaultInterval": -3, "cacheDuration": 0 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.global.slide_frequency(), Duration::from_secs(60));
    assert_eq!(cfg.global.default_interval(), Duration::from_secs(300));
    assert_eq!(cfg.global.cache_duration(), None);
}

#[test]
fn unknown_position_is_kept_as_unrecognized() {
    let cfg = PipelineConfig::from_json_str(r#"{ "overlay": { "position": "middle" } }"#).unwrap();
    assert_eq!(
        cfg.overlay.position(),
        Position::Unrecognized("middle".to_string())
    );

    let cfg = PipelineConfig::from_json_str(r#"{ "overlay": { "align": "justify" } }"#).unwrap();
    assert_eq!(cfg.overlay.align(), Align::Center);
}

#[test]
fn show_clock_is_an_alias_for_show_time() {
    let cfg = PipelineConfig::from_json_str(r#"{ "overlay": { "showClock": true } }"#).unwrap();
    assert_eq!(cfg.overlay.show_time, Some(true));
}

#[test]
fn slides_get_stable_names_and_duplicates_are_dropped() {
    let cfg = PipelineConfig::from_json_str(
        r#"{ "slides": [
            { "url": "https://first" },
            "not a slide",
            { "name": "a/b", "url": "https://ab" },
            { "name": "dup", "url": "https://1" },
            { "name": "dup", "url": "https://2" }
        ] }"#,
    )
    .unwrap();

    let names: Vec<&str> = cfg.slides.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["slide1", "a-b", "dup"]);
    assert_eq!(cfg.slide("dup").unwrap().url, "https://1");
}

#[test]
fn slides_that_are_not_a_list_yield_no_slides() {
    let cfg = PipelineConfig::from_json_str(r#"{ "slides": { "a": 1 } }"#).unwrap();
    assert!(cfg.slides.is_empty());
}

#[test]
fn non_object_document_is_a_config_error() {
    let err = PipelineConfig::from_json_str("[1, 2]").unwrap_err();
    assert!(matches!(err, DashError::Config(_)));
    assert!(PipelineConfig::from_json_str("{ not json").is_err());
}

#[test]
fn stamp_zone_parsing() {
    assert_eq!(StampZone::parse("UTC"), Some(StampZone::Utc));
    assert_eq!(StampZone::parse("local"), Some(StampZone::Local));
    assert_eq!(
        StampZone::parse("-0800"),
        Some(StampZone::Fixed(
            chrono::FixedOffset::east_opt(-8 * 3600).unwrap()
        ))
    );
    let india = Some(StampZone::Fixed(
        chrono::FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap(),
    ));
    assert_eq!(StampZone::parse("+5:30"), india);
    assert_eq!(StampZone::parse("+530"), india);
    assert_eq!(
        StampZone::parse("-3:30"),
        Some(StampZone::Fixed(
            chrono::FixedOffset::east_opt(-(3 * 3600 + 30 * 60)).unwrap()
        ))
    );
    assert_eq!(StampZone::parse("+5:60"), None);
    assert_eq!(StampZone::parse("+12345"), None);
    assert_eq!(
        StampZone::parse("+05:30"),
        Some(StampZone::Fixed(
            chrono::FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
        ))
    );
    assert_eq!(StampZone::parse("America/New_York"), None);
    assert_eq!(StampZone::parse("+25"), None);
}

#[test]
fn font_size_pixels_scale_with_width_and_floor_at_8() {
    assert_eq!(FontSize::Medium.pixels_for(800), 56.0);
    assert_eq!(FontSize::Small.pixels_for(800), 40.0);
    assert_eq!(FontSize::Large.pixels_for(800), 72.0);
    assert_eq!(FontSize::Large.pixels_for(20), 8.0);
}

#[test]
fn serialized_config_uses_camel_case() {
    let cfg = PipelineConfig {
        global: GlobalConfig {
            slide_frequency: Some(15.0),
            boost_contrast: Some(true),
            ..GlobalConfig::default()
        },
        overlay: OverlayConfig {
            position: Some(Position::Top),
            ..OverlayConfig::default()
        },
        slides: vec![SlideSpec::new("a", "https://a")],
    };
    let json = serde_json::to_value(&cfg).unwrap();
    assert_eq!(json["global"]["slideFrequency"], 15.0);
    assert_eq!(json["global"]["boostContrast"], true);
    assert_eq!(json["overlay"]["position"], "top");
    assert!(json["global"].get("resolution").is_none());
}
