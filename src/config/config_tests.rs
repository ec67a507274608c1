use super::*;
use std::io::Write;

#[test]
fn test_default_config() {
    let config = HostConfig::default();
    assert_eq!(config.columns, DEFAULT_COLUMNS);
    assert_eq!(config.rows, DEFAULT_ROWS);
    assert_eq!(config.font.family, DEFAULT_FONT_FAMILY);
    assert_eq!(config.prompt_marker, DEFAULT_PROMPT_MARKER);
    assert_eq!(config.max_retained_lines, DEFAULT_MAX_RETAINED_LINES);
}

#[test]
fn test_empty_document_gives_defaults() {
    let config = parse_config("{}").unwrap();
    assert_eq!(config, HostConfig::default());
}

#[test]
fn test_partial_document_keeps_other_defaults() {
    let config = parse_config(
        r#"{
            "columns": 100,
            "font": { "maxSize": 12.0 },
            "promptMarker": "Press any key"
        }"#,
    )
    .unwrap();

    assert_eq!(config.columns, 100);
    assert_eq!(config.rows, DEFAULT_ROWS);
    assert_eq!(config.font.max_size, 12.0);
    assert_eq!(config.font.min_size, 6.0);
    assert_eq!(config.font.family, DEFAULT_FONT_FAMILY);
    assert_eq!(config.prompt_marker, "Press any key");
}

#[test]
fn test_font_sizes_follow_font_config() {
    let font = FontConfig {
        max_size: 8.0,
        min_size: 7.0,
        step: 0.5,
        ..FontConfig::default()
    };
    assert_eq!(font.sizes().candidates(), vec![8.0, 7.5, 7.0]);
}

#[test]
fn test_interpreter_candidates_in_order() {
    let interpreter = InterpreterConfig::default();
    assert_eq!(
        interpreter.candidates(),
        vec![DEFAULT_INTERPRETER, DEFAULT_INTERPRETER_FALLBACK]
    );
    assert_eq!(interpreter.args.last().map(String::as_str), Some("-File"));

    let interpreter = InterpreterConfig {
        preferred: "bash".to_string(),
        fallback: None,
        args: vec![],
    };
    assert_eq!(interpreter.candidates(), vec!["bash"]);
}

#[test]
fn test_interpreter_without_fallback_field() {
    let config = parse_config(r#"{ "interpreter": { "preferred": "sh", "args": [] } }"#).unwrap();
    assert_eq!(config.interpreter.preferred, "sh");
    assert_eq!(config.interpreter.fallback, None);
    assert!(config.interpreter.args.is_empty());
}

#[test]
fn test_malformed_document_is_config_error() {
    let err = parse_config("{ columns: ").unwrap_err();
    assert!(matches!(err, crate::error::HostError::Config(_)));
}

#[test]
fn test_config_serialization() {
    let config = HostConfig {
        title: "Setup".to_string(),
        columns: 90,
        ..HostConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"promptMarker\""));
    assert!(json.contains("\"maxRetainedLines\""));
    let deserialized = parse_config(&json).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "title": "Installer", "rows": 20 }}"#).unwrap();

    let config = load_config(Some(file.path()));
    assert_eq!(config.title, "Installer");
    assert_eq!(config.rows, 20);
}

#[test]
fn test_load_config_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(Some(&dir.path().join("absent.json")));
    assert_eq!(config, HostConfig::default());
}

#[test]
fn test_load_config_malformed_file_uses_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();
    assert_eq!(load_config(Some(file.path())), HostConfig::default());
}

#[test]
fn test_default_config_path_is_under_home() {
    let path = default_config_path();
    assert!(path.ends_with(".tms-host/config.json"));
}
