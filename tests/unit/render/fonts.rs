use super::*;

fn system_registry() -> Option<FontRegistry> {
    let mut reg = FontRegistry::new();
    reg.register_system_fonts();
    if reg.is_empty() {
        eprintln!("no system fonts available, skipping");
        return None;
    }
    Some(reg)
}

fn clamped(lines: u32) -> TextSpec {
    TextSpec {
        size_px: 36.0,
        line_height: 1.4,
        max_lines: Some(lines),
        ellipsis: true,
        ..TextSpec::default()
    }
}

#[test]
fn font_stack_puts_requested_family_first() {
    let mut reg = FontRegistry::new();
    reg.families.push("Fallback Sans".into());
    assert_eq!(
        reg.font_stack(Some("Plus Jakarta Sans")),
        "\"Plus Jakarta Sans\", \"Fallback Sans\", sans-serif"
    );
    assert_eq!(reg.font_stack(None), "\"Fallback Sans\", sans-serif");
    assert_eq!(
        reg.font_stack(Some("Fallback Sans")),
        "\"Fallback Sans\", sans-serif"
    );
}

#[test]
fn register_bytes_rejects_non_font_data() {
    let mut reg = FontRegistry::new();
    assert!(reg.register_bytes(b"not a font".to_vec()).is_err());
    assert!(reg.is_empty());
}

#[test]
fn register_file_reports_missing_path() {
    let mut reg = FontRegistry::new();
    let err = reg.register_file("/definitely/missing/font.ttf").unwrap_err();
    assert!(err.to_string().contains("read font"));
}

#[test]
fn empty_config_builds_empty_registry() {
    let reg = FontRegistry::from_config(&FontConfig::default()).unwrap();
    assert!(reg.families().is_empty());
}

#[test]
fn short_text_is_left_alone() {
    let Some(mut reg) = system_registry() else {
        return;
    };
    let shaped = reg.shape("Hello", &clamped(3), Some(720.0));
    assert_eq!(shaped.text, "Hello");
    assert_eq!(shaped.line_count(), 1);
    assert!(!shaped.is_truncated());
    assert!(shaped.width() > 0.0 && shaped.width() <= 720.0);
}

#[test]
fn long_text_is_clamped_with_ellipsis() {
    let Some(mut reg) = system_registry() else {
        return;
    };
    let long = "lorem ipsum dolor sit amet ".repeat(60);

    let free = reg.shape(&long, &TextSpec::default(), Some(720.0));
    assert!(free.line_count() > 3);

    let shaped = reg.shape(&long, &clamped(3), Some(720.0));
    assert!(shaped.line_count() <= 3);
    assert!(shaped.is_truncated());
    assert!(long.starts_with(shaped.text.trim_end_matches(ELLIPSIS)));
}

#[test]
fn clamp_without_ellipsis_cuts_silently() {
    let Some(mut reg) = system_registry() else {
        return;
    };
    let long = "word ".repeat(400);
    let spec = TextSpec {
        ellipsis: false,
        ..clamped(2)
    };
    let shaped = reg.shape(&long, &spec, Some(300.0));
    assert!(shaped.line_count() <= 2);
    assert!(shaped.is_truncated());
    assert!(!shaped.text.ends_with(ELLIPSIS));
}
