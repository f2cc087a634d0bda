use super::*;

#[test]
fn test_hex_parsing() {
    assert_eq!(
        Rgb::from_hex("#008ae5"),
        Some(Rgb {
            r: 0,
            g: 0x8a,
            b: 0xe5
        })
    );
    assert_eq!(Rgb::from_hex("#fff"), Some(Rgb::WHITE));
    assert_eq!(Rgb::from_hex("008ae5"), None);
    assert_eq!(Rgb::from_hex("#00zz00"), None);
    assert_eq!(Rgb::from_hex("#e50000").map(|c| c.to_hex()), Some("#e50000".to_string()));
}

#[test]
fn test_scale_anchored_at_zero() {
    let settings = DashboardSettings::default_v1();
    let scale = ColorScale::diverging(&settings, 2.0);
    assert_eq!(scale.color_for(0.0), Rgb::WHITE);
    assert_eq!(scale.color_for(2.0).to_hex(), "#e50000");
    assert_eq!(scale.color_for(-2.0).to_hex(), "#008ae5");
    assert_eq!(scale.color_for(1.0).to_hex(), "#f28080");
    assert_eq!(scale.color_for(10.0), scale.color_for(2.0));
}

#[test]
fn test_zero_domain_is_midpoint() {
    let settings = DashboardSettings::default_v1();
    let scale = ColorScale::diverging(&settings, 0.0);
    assert_eq!(scale.color_for(3.0), Rgb::WHITE);
}

#[test]
fn test_text_contrast() {
    assert!((contrast_ratio(Rgb::WHITE, Rgb::BLACK) - 21.0).abs() < 1e-9);
    assert_eq!(text_color(Rgb::from_hex("#e50000").unwrap()), Rgb::WHITE);
    assert_eq!(text_color(Rgb::from_hex("#008ae5").unwrap()), Rgb::BLACK);
    assert_eq!(text_color(Rgb::WHITE), Rgb::BLACK);
}

#[test]
fn test_format_value() {
    assert_eq!(format_value(2.0, 2), "2.00");
    assert_eq!(format_value(-1.234, 2), "-1.23");
    assert_eq!(format_value(-0.001, 2), "0.00");
}
