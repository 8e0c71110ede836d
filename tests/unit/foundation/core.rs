use super::*;

#[test]
fn open_graph_canvas_is_1200_by_630() {
    assert_eq!(Canvas::OPEN_GRAPH.width, 1200);
    assert_eq!(Canvas::OPEN_GRAPH.height, 630);
    assert_eq!(Canvas::default(), Canvas::OPEN_GRAPH);
}

#[test]
fn canvas_rejects_zero_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(Canvas::new(64, 32).unwrap(), Canvas { width: 64, height: 32 });
}

#[test]
fn hex_parsing_accepts_rgb_and_rgba() {
    assert_eq!(Rgba8::from_hex("#0f172a").unwrap(), Rgba8::rgb(0x0f, 0x17, 0x2a));
    assert_eq!(
        Rgba8::from_hex("F8FAFC80").unwrap(),
        Rgba8 {
            r: 0xf8,
            g: 0xfa,
            b: 0xfc,
            a: 0x80
        }
    );
    assert!(Rgba8::from_hex("#123").is_err());
    assert!(Rgba8::from_hex("#zzzzzz").is_err());
    assert!(Rgba8::from_hex("#ééé").is_err());
}

#[test]
fn hex_round_trips_through_serde() {
    let c = Rgba8::from_hex("#334155").unwrap();
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"#334155\"");
    let back: Rgba8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
}

#[test]
fn premultiply_scales_channels_by_alpha() {
    let c = Rgba8 {
        r: 100,
        g: 50,
        b: 200,
        a: 128,
    };
    assert_eq!(
        c.premultiplied(),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
    assert_eq!(Rgba8::rgb(1, 2, 3).premultiplied(), [1, 2, 3, 255]);
}
