use super::*;

fn approx4(a: Rgba, b: Rgba) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1.0 / 255.0)
}

#[test]
fn names_parse_back_to_formats() {
    for f in PixelFormat::ALL {
        assert_eq!(f.name().parse::<PixelFormat>().unwrap(), f);
        assert_eq!(f.to_string(), f.name());
    }
    assert_eq!(
        "argb32_premultiplied".parse::<PixelFormat>().unwrap(),
        PixelFormat::Argb32Premultiplied
    );
    assert!(matches!(
        "RGB565".parse::<PixelFormat>(),
        Err(FirtreeError::Format(_))
    ));
}

#[test]
fn serde_uses_canonical_names() {
    let json = serde_json::to_string(&PixelFormat::RgbaF32Premultiplied).unwrap();
    assert_eq!(json, "\"RGBA_F32_PREMULTIPLIED\"");
    let back: PixelFormat = serde_json::from_str("\"BGRX32\"").unwrap();
    assert_eq!(back, PixelFormat::Bgrx32);
}

#[test]
fn pixel_sizes() {
    assert_eq!(PixelFormat::Rgb24.bytes_per_pixel(), 3);
    assert_eq!(PixelFormat::Xrgb32.bytes_per_pixel(), 4);
    assert_eq!(PixelFormat::RgbaF32Premultiplied.bytes_per_pixel(), 16);
    assert!(!PixelFormat::Rgbx32.has_alpha());
    assert!(PixelFormat::Abgr32.has_alpha());
}

#[test]
fn byte_order_follows_name() {
    let c = [1.0, 0.0, 0.0, 1.0];
    let mut px = [0u8; 4];
    PixelFormat::Argb32Premultiplied.encode_pixel(c, &mut px);
    assert_eq!(px, [255, 255, 0, 0]);
    PixelFormat::Bgra32Premultiplied.encode_pixel(c, &mut px);
    assert_eq!(px, [0, 0, 255, 255]);
    PixelFormat::Xbgr32.encode_pixel(c, &mut px);
    assert_eq!(px, [255, 0, 0, 255]);

    let mut px3 = [0u8; 3];
    PixelFormat::Bgr24.encode_pixel([0.0, 0.0, 1.0, 1.0], &mut px3);
    assert_eq!(px3, [255, 0, 0]);
}

#[test]
fn straight_formats_unpremultiply_on_write() {
    let half_red = [0.5, 0.0, 0.0, 0.5];
    let mut straight = [0u8; 4];
    PixelFormat::Rgba32.encode_pixel(half_red, &mut straight);
    assert_eq!(straight, [255, 0, 0, 128]);

    let mut pre = [0u8; 4];
    PixelFormat::Rgba32Premultiplied.encode_pixel(half_red, &mut pre);
    assert_eq!(pre, [128, 0, 0, 128]);

    let back = PixelFormat::Rgba32.decode_pixel(&straight);
    assert!(approx4(back, [128.0 / 255.0, 0.0, 0.0, 128.0 / 255.0]));
}

#[test]
fn zero_alpha_straight_writes_zero_color() {
    let mut px = [9u8; 4];
    PixelFormat::Argb32.encode_pixel([0.3, 0.2, 0.1, 0.0], &mut px);
    assert_eq!(px, [0, 0, 0, 0]);
}

#[test]
fn formats_without_alpha_read_opaque() {
    let c = PixelFormat::Xrgb32.decode_pixel(&[0, 10, 20, 30]);
    assert_eq!(c[3], 1.0);
    assert!(approx4(c, [10.0 / 255.0, 20.0 / 255.0, 30.0 / 255.0, 1.0]));
    let c = PixelFormat::Rgb24.decode_pixel(&[255, 0, 255]);
    assert_eq!(c, [1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn float_format_keeps_values_verbatim() {
    let c = [0.25, -0.5, 1.5, 0.75];
    let mut px = [0u8; 16];
    PixelFormat::RgbaF32Premultiplied.encode_pixel(c, &mut px);
    assert_eq!(&px[4..8], &(-0.5f32).to_ne_bytes());
    assert_eq!(PixelFormat::RgbaF32Premultiplied.decode_pixel(&px), c);
}

#[test]
fn out_of_range_values_clamp() {
    let mut px = [0u8; 4];
    PixelFormat::Rgba32Premultiplied.encode_pixel([2.0, -1.0, f32::NAN, 1.0], &mut px);
    assert_eq!(px, [255, 0, 0, 255]);
}

#[test]
fn desc_validation() {
    let d = BufferDesc::packed(4, 3, PixelFormat::Rgba32);
    assert_eq!(d.stride, 16);
    assert_eq!(d.required_len().unwrap(), 48);
    assert!(d.validate(48).is_ok());
    assert!(matches!(d.validate(47), Err(FirtreeError::Format(_))));

    let padded = BufferDesc::new(4, 3, 20, PixelFormat::Rgba32);
    assert_eq!(padded.required_len().unwrap(), 56);

    let narrow = BufferDesc::new(4, 3, 8, PixelFormat::Rgba32);
    assert!(matches!(narrow.validate(1000), Err(FirtreeError::Format(_))));

    let empty = BufferDesc::packed(0, 0, PixelFormat::Rgb24);
    assert!(empty.validate(0).is_ok());
}

#[test]
fn encode_skips_row_padding() {
    let d = BufferDesc::new(1, 2, 6, PixelFormat::Rgb24);
    let mut out = [7u8; 9];
    d.encode(&[[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]], &mut out)
        .unwrap();
    assert_eq!(out, [255, 0, 0, 7, 7, 7, 0, 255, 0]);

    let texels = d.decode(&out).unwrap();
    assert_eq!(texels, vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]]);
}

#[test]
fn encode_rejects_texel_count_mismatch() {
    let d = BufferDesc::packed(2, 2, PixelFormat::Rgba32);
    let mut out = [0u8; 16];
    assert!(matches!(
        d.encode(&[[0.0; 4]; 3], &mut out),
        Err(FirtreeError::Format(_))
    ));
}
