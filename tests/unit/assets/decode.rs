use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_dimensions_and_premul() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8, 0, 0, 0, 0];
    let img = image::RgbaImage::from_raw(2, 1, src_rgba).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let sampler = decode_image(&buf).unwrap();
    assert_eq!((sampler.width(), sampler.height()), (2, 1));
    let px = sampler.pixel(0, 0).unwrap();
    let a = 128.0 / 255.0;
    let expected = [100.0 / 255.0 * a, 50.0 / 255.0 * a, 200.0 / 255.0 * a, a];
    for (got, want) in px.iter().zip(expected) {
        assert!((got - want).abs() < 1e-6, "{px:?}");
    }
    assert_eq!(sampler.pixel(1, 0), Some([0.0; 4]));
}

#[test]
fn decode_rejects_garbage() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(err.to_string().contains("decode image"));
}

#[test]
fn load_reports_missing_file() {
    let err = load_image("/nonexistent/firtree/input.png").unwrap_err();
    assert!(err.to_string().contains("read image"));
}
