use super::*;

#[test]
fn new_checks_byte_length() {
    assert!(FrameRGBA::new(2, 2, vec![0; 16]).is_ok());
    assert!(FrameRGBA::new(2, 2, vec![0; 15]).is_err());
}

#[test]
fn pixel_lookup_is_row_major_and_bounded() {
    let mut data = vec![0u8; 2 * 2 * 4];
    data[(2 + 1) * 4..(2 + 1) * 4 + 4].copy_from_slice(&[9, 8, 7, 255]);
    let f = FrameRGBA::new(2, 2, data).unwrap();
    assert_eq!(f.pixel(1, 1), Some([9, 8, 7, 255]));
    assert_eq!(f.pixel(2, 0), None);
}

#[test]
fn opaque_copy_flattens_transparent_pixels() {
    let f = FrameRGBA::new(1, 1, vec![0, 0, 0, 0]).unwrap();
    assert_eq!(f.to_opaque_rgba8([5, 6, 7]), vec![5, 6, 7, 255]);
}

#[test]
fn pixmap_conversion_rejects_mismatched_len() {
    assert!(pixmap_from_premul_bytes(&[0u8; 12], 2, 2).is_err());
    let pm = pixmap_from_premul_bytes(&[0u8; 16], 2, 2).unwrap();
    assert_eq!((pm.width(), pm.height()), (2, 2));
}
