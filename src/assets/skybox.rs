use super::AssetError;

/// Six square RGBA8 (sRGB) images of equal size, in +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone)]
pub struct CubeFaces {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

/// Decode the six encoded face images. `faces` pairs each image's path
/// (for error messages) with its encoded bytes.
pub fn decode_cube_faces(faces: [(String, Vec<u8>); 6]) -> Result<CubeFaces, AssetError> {
    let mut size = None;
    let mut decoded: [Vec<u8>; 6] = Default::default();

    for (slot, (path, bytes)) in decoded.iter_mut().zip(faces) {
        let image = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Image { path: path.clone(), source })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let expected = *size.get_or_insert(width);
        if width != expected || height != expected {
            return Err(AssetError::FaceSize { path, width, height, expected });
        }
        *slot = image.into_raw();
    }

    Ok(CubeFaces { size: size.unwrap_or(0), faces: decoded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn named(faces: [Vec<u8>; 6]) -> [(String, Vec<u8>); 6] {
        let mut i = 0;
        faces.map(|bytes| {
            i += 1;
            (format!("face{i}.png"), bytes)
        })
    }

    #[test]
    fn decodes_six_faces() {
        let faces = std::array::from_fn(|i| png(4, 4, [i as u8 * 10, 0, 0, 255]));
        let cube = decode_cube_faces(named(faces)).unwrap();
        assert_eq!(cube.size, 4);
        for (i, face) in cube.faces.iter().enumerate() {
            assert_eq!(face.len(), 4 * 4 * 4);
            assert_eq!(face[0], i as u8 * 10);
        }
    }

    #[test]
    fn rejects_mismatched_sizes() {
        let mut faces: [Vec<u8>; 6] = std::array::from_fn(|_| png(4, 4, [0, 0, 0, 255]));
        faces[3] = png(8, 8, [0, 0, 0, 255]);
        match decode_cube_faces(named(faces)) {
            Err(AssetError::FaceSize { path, width, expected, .. }) => {
                assert_eq!(path, "face4.png");
                assert_eq!((width, expected), (8, 4));
            }
            other => panic!("expected a size error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_square_faces() {
        let faces = std::array::from_fn(|_| png(4, 2, [0, 0, 0, 255]));
        assert!(matches!(decode_cube_faces(named(faces)), Err(AssetError::FaceSize { .. })));
    }

    #[test]
    fn reports_undecodable_images() {
        let mut faces: [Vec<u8>; 6] = std::array::from_fn(|_| png(2, 2, [0, 0, 0, 255]));
        faces[0] = b"not an image".to_vec();
        assert!(matches!(decode_cube_faces(named(faces)), Err(AssetError::Image { .. })));
    }
}
