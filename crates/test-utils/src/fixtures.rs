use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

/// A small opaque PNG suitable as a favicon source.
pub fn png_icon(size: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(size, size, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([0x33, 0x66, 0x99, 0xff])
        } else {
            Rgba([0xff, 0xff, 0xff, 0xff])
        }
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).expect("encode png");
    buf.into_inner()
}

/// Write `files` (relative path, contents) below `root`.
pub fn write_tree(root: &std::path::Path, files: &[(&str, &[u8])]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create_dir_all");
        }
        std::fs::write(&path, contents).expect("write fixture");
    }
}
