//! End-to-end tests against the real codecs and the ZIP archiver.
//!
//! Everything here goes bytes in, bytes out, exactly as the CLI drives the
//! library, so no test touches the filesystem.

use rasterkit::archive::ZipArchiver;
use rasterkit::batch::{
    self, BatchError, BatchEvent, BatchOperation, BatchOptions, BatchResult, SourceFile,
};
use rasterkit::imaging::{
    BlobFormat, EncodedBlob, FaviconSize, FlipAxis, ImageBackend, ImageFormat, PlaceholderSpec,
    Quality, RustBackend, Surface, TransformRequest, operations,
};
use std::io::{Cursor, Read};
use std::sync::mpsc;

fn gradient(width: u32, height: u32) -> Surface {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 90, 255]);
        }
    }
    Surface::from_rgba(width, height, pixels).unwrap()
}

fn encode(surface: &Surface, format: ImageFormat, quality: f32) -> EncodedBlob {
    RustBackend::new()
        .encode(surface, format, Quality::new(quality))
        .unwrap()
}

fn png(width: u32, height: u32) -> EncodedBlob {
    encode(&gradient(width, height), ImageFormat::Png, 0.92)
}

fn dimensions(blob: &EncodedBlob) -> (u32, u32) {
    RustBackend::new().decode(blob).unwrap().dimensions()
}

fn red_jpeg() -> EncodedBlob {
    let red = Surface::filled(4, 4, [255, 0, 0, 255]).unwrap();
    encode(&red, ImageFormat::Jpeg, 1.0)
}

// =========================================================================
// 4×4 red JPEG walkthrough
// =========================================================================

#[test]
fn red_jpeg_compresses_without_growing() {
    let backend = RustBackend::new();
    let input = red_jpeg();
    let out = operations::compress_one(&backend, &input, Quality::COMPRESS_DEFAULT).unwrap();
    assert!(out.len() <= input.len());
    assert_eq!(dimensions(&out), (4, 4));
}

#[test]
fn red_jpeg_grayscale_lands_on_red_luma() {
    let backend = RustBackend::new();
    let gray = operations::grayscale(&backend, &red_jpeg()).unwrap();
    assert_eq!(gray.format(), BlobFormat::Image(ImageFormat::Jpeg));

    let surface = backend.decode(&gray).unwrap();
    let [r, g, b, a] = surface.pixel(1, 1);
    // 0.299 · 255 ≈ 76
    for channel in [r, g, b] {
        assert!((70..=82).contains(&channel), "channel {channel}");
    }
    assert_eq!(a, 255);
}

#[test]
fn webp_compression_does_not_grow_the_file() {
    let backend = RustBackend::new();
    let input = encode(&gradient(128, 128), ImageFormat::WebP, 1.0);
    let out = rasterkit::imaging::compress::compress(&backend, &input, Quality::COMPRESS_DEFAULT)
        .unwrap();
    assert_eq!(out.blob.format(), BlobFormat::Image(ImageFormat::WebP));
    assert!(out.blob.len() <= input.len(), "{} > {}", out.blob.len(), input.len());
    assert_eq!(
        backend.decode(&out.blob).unwrap(),
        backend.decode(&input).unwrap()
    );
}

#[test]
fn webp_conversion_ignores_quality() {
    let source = png(64, 32);
    let backend = RustBackend::new();
    let high = operations::convert_one(&backend, &source, ImageFormat::WebP, Some(Quality::new(1.0)))
        .unwrap();
    let default = operations::convert_one(&backend, &source, ImageFormat::WebP, None).unwrap();
    assert_eq!(default.len(), high.len());
}

// =========================================================================
// Batches
// =========================================================================

#[test]
fn single_file_batch_returns_the_image() {
    let files = vec![SourceFile::new("photos/a.png", png(16, 8))];
    let result = batch::convert_many(
        &RustBackend::new(),
        &ZipArchiver::new(),
        &files,
        ImageFormat::WebP,
        None,
    )
    .unwrap();

    match result {
        BatchResult::Single(item) => {
            assert_eq!(item.filename, "a.webp");
            assert_eq!(item.blob.format(), BlobFormat::Image(ImageFormat::WebP));
            assert_eq!(dimensions(&item.blob), (16, 8));
        }
        other => panic!("expected a single image, got {other:?}"),
    }
}

#[test]
fn multi_file_batch_returns_a_readable_zip() {
    let files = vec![
        SourceFile::new("a.png", png(16, 8)),
        SourceFile::new("b.png", png(8, 16)),
    ];
    let result = batch::convert_many(
        &RustBackend::new(),
        &ZipArchiver::new(),
        &files,
        ImageFormat::Jpeg,
        Some(Quality::new(0.8)),
    )
    .unwrap();

    let BatchResult::Archive { blob, entries } = result else {
        panic!("expected an archive");
    };
    assert_eq!(entries, vec!["a.jpg", "b.jpg"]);
    assert_eq!(blob.format(), BlobFormat::Zip);

    let mut zip = zip::ZipArchive::new(Cursor::new(blob.into_bytes())).unwrap();
    assert_eq!(zip.len(), 2);
    for (name, expected) in [("a.jpg", (16, 8)), ("b.jpg", (8, 16))] {
        let mut bytes = Vec::new();
        zip.by_name(name).unwrap().read_to_end(&mut bytes).unwrap();
        let entry = EncodedBlob::from_bytes(bytes);
        assert_eq!(entry.image_format(), Some(ImageFormat::Jpeg));
        assert_eq!(dimensions(&entry), expected);
    }
}

#[test]
fn duplicate_names_are_numbered_inside_the_archive() {
    let files = vec![
        SourceFile::new("one/pic.png", png(4, 4)),
        SourceFile::new("two/pic.png", png(4, 4)),
    ];
    let result = batch::convert_many(
        &RustBackend::new(),
        &ZipArchiver::new(),
        &files,
        ImageFormat::Png,
        None,
    )
    .unwrap();
    let BatchResult::Archive { entries, .. } = result else {
        panic!("expected an archive");
    };
    assert_eq!(entries, vec!["pic.png", "pic_2.png"]);
}

#[test]
fn batch_stops_at_the_first_bad_file() {
    let files = vec![
        SourceFile::new("good.png", png(4, 4)),
        SourceFile::new("broken.png", EncodedBlob::from_bytes(b"nope".to_vec())),
        SourceFile::new("never.png", png(4, 4)),
    ];
    let (tx, rx) = mpsc::channel();
    let options = BatchOptions {
        events: Some(tx),
        ..Default::default()
    };
    let err = batch::run_batch(
        &RustBackend::new(),
        &ZipArchiver::new(),
        &files,
        &BatchOperation::Compress {
            quality: Quality::COMPRESS_DEFAULT,
        },
        &options,
    )
    .unwrap_err();
    drop(options);

    assert!(matches!(err, BatchError::Item { index: 1, ref filename, .. } if filename == "broken.png"));
    assert!(err.to_string().starts_with("Failed on file 2 (broken.png)"));

    let events: Vec<BatchEvent> = rx.into_iter().collect();
    assert!(!events.iter().any(|e| matches!(e, BatchEvent::Archived { .. })));
    assert!(!events.iter().any(|e| matches!(e, BatchEvent::Started { index: 2, .. })));
}

#[test]
fn edit_batch_keeps_source_format_and_suffix() {
    let files = vec![SourceFile::new("wide.png", png(100, 50))];
    let result = batch::run_batch(
        &RustBackend::new(),
        &ZipArchiver::new(),
        &files,
        &BatchOperation::Edit(TransformRequest::Rotate { degrees: 90.0 }),
        &BatchOptions::default(),
    )
    .unwrap();
    let BatchResult::Single(item) = result else {
        panic!("expected a single image");
    };
    assert_eq!(item.filename, "wide_rotated.png");
    assert_eq!(dimensions(&item.blob), (50, 100));
}

// =========================================================================
// Single-image operations
// =========================================================================

#[test]
fn resize_produces_exact_dimensions() {
    let out = operations::resize(&RustBackend::new(), &png(40, 20), 10, 30).unwrap();
    assert_eq!(dimensions(&out), (10, 30));
}

#[test]
fn rotation_bounding_boxes() {
    let backend = RustBackend::new();
    let source = png(100, 50);
    assert_eq!(dimensions(&operations::rotate(&backend, &source, 90.0).unwrap()), (50, 100));
    assert_eq!(dimensions(&operations::rotate(&backend, &source, 0.0).unwrap()), (100, 50));
    assert_eq!(dimensions(&operations::rotate(&backend, &source, 360.0).unwrap()), (100, 50));
    assert_eq!(dimensions(&operations::rotate(&backend, &source, 30.0).unwrap()), (112, 94));
}

#[test]
fn rotated_corners_are_clear_with_alpha_and_white_without() {
    let backend = RustBackend::new();
    let red = Surface::filled(40, 20, [255, 0, 0, 255]).unwrap();

    let png = operations::rotate(&backend, &encode(&red, ImageFormat::Png, 0.92), 45.0).unwrap();
    assert_eq!(png.format(), BlobFormat::Image(ImageFormat::Png));
    let surface = backend.decode(&png).unwrap();
    assert_eq!(surface.dimensions(), (43, 43));
    assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(surface.pixel(42, 42), [0, 0, 0, 0]);

    let jpeg = operations::rotate(&backend, &encode(&red, ImageFormat::Jpeg, 0.92), 45.0).unwrap();
    assert_eq!(jpeg.format(), BlobFormat::Image(ImageFormat::Jpeg));
    let surface = backend.decode(&jpeg).unwrap();
    assert_eq!(surface.dimensions(), (43, 43));
    let [r, g, b, a] = surface.pixel(0, 0);
    assert!(r > 240 && g > 240 && b > 240, "{:?}", [r, g, b]);
    assert_eq!(a, 255);
    // center stays red
    let [r, g, _, _] = surface.pixel(21, 21);
    assert!(r > 200 && g < 60, "{:?}", surface.pixel(21, 21));
}

#[test]
fn flip_twice_is_identity_on_lossless_data() {
    let backend = RustBackend::new();
    let source = png(12, 7);
    let once = operations::flip(&backend, &source, FlipAxis::Horizontal).unwrap();
    let twice = operations::flip(&backend, &once, FlipAxis::Horizontal).unwrap();
    assert_eq!(
        backend.decode(&twice).unwrap().pixels(),
        backend.decode(&source).unwrap().pixels()
    );
}

#[test]
fn merge_stacks_vertically() {
    let backend = RustBackend::new();
    let merged = operations::merge(&backend, &[png(10, 5), png(20, 7)]).unwrap();
    assert_eq!(merged.format(), BlobFormat::Image(ImageFormat::Png));
    let surface = backend.decode(&merged).unwrap();
    assert_eq!(surface.dimensions(), (20, 12));
    // right of the narrow first image is white fill
    assert_eq!(surface.pixel(15, 2), [255, 255, 255, 255]);
}

#[test]
fn favicon_is_a_square_ico() {
    let icon = operations::make_favicon(&RustBackend::new(), &png(64, 40), FaviconSize::Px48).unwrap();
    assert_eq!(icon.format(), BlobFormat::Image(ImageFormat::Ico));
    assert_eq!(dimensions(&icon), (48, 48));
}

#[test]
fn placeholder_renders_background_and_label() {
    let spec = PlaceholderSpec {
        width: 120,
        height: 80,
        ..PlaceholderSpec::default()
    };
    let backend = RustBackend::new();
    let blob = operations::placeholder(&backend, &spec).unwrap();
    let surface = backend.decode(&blob).unwrap();
    assert_eq!(surface.dimensions(), (120, 80));
    assert_eq!(surface.pixel(0, 0), spec.background);
    let label_pixels = surface
        .pixels()
        .chunks_exact(4)
        .filter(|px| *px == spec.color)
        .count();
    assert!(label_pixels > 0);
}

#[test]
fn inspect_reports_format_and_size() {
    let blob = png(9, 4);
    let info = operations::inspect(&RustBackend::new(), &blob).unwrap();
    assert_eq!(info.format, ImageFormat::Png);
    assert_eq!(info.mime_type, "image/png");
    assert_eq!((info.width, info.height), (9, 4));
    assert_eq!(info.bytes, blob.len());
    assert!(!info.has_alpha);
}
