// End-to-end pipeline tests over the public API: decode → watermark →
// encode, and mask drawing → binary export, the way a host UI drives them.

use image::{Rgba, RgbaImage};

use mangamark::io;
use mangamark::ops::watermark;
use mangamark::settings::{ImageWatermarkConfig, WatermarkConfig, WatermarkSettings};
use mangamark::{MaskEditor, MaskTool, PresetPosition};

#[test]
fn image_watermark_pipeline() {
    // A white "page" and a small red mark, both as encoded payloads
    let page = RgbaImage::from_pixel(200, 150, Rgba([255, 255, 255, 255]));
    let page_png = io::encode_png(&page).unwrap();
    let mark = RgbaImage::from_pixel(20, 10, Rgba([200, 0, 0, 255]));
    let mark_png = io::encode_png(&mark).unwrap();

    let mut canvas = io::decode_image(&page_png).unwrap();
    let handle = io::decode_image(&mark_png).unwrap();

    let mut settings = WatermarkSettings {
        config: WatermarkConfig::Image(ImageWatermarkConfig {
            image_data: mark_png,
            opacity: 100.0,
            ..Default::default()
        }),
        ..Default::default()
    };
    settings.position.preset = PresetPosition::BottomRight;

    watermark::render(&settings, &mut canvas, Some(&handle));

    // bottom-right with default margins 10: mark occupies (170,130)..(190,140)
    assert_eq!(canvas.get_pixel(175, 135).0, [200, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(10, 10).0, [255, 255, 255, 255]);

    // Result still encodes cleanly
    let out = io::encode_png(&canvas).unwrap();
    assert!(io::decode_image(&out).is_ok());
}

#[test]
fn mask_editing_to_binary_export() {
    let mut editor = MaskEditor::new(120, 90).unwrap();

    // One brush stroke across the middle
    editor.set_tool(MaskTool::Brush);
    editor.set_brush_size(16.0);
    editor.start_draw(20.0, 45.0);
    editor.continue_draw(60.0, 45.0);
    editor.continue_draw(100.0, 45.0);
    editor.end_draw();
    assert!(editor.has_mask());
    assert!(editor.can_undo());

    let binary = io::decode_image(&editor.export_binary_mask().unwrap()).unwrap();
    assert_eq!(binary.get_pixel(60, 45).0, [255, 255, 255, 255]);
    assert_eq!(binary.get_pixel(5, 5).0, [0, 0, 0, 255]);

    // Undo empties the mask; the export reflects it
    assert!(editor.undo());
    assert!(!editor.has_mask());
    let binary = io::decode_image(&editor.export_binary_mask().unwrap()).unwrap();
    assert!(binary.pixels().all(|p| p.0 == [0, 0, 0, 255]));
}
