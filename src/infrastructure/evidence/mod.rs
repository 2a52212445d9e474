//! Synthetic evidence images.
//!
//! No browser is driven, so the "screenshot" attached to a run is a drawn
//! placeholder: a browser frame, one bar per test step, the failing step
//! highlighted, and a pass/fail banner along the bottom edge.

use crate::domain::error::{AppError, Result};
use crate::domain::test_case::{Evidence, EvidenceKind, TestCase};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const EVIDENCE_WIDTH: u32 = 640;
pub const EVIDENCE_HEIGHT: u32 = 400;

const BACKGROUND: Rgba<u8> = Rgba([245, 245, 245, 255]);
const TITLE_BAR: Rgba<u8> = Rgba([55, 65, 81, 255]);
const ADDRESS_BAR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const STEP_BAR: Rgba<u8> = Rgba([209, 213, 219, 255]);
const FAILED_ROW: Rgba<u8> = Rgba([254, 226, 226, 255]);
const FAILED_EDGE: Rgba<u8> = Rgba([220, 38, 38, 255]);
pub const PASS_BANNER: Rgba<u8> = Rgba([34, 197, 94, 255]);
pub const FAIL_BANNER: Rgba<u8> = Rgba([239, 68, 68, 255]);

const WINDOW_LIGHTS: [[u8; 3]; 3] = [[239, 68, 68], [234, 179, 8], [34, 197, 94]];

const TITLE_BAR_HEIGHT: u32 = 32;
const BANNER_HEIGHT: u32 = 40;
const ROW_TOP: u32 = 56;
const ROW_PITCH: u32 = 28;
const ROW_HEIGHT: u32 = 16;

pub fn render_placeholder(test_case: &TestCase, passed: bool) -> Result<Evidence> {
    let image = draw(test_case, passed);

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("Failed to encode evidence PNG: {}", e)))?;

    Ok(Evidence {
        kind: EvidenceKind::SyntheticPlaceholder,
        media_type: "image/png".to_string(),
        data: STANDARD.encode(&bytes),
        width: EVIDENCE_WIDTH,
        height: EVIDENCE_HEIGHT,
        captured_at: chrono::Utc::now().timestamp_millis(),
    })
}

fn draw(test_case: &TestCase, passed: bool) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(EVIDENCE_WIDTH, EVIDENCE_HEIGHT, BACKGROUND);

    fill_rect(&mut image, 0, 0, EVIDENCE_WIDTH, TITLE_BAR_HEIGHT, TITLE_BAR);
    for (index, [r, g, b]) in WINDOW_LIGHTS.iter().enumerate() {
        let x = 12 + index as u32 * 16;
        fill_rect(&mut image, x, 11, 10, 10, Rgba([*r, *g, *b, 255]));
    }
    fill_rect(&mut image, 80, 8, 480, 16, ADDRESS_BAR);

    let max_rows = (EVIDENCE_HEIGHT - BANNER_HEIGHT - ROW_TOP) / ROW_PITCH;
    for (row, step) in test_case.steps.iter().take(max_rows as usize).enumerate() {
        let y = ROW_TOP + row as u32 * ROW_PITCH;
        let is_failure_point = !passed && test_case.failed_step_number == Some(step.step_number);
        if is_failure_point {
            fill_rect(&mut image, 8, y - 6, EVIDENCE_WIDTH - 16, ROW_PITCH, FAILED_ROW);
            fill_rect(&mut image, 8, y - 6, 4, ROW_PITCH, FAILED_EDGE);
        }
        // Bar length loosely follows the action text so cases look distinct.
        let width = 120 + (step.action.chars().count() as u32 * 6).min(440);
        fill_rect(&mut image, 24, y, width, ROW_HEIGHT, STEP_BAR);
    }

    let banner = if passed { PASS_BANNER } else { FAIL_BANNER };
    fill_rect(
        &mut image,
        0,
        EVIDENCE_HEIGHT - BANNER_HEIGHT,
        EVIDENCE_WIDTH,
        BANNER_HEIGHT,
        banner,
    );

    image
}

fn fill_rect(image: &mut RgbaImage, x: u32, y: u32, width: u32, height: u32, color: Rgba<u8>) {
    let x_end = (x + width).min(image.width());
    let y_end = (y + height).min(image.height());
    for py in y..y_end {
        for px in x..x_end {
            image.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_case::TestStep;

    fn decode(evidence: &Evidence) -> RgbaImage {
        let bytes = STANDARD.decode(&evidence.data).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgba8()
    }

    fn case() -> TestCase {
        TestCase::new(
            "TC-001",
            "REQ-001",
            "Checkout",
            vec![
                TestStep::new(1, "Add item to cart", "Cart shows 1 item"),
                TestStep::new(2, "Pay", "Receipt shown"),
            ],
        )
    }

    #[test]
    fn test_failed_evidence_has_red_banner() {
        let mut case = case();
        case.failed_step_number = Some(2);
        let evidence = render_placeholder(&case, false).unwrap();

        assert_eq!(evidence.kind, EvidenceKind::SyntheticPlaceholder);
        assert_eq!(evidence.media_type, "image/png");

        let image = decode(&evidence);
        assert_eq!(image.dimensions(), (EVIDENCE_WIDTH, EVIDENCE_HEIGHT));
        assert_eq!(*image.get_pixel(10, EVIDENCE_HEIGHT - 1), FAIL_BANNER);
        let failed_row_y = ROW_TOP + ROW_PITCH;
        assert_eq!(*image.get_pixel(9, failed_row_y), FAILED_EDGE);
    }

    #[test]
    fn test_passed_evidence_has_green_banner() {
        let evidence = render_placeholder(&case(), true).unwrap();
        let image = decode(&evidence);
        assert_eq!(*image.get_pixel(EVIDENCE_WIDTH - 1, EVIDENCE_HEIGHT - 1), PASS_BANNER);
        assert!(evidence.data_url().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_many_steps_do_not_overflow_canvas() {
        let steps = (1..=40)
            .map(|n| TestStep::new(n, "a very long action description ".repeat(5), "ok"))
            .collect();
        let case = TestCase::new("TC-002", "REQ-001", "Long", steps);
        assert!(render_placeholder(&case, true).is_ok());
    }
}
