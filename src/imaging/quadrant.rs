//! Page quadrant splitting and year-range detection.
//!
//! A checklist page holds a two-year block: the top half is the first year
//! of the block, the bottom half the second, left column first semester and
//! right column second semester.

use anyhow::{Context, Result};
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::core::model::{Semester, Slot};
use crate::imaging::preprocess::resize_to_width;
use crate::ocr::TextRecognizer;

static COURSE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z]{2,10}\s?-?\s?([1-4])\d{2}\b").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum YearRange {
    /// Years 1 and 2.
    Early,
    /// Years 3 and 4.
    Late,
}

impl YearRange {
    pub fn first_year(&self) -> u8 {
        match self {
            YearRange::Early => 1,
            YearRange::Late => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadrantPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl QuadrantPosition {
    pub const ALL: [QuadrantPosition; 4] = [
        QuadrantPosition::TopLeft,
        QuadrantPosition::TopRight,
        QuadrantPosition::BottomLeft,
        QuadrantPosition::BottomRight,
    ];

    pub fn slot(&self, range: YearRange) -> Slot {
        let first = range.first_year();
        match self {
            QuadrantPosition::TopLeft => Slot::new(first, Semester::First),
            QuadrantPosition::TopRight => Slot::new(first, Semester::Second),
            QuadrantPosition::BottomLeft => Slot::new(first + 1, Semester::First),
            QuadrantPosition::BottomRight => Slot::new(first + 1, Semester::Second),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Quadrant {
    pub position: QuadrantPosition,
    pub slot: Slot,
    pub image: DynamicImage,
}

/// Split at the exact width/height midpoints.
pub fn split_quadrants(image: &DynamicImage, range: YearRange) -> Result<Vec<Quadrant>> {
    let (width, height) = (image.width(), image.height());
    if width < 2 || height < 2 {
        anyhow::bail!("image {width}x{height} is too small to split into quadrants");
    }
    let half_w = width / 2;
    let half_h = height / 2;

    let quadrants = QuadrantPosition::ALL
        .iter()
        .map(|position| {
            let (x, y, w, h) = match position {
                QuadrantPosition::TopLeft => (0, 0, half_w, half_h),
                QuadrantPosition::TopRight => (half_w, 0, width - half_w, half_h),
                QuadrantPosition::BottomLeft => (0, half_h, half_w, height - half_h),
                QuadrantPosition::BottomRight => (half_w, half_h, width - half_w, height - half_h),
            };
            Quadrant {
                position: *position,
                slot: position.slot(range),
                image: image.crop_imm(x, y, w, h),
            }
        })
        .collect();
    Ok(quadrants)
}

/// Count course codes with low (1xx, 2xx) and high (3xx, 4xx) numbers.
pub fn count_course_numbers(text: &str) -> (usize, usize) {
    let mut low = 0;
    let mut high = 0;
    for caps in COURSE_NUMBER.captures_iter(text) {
        match caps.get(1).map(|m| m.as_str()) {
            Some("1") | Some("2") => low += 1,
            Some("3") | Some("4") => high += 1,
            _ => {}
        }
    }
    (low, high)
}

/// Majority vote; ties go to the early years.
pub fn classify_year_range(text: &str) -> YearRange {
    let (low, high) = count_course_numbers(text);
    if high > low {
        YearRange::Late
    } else {
        YearRange::Early
    }
}

/// Quick low-resolution recognition pass over the whole page.
pub fn detect_year_range(
    image: &DynamicImage,
    recognizer: &dyn TextRecognizer,
    detect_width: u32,
) -> Result<YearRange> {
    let preview = resize_to_width(image, detect_width);
    let recognition = recognizer
        .recognize(&preview)
        .context("year detection recognition failed")?;
    let text = recognition.full_text();
    let (low, high) = count_course_numbers(&text);
    let range = classify_year_range(&text);
    info!(low, high, ?range, "detected year range");
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_at_midpoints() {
        let image = DynamicImage::new_rgb8(101, 60);
        let quadrants = split_quadrants(&image, YearRange::Early).unwrap();
        let dims: Vec<_> = quadrants
            .iter()
            .map(|q| (q.position, q.image.width(), q.image.height()))
            .collect();
        assert_eq!(
            dims,
            vec![
                (QuadrantPosition::TopLeft, 50, 30),
                (QuadrantPosition::TopRight, 51, 30),
                (QuadrantPosition::BottomLeft, 50, 30),
                (QuadrantPosition::BottomRight, 51, 30),
            ]
        );
    }

    #[test]
    fn maps_quadrants_to_slots() {
        let late: Vec<_> = QuadrantPosition::ALL
            .iter()
            .map(|p| p.slot(YearRange::Late))
            .collect();
        assert_eq!(
            late,
            vec![
                Slot::new(3, Semester::First),
                Slot::new(3, Semester::Second),
                Slot::new(4, Semester::First),
                Slot::new(4, Semester::Second),
            ]
        );
    }

    #[test]
    fn counts_low_and_high_codes() {
        let text = "CC 101 IT201 IT-301 IT 302 IT 401 GEC 1";
        assert_eq!(count_course_numbers(text), (2, 3));
        assert_eq!(classify_year_range(text), YearRange::Late);
    }

    #[test]
    fn ties_default_to_early_years() {
        assert_eq!(classify_year_range("IT 101 IT 301"), YearRange::Early);
        assert_eq!(classify_year_range("no codes here"), YearRange::Early);
    }

    #[test]
    fn rejects_degenerate_images() {
        let image = DynamicImage::new_rgb8(1, 10);
        assert!(split_quadrants(&image, YearRange::Early).is_err());
    }
}
