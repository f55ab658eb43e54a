//! Reading-order reconstruction from free-form positioned text.

use crate::core::geometry::BBox;
use crate::core::model::{PositionedTextElement, Row};
use crate::ocr::Recognition;

/// Flatten the recognizer tree into positioned elements, skipping blanks.
pub fn flatten(recognition: &Recognition) -> Vec<PositionedTextElement> {
    recognition
        .elements()
        .filter(|element| !element.text.trim().is_empty())
        .map(|element| {
            PositionedTextElement::new(element.text.trim(), BBox::from_frame(&element.frame))
        })
        .collect()
}

/// Group elements into rows by vertical proximity.
///
/// Each element joins the first row whose anchor lies within `tolerance`
/// (first-fit, not nearest-fit). Rows come back sorted top to bottom and
/// their elements left to right.
pub fn cluster_rows(elements: Vec<PositionedTextElement>, tolerance: f32) -> Vec<Row> {
    let mut rows: Vec<Row> = Vec::new();

    for element in elements {
        let target = rows.iter_mut().find(|row| {
            row.elements
                .first()
                .map(|anchor| anchor.bbox.same_band(&element.bbox, tolerance))
                .unwrap_or(false)
        });
        match target {
            Some(row) => row.elements.push(element),
            None => rows.push(Row::new(vec![element])),
        }
    }

    rows.sort_by(|a, b| a.anchor_y().total_cmp(&b.anchor_y()));
    for row in &mut rows {
        row.elements
            .sort_by(|a, b| a.bbox.x().total_cmp(&b.bbox.x()));
    }
    rows
}

pub fn reconstruct_rows(recognition: &Recognition, tolerance: f32) -> Vec<Row> {
    cluster_rows(flatten(recognition), tolerance)
}
