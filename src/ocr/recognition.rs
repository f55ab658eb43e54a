use serde::{Deserialize, Serialize};

use crate::core::geometry::Frame;

/// Recognizer output: the full text plus a block → line → element tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recognition {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    #[serde(default)]
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextLine {
    #[serde(default)]
    pub elements: Vec<TextElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextElement {
    pub text: String,
    pub frame: Frame,
}

impl TextElement {
    pub fn new(text: impl Into<String>, frame: Frame) -> Self {
        Self {
            text: text.into(),
            frame,
        }
    }
}

impl Recognition {
    /// Wrap loose elements, one line per element.
    pub fn from_elements(elements: Vec<TextElement>) -> Self {
        let text = elements
            .iter()
            .map(|element| element.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let lines = elements
            .into_iter()
            .map(|element| TextLine {
                elements: vec![element],
            })
            .collect();
        Self {
            text,
            blocks: vec![TextBlock { lines }],
        }
    }

    /// Every element in block, line, element order.
    pub fn elements(&self) -> impl Iterator<Item = &TextElement> {
        self.blocks
            .iter()
            .flat_map(|block| block.lines.iter())
            .flat_map(|line| line.elements.iter())
    }

    /// Recognized text, rebuilt from elements when the engine left it empty.
    pub fn full_text(&self) -> String {
        if !self.text.trim().is_empty() {
            return self.text.clone();
        }
        self.elements()
            .map(|element| element.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
