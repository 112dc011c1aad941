//! Horizontal reference lines (range bounds and clinical limits) and the
//! label staggering that keeps their captions from overlapping.

use serde::{Deserialize, Serialize};

use crate::{LimitDefinition, RangeBand};

pub const DEFAULT_STAGGER_STEP_PX: f64 = 26.0;
pub const DEFAULT_LIMIT_LABEL: &str = "Límite";
pub const MAX_LABEL: &str = "Max";
pub const MIN_LABEL: &str = "Min";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineType {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineStyle {
    pub line_type: LineType,
    pub width: f64,
    pub opacity: f64,
    pub color: Option<String>,
}

impl LineStyle {
    pub fn new(line_type: LineType, width: f64, opacity: f64) -> Self {
        Self {
            line_type,
            width,
            opacity,
            color: None,
        }
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }
}

/// Where an annotation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Limit,
    RangeBound,
}

impl AnnotationKind {
    fn default_style(self) -> LineStyle {
        match self {
            AnnotationKind::Limit => {
                LineStyle::new(LineType::Solid, 2.0, 0.9).with_color("#111827")
            }
            AnnotationKind::RangeBound => LineStyle::new(LineType::Dashed, 1.0, 0.6),
        }
    }
}

/// Value-axis reference line ready for the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub name: String,
    /// Position on the value axis.
    pub position: f64,
    pub kind: AnnotationKind,
    pub style: LineStyle,
    /// Label offset in pixels, `[dx, dy]`.
    pub label_offset: [f64; 2],
}

impl Annotation {
    pub fn new(name: impl Into<String>, position: f64, kind: AnnotationKind) -> Self {
        Self {
            name: name.into(),
            position,
            kind,
            style: kind.default_style(),
            label_offset: [0.0, 0.0],
        }
    }

    fn rank(&self) -> u8 {
        if self.kind == AnnotationKind::Limit {
            return 10;
        }
        match self.name.as_str() {
            MAX_LABEL => 20,
            MIN_LABEL => 30,
            _ => 99,
        }
    }
}

/// `Min`/`Max` lines for whichever bounds the band defines.
pub fn range_annotations(band: &RangeBand) -> Vec<Annotation> {
    let mut out = Vec::with_capacity(2);
    if let Some(min) = band.min {
        out.push(Annotation::new(MIN_LABEL, min, AnnotationKind::RangeBound));
    }
    if let Some(max) = band.max {
        out.push(Annotation::new(MAX_LABEL, max, AnnotationKind::RangeBound));
    }
    out
}

pub fn limit_annotations(limits: &[LimitDefinition]) -> Vec<Annotation> {
    limits
        .iter()
        .filter(|limit| limit.is_active())
        .map(|limit| {
            let name = match limit.label.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => label.to_string(),
                _ => DEFAULT_LIMIT_LABEL.to_string(),
            };
            Annotation::new(name, limit.value, AnnotationKind::Limit)
        })
        .collect()
}

/// Stable precedence: limits, then `Max`, then `Min`, then the rest.
pub fn order(mut annotations: Vec<Annotation>) -> Vec<Annotation> {
    annotations.sort_by_key(Annotation::rank);
    annotations
}

/// Alternate labels left and right, moving one `step` further out every
/// two items: `-1, +1, -2, +2, ...` times `step`.
pub fn stagger(annotations: Vec<Annotation>, step: f64) -> Vec<Annotation> {
    annotations
        .into_iter()
        .enumerate()
        .map(|(k, mut annotation)| {
            let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
            let level = (k / 2 + 1) as f64;
            annotation.label_offset = [sign * level * step, 0.0];
            annotation
        })
        .collect()
}

/// Merge both sets, order them, and stagger once over the merged list.
pub fn merge(ranges: Vec<Annotation>, limits: Vec<Annotation>, step: f64) -> Vec<Annotation> {
    let mut merged = ranges;
    merged.extend(limits);
    stagger(order(merged), step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(annotations: &[Annotation]) -> Vec<&str> {
        annotations.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn limits_precede_range_bounds() {
        let merged = merge(
            vec![Annotation::new("Max", 10.0, AnnotationKind::RangeBound)],
            vec![Annotation::new("Límite X", 4.0, AnnotationKind::Limit)],
            DEFAULT_STAGGER_STEP_PX,
        );
        assert_eq!(names(&merged), vec!["Límite X", "Max"]);

        let merged = merge(
            vec![],
            vec![
                Annotation::new("Max", 10.0, AnnotationKind::RangeBound),
                Annotation::new("Límite X", 4.0, AnnotationKind::Limit),
            ],
            DEFAULT_STAGGER_STEP_PX,
        );
        assert_eq!(names(&merged), vec!["Límite X", "Max"]);
    }

    #[test]
    fn ordering_is_stable_within_a_rank() {
        let input = vec![
            Annotation::new("Min", 1.0, AnnotationKind::RangeBound),
            Annotation::new("Otro", 3.0, AnnotationKind::RangeBound),
            Annotation::new("Max", 9.0, AnnotationKind::RangeBound),
            Annotation::new("B", 5.0, AnnotationKind::Limit),
            Annotation::new("A", 6.0, AnnotationKind::Limit),
        ];
        assert_eq!(names(&order(input)), vec!["B", "A", "Max", "Min", "Otro"]);
    }

    #[test]
    fn stagger_alternates_and_widens() {
        let input: Vec<Annotation> = (0..5)
            .map(|i| Annotation::new(format!("L{i}"), i as f64, AnnotationKind::Limit))
            .collect();
        let offsets: Vec<f64> = stagger(input, 26.0)
            .iter()
            .map(|a| a.label_offset[0])
            .collect();
        assert_eq!(offsets, vec![-26.0, 26.0, -52.0, 52.0, -78.0]);
    }

    #[test]
    fn builders_skip_missing_values() {
        let band = RangeBand::new(None, Some(11.0));
        assert_eq!(names(&range_annotations(&band)), vec!["Max"]);
        assert_eq!(range_annotations(&band)[0].style.line_type, LineType::Dashed);

        let mut disabled = LimitDefinition::new(Some("Off"), 3.0);
        disabled.enabled = false;
        let limits = vec![
            LimitDefinition::new(None, 2.0),
            disabled,
            LimitDefinition::new(Some("NaN"), f64::NAN),
            LimitDefinition::new(Some("Neutropenia"), 0.5),
        ];
        let built = limit_annotations(&limits);
        assert_eq!(names(&built), vec!["Límite", "Neutropenia"]);
        assert_eq!(built[0].style.color.as_deref(), Some("#111827"));
    }
}
