use image::{DynamicImage, RgbImage};
use indexmap::IndexMap;

/// Detector classes that indicate human presence in a protected zone.
pub const THREAT_CLASSES: [&str; 5] = ["person", "car", "motorcycle", "bus", "truck"];

pub const PERSON_CLASS: &str = "person";

/// What an object detector reports for one camera-trap image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    /// The input image with the detector's boxes drawn on it.
    pub annotated: RgbImage,
    /// One class label per detected box, in detector order.
    pub labels: Vec<String>,
}

impl DetectionOutcome {
    pub fn new(annotated: RgbImage, labels: Vec<String>) -> Self {
        Self { annotated, labels }
    }

    /// True when any detected label is a threat class.
    pub fn is_intrusion(&self) -> bool {
        self.labels
            .iter()
            .any(|label| THREAT_CLASSES.contains(&label.as_str()))
    }

    pub fn count(&self, class: &str) -> usize {
        self.labels.iter().filter(|label| *label == class).count()
    }

    /// Boxes per class, in order of first appearance.
    pub fn class_counts(&self) -> IndexMap<&str, usize> {
        let mut counts = IndexMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// A pretrained object detector, e.g. a hosted or local YOLO model.
pub trait IntrusionDetector {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect(&self, image: &DynamicImage) -> Result<DetectionOutcome, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(labels: &[&str]) -> DetectionOutcome {
        DetectionOutcome::new(
            RgbImage::new(1, 1),
            labels.iter().map(|l| l.to_string()).collect(),
        )
    }

    #[test]
    fn wildlife_is_not_an_intrusion() {
        assert!(!outcome(&["elephant", "deer", "bird"]).is_intrusion());
        assert!(!outcome(&[]).is_intrusion());
    }

    #[test]
    fn any_threat_class_is_an_intrusion() {
        for class in THREAT_CLASSES {
            assert!(outcome(&["deer", class]).is_intrusion());
        }
    }

    #[test]
    fn counts_keep_first_seen_order() {
        let detected = outcome(&["person", "deer", "person", "truck", "deer", "person"]);
        let counts: Vec<(&str, usize)> = detected.class_counts().into_iter().collect();
        assert_eq!(counts, vec![("person", 3), ("deer", 2), ("truck", 1)]);
        assert_eq!(detected.count(PERSON_CLASS), 3);
        assert_eq!(detected.count("bus"), 0);
    }
}
