//! Sources of the raw per-frame light color

use std::fmt::Debug;

use super::sensors::CameraFrame;
use super::{LightColor, LocatedLight};

/// Trait for image based traffic light classifiers
pub trait LightClassifier: Debug + Send + Sync {
    /// Classify the light visible in the frame
    fn classify(&self, frame: &CameraFrame) -> LightColor;

    /// Get the name of this classifier
    fn name(&self) -> &str;
}

/// Classifier used when no model is loaded; never sees a color
#[derive(Debug, Default)]
pub struct UnknownClassifier;

impl LightClassifier for UnknownClassifier {
    fn classify(&self, _frame: &CameraFrame) -> LightColor {
        LightColor::Unknown
    }

    fn name(&self) -> &str {
        "UnknownClassifier"
    }
}

/// Where the detector takes the raw color of the located light from
#[derive(Debug)]
pub enum StateSource {
    /// Read the color reported for the light on the dynamic light feed
    GroundTruth,
    /// Classify the current camera frame
    Classifier(Box<dyn LightClassifier>),
}

impl StateSource {
    /// Use an image classifier
    pub fn classifier<C: LightClassifier + 'static>(classifier: C) -> Self {
        StateSource::Classifier(Box::new(classifier))
    }

    /// Raw color of `light` for this frame
    pub fn light_state(
        &self,
        light: &LocatedLight,
        observations: &[LightColor],
        frame: Option<&CameraFrame>,
    ) -> LightColor {
        match self {
            StateSource::GroundTruth => observations
                .get(light.light_index)
                .copied()
                .unwrap_or(LightColor::Unknown),
            StateSource::Classifier(classifier) => match frame {
                Some(frame) if !frame.is_empty() => classifier.classify(frame),
                _ => LightColor::Unknown,
            },
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        match self {
            StateSource::GroundTruth => "ground_truth",
            StateSource::Classifier(classifier) => classifier.name(),
        }
    }
}
