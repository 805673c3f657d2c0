//! Sensor data handed to the light classifier

/// A raw camera image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel encoding, e.g. `rgb8` or `bgr8`
    pub encoding: String,
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// Create a frame from raw image data
    pub fn new(width: u32, height: u32, encoding: &str, data: Vec<u8>) -> Self {
        CameraFrame {
            width,
            height,
            encoding: encoding.to_string(),
            data,
        }
    }

    /// True when the frame carries no pixels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() || self.width == 0 || self.height == 0
    }
}
