use color_eyre::Result;

use super::Overlay;

/// One line handed to a [`RecordingOverlay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shown {
    pub text: String,
    pub color: String,
}

/// An overlay that remembers every line instead of drawing it.
#[derive(Clone, Debug, Default)]
pub struct RecordingOverlay {
    pub color: String,
    pub shown: Vec<Shown>,
}

impl RecordingOverlay {
    pub fn new(color: &str) -> Self {
        Self {
            color: color.to_string(),
            shown: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<&Shown> {
        self.shown.last()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.shown.iter().map(|s| s.text.as_str()).collect()
    }
}

impl Overlay for RecordingOverlay {
    fn set_color(&mut self, color: &str) -> Result<()> {
        self.color = color.to_string();
        Ok(())
    }

    fn display(&mut self, text: &str) -> Result<()> {
        self.shown.push(Shown {
            text: text.to_string(),
            color: self.color.clone(),
        });
        Ok(())
    }
}
