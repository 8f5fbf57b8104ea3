//! Display surfaces the sampled line is shown on.

mod recording;
mod terminal;

pub use recording::{RecordingOverlay, Shown};
pub use terminal::{TerminalOverlay, restore};

use color_eyre::Result;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Middle,
    #[default]
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    #[default]
    Left,
    Center,
    Right,
}

/// How the overlay line looks and where it sits.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub font: String,
    pub color: String,
    pub outline_color: String,
    pub outline_width: u16,
    pub shadow: u16,
    pub vertical: VerticalAnchor,
    pub horizontal: HorizontalAnchor,
    /// Distance from the vertical anchor edge, towards the center.
    pub voffset: i32,
    /// Distance from the horizontal anchor edge, towards the center.
    pub hoffset: i32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            font: String::new(),
            color: "green".to_string(),
            outline_color: "black".to_string(),
            outline_width: 1,
            shadow: 0,
            vertical: VerticalAnchor::Bottom,
            horizontal: HorizontalAnchor::Left,
            voffset: 0,
            hoffset: 0,
        }
    }
}

/// A surface showing a single line of text.
pub trait Overlay {
    /// Switches the color used for subsequent lines.
    fn set_color(&mut self, color: &str) -> Result<()>;

    /// Replaces whatever is shown with `text`; an empty string hides it.
    fn display(&mut self, text: &str) -> Result<()>;
}

/// Offset of a `len` long span inside `available`, anchored at the start,
/// center or end and pushed `offset` cells away from that edge.
pub(crate) fn anchor_offset(available: u16, len: u16, anchor: Placement, offset: i32) -> u16 {
    let room = i32::from(available.saturating_sub(len));
    let pos = match anchor {
        Placement::Start => offset,
        Placement::Center => room / 2 + offset,
        Placement::End => room - offset,
    };
    pos.clamp(0, room) as u16
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Start,
    Center,
    End,
}

impl From<VerticalAnchor> for Placement {
    fn from(anchor: VerticalAnchor) -> Self {
        match anchor {
            VerticalAnchor::Top => Placement::Start,
            VerticalAnchor::Middle => Placement::Center,
            VerticalAnchor::Bottom => Placement::End,
        }
    }
}

impl From<HorizontalAnchor> for Placement {
    fn from(anchor: HorizontalAnchor) -> Self {
        match anchor {
            HorizontalAnchor::Left => Placement::Start,
            HorizontalAnchor::Center => Placement::Center,
            HorizontalAnchor::Right => Placement::End,
        }
    }
}
