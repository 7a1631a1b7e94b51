//! Chrome colours and layout constants.
//!
//! The editor body takes its colours from the configured
//! [`ColorScheme`](lyra_core::ColorScheme); everything around it uses the
//! fixed dark palette below.

use iced::Color;
use lyra_core::Rgb;

pub mod colors {
    use iced::Color;

    pub const BG_DARK: Color = Color::from_rgb(0.11, 0.11, 0.13);
    pub const BG_MEDIUM: Color = Color::from_rgb(0.14, 0.14, 0.16);
    pub const BG_HOVER: Color = Color::from_rgb(0.22, 0.22, 0.25);

    pub const TEXT_PRIMARY: Color = Color::from_rgb(0.93, 0.93, 0.93);
    pub const TEXT_SECONDARY: Color = Color::from_rgb(0.65, 0.65, 0.68);
    pub const TEXT_MUTED: Color = Color::from_rgb(0.45, 0.45, 0.48);

    pub const ACCENT: Color = Color::from_rgb(0.36, 0.54, 0.90);

    pub const BORDER: Color = Color::from_rgb(0.25, 0.25, 0.28);
}

/// Height of the tab strip in logical pixels.
pub const TAB_BAR_HEIGHT: f32 = 36.0;

/// Height of the status line in logical pixels.
pub const STATUS_BAR_HEIGHT: f32 = 28.0;

/// Font size bounds for zooming.
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const MAX_FONT_SIZE: f32 = 40.0;

/// Converts a configured colour to an iced colour.
pub fn to_iced(rgb: Rgb) -> Color {
    Color::from_rgb8(rgb.r, rgb.g, rgb.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_iced() {
        let color = to_iced(Rgb::new(255, 0, 51));
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert!((color.b - 0.2).abs() < 1e-6);
        assert_eq!(color.a, 1.0);
    }
}
