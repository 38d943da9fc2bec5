use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::ReportStatus;

// ---------------------------------------------------------------------------
// Fixed severity colors
// ---------------------------------------------------------------------------

/// Traffic-light colors used everywhere a severity is shown.
pub fn status_color(status: ReportStatus) -> Color32 {
    match status {
        ReportStatus::Normal => Color32::from_rgb(0x2e, 0xcc, 0x71),
        ReportStatus::Caution => Color32::from_rgb(0xf1, 0xc4, 0x0f),
        ReportStatus::Alert => Color32::from_rgb(0xe7, 0x4c, 0x3c),
    }
}

// ---------------------------------------------------------------------------
// Diverging colormap for the correlation grid
// ---------------------------------------------------------------------------

/// Map a correlation coefficient in [-1, 1] to a blue–white–red ramp.
/// NaN (undefined correlation) renders as gray.
pub fn correlation_color(r: f64) -> Color32 {
    if !r.is_finite() {
        return Color32::from_gray(90);
    }
    let r = r.clamp(-1.0, 1.0) as f32;

    let white: LinSrgb = Srgb::new(0.96f32, 0.96, 0.96).into_linear();
    let blue: LinSrgb = Hsl::new(215.0f32, 0.65, 0.45).into_color();
    let red: LinSrgb = Hsl::new(6.0f32, 0.7, 0.5).into_color();

    let mixed = if r < 0.0 {
        white.mix(blue, -r)
    } else {
        white.mix(red, r)
    };
    let out: Srgb = Srgb::from_linear(mixed);
    Color32::from_rgb(
        (out.red * 255.0) as u8,
        (out.green * 255.0) as u8,
        (out.blue * 255.0) as u8,
    )
}

/// Readable text color on top of a correlation cell.
pub fn correlation_text_color(r: f64) -> Color32 {
    if r.is_finite() && r.abs() > 0.6 {
        Color32::WHITE
    } else {
        Color32::from_gray(25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colors_are_distinct() {
        let normal = status_color(ReportStatus::Normal);
        let caution = status_color(ReportStatus::Caution);
        let alert = status_color(ReportStatus::Alert);
        assert_ne!(normal, caution);
        assert_ne!(caution, alert);
        assert_ne!(normal, alert);
    }

    #[test]
    fn test_correlation_extremes() {
        // Zero correlation stays near white, extremes saturate.
        let mid = correlation_color(0.0);
        assert!(mid.r() > 200 && mid.g() > 200 && mid.b() > 200);

        let hot = correlation_color(1.0);
        assert!(hot.r() > hot.b());

        let cold = correlation_color(-1.0);
        assert!(cold.b() > cold.r());

        let undefined = correlation_color(f64::NAN);
        assert_eq!(undefined.r(), undefined.g());
    }
}
