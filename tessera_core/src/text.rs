// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font fitting for text units.
//!
//! Text is rendered in a monospace face, so one glyph advance per pixel of
//! font size (the capability probe's `glyph_weight`) is enough to estimate
//! how large the string can be set inside its box. Proportional faces are
//! not measured per glyph.

/// Returns the font size that fits `chars` glyphs into `width` x `height`.
///
/// The result is `min(width / (chars * glyph_weight), height)`. Without a
/// usable weight or with no characters the height alone bounds it.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    reason = "character counts are far below 2^52"
)]
pub fn fit_font_size(width: f64, height: f64, chars: usize, glyph_weight: Option<f64>) -> f64 {
    let height = height.abs();
    match glyph_weight {
        Some(weight) if chars > 0 && weight > 0.0 => {
            let by_width = width.abs() / (chars as f64 * weight);
            by_width.min(height)
        }
        _ => height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_bound_for_long_strings() {
        // 10 glyphs at 0.5 px per px of font size in 100 px: 20 px.
        assert_eq!(fit_font_size(100.0, 40.0, 10, Some(0.5)), 20.0);
    }

    #[test]
    fn height_bound_for_short_strings() {
        assert_eq!(fit_font_size(400.0, 30.0, 2, Some(0.5)), 30.0);
    }

    #[test]
    fn degenerate_inputs_use_height() {
        assert_eq!(fit_font_size(100.0, 25.0, 0, Some(0.5)), 25.0);
        assert_eq!(fit_font_size(100.0, 25.0, 4, None), 25.0);
        assert_eq!(fit_font_size(0.0, 25.0, 4, Some(0.5)), 0.0);
    }
}
