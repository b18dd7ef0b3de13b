//! Intensity-to-glyph mapping.
//!
//! A [`GlyphRamp`] maps a pixel intensity `v` in `[0, 255]` to the glyph
//! at index `floor(v / step)`, clamped to the last index, where
//! `step = 256 / ramp_len`. Darker cells map to earlier glyphs; reversing
//! the ramp flips the mapping for every intensity.

use unicode_width::UnicodeWidthChar;

/// Ramp used when the user supplies none.
pub const DEFAULT_RAMP: &str = " .:-=+*#%@";

/// Errors raised while validating a user-supplied ramp.
#[derive(Debug, thiserror::Error)]
pub enum RampError {
    #[error("grayscale ramp must not be empty")]
    Empty,

    #[error("glyph {0:?} does not occupy exactly one terminal column")]
    NotSingleWidth(char),
}

/// An ordered set of printable glyphs representing intensity bands.
#[derive(Debug, Clone)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
    step: f32,
}

impl GlyphRamp {
    /// Builds a ramp from its glyph string, optionally reversed
    /// end-to-end.
    ///
    /// Every glyph must occupy exactly one terminal column, otherwise the
    /// blitted rows would drift out of alignment.
    pub fn new(ramp: &str, reverse: bool) -> Result<Self, RampError> {
        let mut glyphs: Vec<char> = ramp.chars().collect();
        if glyphs.is_empty() {
            return Err(RampError::Empty);
        }
        for &glyph in &glyphs {
            if glyph.width() != Some(1) {
                return Err(RampError::NotSingleWidth(glyph));
            }
        }
        if reverse {
            glyphs.reverse();
        }
        let step = 256.0 / glyphs.len() as f32;
        Ok(Self { glyphs, step })
    }

    /// The glyph for one pixel intensity.
    pub fn glyph(&self, intensity: u8) -> char {
        let index = (intensity as f32 / self.step) as usize;
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        // The built-in ramp is a valid literal.
        Self::new(DEFAULT_RAMP, false).expect("default ramp is valid")
    }
}
