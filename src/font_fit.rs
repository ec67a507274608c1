//! Font-fit sizing for the fixed character grid
//!
//! Picks the largest monospace font size at which a `columns × rows` grid fits
//! into a pixel area. Width per character is always derived from the measured
//! width of a whole probe line divided by the column count, so rendering
//! rounding and kerning are absorbed the same way for every column.

use serde::{Deserialize, Serialize};

/// Full-width reference glyph used for probing.
pub const PROBE_GLYPH: char = 'W';

/// Screen pixels per typographic point at 96 DPI.
pub const PIXELS_PER_POINT: f32 = 96.0 / 72.0;

/// Horizontal advance of a typical monospace face, as a fraction of its em size.
const MONOSPACE_ADVANCE_RATIO: f32 = 0.6;
/// Line height multiplier - leaves room for descenders and ascenders
const LINE_HEIGHT_MULTIPLIER: f32 = 1.3;

/// Margin kept free around the window inside the screen work area.
const WORK_AREA_MARGIN: u32 = 20;
/// Smallest client area the window may have.
pub const MIN_CLIENT_WIDTH: u32 = 200;
pub const MIN_CLIENT_HEIGHT: u32 = 120;

/// Smaller configured steps are raised to this (points).
pub const MIN_FONT_STEP: f32 = 0.1;
/// Upper bound on candidates measured per fit, `min_size` included.
pub const MAX_FONT_CANDIDATES: usize = 256;

/// Measured extent of a piece of text in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

impl TextExtent {
    /// Extent of one shaped line: its advance width, and ascent plus descent
    /// as the height. Shapers differ on the sign of the descent.
    pub fn from_line_metrics(width: f32, ascent: f32, descent: f32) -> Self {
        Self {
            width,
            height: (ascent.abs() + descent.abs()).ceil(),
        }
    }
}

/// Measures text rendered in a given font family and size (points).
pub trait TextMeasurer {
    fn measure(&self, text: &str, family: &str, size: f32) -> TextExtent;
}

/// Deterministic estimate of monospace metrics.
///
/// Used when no real text system is available (headless sessions, and before
/// the window exists).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceEstimate {
    pub advance_ratio: f32,
    pub line_height_multiplier: f32,
}

impl Default for MonospaceEstimate {
    fn default() -> Self {
        Self {
            advance_ratio: MONOSPACE_ADVANCE_RATIO,
            line_height_multiplier: LINE_HEIGHT_MULTIPLIER,
        }
    }
}

impl TextMeasurer for MonospaceEstimate {
    fn measure(&self, text: &str, _family: &str, size: f32) -> TextExtent {
        let px = size * PIXELS_PER_POINT;
        let longest = text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let line_count = text.lines().count().max(1);
        TextExtent {
            width: (longest as f32 * px * self.advance_ratio).round(),
            height: (line_count as f32 * px * self.line_height_multiplier).ceil(),
        }
    }
}

/// Descending sequence of candidate font sizes, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeSequence {
    pub max_size: f32,
    pub min_size: f32,
    pub step: f32,
}

impl Default for SizeSequence {
    fn default() -> Self {
        Self {
            max_size: 10.0,
            min_size: 6.0,
            step: 0.5,
        }
    }
}

impl SizeSequence {
    /// Candidate sizes from largest to smallest, always ending at `min_size`.
    ///
    /// Sizes are computed as `max - i * step` rather than by repeated
    /// subtraction so the sequence is exact for the usual half-point steps.
    /// The step is at least `MIN_FONT_STEP` and at most
    /// `MAX_FONT_CANDIDATES` sizes are produced.
    pub fn candidates(&self) -> Vec<f32> {
        let min = self.min_size.max(f32::EPSILON);
        let max = self.max_size.max(min);
        if self.step <= 0.0 || !self.step.is_finite() {
            return vec![max, min];
        }
        let step = self.step.max(MIN_FONT_STEP);

        let mut sizes = Vec::new();
        let mut i = 0u32;
        while sizes.len() < MAX_FONT_CANDIDATES - 1 {
            let size = max - i as f32 * step;
            if size < min - 1e-4 {
                break;
            }
            sizes.push(size);
            i += 1;
        }
        if sizes.last().map_or(true, |last| (*last - min).abs() > 1e-4) {
            sizes.push(min);
        }
        sizes
    }
}

/// Pixel area the grid has to fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelArea {
    pub width: u32,
    pub height: u32,
}

impl PixelArea {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Area available to the window inside a screen work area.
    pub fn available_in(work_area: PixelArea) -> Self {
        Self {
            width: work_area.width.saturating_sub(WORK_AREA_MARGIN).max(MIN_CLIENT_WIDTH),
            height: work_area
                .height
                .saturating_sub(WORK_AREA_MARGIN)
                .max(MIN_CLIENT_HEIGHT),
        }
    }
}

/// Per-cell pixel metrics at one font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub char_width: u32,
    pub line_height: u32,
}

impl CellMetrics {
    /// Pixel size of a `columns × rows` grid, before any window clamping.
    pub fn grid_size(&self, columns: u16, rows: u16) -> PixelArea {
        PixelArea {
            width: self.char_width * columns as u32,
            height: self.line_height * rows as u32,
        }
    }
}

/// Result of a fit: chosen size plus the metrics measured at that size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontFit {
    pub size: f32,
    pub metrics: CellMetrics,
}

/// Measure cell metrics for `columns` columns at one font size.
pub fn cell_metrics(
    measurer: &dyn TextMeasurer,
    family: &str,
    size: f32,
    columns: u16,
) -> CellMetrics {
    let columns = columns.max(1);
    let probe: String = std::iter::repeat(PROBE_GLYPH).take(columns as usize).collect();
    let line = measurer.measure(&probe, family, size);
    let glyph = measurer.measure(PROBE_GLYPH.encode_utf8(&mut [0; 4]), family, size);

    let char_width = ((line.width / columns as f32).floor() as u32).max(1);
    let line_height = (glyph.height.ceil() as u32).max(1);
    CellMetrics {
        char_width,
        line_height,
    }
}

/// Largest size in `sizes` whose grid fits `area`; the minimum size if none fit.
pub fn fit_font_size(
    measurer: &dyn TextMeasurer,
    family: &str,
    sizes: &SizeSequence,
    columns: u16,
    rows: u16,
    area: PixelArea,
) -> FontFit {
    let candidates = sizes.candidates();
    for &size in &candidates {
        let metrics = cell_metrics(measurer, family, size, columns);
        let grid = metrics.grid_size(columns, rows.max(1));
        if grid.width <= area.width && grid.height <= area.height {
            return FontFit { size, metrics };
        }
    }

    let size = candidates.last().copied().unwrap_or(sizes.min_size);
    FontFit {
        size,
        metrics: cell_metrics(measurer, family, size, columns),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Measurer whose single-glyph width is wider than the per-glyph width of
    /// a long run, the way real shapers round individual glyphs.
    struct KerningMeasurer;

    impl TextMeasurer for KerningMeasurer {
        fn measure(&self, text: &str, _family: &str, size: f32) -> TextExtent {
            let n = text.chars().count() as f32;
            TextExtent {
                width: n * size * 0.7 + 3.0,
                height: size * 1.5,
            }
        }
    }

    #[test]
    fn test_default_sequence_is_descending_half_points() {
        let sizes = SizeSequence::default().candidates();
        assert_eq!(sizes.first(), Some(&10.0));
        assert_eq!(sizes.last(), Some(&6.0));
        assert_eq!(sizes.len(), 9);
        assert!(sizes.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_sequence_with_uneven_step_still_ends_at_min() {
        let sizes = SizeSequence {
            max_size: 10.0,
            min_size: 6.0,
            step: 1.5,
        }
        .candidates();
        assert_eq!(sizes, vec![10.0, 8.5, 7.0, 6.0]);
    }

    #[test]
    fn test_line_metrics_height_is_ascent_plus_descent() {
        assert_eq!(
            TextExtent::from_line_metrics(80.0, 10.4, 3.1),
            TextExtent {
                width: 80.0,
                height: 14.0,
            }
        );
        assert_eq!(TextExtent::from_line_metrics(8.0, 10.4, -3.1).height, 14.0);
    }

    #[test]
    fn test_cell_height_is_measured_not_derived() {
        struct TallGlyphs;
        impl TextMeasurer for TallGlyphs {
            fn measure(&self, text: &str, _family: &str, _size: f32) -> TextExtent {
                TextExtent::from_line_metrics(text.chars().count() as f32 * 7.0, 12.2, 4.5)
            }
        }
        let metrics = cell_metrics(&TallGlyphs, "Consolas", 10.0, 80);
        assert_eq!(
            metrics,
            CellMetrics {
                char_width: 7,
                line_height: 17,
            }
        );
    }

    #[test]
    fn test_tiny_step_is_bounded() {
        let sizes = SizeSequence {
            max_size: 10.0,
            min_size: 6.0,
            step: 1e-9,
        }
        .candidates();
        assert_eq!(sizes.len(), 41);
        assert_eq!(sizes.first(), Some(&10.0));
        assert_eq!(sizes.last(), Some(&6.0));

        let wide = SizeSequence {
            max_size: 1000.0,
            min_size: 6.0,
            step: 0.1,
        }
        .candidates();
        assert_eq!(wide.len(), MAX_FONT_CANDIDATES);
        assert_eq!(wide.first(), Some(&1000.0));
        assert_eq!(wide.last(), Some(&6.0));
    }

    #[test]
    fn test_large_area_gets_largest_size() {
        let fit = fit_font_size(
            &MonospaceEstimate::default(),
            "Consolas",
            &SizeSequence::default(),
            80,
            25,
            PixelArea::new(4000, 4000),
        );
        assert_eq!(fit.size, 10.0);
    }

    #[test]
    fn test_tiny_area_falls_back_to_min_size() {
        let fit = fit_font_size(
            &MonospaceEstimate::default(),
            "Consolas",
            &SizeSequence::default(),
            200,
            100,
            PixelArea::new(50, 50),
        );
        assert_eq!(fit.size, 6.0);
    }

    #[test]
    fn test_chosen_size_fits_bounds() {
        let measurer = MonospaceEstimate::default();
        let sizes = SizeSequence::default();
        for (columns, rows, width, height) in [
            (120u16, 30u16, 1000u32, 700u32),
            (80, 25, 640, 480),
            (100, 40, 900, 600),
            (132, 50, 1280, 1024),
        ] {
            let area = PixelArea::new(width, height);
            let fit = fit_font_size(&measurer, "Consolas", &sizes, columns, rows, area);
            let grid = fit.metrics.grid_size(columns, rows);
            if fit.size > sizes.min_size {
                assert!(grid.width <= area.width, "{columns}x{rows} too wide");
                assert!(grid.height <= area.height, "{columns}x{rows} too tall");
            }
            assert!(sizes.candidates().contains(&fit.size));
        }
    }

    #[test]
    fn test_fit_is_monotonic_in_area() {
        let measurer = MonospaceEstimate::default();
        let sizes = SizeSequence::default();
        let mut previous = 0.0f32;
        for width in (200..=1600).step_by(25) {
            let fit = fit_font_size(
                &measurer,
                "Consolas",
                &sizes,
                120,
                30,
                PixelArea::new(width, 900),
            );
            assert!(fit.size >= previous, "size shrank when width grew to {width}");
            previous = fit.size;
        }

        let mut previous = 0.0f32;
        for height in (120..=1200).step_by(20) {
            let fit = fit_font_size(
                &measurer,
                "Consolas",
                &sizes,
                120,
                30,
                PixelArea::new(2000, height),
            );
            assert!(fit.size >= previous, "size shrank when height grew to {height}");
            previous = fit.size;
        }
    }

    #[test]
    fn test_char_width_comes_from_whole_probe_line() {
        // 10 columns at size 10: probe width 73 -> 7 per column.
        // A single glyph would measure 10 and overestimate the grid.
        let metrics = cell_metrics(&KerningMeasurer, "Mono", 10.0, 10);
        assert_eq!(metrics.char_width, 7);
        assert_eq!(metrics.line_height, 15);
    }

    #[test]
    fn test_available_area_keeps_margin_and_minimum() {
        assert_eq!(
            PixelArea::available_in(PixelArea::new(1920, 1040)),
            PixelArea::new(1900, 1020)
        );
        assert_eq!(
            PixelArea::available_in(PixelArea::new(100, 50)),
            PixelArea::new(MIN_CLIENT_WIDTH, MIN_CLIENT_HEIGHT)
        );
    }
}
