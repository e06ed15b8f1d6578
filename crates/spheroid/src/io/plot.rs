use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut, text_size},
    rect::Rect,
};
use tracing::debug;

use crate::{error::Result, histogram::{IntensityHistogram, BINS}, traits::HistogramRenderer};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BAR: Rgb<u8> = Rgb([128, 128, 128]);

const FONT: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");
const X_LABEL: &str = "Pixel Intensity";
const Y_LABEL: &str = "Frequency";

// Space around the plot area for title, axis labels and ticks
const LEFT: u32 = 70;
const RIGHT: u32 = 20;
const TOP: u32 = 40;
const BOTTOM: u32 = 50;

/// Renders a histogram as a gray bar chart PNG, one bar per intensity bin.
#[derive(Debug, Clone)]
pub struct BarChartRenderer {
    /// Horizontal pixels per bin
    pub bar_width: u32,
    /// Plot area height in pixels
    pub plot_height: u32,
    pub title_size: f32,
    pub label_size: f32,
}

impl Default for BarChartRenderer {
    fn default() -> Self {
        Self {
            bar_width: 2,
            plot_height: 300,
            title_size: 20.0,
            label_size: 16.0,
        }
    }
}

impl BarChartRenderer {
    pub fn draw(&self, histogram: &IntensityHistogram, title: &str) -> Result<RgbImage> {
        let font = FontRef::try_from_slice(FONT)?;
        let title_scale = PxScale::from(self.title_size);
        let label_scale = PxScale::from(self.label_size);

        let plot_width = self.bar_width * BINS as u32;
        let width = LEFT + plot_width + RIGHT;
        let height = TOP + self.plot_height + BOTTOM;
        let mut canvas = RgbImage::from_pixel(width, height, WHITE);
        let baseline = TOP + self.plot_height;

        let peak = histogram.peak();
        if peak > 0 {
            for (bin, &count) in histogram.counts.iter().enumerate() {
                let bar_height =
                    ((count as f64 / peak as f64) * self.plot_height as f64).round() as u32;
                if bar_height == 0 {
                    continue;
                }
                let x = LEFT + bin as u32 * self.bar_width;
                draw_filled_rect_mut(
                    &mut canvas,
                    Rect::at(x as i32, (baseline - bar_height) as i32).of_size(self.bar_width, bar_height),
                    BAR,
                );
            }
        }

        // Axes
        let (left, right) = (LEFT as f32, (LEFT + plot_width) as f32);
        draw_line_segment_mut(&mut canvas, (left, baseline as f32), (right, baseline as f32), BLACK);
        draw_line_segment_mut(&mut canvas, (left, TOP as f32), (left, baseline as f32), BLACK);

        // Ticks: intensity range along x, peak count at the top of y
        let tick_y = (baseline + 4) as i32;
        draw_text_mut(&mut canvas, BLACK, LEFT as i32, tick_y, label_scale, &font, "0");
        let (max_w, _) = text_size(label_scale, &font, "255");
        draw_text_mut(&mut canvas, BLACK, (LEFT + plot_width - max_w) as i32, tick_y, label_scale, &font, "255");
        let peak_label = peak.to_string();
        let (peak_w, _) = text_size(label_scale, &font, &peak_label);
        draw_text_mut(
            &mut canvas,
            BLACK,
            (LEFT as i32 - peak_w as i32 - 4).max(0),
            TOP as i32,
            label_scale,
            &font,
            &peak_label,
        );

        let (title_w, _) = text_size(title_scale, &font, title);
        let title_x = ((width as i32 - title_w as i32) / 2).max(0);
        draw_text_mut(&mut canvas, BLACK, title_x, 10, title_scale, &font, title);

        let (x_label_w, _) = text_size(label_scale, &font, X_LABEL);
        let x_label_x = LEFT as i32 + (plot_width as i32 - x_label_w as i32) / 2;
        draw_text_mut(&mut canvas, BLACK, x_label_x, (baseline + 24) as i32, label_scale, &font, X_LABEL);

        // Vertical label: drawn upright on its own canvas, then turned
        let (y_label_w, y_label_h) = text_size(label_scale, &font, Y_LABEL);
        let mut y_label = RgbImage::from_pixel(y_label_w.max(1), y_label_h.max(1) + 4, WHITE);
        draw_text_mut(&mut y_label, BLACK, 0, 0, label_scale, &font, Y_LABEL);
        let y_label = imageops::rotate270(&y_label);
        let y_label_y = TOP as i64 + (self.plot_height as i64 - y_label.height() as i64) / 2;
        imageops::overlay(&mut canvas, &y_label, 8, y_label_y.max(0));

        Ok(canvas)
    }
}

impl HistogramRenderer for BarChartRenderer {
    fn render(&self, histogram: &IntensityHistogram, title: &str, path: &Path) -> Result<()> {
        debug!("Rendering histogram '{}' ({} samples) to {:?}", title, histogram.total(), path);
        self.draw(histogram, title)?.save(path)?;
        Ok(())
    }
}
