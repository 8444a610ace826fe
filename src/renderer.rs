//! # Chart Rendering Surfaces
//!
//! The chart scaler emits plot commands; a [`RenderSurface`] turns them into
//! something visible. Two surfaces are provided:
//!
//! - [`AsciiSurface`]: a character grid for terminal output during development
//! - [`GraphicsSurface`]: any `embedded-graphics` draw target with binary colour,
//!   such as an e-paper frame buffer or `MockDisplay` in tests
//!
//! Both take pixel coordinates of the chart geometry; the ASCII surface scales
//! them down to its grid.

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Baseline, Text},
};

use crate::chart::PlotPoint;

/// Minimal drawing capability needed for strip charts.
pub trait RenderSurface {
    /// Start a new line at `to`.
    fn move_to(&mut self, to: PlotPoint);
    /// Draw from the current position to `to`.
    fn line_to(&mut self, to: PlotPoint);
    /// Write text with its top left corner at `at`.
    fn draw_text(&mut self, at: PlotPoint, text: &str);
}

/// Character grid for terminal output.
#[derive(Clone, Debug)]
pub struct AsciiSurface {
    grid: Vec<Vec<char>>,
    cols: usize,
    rows: usize,
    pixel_width: u32,
    pixel_height: u32,
    cursor: Option<(usize, usize)>,
}

impl AsciiSurface {
    /// Grid of `cols × rows` cells covering `pixel_width × pixel_height` pixels.
    pub fn new(cols: usize, rows: usize, pixel_width: u32, pixel_height: u32) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        AsciiSurface {
            grid: vec![vec![' '; cols]; rows],
            cols,
            rows,
            pixel_width: pixel_width.max(1),
            pixel_height: pixel_height.max(1),
            cursor: None,
        }
    }

    fn cell(&self, p: PlotPoint) -> (usize, usize) {
        let scale = |v: i32, pixels: u32, cells: usize| {
            let v = v.clamp(0, pixels as i32) as usize;
            (v * cells / pixels as usize).min(cells - 1)
        };
        (
            scale(p.x, self.pixel_width, self.cols),
            scale(p.y, self.pixel_height, self.rows),
        )
    }

    fn plot(&mut self, col: usize, row: usize) {
        self.grid[row][col] = '•';
    }

    /// Bresenham between two cells.
    fn line(&mut self, from: (usize, usize), to: (usize, usize)) {
        let (mut x, mut y) = (from.0 as i64, from.1 as i64);
        let (x1, y1) = (to.0 as i64, to.1 as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x as usize, y as usize);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn char_at(&self, col: usize, row: usize) -> Option<char> {
        self.grid.get(row).and_then(|r| r.get(col)).copied()
    }

    /// The grid as text, one line per row, trailing blanks removed.
    pub fn render(&self) -> String {
        self.grid
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RenderSurface for AsciiSurface {
    fn move_to(&mut self, to: PlotPoint) {
        let (col, row) = self.cell(to);
        self.plot(col, row);
        self.cursor = Some((col, row));
    }

    fn line_to(&mut self, to: PlotPoint) {
        let target = self.cell(to);
        match self.cursor {
            Some(from) => self.line(from, target),
            None => self.plot(target.0, target.1),
        }
        self.cursor = Some(target);
    }

    fn draw_text(&mut self, at: PlotPoint, text: &str) {
        let (col, row) = self.cell(at);
        // Keep labels readable at the right edge
        let start = col.min(self.cols.saturating_sub(text.chars().count()));
        for (i, ch) in text.chars().enumerate() {
            if let Some(cell) = self.grid[row].get_mut(start + i) {
                *cell = ch;
            }
        }
    }
}

/// Surface on top of an `embedded-graphics` draw target.
pub struct GraphicsSurface<'a, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    display: &'a mut D,
    cursor: Option<Point>,
    stroke_width: u32,
}

impl<'a, D> GraphicsSurface<'a, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    pub fn new(display: &'a mut D) -> Self {
        GraphicsSurface {
            display,
            cursor: None,
            stroke_width: 1,
        }
    }

    /// Line width in pixels; the wind plot uses 2 for legibility on e-paper.
    pub fn with_stroke_width(mut self, stroke_width: u32) -> Self {
        self.stroke_width = stroke_width.max(1);
        self
    }
}

fn point(p: PlotPoint) -> Point {
    Point::new(p.x, p.y)
}

impl<D> RenderSurface for GraphicsSurface<'_, D>
where
    D: DrawTarget<Color = BinaryColor>,
{
    fn move_to(&mut self, to: PlotPoint) {
        self.cursor = Some(point(to));
    }

    fn line_to(&mut self, to: PlotPoint) {
        let to = point(to);
        let from = self.cursor.unwrap_or(to);
        Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, self.stroke_width))
            .draw(&mut *self.display)
            .ok();
        self.cursor = Some(to);
    }

    fn draw_text(&mut self, at: PlotPoint, text: &str) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        Text::with_baseline(text, point(at), style, Baseline::Top)
            .draw(&mut *self.display)
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    #[test]
    fn test_ascii_line_is_continuous() {
        let mut surface = AsciiSurface::new(10, 5, 100, 50);
        surface.move_to(PlotPoint::new(0, 0));
        surface.line_to(PlotPoint::new(90, 40));

        assert_eq!(surface.char_at(0, 0), Some('•'));
        assert_eq!(surface.char_at(9, 4), Some('•'));
        for row in 0..5 {
            let dots = (0..10).filter(|&c| surface.char_at(c, row) == Some('•')).count();
            assert!(dots >= 1, "row {row} has no dot");
        }
    }

    #[test]
    fn test_ascii_move_to_breaks_line() {
        let mut surface = AsciiSurface::new(10, 3, 10, 3);
        surface.move_to(PlotPoint::new(0, 1));
        surface.move_to(PlotPoint::new(9, 1));
        assert_eq!(surface.render().lines().nth(1), Some("•        •"));
    }

    #[test]
    fn test_ascii_text_and_clamping() {
        let mut surface = AsciiSurface::new(8, 2, 8, 2);
        surface.draw_text(PlotPoint::new(7, 0), "090");
        surface.line_to(PlotPoint::new(-5, 99));
        let text = surface.render();
        assert_eq!(text.lines().next(), Some("     090"));
        assert_eq!(surface.char_at(0, 1), Some('•'));
    }

    #[test]
    fn test_graphics_surface_draws_pixels() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);
        {
            let mut surface = GraphicsSurface::new(&mut display);
            surface.move_to(PlotPoint::new(2, 2));
            surface.line_to(PlotPoint::new(40, 30));
            surface.line_to(PlotPoint::new(60, 2));
        }
        assert_eq!(display.get_pixel(Point::new(2, 2)), Some(BinaryColor::On));
        assert_eq!(display.get_pixel(Point::new(60, 2)), Some(BinaryColor::On));
        let pixels_drawn = display.affected_area().size.width;
        assert!(pixels_drawn > 50, "No line was drawn to the display");
    }

    #[test]
    fn test_graphics_surface_text() {
        let mut display = MockDisplay::<BinaryColor>::new();
        display.set_allow_overdraw(true);
        GraphicsSurface::new(&mut display).draw_text(PlotPoint::new(0, 0), "TWD");
        assert!(display.affected_area().size.width > 0);
    }
}
