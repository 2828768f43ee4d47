//! Terminal render target.

use flurry_core::{Bounds, ColorTheme, Span};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span as TextSpan},
    widgets::{Paragraph, Widget},
};

use crate::color::flake_color;
use crate::render::{RenderTarget, Sprite};

/// A glyph placed in one terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placed {
    glyph: char,
    color: Color,
    /// Size times opacity; the heaviest flake wins a shared cell.
    weight: f32,
}

/// Grid of terminal cells that snowflakes are drawn into.
///
/// Surface coordinates are mapped to cells by the cell size, so a surface of
/// `cols * cell_width` by `rows * cell_height` units fills the grid. Cells
/// cannot rotate, so rotation is ignored.
#[derive(Debug, Clone)]
pub struct CellCanvas {
    cell_width: f32,
    cell_height: f32,
    cols: u16,
    rows: u16,
    cells: Vec<Option<Placed>>,
    theme: ColorTheme,
    /// Flake size range, used to grade colors from small to large.
    size_range: Span,
}

impl CellCanvas {
    /// Create an empty canvas; call `fit` (or let the field do it) to size it.
    pub fn new(cell_width: f32, cell_height: f32, theme: ColorTheme, size_range: Span) -> Self {
        Self {
            cell_width: cell_width.max(f32::EPSILON),
            cell_height: cell_height.max(f32::EPSILON),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            theme,
            size_range,
        }
    }

    /// Surface bounds covering a grid of `cols` by `rows` cells.
    pub fn surface_bounds(&self, cols: u16, rows: u16) -> Bounds {
        Bounds::new(
            f32::from(cols) * self.cell_width,
            f32::from(rows) * self.cell_height,
        )
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn theme(&self) -> ColorTheme {
        self.theme
    }

    /// Change the tint. Takes effect from the next frame.
    pub fn set_theme(&mut self, theme: ColorTheme) {
        self.theme = theme;
    }

    /// Glyph at a cell, if any.
    pub fn glyph_at(&self, col: u16, row: u16) -> Option<char> {
        self.index(col, row)
            .and_then(|i| self.cells[i])
            .map(|placed| placed.glyph)
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Build the canvas as styled lines, one per row.
    pub fn lines(&self) -> Vec<Line<'static>> {
        (0..self.rows)
            .map(|row| {
                let spans: Vec<TextSpan> = (0..self.cols)
                    .map(|col| match self.index(col, row).and_then(|i| self.cells[i]) {
                        Some(placed) => TextSpan::styled(
                            placed.glyph.to_string(),
                            Style::new().fg(placed.color),
                        ),
                        None => TextSpan::raw(" "),
                    })
                    .collect();
                Line::from(spans)
            })
            .collect()
    }

    fn index(&self, col: u16, row: u16) -> Option<usize> {
        (col < self.cols && row < self.rows)
            .then(|| usize::from(row) * usize::from(self.cols) + usize::from(col))
    }
}

impl RenderTarget for CellCanvas {
    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    fn draw_glyph(&mut self, sprite: &Sprite) {
        if !(sprite.x >= 0.0 && sprite.y >= 0.0) {
            return;
        }
        let col = (sprite.x / self.cell_width) as u64;
        let row = (sprite.y / self.cell_height) as u64;
        let (Ok(col), Ok(row)) = (u16::try_from(col), u16::try_from(row)) else {
            return;
        };
        let Some(i) = self.index(col, row) else {
            return;
        };

        let weight = sprite.size * sprite.opacity;
        if self.cells[i].is_some_and(|existing| existing.weight >= weight) {
            return;
        }

        let size_t = self.size_range.normalize(sprite.size);
        self.cells[i] = Some(Placed {
            glyph: sprite.glyph,
            color: flake_color(self.theme, size_t, sprite.opacity),
            weight,
        });
    }

    fn fit(&mut self, bounds: Bounds) {
        let cols = (bounds.width / self.cell_width).ceil().clamp(0.0, f32::from(u16::MAX)) as u16;
        let rows = (bounds.height / self.cell_height).ceil().clamp(0.0, f32::from(u16::MAX)) as u16;
        if cols == self.cols && rows == self.rows {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![None; usize::from(cols) * usize::from(rows)];
    }
}

impl Widget for &CellCanvas {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Paragraph::new(self.lines()).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> CellCanvas {
        let mut canvas = CellCanvas::new(8.0, 16.0, ColorTheme::Frost, Span::new(8.0, 20.0));
        canvas.fit(canvas.surface_bounds(10, 5));
        canvas
    }

    fn sprite(x: f32, y: f32, size: f32, glyph: char) -> Sprite {
        Sprite {
            id: 0,
            x,
            y,
            size,
            opacity: 1.0,
            rotation: 0.0,
            glyph,
        }
    }

    #[test]
    fn test_fit_sizes_grid() {
        let canvas = canvas();
        assert_eq!((canvas.cols(), canvas.rows()), (10, 5));
        assert_eq!(canvas.surface_bounds(10, 5), Bounds::new(80.0, 80.0));
        assert_eq!(canvas.occupied(), 0);
    }

    #[test]
    fn test_maps_surface_to_cells() {
        let mut canvas = canvas();
        canvas.draw_glyph(&sprite(17.0, 33.0, 10.0, '❄'));
        assert_eq!(canvas.glyph_at(2, 2), Some('❄'));
        assert_eq!(canvas.occupied(), 1);
    }

    #[test]
    fn test_offscreen_sprites_skipped() {
        let mut canvas = canvas();
        canvas.draw_glyph(&sprite(-1.0, 10.0, 10.0, '*'));
        canvas.draw_glyph(&sprite(10.0, -50.0, 10.0, '*'));
        canvas.draw_glyph(&sprite(81.0, 10.0, 10.0, '*'));
        canvas.draw_glyph(&sprite(10.0, 1000.0, 10.0, '*'));
        canvas.draw_glyph(&sprite(f32::NAN, 10.0, 10.0, '*'));
        assert_eq!(canvas.occupied(), 0);
    }

    #[test]
    fn test_heavier_flake_wins_cell() {
        let mut canvas = canvas();
        canvas.draw_glyph(&sprite(1.0, 1.0, 9.0, '·'));
        canvas.draw_glyph(&sprite(2.0, 2.0, 18.0, '❅'));
        canvas.draw_glyph(&sprite(3.0, 3.0, 10.0, '*'));
        assert_eq!(canvas.glyph_at(0, 0), Some('❅'));
    }

    #[test]
    fn test_clear_and_lines() {
        let mut canvas = canvas();
        canvas.draw_glyph(&sprite(0.0, 0.0, 10.0, '*'));
        let lines = canvas.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].spans.len(), 10);
        assert_eq!(lines[0].spans[0].content, "*");
        assert_eq!(lines[0].spans[1].content, " ");

        canvas.clear();
        assert_eq!(canvas.occupied(), 0);
        assert_eq!((canvas.cols(), canvas.rows()), (10, 5));
    }

    #[test]
    fn test_renders_into_buffer() {
        let mut canvas = canvas();
        canvas.draw_glyph(&sprite(8.0, 16.0, 10.0, '✦'));

        let area = Rect::new(0, 0, 10, 5);
        let mut buf = Buffer::empty(area);
        (&canvas).render(area, &mut buf);
        assert_eq!(buf[(1, 1)].symbol(), "✦");
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }
}
