use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::activity::{Activity, RawActivity};
use crate::error::HeatmapError;
use crate::grid::{Cell, Grid, GridLayout, build_grid};
use crate::intensity::LEVEL_COUNT;
use crate::months::MonthLabel;

/// Characters per week-column: a two-character glyph plus a separator.
pub const COLUMN_WIDTH: usize = 3;

const ROW_LABEL_WIDTH: usize = 4;
const PLACEHOLDER_GLYPH: &str = "  ";

/// How one intensity level is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    pub glyph: &'static str,
    pub color: &'static str,
    pub label: &'static str,
}

/// Lookup table from level 0-4 to its glyph, color and legend label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    swatches: [Swatch; LEVEL_COUNT],
    reset: &'static str,
}

impl Palette {
    /// 256-color backgrounds from dark grey through vivid green.
    pub const fn ansi() -> Self {
        Self {
            swatches: [
                Swatch { glyph: "  ", color: "\x1b[48;5;237m", label: "0" },
                Swatch { glyph: "░░", color: "\x1b[48;5;22m", label: "low" },
                Swatch { glyph: "▒▒", color: "\x1b[48;5;28m", label: "med" },
                Swatch { glyph: "▓▓", color: "\x1b[48;5;34m", label: "high" },
                Swatch { glyph: "██", color: "\x1b[48;5;46m", label: "peak" },
            ],
            reset: "\x1b[0m",
        }
    }

    /// Glyphs only, for pipes and dumb terminals.
    pub const fn plain() -> Self {
        Self {
            swatches: [
                Swatch { glyph: "··", color: "", label: "0" },
                Swatch { glyph: "░░", color: "", label: "low" },
                Swatch { glyph: "▒▒", color: "", label: "med" },
                Swatch { glyph: "▓▓", color: "", label: "high" },
                Swatch { glyph: "██", color: "", label: "peak" },
            ],
            reset: "",
        }
    }

    pub fn swatch(&self, level: u8) -> &Swatch {
        let idx = usize::from(level).min(LEVEL_COUNT - 1);
        &self.swatches[idx]
    }

    pub fn paint(&self, level: u8) -> String {
        let swatch = self.swatch(level);
        if swatch.color.is_empty() {
            return swatch.glyph.to_string();
        }
        format!("{}{}{}", swatch.color, swatch.glyph, self.reset)
    }

    fn paint_cell(&self, cell: &Cell) -> String {
        if cell.is_placeholder {
            PLACEHOLDER_GLYPH.to_string()
        } else {
            self.paint(cell.intensity_level)
        }
    }
}

/// Terminal heatmap over the full extent of the data, Monday-start rows.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    palette: Palette,
}

impl TextRenderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Colors only when asked to and stdout is a terminal.
    pub fn for_stdout(color: bool) -> Self {
        let palette = if color && io::stdout().is_terminal() {
            Palette::ansi()
        } else {
            Palette::plain()
        };
        Self::new(palette)
    }

    #[tracing::instrument(skip(self, out, raw), fields(entries = raw.len()))]
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        raw: &RawActivity,
        today: NaiveDate,
    ) -> Result<(), HeatmapError> {
        if raw.is_empty() {
            writeln!(out, "No journey data found.")?;
            return Ok(());
        }

        let activity = Activity::parse(raw)?;
        let grid = build_grid(&activity, today, GridLayout::full_range());

        writeln!(out, "{}", month_header(&grid.month_labels(COLUMN_WIDTH)))?;
        self.write_rows(out, &grid)?;
        self.write_legend(out)?;

        writeln!(
            out,
            "\nTotal journeys: {} across {} days",
            activity.total(),
            activity.len()
        )?;
        Ok(())
    }

    fn write_rows<W: Write>(&self, out: &mut W, grid: &Grid) -> io::Result<()> {
        for (row, weekday) in grid.layout.weekdays().iter().enumerate() {
            write!(out, "{:<width$}", weekday.to_string(), width = ROW_LABEL_WIDTH)?;
            for week in &grid.weeks {
                write!(out, "{} ", self.palette.paint_cell(&week.cells[row]))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_legend<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "\nLegend: ")?;
        for level in 0..LEVEL_COUNT as u8 {
            let swatch = self.palette.swatch(level);
            write!(out, "{} {}  ", self.palette.paint(level), swatch.label)?;
        }
        writeln!(out)
    }
}

fn month_header(labels: &[MonthLabel]) -> String {
    let mut line = " ".repeat(ROW_LABEL_WIDTH);
    for label in labels {
        let target = ROW_LABEL_WIDTH + label.offset;
        let current = UnicodeWidthStr::width(line.as_str());
        line.push_str(&" ".repeat(target.saturating_sub(current)));
        line.push_str(&clip_to_width(&label.name, label.width));
    }
    line.trim_end().to_string()
}

fn clip_to_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(ch);
    }
    out
}
