use askama::Template;

use crate::error::HeatmapError;
use crate::heatmap::{CELL_WIDTH_PX, HeatmapData};

/// Browser heatmap page; values are HTML-escaped by the template engine.
#[derive(Template)]
#[template(path = "heatmap.html")]
struct HeatmapPage<'a> {
    data: &'a HeatmapData,
    grid_width: usize,
    column_width: usize,
}

/// Renders the browser heatmap page.
pub fn render_page(data: &HeatmapData) -> Result<String, HeatmapError> {
    let page = HeatmapPage {
        data,
        grid_width: data.grid_width(),
        column_width: CELL_WIDTH_PX,
    };
    Ok(page.render()?)
}
