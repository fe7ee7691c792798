//! Chart Viewer Widget
//! Central panel rendering the aggregation as a lollipop chart with
//! egui_plot: one point per category at its fatality percentage, a baseline
//! segment from zero, ordered by percentage ascending.

use crate::analysis::{CategoryAggregate, Dimension};
use egui::{Color32, RichText};
use egui_plot::{GridMark, Line, Plot, PlotPoints, Points};

/// Fixed chart caption.
pub const CAPTION: &str = "*Percent of Fatal Accidents by category";

/// Two-hue gradient endpoints: low percentages cool, high percentages hot.
const LOW_COLOR: Color32 = Color32::from_rgb(52, 152, 219);
const HIGH_COLOR: Color32 = Color32::from_rgb(231, 76, 60);

/// Central chart area. Holds the last aggregation result; re-rendered every
/// frame, replaced whenever the controls change.
pub struct ChartViewer {
    dimension_label: &'static str,
    rows: Vec<CategoryAggregate>,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            dimension_label: "",
            rows: Vec::new(),
        }
    }
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chart contents. Rows are sorted by percentage ascending
    /// so the lowest category sits at the bottom of the chart.
    pub fn set_result(&mut self, dimension: Dimension, mut rows: Vec<CategoryAggregate>) {
        rows.sort_by(|a, b| {
            a.fatal_percentage
                .partial_cmp(&b.fatal_percentage)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.dimension_label = dimension.label();
        self.rows = rows;
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Draw the chart, or a neutral placeholder when there is nothing to
    /// show (e.g. Specific mode with no categories picked).
    pub fn show(&self, ui: &mut egui::Ui) {
        if self.rows.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new("No categories selected")
                        .size(20.0)
                        .color(Color32::GRAY),
                );
            });
            return;
        }

        ui.vertical(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new(format!(
                    "Percent of Fatal Accidents — {}",
                    self.dimension_label
                ))
                .size(18.0)
                .strong(),
            );
            ui.add_space(8.0);

            let labels: Vec<String> = self.rows.iter().map(|row| row.category.clone()).collect();
            let count = labels.len();
            let chart_height = (ui.available_height() - 50.0).max(200.0);

            Plot::new("fatality_chart")
                .height(chart_height)
                .x_axis_label("Fatal cases (%)")
                .allow_scroll(false)
                .include_x(0.0)
                .include_y(-0.6)
                .include_y(count as f64 - 0.4)
                // One grid line per category, none in between.
                .y_grid_spacer(move |_input| {
                    (0..count)
                        .map(|i| GridMark {
                            value: i as f64,
                            step_size: 1.0,
                        })
                        .collect()
                })
                .y_axis_formatter(move |mark, _range| {
                    let nearest = mark.value.round();
                    if (mark.value - nearest).abs() > 1e-6 || nearest < 0.0 {
                        return String::new();
                    }
                    labels.get(nearest as usize).cloned().unwrap_or_default()
                })
                .show(ui, |plot_ui| {
                    for (i, row) in self.rows.iter().enumerate() {
                        let y = i as f64;
                        let color = percentage_color(row.fatal_percentage);

                        let baseline: PlotPoints =
                            vec![[0.0, y], [row.fatal_percentage, y]].into();
                        plot_ui.line(Line::new(baseline).color(color).width(2.0));

                        let point: PlotPoints = vec![[row.fatal_percentage, y]].into();
                        plot_ui.points(
                            Points::new(point)
                                .radius(5.0)
                                .color(color)
                                .name(&row.category),
                        );
                    }
                });

            ui.add_space(6.0);
            ui.label(RichText::new(CAPTION).italics().size(12.0).color(Color32::GRAY));
        });
    }
}

/// Interpolate the two-hue gradient by percentage.
fn percentage_color(percentage: f64) -> Color32 {
    let t = (percentage / 100.0).clamp(0.0, 1.0) as f32;
    let channel = |low: u8, high: u8| -> u8 {
        (f32::from(low) + (f32::from(high) - f32::from(low)) * t).round() as u8
    };
    Color32::from_rgb(
        channel(LOW_COLOR.r(), HIGH_COLOR.r()),
        channel(LOW_COLOR.g(), HIGH_COLOR.g()),
        channel(LOW_COLOR.b(), HIGH_COLOR.b()),
    )
}
