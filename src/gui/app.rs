//! CrashScope Main Application
//! Main window wiring the control panel to the aggregation pipeline.
//!
//! Every input event runs the same explicit chain, synchronously on the UI
//! thread: dimension change → category-list recompute → bounds-check the
//! mode controls → aggregation recompute → render.

use crate::analysis;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::sync::Arc;
use tracing::{debug, error};

/// Main application window.
pub struct CrashScopeApp {
    /// The Traffic table, built once at startup and never mutated.
    traffic: Arc<DataFrame>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl CrashScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, traffic: Arc<DataFrame>) -> Self {
        let mut app = Self {
            traffic,
            control_panel: ControlPanel::new(),
            chart_viewer: ChartViewer::new(),
        };
        app.refresh_categories();
        app.recompute();
        app
    }

    /// Rebuild the valid-category list for the current dimension; the panel
    /// re-bounds its slider and resets its selection from it.
    fn refresh_categories(&mut self) {
        match analysis::valid_categories(&self.traffic, self.control_panel.dimension) {
            Ok(categories) => self.control_panel.set_categories(categories),
            Err(err) => {
                // Recoverable: degrade to an empty list and a placeholder
                // chart instead of taking the process down.
                error!(error = %err, "category refresh failed");
                self.control_panel.set_categories(Vec::new());
            }
        }
    }

    /// Rerun the aggregation for the current controls and hand the result to
    /// the chart.
    fn recompute(&mut self) {
        let dimension = self.control_panel.dimension;
        let mode = self.control_panel.display_mode();
        match analysis::aggregate(&self.traffic, dimension, &mode) {
            Ok(rows) => {
                debug!(
                    dimension = dimension.label(),
                    rows = rows.len(),
                    "aggregation rebuilt"
                );
                self.chart_viewer.set_result(dimension, rows);
            }
            Err(err) => {
                error!(error = %err, "aggregation failed");
                self.chart_viewer.clear();
            }
        }
    }
}

impl eframe::App for CrashScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Left panel - controls
        SidePanel::left("control_panel")
            .min_width(320.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::DimensionChanged => {
                            self.refresh_categories();
                            self.recompute();
                        }
                        ControlPanelAction::SelectionChanged => self.recompute(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - chart
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
