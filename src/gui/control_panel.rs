//! Control Panel Widget
//! Left side panel with the dimension, display-mode and category controls.

use crate::analysis::{Dimension, DisplayMode, MIN_SUPPORT};
use egui::{Color32, ComboBox, RichText, ScrollArea};
use std::collections::BTreeSet;

/// Which display-mode radio is active. The aggregation parameters live in
/// the panel itself; [`ControlPanel::display_mode`] assembles the full
/// [`DisplayMode`] on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChoice {
    TopN,
    Specific,
}

/// Left side control panel driving the aggregation.
pub struct ControlPanel {
    pub dimension: Dimension,
    pub mode: ModeChoice,
    pub top_n: usize,
    categories: Vec<String>,
    selected: Vec<bool>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            dimension: Dimension::Weather,
            mode: ModeChoice::TopN,
            top_n: 5,
            categories: Vec::new(),
            selected: Vec::new(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the valid-category list for the current dimension.
    ///
    /// Re-bounds the TopN slider and resets the Specific selection, so the
    /// mode controls can never refer to categories the dimension does not
    /// have.
    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.selected = vec![false; categories.len()];
        self.categories = categories;
        let bound = self.categories.len().max(1);
        self.top_n = self.top_n.clamp(1, bound);
    }

    /// Assemble the display mode for the aggregator from the current controls.
    pub fn display_mode(&self) -> DisplayMode {
        match self.mode {
            ModeChoice::TopN => DisplayMode::TopN { count: self.top_n },
            ModeChoice::Specific => {
                let selected: BTreeSet<String> = self
                    .categories
                    .iter()
                    .zip(&self.selected)
                    .filter(|(_, &picked)| picked)
                    .map(|(category, _)| category.clone())
                    .collect();
                DisplayMode::Specific { selected }
            }
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🚦 CrashScope")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Traffic Fatality Explorer")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Dimension Section =====
        ui.label(RichText::new("📊 Breakdown Dimension").size(14.0).strong());
        ui.add_space(5.0);

        ComboBox::from_id_salt("dimension")
            .width(240.0)
            .selected_text(self.dimension.label())
            .show_ui(ui, |ui| {
                for dimension in Dimension::ALL {
                    if ui
                        .selectable_label(self.dimension == dimension, dimension.label())
                        .clicked()
                        && self.dimension != dimension
                    {
                        self.dimension = dimension;
                        action = ControlPanelAction::DimensionChanged;
                    }
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Display Mode Section =====
        ui.label(RichText::new("⚙ Display Mode").size(14.0).strong());
        ui.add_space(5.0);

        if ui
            .radio_value(&mut self.mode, ModeChoice::TopN, "Select Top N Categories")
            .changed()
        {
            action = ControlPanelAction::SelectionChanged;
        }
        if ui
            .radio_value(
                &mut self.mode,
                ModeChoice::Specific,
                "Select Specific Categories",
            )
            .changed()
        {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(10.0);

        match self.mode {
            ModeChoice::TopN => {
                let bound = self.categories.len().max(1);
                ui.add_enabled_ui(!self.categories.is_empty(), |ui| {
                    if ui
                        .add(
                            egui::Slider::new(&mut self.top_n, 1..=bound)
                                .text("categories"),
                        )
                        .changed()
                    {
                        action = ControlPanelAction::SelectionChanged;
                    }
                });
            }
            ModeChoice::Specific => {
                ui.label("Categories:");
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(5.0)
                    .inner_margin(5.0)
                    .show(ui, |ui| {
                        ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                            for (i, category) in self.categories.iter().enumerate() {
                                if i < self.selected.len()
                                    && ui.checkbox(&mut self.selected[i], category).changed()
                                {
                                    action = ControlPanelAction::SelectionChanged;
                                }
                            }
                        });
                    });

                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    if ui.small_button("Select All").clicked() {
                        self.selected.iter_mut().for_each(|picked| *picked = true);
                        action = ControlPanelAction::SelectionChanged;
                    }
                    if ui.small_button("Clear All").clicked() {
                        self.selected.iter_mut().for_each(|picked| *picked = false);
                        action = ControlPanelAction::SelectionChanged;
                    }
                });
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Notes Section =====
        ui.label(
            RichText::new(format!(
                "{} categories available for this dimension.",
                self.categories.len()
            ))
            .size(11.0),
        );
        ui.add_space(5.0);
        ui.label(
            RichText::new(format!(
                "Categories with fewer than {MIN_SUPPORT} recorded cases are not shown; \
                 their percentages would be unreliable."
            ))
            .size(11.0)
            .color(Color32::GRAY),
        );
        ui.add_space(3.0);
        ui.label(
            RichText::new(
                "\"Pedestrian\" marks records with no matching vehicle entry (an \
                 approximation, not a verified pedestrian flag); it is hidden from \
                 every breakdown.",
            )
            .size(11.0)
            .color(Color32::GRAY),
        );

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    /// The dimension changed: the category list must be rebuilt before the
    /// aggregation reruns.
    DimensionChanged,
    /// Mode, slider or category picks changed: the aggregation reruns
    /// against the existing category list.
    SelectionChanged,
}
