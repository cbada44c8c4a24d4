use crate::chart::ChartBuilder;
use crate::data::Field;
use crate::error::{DashError, Result};
use crate::ir::ChartPayload;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const AXIS_OPTIONS: [Field; 4] = [Field::Sex, Field::Smoker, Field::Day, Field::Time];
const TEXT_OPTIONS: [Field; 5] = [Field::Sex, Field::Smoker, Field::Day, Field::Time, Field::Size];

/// Dropdown controls, identified by the IDs the page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlId {
    #[serde(rename = "hue-scatter")]
    HueScatter,
    #[serde(rename = "x-bar")]
    XBar,
    #[serde(rename = "text-bar")]
    TextBar,
}

impl ControlId {
    pub const ALL: [ControlId; 3] = [ControlId::HueScatter, ControlId::XBar, ControlId::TextBar];

    pub fn as_str(self) -> &'static str {
        match self {
            ControlId::HueScatter => "hue-scatter",
            ControlId::XBar => "x-bar",
            ControlId::TextBar => "text-bar",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ControlId::HueScatter => "Hue : ",
            ControlId::XBar => "X Axis : ",
            ControlId::TextBar => "Text : ",
        }
    }

    /// The closed set of fields this control offers.
    pub fn options(self) -> &'static [Field] {
        match self {
            ControlId::HueScatter | ControlId::XBar => &AXIS_OPTIONS,
            ControlId::TextBar => &TEXT_OPTIONS,
        }
    }

    pub fn accepts(self, field: Field) -> bool {
        self.options().contains(&field)
    }
}

impl FromStr for ControlId {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self> {
        ControlId::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DashError::UnknownControl(s.to_string()))
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart containers on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChartId {
    #[serde(rename = "scatter-plot")]
    Scatter,
    #[serde(rename = "bar-plot")]
    Bar,
}

impl ChartId {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartId::Scatter => "scatter-plot",
            ChartId::Bar => "bar-plot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropdownOption {
    pub label: &'static str,
    pub value: Field,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dropdown {
    pub id: ControlId,
    pub label: &'static str,
    pub options: Vec<DropdownOption>,
    pub value: Field,
}

/// Dropdown definitions with `state` as the current values.
pub fn dropdowns(state: &SelectionState) -> Vec<Dropdown> {
    ControlId::ALL
        .iter()
        .map(|&id| Dropdown {
            id,
            label: id.label(),
            options: id
                .options()
                .iter()
                .map(|&f| DropdownOption { label: f.label(), value: f })
                .collect(),
            value: state.get(id),
        })
        .collect()
}

/// The fields currently driving each chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub hue: Field,
    pub x_field: Field,
    pub text_field: Field,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            hue: Field::Sex,
            x_field: Field::Sex,
            text_field: Field::Sex,
        }
    }
}

impl SelectionState {
    pub fn get(&self, control: ControlId) -> Field {
        match control {
            ControlId::HueScatter => self.hue,
            ControlId::XBar => self.x_field,
            ControlId::TextBar => self.text_field,
        }
    }

    /// Copy of this selection with one control changed, checked against its option set.
    pub fn with(mut self, control: ControlId, field: Field) -> Result<Self> {
        if !control.accepts(field) {
            return Err(DashError::InvalidField(format!(
                "{} (not offered by {})",
                field, control
            )));
        }
        match control {
            ControlId::HueScatter => self.hue = field,
            ControlId::XBar => self.x_field = field,
            ControlId::TextBar => self.text_field = field,
        }
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        for control in ControlId::ALL {
            self.with(control, self.get(control))?;
        }
        Ok(())
    }
}

type Handler = fn(&ChartBuilder, &SelectionState) -> Result<ChartPayload>;

/// Recomputes one chart whenever any of its input controls changes.
#[derive(Clone)]
pub struct Binding {
    pub inputs: &'static [ControlId],
    pub output: ChartId,
    handler: Handler,
}

impl Binding {
    pub fn new(inputs: &'static [ControlId], output: ChartId, handler: Handler) -> Self {
        Self { inputs, output, handler }
    }

    pub fn depends_on(&self, control: ControlId) -> bool {
        self.inputs.contains(&control)
    }

    pub fn evaluate(&self, builder: &ChartBuilder, state: &SelectionState) -> Result<ChartPayload> {
        (self.handler)(builder, state)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(&[ControlId::HueScatter], ChartId::Scatter, |builder, state| {
            builder.scatter_by(state.hue)
        }),
        Binding::new(&[ControlId::XBar, ControlId::TextBar], ChartId::Bar, |builder, state| {
            Ok(builder.bar_by(state.x_field, state.text_field))
        }),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartUpdate {
    pub chart: ChartId,
    pub figure: ChartPayload,
}

/// Per-session interaction state: the current selection and the figures it produced.
#[derive(Debug, Clone)]
pub struct Controller {
    builder: ChartBuilder,
    bindings: Vec<Binding>,
    state: SelectionState,
    figures: BTreeMap<ChartId, ChartPayload>,
}

impl Controller {
    /// Build the initial view from the default selection.
    pub fn new(builder: ChartBuilder) -> Result<Self> {
        Self::with_state(builder, SelectionState::default())
    }

    pub fn with_state(builder: ChartBuilder, state: SelectionState) -> Result<Self> {
        state.validate()?;
        let bindings = default_bindings();
        let mut figures = BTreeMap::new();
        for binding in &bindings {
            figures.insert(binding.output, binding.evaluate(&builder, &state)?);
        }
        Ok(Self {
            builder,
            bindings,
            state,
            figures,
        })
    }

    pub fn selection(&self) -> SelectionState {
        self.state
    }

    pub fn figure(&self, chart: ChartId) -> Option<&ChartPayload> {
        self.figures.get(&chart)
    }

    /// Snapshot of every chart's current figure.
    pub fn figures(&self) -> Vec<ChartUpdate> {
        self.figures
            .iter()
            .map(|(&chart, figure)| ChartUpdate {
                chart,
                figure: figure.clone(),
            })
            .collect()
    }

    /// Handle a dropdown change given as raw strings.
    pub fn dispatch(&mut self, control: &str, value: &str) -> Result<Vec<ChartUpdate>> {
        let control: ControlId = control.parse()?;
        self.on_change(control, value)
    }

    /// Apply a new dropdown value and recompute every chart bound to it.
    ///
    /// All-or-nothing: on error the previous selection and figures stay in place.
    pub fn on_change(&mut self, control: ControlId, value: &str) -> Result<Vec<ChartUpdate>> {
        let field = Field::parse(value)?;
        let next = self.state.with(control, field)?;

        let updates = self
            .bindings
            .iter()
            .filter(|b| b.depends_on(control))
            .map(|b| {
                Ok(ChartUpdate {
                    chart: b.output,
                    figure: b.evaluate(&self.builder, &next)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.state = next;
        for update in &updates {
            self.figures.insert(update.chart, update.figure.clone());
        }
        tracing::debug!(control = %control, value, charts = updates.len(), "selection changed");
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, Record};
    use crate::palette::{CategoryColorTable, Color};
    use std::sync::Arc;

    fn row(sex: &str, day: &str) -> Record {
        Record {
            total_bill: 12.5,
            tip: 2.0,
            sex: sex.to_string(),
            smoker: "No".to_string(),
            day: day.to_string(),
            time: "Lunch".to_string(),
            size: 3,
        }
    }

    fn builder_with(palettes: CategoryColorTable) -> ChartBuilder {
        let data = Dataset::new(vec![row("Male", "Sun"), row("Female", "Sat"), row("Male", "Thur")]);
        ChartBuilder::new(data, Arc::new(palettes))
    }

    fn controller() -> Controller {
        Controller::new(builder_with(CategoryColorTable::tips_default())).unwrap()
    }

    #[test]
    fn test_control_id_parse() {
        assert_eq!("hue-scatter".parse::<ControlId>().unwrap(), ControlId::HueScatter);
        assert_eq!("text-bar".parse::<ControlId>().unwrap(), ControlId::TextBar);
        assert!(matches!("ddl-hue".parse::<ControlId>(), Err(DashError::UnknownControl(_))));
    }

    #[test]
    fn test_dropdown_options() {
        let controls = dropdowns(&SelectionState::default());
        assert_eq!(controls.len(), 3);
        let labels: Vec<&str> = controls[2].options.iter().map(|o| o.label).collect();
        assert_eq!(labels, vec!["Sex", "Smoker", "Day", "Time", "Size"]);
        assert_eq!(controls[0].options.len(), 4);
        assert!(controls.iter().all(|d| d.value == Field::Sex));
    }

    #[test]
    fn test_initial_render_uses_defaults() {
        let ctl = controller();
        assert_eq!(ctl.selection(), SelectionState::default());
        let scatter = ctl.figure(ChartId::Scatter).unwrap();
        assert_eq!(scatter.series.len(), 2);
        let bar = ctl.figure(ChartId::Bar).unwrap();
        assert_eq!(bar.axes.x.title, "Sex");
    }

    #[test]
    fn test_hue_change_updates_scatter_only() {
        let mut ctl = controller();
        let bar_before = ctl.figure(ChartId::Bar).unwrap().clone();

        let updates = ctl.on_change(ControlId::HueScatter, "day").unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].chart, ChartId::Scatter);
        assert_eq!(updates[0].figure.series.len(), 3);
        assert_eq!(ctl.selection().hue, Field::Day);
        assert_eq!(ctl.figure(ChartId::Scatter), Some(&updates[0].figure));
        assert_eq!(ctl.figure(ChartId::Bar), Some(&bar_before));
    }

    #[test]
    fn test_bar_binding_reads_both_inputs() {
        let mut ctl = controller();
        ctl.on_change(ControlId::TextBar, "size").unwrap();
        let updates = ctl.dispatch("x-bar", "time").unwrap();
        assert_eq!(updates.len(), 1);
        let figure = &updates[0].figure;
        assert_eq!(figure.axes.x.title, "Time");
        assert_eq!(figure.series[0].text.as_ref().map(Vec::len), Some(3));
        assert_eq!(ctl.selection().text_field, Field::Size);
    }

    #[test]
    fn test_invalid_value_keeps_previous_state() {
        let mut ctl = controller();
        let before = ctl.figures();

        assert!(matches!(ctl.on_change(ControlId::HueScatter, "tip"), Err(DashError::InvalidField(_))));
        assert!(matches!(ctl.on_change(ControlId::XBar, "size"), Err(DashError::InvalidField(_))));
        assert!(matches!(ctl.on_change(ControlId::XBar, "bogus"), Err(DashError::InvalidField(_))));
        assert!(matches!(ctl.dispatch("nope", "sex"), Err(DashError::UnknownControl(_))));

        assert_eq!(ctl.selection(), SelectionState::default());
        assert_eq!(ctl.figures(), before);
    }

    #[test]
    fn test_failed_binding_keeps_previous_figure() {
        let mut palettes = CategoryColorTable::new();
        palettes.register(Field::Sex, vec![Color::rgb(0, 0, 0)]).unwrap();
        let mut ctl = Controller::new(builder_with(palettes)).unwrap();
        let before = ctl.figure(ChartId::Scatter).unwrap().clone();

        let result = ctl.on_change(ControlId::HueScatter, "day");
        assert!(matches!(result, Err(DashError::Configuration(_))));
        assert_eq!(ctl.selection().hue, Field::Sex);
        assert_eq!(ctl.figure(ChartId::Scatter), Some(&before));
    }

    #[test]
    fn test_with_state_rejects_invalid_selection() {
        let state = SelectionState {
            hue: Field::Size,
            ..SelectionState::default()
        };
        let result = Controller::with_state(builder_with(CategoryColorTable::tips_default()), state);
        assert!(matches!(result, Err(DashError::InvalidField(_))));
    }

    #[test]
    fn test_serialized_ids() {
        assert_eq!(serde_json::to_string(&ControlId::XBar).unwrap(), "\"x-bar\"");
        assert_eq!(serde_json::to_string(&ChartId::Bar).unwrap(), "\"bar-plot\"");
    }
}
