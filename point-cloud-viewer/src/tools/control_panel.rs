use std::collections::HashMap;

use bevy::prelude::*;
use constants::budget::POINT_BUDGET_STEP;

use super::dataset_controls::{CommandSource, DatasetCommand};
use crate::engine::assets::catalog::{DatasetCatalog, DatasetKey};
use crate::engine::assets::dataset::PointBudget;
use crate::engine::loading::registry::{DatasetRegistry, SlotState};
use crate::engine::loading::systems::DatasetStatus;

const BUTTON_IDLE: Color = Color::srgb(0.22, 0.24, 0.28);
const BUTTON_HOVER: Color = Color::srgb(0.26, 0.28, 0.32);
const BUTTON_PRESSED: Color = Color::srgb(0.18, 0.20, 0.24);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Load,
    Unload,
    BudgetDown,
    BudgetUp,
}

impl PanelAction {
    fn label(self) -> &'static str {
        match self {
            Self::Load => "Load",
            Self::Unload => "Unload",
            Self::BudgetDown => "-",
            Self::BudgetUp => "+",
        }
    }
}

#[derive(Component)]
pub struct DatasetPanelRoot;

#[derive(Component, Debug, Clone)]
pub struct PanelButton {
    pub key: DatasetKey,
    pub action: PanelAction,
}

#[derive(Component, Debug, Clone)]
pub struct StatusLabel {
    pub key: DatasetKey,
}

/// Last load error per dataset, cleared by the next load attempt.
#[derive(Resource, Debug, Default)]
pub struct PanelErrors {
    pub last_error: HashMap<DatasetKey, String>,
}

/// Text shown next to a dataset's buttons.
pub fn status_text(state: SlotState, budget: Option<PointBudget>, error: Option<&str>) -> String {
    match (state, error) {
        (SlotState::Unloaded, Some(error)) => format!("failed: {error}"),
        (SlotState::Loaded, _) => match budget {
            Some(budget) => format!("loaded ({budget} pts)"),
            None => state.label().to_string(),
        },
        _ => state.label().to_string(),
    }
}

/// Budget a −/+ press asks for, or `None` if nothing is installed.
pub fn stepped_budget(registry: &DatasetRegistry, key: &DatasetKey, action: PanelAction) -> Option<i64> {
    let current = i64::from(registry.get(key)?.point_budget.get());
    let step = i64::from(POINT_BUDGET_STEP);
    match action {
        PanelAction::BudgetDown => Some(current - step),
        PanelAction::BudgetUp => Some(current + step),
        PanelAction::Load | PanelAction::Unload => None,
    }
}

// Spawns one row per catalog entry: name, Load, Unload, budget -/+ and status
pub fn spawn_dataset_panel(mut commands: Commands, catalog: Res<DatasetCatalog>) {
    commands
        .spawn((
            DatasetPanelRoot,
            Name::new("DatasetPanel"),
            BackgroundColor(Color::srgb(0.10, 0.11, 0.13)),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                top: Val::Px(12.0),
                padding: UiRect::all(Val::Px(8.0)),
                row_gap: Val::Px(6.0),
                display: Display::Flex,
                flex_direction: FlexDirection::Column,
                ..default()
            },
        ))
        .with_children(|panel| {
            for key in catalog.keys() {
                panel
                    .spawn((
                        Name::new(format!("DatasetRow {key}")),
                        Node {
                            display: Display::Flex,
                            align_items: AlignItems::Center,
                            column_gap: Val::Px(6.0),
                            ..default()
                        },
                    ))
                    .with_children(|row| {
                        row.spawn((
                            Text::new(key.to_string()),
                            TextFont { font_size: 16.0, ..default() },
                            TextColor(Color::WHITE),
                            Node { width: Val::Px(48.0), ..default() },
                        ));

                        for action in [
                            PanelAction::Load,
                            PanelAction::Unload,
                            PanelAction::BudgetDown,
                            PanelAction::BudgetUp,
                        ] {
                            row.spawn((
                                PanelButton { key: key.clone(), action },
                                Button,
                                BackgroundColor(BUTTON_IDLE),
                                BorderColor(Color::srgba(0.0, 0.0, 0.0, 0.25)),
                                Node {
                                    padding: UiRect::axes(Val::Px(8.0), Val::Px(4.0)),
                                    justify_content: JustifyContent::Center,
                                    border: UiRect::all(Val::Px(1.0)),
                                    ..default()
                                },
                            ))
                            .with_children(|btn| {
                                btn.spawn((
                                    Text::new(action.label()),
                                    TextFont { font_size: 14.0, ..default() },
                                    TextColor(Color::WHITE),
                                ));
                            });
                        }

                        row.spawn((
                            StatusLabel { key: key.clone() },
                            Text::new(SlotState::Unloaded.label()),
                            TextFont { font_size: 14.0, ..default() },
                            TextColor(Color::srgb(0.8, 0.8, 0.8)),
                        ));
                    });
            }
        });
}

pub fn panel_button_interaction(
    mut q: Query<(&Interaction, &PanelButton, &mut BackgroundColor), (Changed<Interaction>, With<Button>)>,
    registry: Res<DatasetRegistry>,
    mut commands: EventWriter<DatasetCommand>,
) {
    for (interaction, button, mut bg) in &mut q {
        match *interaction {
            Interaction::Pressed => {
                *bg = BackgroundColor(BUTTON_PRESSED);
                let key = button.key.clone();
                let command = match button.action {
                    PanelAction::Load => Some(DatasetCommand::load(key, CommandSource::Panel)),
                    PanelAction::Unload => Some(DatasetCommand::unload(key, CommandSource::Panel)),
                    PanelAction::BudgetDown | PanelAction::BudgetUp => {
                        stepped_budget(&registry, &key, button.action)
                            .map(|value| DatasetCommand::set_budget(key, value, CommandSource::Panel))
                    }
                };
                if let Some(command) = command {
                    commands.write(command);
                }
            }
            Interaction::Hovered => *bg = BackgroundColor(BUTTON_HOVER),
            Interaction::None => *bg = BackgroundColor(BUTTON_IDLE),
        }
    }
}

pub fn record_panel_errors(mut events: EventReader<DatasetStatus>, mut errors: ResMut<PanelErrors>) {
    for event in events.read() {
        match event {
            DatasetStatus::LoadFailed { key, reason } => {
                errors.last_error.insert(key.clone(), reason.clone());
            }
            DatasetStatus::Loading { key } | DatasetStatus::Loaded { key, .. } => {
                errors.last_error.remove(key);
            }
            _ => {}
        }
    }
}

pub fn refresh_status_labels(
    registry: Res<DatasetRegistry>,
    errors: Res<PanelErrors>,
    mut labels: Query<(&StatusLabel, &mut Text)>,
) {
    if !registry.is_changed() && !errors.is_changed() {
        return;
    }

    for (label, mut text) in &mut labels {
        let budget = registry.get(&label.key).map(|dataset| dataset.point_budget);
        let error = errors.last_error.get(&label.key).map(String::as_str);
        let status = status_text(registry.state(&label.key), budget, error);
        if text.0 != status {
            text.0 = status;
        }
    }
}

/// Native dataset panel. The web build drives datasets from the host page instead.
pub struct ControlPanelPlugin;

impl Plugin for ControlPanelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelErrors>()
            .add_systems(Startup, spawn_dataset_panel)
            .add_systems(
                Update,
                (panel_button_interaction, record_panel_errors, refresh_status_labels),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::dataset::test_support::dataset;

    #[test]
    fn status_text_covers_each_state() {
        assert_eq!(status_text(SlotState::Unloaded, None, None), "unloaded");
        assert_eq!(status_text(SlotState::Loading, None, None), "loading");
        assert_eq!(
            status_text(SlotState::Loaded, Some(PointBudget::default()), None),
            "loaded (255000 pts)"
        );
        assert_eq!(
            status_text(SlotState::Unloaded, None, Some("boom")),
            "failed: boom"
        );
    }

    #[test]
    fn budget_buttons_step_from_current_value() {
        let mut registry = DatasetRegistry::default();
        let key = DatasetKey::new("v1");
        assert_eq!(stepped_budget(&registry, &key, PanelAction::BudgetUp), None);

        registry.set(&key, dataset("v1"));
        assert_eq!(stepped_budget(&registry, &key, PanelAction::BudgetUp), Some(265_000));
        assert_eq!(stepped_budget(&registry, &key, PanelAction::BudgetDown), Some(245_000));
        assert_eq!(stepped_budget(&registry, &key, PanelAction::Load), None);
    }

    #[test]
    fn pressing_load_sends_a_panel_command() {
        let mut app = App::new();
        app.init_resource::<DatasetRegistry>()
            .add_event::<DatasetCommand>()
            .add_systems(Update, panel_button_interaction);
        app.world_mut().spawn((
            PanelButton {
                key: "v2".into(),
                action: PanelAction::Load,
            },
            Button,
            Interaction::Pressed,
            BackgroundColor(BUTTON_IDLE),
        ));
        app.update();

        let sent: Vec<DatasetCommand> = app
            .world_mut()
            .resource_mut::<Events<DatasetCommand>>()
            .drain()
            .collect();
        assert_eq!(sent, vec![DatasetCommand::load("v2".into(), CommandSource::Panel)]);
    }

    #[test]
    fn failed_load_shows_error_until_retried() {
        let mut app = App::new();
        app.init_resource::<DatasetRegistry>()
            .init_resource::<PanelErrors>()
            .add_event::<DatasetStatus>()
            .add_systems(Update, (record_panel_errors, refresh_status_labels).chain());
        let label = app
            .world_mut()
            .spawn((StatusLabel { key: "v1".into() }, Text::new("unloaded")))
            .id();

        app.world_mut().send_event(DatasetStatus::LoadFailed {
            key: "v1".into(),
            reason: "missing cloud.js".to_string(),
        });
        app.update();
        assert_eq!(app.world().get::<Text>(label).unwrap().0, "failed: missing cloud.js");

        app.world_mut().send_event(DatasetStatus::Loading { key: "v1".into() });
        app.update();
        assert_eq!(app.world().get::<Text>(label).unwrap().0, "unloaded");
    }
}
