use bevy::prelude::*;

use crate::engine::assets::catalog::{DatasetCatalog, DatasetKey};

/// Requested change to one dataset slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetAction {
    Load { key: DatasetKey },
    Unload { key: DatasetKey },
    SetBudget { key: DatasetKey, value: i64 },
}

impl DatasetAction {
    pub fn key(&self) -> &DatasetKey {
        match self {
            Self::Load { key } | Self::Unload { key } | Self::SetBudget { key, .. } => key,
        }
    }
}

/// Where a command came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Keyboard,
    Panel,
    Rpc,
}

/// Event fired by keyboard shortcuts, the control panel or RPC.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct DatasetCommand {
    pub action: DatasetAction,
    pub source: CommandSource,
}

impl DatasetCommand {
    pub fn load(key: DatasetKey, source: CommandSource) -> Self {
        Self {
            action: DatasetAction::Load { key },
            source,
        }
    }

    pub fn unload(key: DatasetKey, source: CommandSource) -> Self {
        Self {
            action: DatasetAction::Unload { key },
            source,
        }
    }

    pub fn set_budget(key: DatasetKey, value: i64, source: CommandSource) -> Self {
        Self {
            action: DatasetAction::SetBudget { key, value },
            source,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
const SLOT_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Number keys load the n-th catalog entry, Shift + number unloads it (native builds only).
#[cfg(not(target_arch = "wasm32"))]
pub fn handle_dataset_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    catalog: Res<DatasetCatalog>,
    mut commands: EventWriter<DatasetCommand>,
) {
    let unload = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);

    for (index, code) in SLOT_KEYS.iter().enumerate() {
        if !keyboard.just_pressed(*code) {
            continue;
        }
        let Some(key) = catalog.key_at(index) else {
            continue;
        };
        let key = key.clone();
        commands.write(if unload {
            DatasetCommand::unload(key, CommandSource::Keyboard)
        } else {
            DatasetCommand::load(key, CommandSource::Keyboard)
        });
    }
}

/// Placeholder system for WASM builds where keyboard shortcuts are disabled.
#[cfg(target_arch = "wasm32")]
pub fn handle_dataset_keyboard_shortcuts() {
    // Datasets are driven over RPC on the web.
}

pub struct DatasetControlsPlugin;

impl Plugin for DatasetControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DatasetCommand>()
            .add_systems(PreUpdate, handle_dataset_keyboard_shortcuts);
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.insert_resource(DatasetCatalog::builtin())
            .init_resource::<ButtonInput<KeyCode>>()
            .add_event::<DatasetCommand>()
            .add_systems(Update, handle_dataset_keyboard_shortcuts);
        app
    }

    fn drain(app: &mut App) -> Vec<DatasetCommand> {
        app.world_mut()
            .resource_mut::<Events<DatasetCommand>>()
            .drain()
            .collect()
    }

    #[test]
    fn number_key_loads_catalog_slot() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Digit2);
        app.update();

        assert_eq!(
            drain(&mut app),
            vec![DatasetCommand::load("v2".into(), CommandSource::Keyboard)]
        );
    }

    #[test]
    fn shift_number_unloads() {
        let mut app = app();
        {
            let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
            keyboard.press(KeyCode::ShiftLeft);
            keyboard.press(KeyCode::Digit1);
        }
        app.update();

        assert_eq!(
            drain(&mut app),
            vec![DatasetCommand::unload("v1".into(), CommandSource::Keyboard)]
        );
    }

    #[test]
    fn every_action_names_its_slot() {
        let commands = [
            DatasetCommand::load("v1".into(), CommandSource::Panel),
            DatasetCommand::unload("v1".into(), CommandSource::Keyboard),
            DatasetCommand::set_budget("v1".into(), 90_000, CommandSource::Rpc),
        ];
        for command in &commands {
            assert_eq!(command.action.key().as_str(), "v1");
        }
        assert_eq!(
            commands[2].action,
            DatasetAction::SetBudget {
                key: "v1".into(),
                value: 90_000
            }
        );
    }

    #[test]
    fn keys_past_the_catalog_are_ignored() {
        let mut app = app();
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Digit7);
        app.update();

        assert!(drain(&mut app).is_empty());
    }
}
