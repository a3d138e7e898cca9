//! Named focus-mode presets.
//!
//! Three presets are built in; users can save their own, which persist with
//! the rest of the participant state.

use serde::{Deserialize, Serialize};

use crate::types::{ModeSettings, ToggleId};

/// A named set of focus-mode flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub settings: ModeSettings,
    #[serde(default)]
    pub is_built_in: bool,
}

impl Preset {
    fn built_in(id: &str, name: &str, visible: &[ToggleId]) -> Self {
        let settings = visible
            .iter()
            .fold(ModeSettings::default(), |s, id| s.with(*id, true));
        Self {
            id: id.to_string(),
            name: name.to_string(),
            settings,
            is_built_in: true,
        }
    }
}

/// Built-in presets: `minimal`, `writer` and `focus`.
pub fn built_in_presets() -> Vec<Preset> {
    vec![
        Preset::built_in("minimal", "Minimal", &[]),
        Preset::built_in(
            "writer",
            "Writer",
            &[
                ToggleId::ScrollbarVertical,
                ToggleId::CursorBlinking,
                ToggleId::LineHighlight,
            ],
        ),
        Preset::built_in(
            "focus",
            "Focus",
            &[
                ToggleId::LineNumbers,
                ToggleId::Gutter,
                ToggleId::ScrollbarVertical,
                ToggleId::ScrollbarHorizontal,
                ToggleId::IndentGuides,
                ToggleId::BracketPairs,
                ToggleId::StatusBar,
                ToggleId::CursorBlinking,
                ToggleId::LineHighlight,
            ],
        ),
    ]
}

/// Built-in and custom presets plus the active selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetLibrary {
    custom: Vec<Preset>,
    active_id: Option<String>,
}

impl PresetLibrary {
    pub fn new(custom: Vec<Preset>, active_id: Option<String>) -> Self {
        Self { custom, active_id }
    }

    /// Built-in presets first, then custom ones in creation order.
    pub fn all(&self) -> Vec<Preset> {
        let mut presets = built_in_presets();
        presets.extend(self.custom.iter().cloned());
        presets
    }

    pub fn custom(&self) -> &[Preset] {
        &self.custom
    }

    pub fn get(&self, id: &str) -> Option<Preset> {
        self.all().into_iter().find(|p| p.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<Preset> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn set_active(&mut self, id: Option<String>) {
        self.active_id = id;
    }

    /// Saves a custom preset with id `custom-<now_ms>`.
    pub fn save_custom(&mut self, name: &str, settings: ModeSettings, now_ms: u64) -> Preset {
        let mut stamp = now_ms;
        while self.custom.iter().any(|p| p.id == format!("custom-{stamp}")) {
            stamp += 1;
        }

        let preset = Preset {
            id: format!("custom-{stamp}"),
            name: name.to_string(),
            settings,
            is_built_in: false,
        };
        self.custom.push(preset.clone());
        preset
    }

    /// Renames and/or replaces the flags of a custom preset.
    ///
    /// Returns false if no custom preset has this id.
    pub fn update_custom(
        &mut self,
        id: &str,
        name: Option<&str>,
        settings: Option<ModeSettings>,
    ) -> bool {
        let Some(preset) = self.custom.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if let Some(name) = name {
            preset.name = name.to_string();
        }
        if let Some(settings) = settings {
            preset.settings = settings;
        }
        true
    }

    /// Deletes a custom preset, clearing the selection if it was active.
    pub fn delete_custom(&mut self, id: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|p| p.id != id);
        if self.custom.len() == before {
            return false;
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_presets() {
        let presets = built_in_presets();
        let ids: Vec<_> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["minimal", "writer", "focus"]);
        assert!(presets.iter().all(|p| p.is_built_in));
        assert!(presets[0].settings.visible().is_empty());
        assert!(presets[1].settings.line_highlight);
        assert!(!presets[1].settings.line_numbers);
        assert!(presets[2].settings.status_bar);
        assert!(!presets[2].settings.minimap);
    }

    #[test]
    fn test_save_custom_ids_are_unique() {
        let mut library = PresetLibrary::default();
        let a = library.save_custom("A", ModeSettings::default(), 1_000);
        let b = library.save_custom("B", ModeSettings::default(), 1_000);

        assert_eq!(a.id, "custom-1000");
        assert_eq!(b.id, "custom-1001");
        assert_eq!(library.all().len(), 5);
        assert!(!library.get("custom-1001").unwrap().is_built_in);
    }

    #[test]
    fn test_update_custom() {
        let mut library = PresetLibrary::default();
        let preset = library.save_custom("Draft", ModeSettings::default(), 1);
        let settings = ModeSettings::default().with(ToggleId::Tabs, true);

        assert!(library.update_custom(&preset.id, Some("Final"), Some(settings)));
        let updated = library.get(&preset.id).unwrap();
        assert_eq!(updated.name, "Final");
        assert!(updated.settings.tabs);

        assert!(!library.update_custom("writer", Some("Mine"), None));
    }

    #[test]
    fn test_delete_active_preset_clears_selection() {
        let mut library = PresetLibrary::default();
        let preset = library.save_custom("Mine", ModeSettings::default(), 1);
        library.set_active(Some(preset.id.clone()));
        assert_eq!(library.active().unwrap().name, "Mine");

        assert!(library.delete_custom(&preset.id));
        assert_eq!(library.active_id(), None);
        assert!(!library.delete_custom(&preset.id));
    }

    #[test]
    fn test_built_ins_cannot_be_deleted() {
        let mut library = PresetLibrary::default();
        library.set_active(Some("focus".to_string()));
        assert!(!library.delete_custom("focus"));
        assert_eq!(library.active_id(), Some("focus"));
    }
}
