//! Focus-mode visibility settings.
//!
//! Each flag says whether an editor element stays visible while focus mode
//! is on. The flags travel inside the `Mode*` sync payloads.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// ToggleId
// ============================================================================

/// Identifies one editor element controlled by focus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleId {
    LineNumbers,
    Gutter,
    Minimap,
    Breadcrumbs,
    ScrollbarVertical,
    ScrollbarHorizontal,
    IndentGuides,
    BracketPairs,
    Rulers,
    ActivityBar,
    StatusBar,
    SideBar,
    Panel,
    Tabs,
    CursorBlinking,
    RenderWhitespace,
    LineHighlight,
}

impl ToggleId {
    /// Every toggle, in presentation order.
    pub const ALL: [ToggleId; 17] = [
        ToggleId::LineNumbers,
        ToggleId::Gutter,
        ToggleId::Minimap,
        ToggleId::Breadcrumbs,
        ToggleId::ScrollbarVertical,
        ToggleId::ScrollbarHorizontal,
        ToggleId::IndentGuides,
        ToggleId::BracketPairs,
        ToggleId::Rulers,
        ToggleId::ActivityBar,
        ToggleId::StatusBar,
        ToggleId::SideBar,
        ToggleId::Panel,
        ToggleId::Tabs,
        ToggleId::CursorBlinking,
        ToggleId::RenderWhitespace,
        ToggleId::LineHighlight,
    ];

    /// Returns the wire name of the toggle.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleId::LineNumbers => "lineNumbers",
            ToggleId::Gutter => "gutter",
            ToggleId::Minimap => "minimap",
            ToggleId::Breadcrumbs => "breadcrumbs",
            ToggleId::ScrollbarVertical => "scrollbarVertical",
            ToggleId::ScrollbarHorizontal => "scrollbarHorizontal",
            ToggleId::IndentGuides => "indentGuides",
            ToggleId::BracketPairs => "bracketPairs",
            ToggleId::Rulers => "rulers",
            ToggleId::ActivityBar => "activityBar",
            ToggleId::StatusBar => "statusBar",
            ToggleId::SideBar => "sideBar",
            ToggleId::Panel => "panel",
            ToggleId::Tabs => "tabs",
            ToggleId::CursorBlinking => "cursorBlinking",
            ToggleId::RenderWhitespace => "renderWhitespace",
            ToggleId::LineHighlight => "lineHighlight",
        }
    }

    /// Returns true for elements the editor shows or hides through a
    /// command rather than a setting.
    pub fn is_command(&self) -> bool {
        matches!(self, ToggleId::SideBar | ToggleId::Panel)
    }
}

impl fmt::Display for ToggleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToggleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToggleId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown toggle '{s}'"))
    }
}

// ============================================================================
// ModeSettings
// ============================================================================

/// Which elements stay visible while focus mode is enabled.
///
/// `false` hides the element; the default hides everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeSettings {
    pub line_numbers: bool,
    pub gutter: bool,
    pub minimap: bool,
    pub breadcrumbs: bool,
    pub scrollbar_vertical: bool,
    pub scrollbar_horizontal: bool,
    pub indent_guides: bool,
    pub bracket_pairs: bool,
    pub rulers: bool,
    pub activity_bar: bool,
    pub status_bar: bool,
    pub side_bar: bool,
    pub panel: bool,
    pub tabs: bool,
    pub cursor_blinking: bool,
    pub render_whitespace: bool,
    pub line_highlight: bool,
}

impl ModeSettings {
    /// Returns whether the element stays visible.
    pub fn get(&self, id: ToggleId) -> bool {
        *self.field(id)
    }

    /// Sets whether the element stays visible.
    pub fn set(&mut self, id: ToggleId, show: bool) {
        *self.field_mut(id) = show;
    }

    /// Returns a copy with one flag changed.
    pub fn with(mut self, id: ToggleId, show: bool) -> Self {
        self.set(id, show);
        self
    }

    /// Toggles that stay visible.
    pub fn visible(&self) -> Vec<ToggleId> {
        ToggleId::ALL
            .iter()
            .copied()
            .filter(|id| self.get(*id))
            .collect()
    }

    fn field(&self, id: ToggleId) -> &bool {
        match id {
            ToggleId::LineNumbers => &self.line_numbers,
            ToggleId::Gutter => &self.gutter,
            ToggleId::Minimap => &self.minimap,
            ToggleId::Breadcrumbs => &self.breadcrumbs,
            ToggleId::ScrollbarVertical => &self.scrollbar_vertical,
            ToggleId::ScrollbarHorizontal => &self.scrollbar_horizontal,
            ToggleId::IndentGuides => &self.indent_guides,
            ToggleId::BracketPairs => &self.bracket_pairs,
            ToggleId::Rulers => &self.rulers,
            ToggleId::ActivityBar => &self.activity_bar,
            ToggleId::StatusBar => &self.status_bar,
            ToggleId::SideBar => &self.side_bar,
            ToggleId::Panel => &self.panel,
            ToggleId::Tabs => &self.tabs,
            ToggleId::CursorBlinking => &self.cursor_blinking,
            ToggleId::RenderWhitespace => &self.render_whitespace,
            ToggleId::LineHighlight => &self.line_highlight,
        }
    }

    fn field_mut(&mut self, id: ToggleId) -> &mut bool {
        match id {
            ToggleId::LineNumbers => &mut self.line_numbers,
            ToggleId::Gutter => &mut self.gutter,
            ToggleId::Minimap => &mut self.minimap,
            ToggleId::Breadcrumbs => &mut self.breadcrumbs,
            ToggleId::ScrollbarVertical => &mut self.scrollbar_vertical,
            ToggleId::ScrollbarHorizontal => &mut self.scrollbar_horizontal,
            ToggleId::IndentGuides => &mut self.indent_guides,
            ToggleId::BracketPairs => &mut self.bracket_pairs,
            ToggleId::Rulers => &mut self.rulers,
            ToggleId::ActivityBar => &mut self.activity_bar,
            ToggleId::StatusBar => &mut self.status_bar,
            ToggleId::SideBar => &mut self.side_bar,
            ToggleId::Panel => &mut self.panel,
            ToggleId::Tabs => &mut self.tabs,
            ToggleId::CursorBlinking => &mut self.cursor_blinking,
            ToggleId::RenderWhitespace => &mut self.render_whitespace,
            ToggleId::LineHighlight => &mut self.line_highlight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hides_everything() {
        let settings = ModeSettings::default();
        assert!(settings.visible().is_empty());
    }

    #[test]
    fn test_get_and_set_cover_every_toggle() {
        let mut settings = ModeSettings::default();
        for id in ToggleId::ALL {
            settings.set(id, true);
            assert!(settings.get(id), "{id} should be visible");
        }
        assert_eq!(settings.visible().len(), ToggleId::ALL.len());
    }

    #[test]
    fn test_with_changes_single_flag() {
        let settings = ModeSettings::default().with(ToggleId::Minimap, true);
        assert_eq!(settings.visible(), vec![ToggleId::Minimap]);
        assert!(settings.minimap);
    }

    #[test]
    fn test_toggle_id_from_str() {
        assert_eq!("minimap".parse::<ToggleId>(), Ok(ToggleId::Minimap));
        assert_eq!("SIDEBAR".parse::<ToggleId>(), Ok(ToggleId::SideBar));
        assert!("statusbarr".parse::<ToggleId>().is_err());
    }

    #[test]
    fn test_toggle_id_wire_name_matches_field_name() {
        for id in ToggleId::ALL {
            let settings = ModeSettings::default().with(id, true);
            let json = serde_json::to_value(settings).unwrap();
            assert_eq!(json[id.as_str()], true, "wire name for {id:?}");
        }
    }

    #[test]
    fn test_partial_settings_deserialize() {
        let settings: ModeSettings = serde_json::from_str(r#"{"tabs":true}"#).unwrap();
        assert!(settings.tabs);
        assert!(!settings.minimap);
    }

    #[test]
    fn test_command_toggles() {
        assert!(ToggleId::SideBar.is_command());
        assert!(ToggleId::Panel.is_command());
        assert!(!ToggleId::Tabs.is_command());
    }
}
