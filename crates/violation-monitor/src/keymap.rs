//! Suspicious keyboard shortcut deny-list

use page_monitor::KeyCombo;

/// Match a key press against the deny-list.
///
/// Returns the human-readable label of the blocked combination, or `None`
/// when the press is allowed. Blocked:
/// - copy / paste / cut / select-all / find accelerators (Ctrl or Cmd)
/// - view-source (Ctrl/Cmd+U)
/// - developer-tools toggles (F12, Ctrl/Cmd+Shift+I/J/C)
/// - fullscreen toggle (F11)
pub fn blocked_combo(combo: &KeyCombo) -> Option<String> {
    let key = combo.key_lower();
    let accel = combo.ctrl || combo.meta;

    let blocked = if accel && combo.shift {
        matches!(key.as_str(), "i" | "j" | "c")
    } else if accel && !combo.alt {
        matches!(key.as_str(), "c" | "v" | "x" | "a" | "f" | "u")
    } else {
        !combo.ctrl
            && !combo.alt
            && !combo.shift
            && !combo.meta
            && matches!(key.as_str(), "f11" | "f12")
    };

    blocked.then(|| combo.label())
}
