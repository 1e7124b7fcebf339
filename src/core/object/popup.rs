//=========================================================================
// Popup Gating
//=========================================================================
//
// Which world-popup icons an object shows, as a pure function of camera
// distance and the object's capabilities.
//
//=========================================================================

//=== Capabilities ========================================================

/// What the player may do with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub inspectable: bool,
    pub interactable: bool,
    pub grabbable: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { inspectable: true, interactable: false, grabbable: false }
    }
}

//=== PopupIcons ==========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupIcons {
    pub inspect: bool,
    pub interact: bool,
    pub grab: bool,
    /// "Interact or grab" hint text.
    pub show_or_text: bool,
}

impl PopupIcons {
    pub fn any(&self) -> bool {
        self.inspect || self.interact || self.grab
    }
}

/// Computes the icons for a camera at `distance`.
///
/// Returns `None` when the camera is outside both ranges, meaning the
/// whole popup must be hidden.
pub fn popup_icons(
    distance: f32,
    caps: Capabilities,
    inspect_range: f32,
    interact_range: f32,
) -> Option<PopupIcons> {
    let in_inspect = distance <= inspect_range;
    let in_interact = distance <= interact_range;

    if !in_inspect && !in_interact {
        return None;
    }

    Some(PopupIcons {
        inspect: caps.inspectable && in_inspect,
        interact: caps.interactable && in_interact,
        grab: caps.grabbable && in_interact,
        show_or_text: caps.interactable && caps.grabbable && in_interact,
    })
}

//=== PopupState ==========================================================

/// Whether the popup is up and tracking the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupState {
    pub(crate) active: bool,
    pub(crate) hide_pending: bool,
    pub(crate) icons: PopupIcons,
}

impl PopupState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn icons(&self) -> PopupIcons {
        self.icons
    }
}

//=========================================================================
// Tests
//=========================================================================
