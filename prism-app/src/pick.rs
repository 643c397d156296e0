//! Pointer input on the 3D view: click-to-pick and the rectangle gesture.

use crate::view::DepthBuffer;
use glam::{Vec2, Vec3};
use prism_data::{FAR_PLANE_DEPTH, ViewCamera};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    ButtonDown,
    ButtonUp,
    Drag,
    Move,
    Wheel,
}

/// A pointer event in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Vec2,
    /// Button that changed state, or the held button for drags.
    pub button: Option<PointerButton>,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            button: None,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Ctrl + primary button press at `position`: the pick gesture.
    pub fn pick_click(position: Vec2) -> Self {
        Self::new(PointerEventKind::ButtonDown, position)
            .with_button(PointerButton::Primary)
            .with_modifiers(Modifiers {
                ctrl: true,
                ..Default::default()
            })
    }

    pub(crate) fn is_primary_down(&self) -> bool {
        self.kind == PointerEventKind::ButtonDown && self.button == Some(PointerButton::Primary)
    }
}

/// Whether the handler consumed an event. Ignored events go to the view's own
/// navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Handled,
    Ignored,
}

/// Gesture state of the pointer handler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// A rectangle is being dragged out from `anchor` (viewport coordinates).
    Drawing { anchor: Vec2 },
}

/// Geometry for the rectangle gesture. All coordinates are viewport-local.
///
/// Installed tools receive Shift + primary drags on the 3D view.
pub trait RectangleTool {
    fn begin(&mut self, anchor: Vec2);
    fn update(&mut self, anchor: Vec2, current: Vec2);
    fn finish(&mut self, anchor: Vec2, end: Vec2);
}

/// What a pick found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickHit {
    World(Vec3),
    NoHit,
}

/// Result of one click on the 3D view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub pixel: (u32, u32),
    pub depth: f32,
    pub hit: PickHit,
}

impl fmt::Display for PickResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hit {
            PickHit::World(p) => write!(f, "Mouse Coord: ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z),
            PickHit::NoHit => write!(f, "Mouse Coord: Clicked on nothing"),
        }
    }
}

/// Sample the depth buffer at `(x, y)` and unproject through `camera`.
///
/// Pixels outside the buffer read as the far plane; a far-plane depth means
/// nothing was hit.
pub fn resolve_pick(
    depth: &DepthBuffer,
    (x, y): (u32, u32),
    camera: &ViewCamera,
    (width, height): (u32, u32),
) -> PickResult {
    let sampled = if x < depth.width() && y < depth.height() {
        depth.get_pixel(x, y).0[0]
    } else {
        FAR_PLANE_DEPTH
    };

    let hit = if sampled == FAR_PLANE_DEPTH {
        PickHit::NoHit
    } else {
        PickHit::World(camera.unproject(x as f32, y as f32, sampled, width, height))
    };

    PickResult {
        pixel: (x, y),
        depth: sampled,
        hit,
    }
}
