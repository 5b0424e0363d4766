#![forbid(unsafe_code)]

//! Interactive-element detection for the tap-navigation guard.
//!
//! The host describes the element under a press as an [`ElementTarget`]: an
//! opaque handle plus a short path of [`ElementInfo`] records, the target
//! itself first and then its ancestors. [`is_interactive`] is a pure function
//! of that path.
//!
//! An element is interactive when the target or any of its nearest
//! [`INTERACTIVE_ANCESTOR_DEPTH`] ancestors is an anchor, a button, a form
//! control, content-editable, has a pointer cursor, or has a button-like ARIA
//! role.

use bitflags::bitflags;

/// How many ancestors above the target are inspected.
pub const INTERACTIVE_ANCESTOR_DEPTH: usize = 5;

bitflags! {
    /// Computed traits of a single element.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementFlags: u8 {
        /// Computed `cursor: pointer`.
        const POINTER_CURSOR   = 0b0000_0001;
        /// `role` is one of the button-like ARIA roles.
        const BUTTON_ROLE      = 0b0000_0010;
        /// `contenteditable` is set.
        const CONTENT_EDITABLE = 0b0000_0100;
    }
}

/// Element tag categories that matter to the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementTag {
    Anchor,
    Button,
    Input,
    Select,
    TextArea,
    Label,
    Summary,
    #[default]
    Other,
}

impl ElementTag {
    /// Map a DOM `tagName` (any case) to a category.
    #[must_use]
    pub fn from_tag_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "a" => Self::Anchor,
            "button" => Self::Button,
            "input" => Self::Input,
            "select" => Self::Select,
            "textarea" => Self::TextArea,
            "label" => Self::Label,
            "summary" => Self::Summary,
            _ => Self::Other,
        }
    }

    /// Tags that are interactive regardless of styling.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// ARIA roles treated like buttons.
#[must_use]
pub fn is_button_like_role(role: &str) -> bool {
    matches!(
        role.trim().to_ascii_lowercase().as_str(),
        "button" | "link" | "menuitem" | "tab" | "checkbox" | "radio" | "switch" | "option"
    )
}

/// One element on the path from the press target upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementInfo {
    pub tag: ElementTag,
    pub flags: ElementFlags,
}

impl ElementInfo {
    /// Plain element with no interactive traits.
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            tag: ElementTag::Other,
            flags: ElementFlags::empty(),
        }
    }

    /// Element with the given tag and no flags.
    #[must_use]
    pub const fn tagged(tag: ElementTag) -> Self {
        Self {
            tag,
            flags: ElementFlags::empty(),
        }
    }

    /// Builder: add flags.
    #[must_use]
    pub fn with_flags(mut self, flags: ElementFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Whether this single element is interactive.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.tag.is_interactive() || !self.flags.is_empty()
    }
}

/// The element under a press, as described by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementTarget {
    /// Opaque host-side handle (e.g. an index into a JS-side registry).
    pub handle: u64,
    /// Target first, then ancestors nearest-first.
    pub path: Vec<ElementInfo>,
}

impl ElementTarget {
    /// Create a target from its path.
    #[must_use]
    pub fn new(handle: u64, path: Vec<ElementInfo>) -> Self {
        Self { handle, path }
    }
}

/// Whether a tap on `target` must pass through to the page untouched.
#[must_use]
pub fn is_interactive(target: &ElementTarget) -> bool {
    target
        .path
        .iter()
        .take(1 + INTERACTIVE_ANCESTOR_DEPTH)
        .any(ElementInfo::is_interactive)
}
