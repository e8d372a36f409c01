//! Keystroke classification.
//!
//! Pure domain logic: given a key-down event and the manager's current
//! state, decide whether the event is swallowed and which follow-up, if any,
//! it triggers. No I/O, no OS hook required.
//!
//! Shortcuts are written by character and resolved to virtual key codes
//! against a [`KeyLayout`] before the hook is armed.

use crate::layout::{AnsiLayout, KeyLayout};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Virtual key code of `C` on the ANSI layout (kVK_ANSI_C).
pub const KEY_CODE_C: u16 = 0x08;

/// Virtual key code of `V` on the ANSI layout (kVK_ANSI_V).
pub const KEY_CODE_V: u16 = 0x09;

/// Virtual key code of Delete (kVK_Delete). Layout independent.
pub const KEY_CODE_DELETE: u16 = 0x33;

const NAMED_KEYS: &[(&str, u16)] = &[
    ("delete", KEY_CODE_DELETE),
    ("backspace", KEY_CODE_DELETE),
    ("return", 0x24),
    ("enter", 0x24),
    ("tab", 0x30),
    ("space", 0x31),
    ("escape", 0x35),
    ("esc", 0x35),
];

/// Modifier keys held during a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub command: bool,
    pub control: bool,
    pub option: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        command: false,
        control: false,
        option: false,
        shift: false,
    };

    pub const COMMAND: Modifiers = Modifiers {
        command: true,
        ..Modifiers::NONE
    };

    pub const OPTION_SHIFT: Modifiers = Modifiers {
        option: true,
        shift: true,
        ..Modifiers::NONE
    };

    /// Whether every modifier in `required` is held.
    pub fn contains(self, required: Modifiers) -> bool {
        (!required.command || self.command)
            && (!required.control || self.control)
            && (!required.option || self.option)
            && (!required.shift || self.shift)
    }

    pub fn is_empty(self) -> bool {
        self == Modifiers::NONE
    }
}

/// A key-down event as seen by the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key_code: u16, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            modifiers,
        }
    }
}

/// A key plus the modifiers that must be held with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub key_code: u16,
    pub modifiers: Modifiers,
}

impl Chord {
    /// Extra modifiers on the event do not prevent a match, so
    /// Command+Shift+V still counts as a paste.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key_code == self.key_code && event.modifiers.contains(self.modifiers)
    }

    /// Exact modifier match, used for queue commands.
    pub fn matches_exactly(&self, event: &KeyEvent) -> bool {
        event.key_code == self.key_code && event.modifiers == self.modifiers
    }
}

/// The key half of a shortcut: a character typed by the active layout, or a
/// fixed virtual key for keys that type nothing (Delete, Return).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Code(u16),
}

impl Key {
    fn resolve(self, layout: &dyn KeyLayout) -> Option<u16> {
        match self {
            Key::Code(code) => Some(code),
            Key::Char(ch) => layout.key_code(ch).or_else(|| {
                let fallback = AnsiLayout.key_code(ch);
                tracing::warn!(key = %ch, ?fallback, "active layout has no key, using ANSI position");
                fallback
            }),
        }
    }
}

/// A configured shortcut such as `cmd+v` or `opt+shift+delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Shortcut {
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn resolve(&self, layout: &dyn KeyLayout) -> Option<Chord> {
        Some(Chord {
            key_code: self.key.resolve(layout)?,
            modifiers: self.modifiers,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    Empty,

    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("shortcut '{0}' needs at least one modifier")]
    NoModifier(String),
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut parts: Vec<&str> = lowered.split('+').map(str::trim).collect();
        let key_name = parts.pop().filter(|k| !k.is_empty()).ok_or(ShortcutError::Empty)?;

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match part {
                "cmd" | "command" => modifiers.command = true,
                "ctrl" | "control" => modifiers.control = true,
                "opt" | "option" | "alt" => modifiers.option = true,
                "shift" => modifiers.shift = true,
                other => return Err(ShortcutError::UnknownModifier(other.to_string())),
            }
        }
        if modifiers.is_empty() {
            return Err(ShortcutError::NoModifier(s.trim().to_string()));
        }

        let mut chars = key_name.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(ch), None) if !ch.is_whitespace() => Key::Char(ch),
            _ => NAMED_KEYS
                .iter()
                .find(|(name, _)| *name == key_name)
                .map(|(_, code)| Key::Code(*code))
                .ok_or_else(|| ShortcutError::UnknownKey(key_name.to_string()))?,
        };

        Ok(Shortcut::new(key, modifiers))
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [
            (m.control, "ctrl"),
            (m.option, "opt"),
            (m.shift, "shift"),
            (m.command, "cmd"),
        ] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        match self.key {
            Key::Char(ch) => write!(f, "{ch}"),
            Key::Code(code) => match NAMED_KEYS.iter().find(|(_, c)| *c == code) {
                Some((name, _)) => f.write_str(name),
                None => write!(f, "0x{code:02X}"),
            },
        }
    }
}

/// Queue actions bound to their own shortcuts while the hook is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueCommand {
    Clear,
    PasteAll,
    ToggleSplit,
    TogglePasteOrder,
}

impl QueueCommand {
    pub const ALL: [QueueCommand; 4] = [
        QueueCommand::Clear,
        QueueCommand::PasteAll,
        QueueCommand::ToggleSplit,
        QueueCommand::TogglePasteOrder,
    ];
}

/// The shortcuts the manager reacts to, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub paste: Shortcut,
    pub copy: Shortcut,
    pub clear_queue: Option<Shortcut>,
    pub paste_all: Option<Shortcut>,
    pub toggle_split: Option<Shortcut>,
    pub toggle_paste_order: Option<Shortcut>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            paste: Shortcut::new(Key::Char('v'), Modifiers::COMMAND),
            copy: Shortcut::new(Key::Char('c'), Modifiers::COMMAND),
            clear_queue: Some(Shortcut::new(
                Key::Code(KEY_CODE_DELETE),
                Modifiers::OPTION_SHIFT,
            )),
            paste_all: None,
            toggle_split: None,
            toggle_paste_order: None,
        }
    }
}

impl KeyBindings {
    pub fn command_shortcut(&self, command: QueueCommand) -> Option<Shortcut> {
        match command {
            QueueCommand::Clear => self.clear_queue,
            QueueCommand::PasteAll => self.paste_all,
            QueueCommand::ToggleSplit => self.toggle_split,
            QueueCommand::TogglePasteOrder => self.toggle_paste_order,
        }
    }

    /// Turn characters into key codes for `layout`.
    pub fn resolve(&self, layout: &dyn KeyLayout) -> ResolvedBindings {
        let commands = QueueCommand::ALL
            .into_iter()
            .filter_map(|command| {
                let chord = self.command_shortcut(command)?.resolve(layout)?;
                Some((command, chord))
            })
            .collect();

        ResolvedBindings {
            paste: self.paste.resolve(layout),
            copy: self.copy.resolve(layout),
            commands,
        }
    }
}

/// Bindings expressed as key codes for one keyboard layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBindings {
    pub paste: Option<Chord>,
    pub copy: Option<Chord>,
    pub commands: Vec<(QueueCommand, Chord)>,
}

impl Default for ResolvedBindings {
    fn default() -> Self {
        KeyBindings::default().resolve(&AnsiLayout)
    }
}

impl ResolvedBindings {
    pub fn gesture_for(&self, event: &KeyEvent) -> Gesture {
        if let Some((command, _)) = self
            .commands
            .iter()
            .find(|(_, chord)| chord.matches_exactly(event))
        {
            return Gesture::Command(*command);
        }

        if self.paste.is_some_and(|chord| chord.matches(event)) {
            Gesture::Paste
        } else if self.copy.is_some_and(|chord| chord.matches(event)) {
            Gesture::Copy
        } else {
            Gesture::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Paste,
    Copy,
    Command(QueueCommand),
    Other,
}

/// Manager state consulted by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HookState {
    /// The next matching paste is our own synthetic one.
    pub pending_echo: bool,
    /// flowclip's own window holds input focus.
    pub own_app_active: bool,
}

/// What the hook returns to the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    PassThrough,
    Swallow,
}

/// Outcome of classifying one key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not ours; deliver untouched.
    PassThrough,
    /// Our own synthetic paste coming back: clear the guard and deliver.
    EchoPassThrough,
    /// A real paste: swallow it and paste the next queued item instead.
    InterceptPaste { yield_focus: bool },
    /// A copy aimed at our own window: swallow it, hand focus back and
    /// re-send the copy to the previous application.
    RetargetCopy,
    /// A queue shortcut: swallow it and run the command.
    RunCommand(QueueCommand),
}

impl Decision {
    pub fn verdict(&self) -> Verdict {
        match self {
            Decision::PassThrough | Decision::EchoPassThrough => Verdict::PassThrough,
            Decision::InterceptPaste { .. } | Decision::RetargetCopy | Decision::RunCommand(_) => {
                Verdict::Swallow
            }
        }
    }
}

/// Classify a gesture against the current state.
pub fn classify(gesture: Gesture, state: HookState) -> Decision {
    match gesture {
        Gesture::Paste if state.pending_echo => Decision::EchoPassThrough,
        Gesture::Paste => Decision::InterceptPaste {
            yield_focus: state.own_app_active,
        },
        Gesture::Copy if state.own_app_active => Decision::RetargetCopy,
        Gesture::Command(command) => Decision::RunCommand(command),
        Gesture::Copy | Gesture::Other => Decision::PassThrough,
    }
}
