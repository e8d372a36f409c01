//! Keyboard layouts: which virtual key types which character.
//!
//! Shortcuts are configured by character ("Command+V") but the hook sees raw
//! virtual key codes, which name physical positions. On Dvorak the key that
//! types `v` is not the ANSI `V` key, so bindings are resolved against the
//! active layout whenever monitoring starts.

use std::sync::Arc;

/// Maps characters to the virtual key that types them.
pub trait KeyLayout: Send + Sync {
    /// The key code that types `ch` with no modifiers held, if any key does.
    fn key_code(&self, ch: char) -> Option<u16>;
}

pub type KeyLayoutRef = Arc<dyn KeyLayout>;

/// US ANSI positions (kVK_ANSI_*).
const ANSI_KEYS: &[(char, u16)] = &[
    ('a', 0x00),
    ('s', 0x01),
    ('d', 0x02),
    ('f', 0x03),
    ('h', 0x04),
    ('g', 0x05),
    ('z', 0x06),
    ('x', 0x07),
    ('c', 0x08),
    ('v', 0x09),
    ('b', 0x0B),
    ('q', 0x0C),
    ('w', 0x0D),
    ('e', 0x0E),
    ('r', 0x0F),
    ('y', 0x10),
    ('t', 0x11),
    ('1', 0x12),
    ('2', 0x13),
    ('3', 0x14),
    ('4', 0x15),
    ('6', 0x16),
    ('5', 0x17),
    ('=', 0x18),
    ('9', 0x19),
    ('7', 0x1A),
    ('-', 0x1B),
    ('8', 0x1C),
    ('0', 0x1D),
    (']', 0x1E),
    ('o', 0x1F),
    ('u', 0x20),
    ('[', 0x21),
    ('i', 0x22),
    ('p', 0x23),
    ('l', 0x25),
    ('j', 0x26),
    ('\'', 0x27),
    ('k', 0x28),
    (';', 0x29),
    ('\\', 0x2A),
    (',', 0x2B),
    ('/', 0x2C),
    ('n', 0x2D),
    ('m', 0x2E),
    ('.', 0x2F),
    ('`', 0x32),
];

/// The US ANSI layout. Used off macOS and as the fallback when the active
/// layout has no key for a character.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiLayout;

impl KeyLayout for AnsiLayout {
    fn key_code(&self, ch: char) -> Option<u16> {
        ANSI_KEYS
            .iter()
            .find(|(key, _)| *key == ch)
            .map(|(_, code)| *code)
    }
}

/// A fixed character table, for tests and for layouts known ahead of time.
#[derive(Debug, Default, Clone)]
pub struct TableLayout {
    keys: Vec<(char, u16)>,
}

impl TableLayout {
    pub fn new(keys: impl IntoIterator<Item = (char, u16)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeyLayout for TableLayout {
    fn key_code(&self, ch: char) -> Option<u16> {
        self.keys
            .iter()
            .find(|(key, _)| *key == ch)
            .map(|(_, code)| *code)
    }
}

#[cfg(target_os = "macos")]
pub use system::SystemLayout;

#[cfg(target_os = "macos")]
mod system {
    use super::KeyLayout;
    use core_foundation::base::{CFRelease, CFTypeRef};
    use core_foundation::data::{CFDataGetBytePtr, CFDataRef};
    use core_foundation::string::CFStringRef;
    use std::ffi::c_void;

    type TISInputSourceRef = *mut c_void;

    #[link(name = "Carbon", kind = "framework")]
    extern "C" {
        static kTISPropertyUnicodeKeyLayoutData: CFStringRef;

        fn TISCopyCurrentASCIICapableKeyboardLayoutInputSource() -> TISInputSourceRef;
        fn TISGetInputSourceProperty(source: TISInputSourceRef, key: CFStringRef)
            -> *const c_void;
        fn LMGetKbdType() -> u8;
        #[allow(clippy::too_many_arguments)]
        fn UCKeyTranslate(
            key_layout: *const c_void,
            virtual_key_code: u16,
            key_action: u16,
            modifier_key_state: u32,
            keyboard_type: u32,
            key_translate_options: u32,
            dead_key_state: *mut u32,
            max_string_length: usize,
            actual_string_length: *mut usize,
            unicode_string: *mut u16,
        ) -> i32;
    }

    const KEY_ACTION_DISPLAY: u16 = 3;
    const TRANSLATE_NO_DEAD_KEYS: u32 = 1;
    /// Codes above this are keypad and function keys.
    const LAST_KEY_CODE: u16 = 0x7F;

    /// The user's current ASCII-capable layout, read through Text Input
    /// Sources.
    ///
    /// Text Input Sources must be queried on the main thread, so resolve
    /// bindings from the thread that starts monitoring.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemLayout;

    impl KeyLayout for SystemLayout {
        fn key_code(&self, ch: char) -> Option<u16> {
            unsafe {
                let source = TISCopyCurrentASCIICapableKeyboardLayoutInputSource();
                if source.is_null() {
                    tracing::warn!("no ASCII-capable keyboard layout");
                    return None;
                }
                let code = find_key_code(source, ch);
                CFRelease(source as CFTypeRef);
                code
            }
        }
    }

    unsafe fn find_key_code(source: TISInputSourceRef, ch: char) -> Option<u16> {
        let data = TISGetInputSourceProperty(source, kTISPropertyUnicodeKeyLayoutData) as CFDataRef;
        if data.is_null() {
            return None;
        }
        let key_layout = CFDataGetBytePtr(data) as *const c_void;
        let keyboard_type = u32::from(LMGetKbdType());

        (0..=LAST_KEY_CODE).find(|&key_code| {
            let mut dead_key_state = 0u32;
            let mut buffer = [0u16; 4];
            let mut length = 0usize;
            let status = UCKeyTranslate(
                key_layout,
                key_code,
                KEY_ACTION_DISPLAY,
                0,
                keyboard_type,
                TRANSLATE_NO_DEAD_KEYS,
                &mut dead_key_state,
                buffer.len(),
                &mut length,
                buffer.as_mut_ptr(),
            );
            status == 0
                && length == 1
                && char::from_u32(u32::from(buffer[0])).map(|c| c.to_ascii_lowercase()) == Some(ch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{KEY_CODE_C, KEY_CODE_V};

    #[test]
    fn test_ansi_letters() {
        assert_eq!(AnsiLayout.key_code('v'), Some(KEY_CODE_V));
        assert_eq!(AnsiLayout.key_code('c'), Some(KEY_CODE_C));
        assert_eq!(AnsiLayout.key_code('k'), Some(0x28));
        assert_eq!(AnsiLayout.key_code('é'), None);
    }

    #[test]
    fn test_ansi_table_has_no_duplicates() {
        for (i, (ch, code)) in ANSI_KEYS.iter().enumerate() {
            assert!(
                ANSI_KEYS[i + 1..].iter().all(|(c, k)| c != ch && k != code),
                "duplicate entry for {ch:?}"
            );
        }
    }

    #[test]
    fn test_table_layout() {
        let layout = TableLayout::new([('v', 0x2F), ('k', 0x09)]);
        assert_eq!(layout.key_code('v'), Some(0x2F));
        assert_eq!(layout.key_code('k'), Some(0x09));
        assert_eq!(layout.key_code('c'), None);
    }
}
