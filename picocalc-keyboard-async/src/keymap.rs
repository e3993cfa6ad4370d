//! Scancode to logical key mapping, matching keyboard firmware v1.2.
//!
//! The firmware resolves modifiers and CapsLock on the microcontroller
//! and emits ASCII-like codes for shifted symbols, so a shifted symbol
//! code aliases the same logical key as its unshifted sibling (`'+'` and
//! `'='` are both [`KeyCode::Equal`]). Lower-case letters, digits and
//! `'='` are never emitted by the current firmware; their slots keep the
//! full key set announced anyway in case a later firmware starts using
//! them.

/// Host-side logical key identifier, the result of a scancode lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    Space,
    Backspace,
    Enter,
    Tab,
    Esc,
    Delete,
    End,
    Home,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,
    CapsLock,
    Pause,
    Minus,
    Equal,
    Backslash,
    Grave,
    Apostrophe,
    Semicolon,
    Comma,
    Dot,
    Slash,
    LeftBrace,
    RightBrace,
    LeftAlt,
    LeftShift,
    RightShift,
    LeftCtrl,
}

/// Result of looking a scancode up in the table.
///
/// `Ignored` and `Unknown` are distinct on purpose: an `Ignored` code is
/// one the firmware never emits and is dropped silently, an `Unknown`
/// code is one the firmware does emit without any host mapping and is
/// worth a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMapping {
    Ignored,
    Unknown,
    Code(KeyCode),
}

/// Looks up the logical key for a raw scancode.
pub fn lookup(scancode: u8) -> KeyMapping {
    KEYMAP[scancode as usize]
}

static KEYMAP: [KeyMapping; 256] = build_keymap();

const fn build_keymap() -> [KeyMapping; 256] {
    use KeyCode::*;

    let mut map = [KeyMapping::Ignored; 256];

    let letters = [
        A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    ];
    let mut i = 0;
    while i < letters.len() {
        map[b'a' as usize + i] = KeyMapping::Code(letters[i]);
        map[b'A' as usize + i] = KeyMapping::Code(letters[i]);
        i += 1;
    }

    let digits = [Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9];
    // The symbols Shift produces on the digit row, in digit order.
    let shifted_digits = *b")!@#$%^&*(";
    let mut i = 0;
    while i < digits.len() {
        map[b'0' as usize + i] = KeyMapping::Code(digits[i]);
        map[shifted_digits[i] as usize] = KeyMapping::Code(digits[i]);
        i += 1;
    }

    // F1-F9 are contiguous, F10 is not.
    let fkeys = [F1, F2, F3, F4, F5, F6, F7, F8, F9];
    let mut i = 0;
    while i < fkeys.len() {
        map[0x81 + i] = KeyMapping::Code(fkeys[i]);
        i += 1;
    }
    map[0x90] = KeyMapping::Code(F10);

    // Modifiers, reported by the firmware as ordinary keys. 0xA4 sits in
    // the modifier range and is emitted by some firmware builds but has
    // no host mapping.
    map[0xA1] = KeyMapping::Code(LeftAlt);
    map[0xA2] = KeyMapping::Code(LeftShift);
    map[0xA3] = KeyMapping::Code(RightShift);
    map[0xA4] = KeyMapping::Unknown;
    map[0xA5] = KeyMapping::Code(LeftCtrl);

    map[b' ' as usize] = KeyMapping::Code(Space);
    map[0x08] = KeyMapping::Code(Backspace);
    map[b'\n' as usize] = KeyMapping::Code(Enter);
    map[0x09] = KeyMapping::Code(Tab);
    map[0xB1] = KeyMapping::Code(Esc);

    map[0xB4] = KeyMapping::Code(Left);
    map[0xB5] = KeyMapping::Code(Up);
    map[0xB6] = KeyMapping::Code(Down);
    map[0xB7] = KeyMapping::Code(Right);

    map[0xC1] = KeyMapping::Code(CapsLock);
    map[0xD0] = KeyMapping::Code(Pause);
    // Shift+Enter is reported as 0xD1 (the firmware's Insert).
    map[0xD1] = KeyMapping::Code(Enter);
    map[0xD2] = KeyMapping::Code(Home);
    map[0xD4] = KeyMapping::Code(Delete);
    map[0xD5] = KeyMapping::Code(End);
    map[0xD6] = KeyMapping::Code(PageUp);
    map[0xD7] = KeyMapping::Code(PageDown);

    // Shifted symbol codes alias their unshifted key.
    map[b'=' as usize] = KeyMapping::Code(Equal);
    map[b'+' as usize] = KeyMapping::Code(Equal);
    map[b'-' as usize] = KeyMapping::Code(Minus);
    map[b'_' as usize] = KeyMapping::Code(Minus);
    map[b'\\' as usize] = KeyMapping::Code(Backslash);
    map[b'|' as usize] = KeyMapping::Code(Backslash);
    map[b'.' as usize] = KeyMapping::Code(Dot);
    map[b'>' as usize] = KeyMapping::Code(Dot);
    map[b';' as usize] = KeyMapping::Code(Semicolon);
    map[b':' as usize] = KeyMapping::Code(Semicolon);
    map[b',' as usize] = KeyMapping::Code(Comma);
    map[b'<' as usize] = KeyMapping::Code(Comma);
    map[b'`' as usize] = KeyMapping::Code(Grave);
    map[b'~' as usize] = KeyMapping::Code(Grave);
    map[b'\'' as usize] = KeyMapping::Code(Apostrophe);
    map[b'"' as usize] = KeyMapping::Code(Apostrophe);
    map[b'/' as usize] = KeyMapping::Code(Slash);
    map[b'?' as usize] = KeyMapping::Code(Slash);
    map[b']' as usize] = KeyMapping::Code(RightBrace);
    map[b'}' as usize] = KeyMapping::Code(RightBrace);
    map[b'[' as usize] = KeyMapping::Code(LeftBrace);
    map[b'{' as usize] = KeyMapping::Code(LeftBrace);

    map
}
