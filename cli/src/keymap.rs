use panaroia::KEY_COUNT;

/// # Keymap
/// Chip-8 input is generated with a hexadecimal keypad.
///
/// This original layout is mapped to the left 4 alphanumeric columns.
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |Q|W|E|R|
/// |7|8|9|E|  ->  |A|S|D|F|
/// |A|0|B|F|      |Z|X|C|V|
/// ```
pub fn keymap(key: char) -> Option<u8> {
    match key.to_ascii_uppercase() {
        'X' => Some(0x0),
        '1' => Some(0x1),
        '2' => Some(0x2),
        '3' => Some(0x3),
        'Q' => Some(0x4),
        'W' => Some(0x5),
        'E' => Some(0x6),
        'A' => Some(0x7),
        'S' => Some(0x8),
        'D' => Some(0x9),
        'Z' => Some(0xA),
        'C' => Some(0xB),
        '4' => Some(0xC),
        'R' => Some(0xD),
        'F' => Some(0xE),
        'V' => Some(0xF),
        _ => None,
    }
}

/// Parses a `--hold` list into a key pad.
///
/// Each comma separated entry is either a single key from the layout above or a
/// keypad index written in hex with a `0x` prefix, so `w,0xA` holds keys 5 and A.
pub fn parse_held(list: &str) -> Result<[bool; KEY_COUNT], String> {
    let mut keys = [false; KEY_COUNT];
    for entry in list.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let key = match entry.strip_prefix("0x").or_else(|| entry.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16)
                .ok()
                .filter(|&key| usize::from(key) < KEY_COUNT),
            None => {
                let mut chars = entry.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => keymap(c),
                    _ => None,
                }
            }
        };
        match key {
            Some(key) => keys[usize::from(key)] = true,
            None => return Err(format!("'{}' is not a key", entry)),
        }
    }
    Ok(keys)
}
