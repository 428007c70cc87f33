use std::collections::BTreeMap;

/// Derive the frontend color palette from a base hex color: the base itself
/// plus lighter/darker shades the SPA maps onto CSS variables.
pub fn derive_palette(base_hex: &str) -> BTreeMap<String, String> {
    let (r, g, b) = parse_hex(base_hex).unwrap_or((0x1a, 0x73, 0xe8));

    let mut palette = BTreeMap::new();
    palette.insert("primary".to_string(), to_hex(r, g, b));
    palette.insert("primary-light".to_string(), to_hex(
        lighten(r, 0.85),
        lighten(g, 0.85),
        lighten(b, 0.85),
    ));
    palette.insert("primary-soft".to_string(), to_hex(
        lighten(r, 0.45),
        lighten(g, 0.45),
        lighten(b, 0.45),
    ));
    palette.insert("primary-dark".to_string(), to_hex(
        darken(r, 0.25),
        darken(g, 0.25),
        darken(b, 0.25),
    ));
    palette
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn lighten(channel: u8, amount: f32) -> u8 {
    let c = channel as f32;
    (c + (255.0 - c) * amount).round() as u8
}

fn darken(channel: u8, amount: f32) -> u8 {
    ((channel as f32) * (1.0 - amount)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_contains_base_and_shades() {
        let palette = derive_palette("#1a73e8");
        assert_eq!(palette["primary"], "#1a73e8");
        assert!(palette.contains_key("primary-light"));
        assert!(palette.contains_key("primary-dark"));
    }

    #[test]
    fn invalid_hex_falls_back_to_default() {
        let palette = derive_palette("not-a-color");
        assert_eq!(palette["primary"], "#1a73e8");
    }

    #[test]
    fn dark_shade_is_darker() {
        let palette = derive_palette("#808080");
        assert!(palette["primary-dark"].as_str() < palette["primary"].as_str());
    }
}
