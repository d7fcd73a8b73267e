//! Random display colors for users and labels

use rand::Rng;

/// Generate a random `#rrggbb` color
pub fn random_hex_color() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..=0xFF_FFFF);
    format!("#{:06x}", value)
}

/// Check for a well-formed `#rrggbb` color
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_color_format() {
        for _ in 0..100 {
            let color = random_hex_color();
            assert!(is_hex_color(&color), "bad color: {}", color);
        }
    }

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#00ff7F"));
        assert!(!is_hex_color("00ff7f"));
        assert!(!is_hex_color("#00ff7"));
        assert!(!is_hex_color("#00gg7f"));
    }
}
