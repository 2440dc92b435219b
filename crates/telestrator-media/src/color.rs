/// An 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    /// Parse a CSS color as produced by swatches and color pickers:
    /// `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or a basic keyword.
    pub fn parse(input: &str) -> Option<Rgba> {
        let s = input.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(args) = s.strip_prefix("rgba(").or_else(|| s.strip_prefix("rgb(")) {
            return parse_functional(args.strip_suffix(')')?);
        }
        named(&s)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    match digits.as_slice() {
        [r, g, b] => Some(Rgba([r * 17, g * 17, b * 17, 255])),
        [r1, r2, g1, g2, b1, b2] => Some(Rgba([r1 << 4 | r2, g1 << 4 | g2, b1 << 4 | b2, 255])),
        _ => None,
    }
}

fn parse_functional(args: &str) -> Option<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    match parts.as_slice() {
        [r, g, b] => Some(Rgba([channel(r)?, channel(g)?, channel(b)?, 255])),
        [r, g, b, a] => {
            let alpha = a.parse::<f64>().ok()?.clamp(0.0, 1.0);
            Some(Rgba([
                channel(r)?,
                channel(g)?,
                channel(b)?,
                (alpha * 255.0).round() as u8,
            ]))
        }
        _ => None,
    }
}

fn named(name: &str) -> Option<Rgba> {
    let rgb = match name {
        "transparent" => return Some(Rgba::TRANSPARENT),
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "lime" => [0, 255, 0],
        "green" => [0, 128, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "magenta" | "fuchsia" => [255, 0, 255],
        "cyan" | "aqua" => [0, 255, 255],
        "gray" | "grey" => [128, 128, 128],
        "pink" => [255, 192, 203],
        _ => return None,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_swatch_formats() {
        assert_eq!(Rgba::parse("red"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(Rgba::parse("#0f0"), Some(Rgba([0, 255, 0, 255])));
        assert_eq!(Rgba::parse("#1E90FF"), Some(Rgba([30, 144, 255, 255])));
        assert_eq!(Rgba::parse("rgb(255, 255, 0)"), Some(Rgba([255, 255, 0, 255])));
        assert_eq!(Rgba::parse("rgba(0, 0, 0, 0.5)"), Some(Rgba([0, 0, 0, 128])));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Rgba::parse("not-a-color"), None);
        assert_eq!(Rgba::parse("#12345"), None);
        assert_eq!(Rgba::parse("rgb(1,2)"), None);
    }
}
