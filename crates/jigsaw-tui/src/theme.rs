use crossterm::style::Color;

/// Color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    /// Background color
    pub bg: Color,
    /// Default text color
    pub fg: Color,
    /// Board frame color
    pub border: Color,
    /// Tile label text
    pub tile_fg: Color,
    /// Keyboard cursor outline
    pub cursor: Color,
    /// Drop-target highlight
    pub hover_bg: Color,
    /// Lifted tile background
    pub lifted_bg: Color,
    /// Hint source and destination
    pub hint: Color,
    /// Error/time-up color
    pub error: Color,
    /// Success/win color
    pub success: Color,
    /// Timer/info text color
    pub info: Color,
    /// Key binding text color
    pub key: Color,
    /// Modal background
    pub modal_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb { r: 20, g: 22, b: 30 },
            fg: Color::Rgb { r: 230, g: 230, b: 240 },
            border: Color::Rgb { r: 130, g: 140, b: 170 },
            tile_fg: Color::Rgb { r: 15, g: 15, b: 20 },
            cursor: Color::Rgb { r: 255, g: 255, b: 255 },
            hover_bg: Color::Rgb { r: 90, g: 255, b: 130 },
            lifted_bg: Color::Rgb { r: 70, g: 90, b: 140 },
            hint: Color::Rgb { r: 255, g: 210, b: 100 },
            error: Color::Rgb { r: 255, g: 90, b: 90 },
            success: Color::Rgb { r: 90, g: 255, b: 130 },
            info: Color::Rgb { r: 160, g: 165, b: 185 },
            key: Color::Rgb { r: 255, g: 210, b: 100 },
            modal_bg: Color::Rgb { r: 30, g: 30, b: 40 },
        }
    }

    /// High contrast theme
    pub fn high_contrast() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::White,
            border: Color::White,
            tile_fg: Color::Black,
            cursor: Color::Yellow,
            hover_bg: Color::Green,
            lifted_bg: Color::Blue,
            hint: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
            info: Color::Grey,
            key: Color::Yellow,
            modal_bg: Color::Rgb { r: 30, g: 30, b: 30 },
        }
    }

    /// Fill color of a piece, a gradient over its solved position.
    ///
    /// Stands in for the image crop: neighbouring pieces get neighbouring
    /// shades, so a solved board reads as one smooth gradient.
    pub fn piece_color(piece: usize, grid_size: usize) -> Color {
        let n = grid_size.max(1);
        let (row, col) = (piece / n, piece % n);
        let span = (n - 1).max(1) as f64;
        let fx = col as f64 / span;
        let fy = row as f64 / span;
        Color::Rgb {
            r: (70.0 + 170.0 * fx) as u8,
            g: (80.0 + 150.0 * fy) as u8,
            b: (220.0 - 120.0 * (fx + fy) / 2.0) as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_color_corners() {
        assert_eq!(Theme::piece_color(0, 4), Color::Rgb { r: 70, g: 80, b: 220 });
        assert_eq!(Theme::piece_color(15, 4), Color::Rgb { r: 240, g: 230, b: 100 });
    }

    #[test]
    fn test_piece_color_neighbours_differ() {
        assert_ne!(Theme::piece_color(0, 3), Theme::piece_color(1, 3));
        assert_ne!(Theme::piece_color(0, 3), Theme::piece_color(3, 3));
    }
}
