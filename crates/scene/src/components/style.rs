/// Linear RGBA color.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);
    pub const YELLOW: Color = Color([1.0, 1.0, 0.0, 1.0]);
    pub const BLUE: Color = Color([0.0, 0.0, 1.0, 1.0]);
    pub const RED: Color = Color([1.0, 0.0, 0.0, 1.0]);
    pub const CYAN: Color = Color([0.0, 1.0, 1.0, 1.0]);
    pub const GREEN: Color = Color([0.0, 0.5, 0.0, 1.0]);
    pub const ORANGE: Color = Color([1.0, 0.647, 0.0, 1.0]);

    pub const fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Color([r, g, b, alpha])
    }
}

/// Render style of a single entity.
///
/// `size` is the pixel size for points and the stroke width for lines and
/// polygon outlines.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Style {
    pub color: Color,
    pub size: f32,
    pub outline_color: Color,
    pub outline_width: f32,
    pub clamp_to_ground: bool,
}

impl Style {
    pub const fn new(color: Color, size: f32) -> Self {
        Self {
            color,
            size,
            outline_color: Color::WHITE,
            outline_width: 0.0,
            clamp_to_ground: false,
        }
    }

    pub const fn outlined(mut self, color: Color, width: f32) -> Self {
        self.outline_color = color;
        self.outline_width = width;
        self
    }

    pub const fn clamped(mut self) -> Self {
        self.clamp_to_ground = true;
        self
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::new(Color::WHITE, 1.0)
    }
}
