//! Color themes for quill.
//!
//! Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions without truecolor support.
//! - `catppuccin-mocha` uses the Catppuccin Mocha palette in RGB and needs a
//!   truecolor terminal.

use ratatui::style::Color;

use quill_core::detector::RateBand;

/// All color values used across quill's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Editor
    pub text: Color,
    /// Placeholder and secondary text.
    pub muted: Color,
    pub selection_bg: Color,
    pub cursor_bg: Color,

    // Copilot transcript
    pub chat_user: Color,
    pub chat_assistant: Color,
    pub chat_card: Color,
    pub chat_quote: Color,

    // AI rate badge
    pub rate_low: Color,
    pub rate_medium: Color,
    pub rate_high: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_mode_prompt: Color,
    pub status_streaming: Color,
    pub status_error: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            text: Color::Reset,
            muted: Color::DarkGray,
            selection_bg: Color::Blue,
            cursor_bg: Color::Gray,

            chat_user: Color::Cyan,
            chat_assistant: Color::Reset,
            chat_card: Color::Magenta,
            chat_quote: Color::DarkGray,

            rate_low: Color::Green,
            rate_medium: Color::Yellow,
            rate_high: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_mode_prompt: Color::Magenta,
            status_streaming: Color::Yellow,
            status_error: Color::Red,
        }
    }

    /// Catppuccin Mocha palette, <https://github.com/catppuccin/catppuccin>.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let surface2 = Color::Rgb(88, 91, 112); // #585b70
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            text,
            muted: overlay1,
            selection_bg: surface2,
            cursor_bg: lavender,

            chat_user: blue,
            chat_assistant: text,
            chat_card: mauve,
            chat_quote: overlay1,

            rate_low: green,
            rate_medium: yellow,
            rate_high: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_mode_prompt: mauve,
            status_streaming: peach,
            status_error: red,
        }
    }

    /// Resolves a theme name from config. Unknown names fall back to `dark`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn rate_color(&self, band: RateBand) -> Color {
        match band {
            RateBand::Low => self.rate_low,
            RateBand::Medium => self.rate_medium,
            RateBand::High => self.rate_high,
        }
    }
}
