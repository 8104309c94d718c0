//! Named display themes.
//!
//! Maps the theme name from the config file (or `--theme`) to a color
//! scheme for the interactive session. Unknown names fall back to
//! "monokai" rather than failing, so a stale config never blocks a
//! session.

use nu_ansi_term::{Color, Style};

/// Colors used by the interactive session screen.
#[derive(Debug, Clone, Copy)]
pub struct ColorScheme {
    /// The `>` prompt marker
    pub prompt: Style,
    /// The query text being edited
    pub input: Style,
    /// Suggestion list entries
    pub suggestion: Style,
    /// Evaluation error messages
    pub error: Style,
    /// Status bar and hints
    pub hint: Style,
}

/// Default theme name applied when nothing is configured.
pub const DEFAULT_THEME: &str = "monokai";

/// Resolve a theme name to its color scheme.
pub fn scheme_for(name: Option<&str>) -> ColorScheme {
    match name.unwrap_or(DEFAULT_THEME) {
        "dracula" => scheme(Color::Rgb(189, 147, 249), Color::Rgb(80, 250, 123)),
        "nord" => scheme(Color::Rgb(136, 192, 208), Color::Rgb(163, 190, 140)),
        "gruvbox" => scheme(Color::Rgb(250, 189, 47), Color::Rgb(184, 187, 38)),
        "solarized-dark" | "solarized-light" => {
            scheme(Color::Rgb(38, 139, 210), Color::Rgb(133, 153, 0))
        }
        "one-dark" | "atom-one-dark" => scheme(Color::Rgb(97, 175, 239), Color::Rgb(152, 195, 121)),
        "catppuccin-mocha" | "catppuccin-latte" => {
            scheme(Color::Rgb(203, 166, 247), Color::Rgb(166, 227, 161))
        }
        "rose-pine" | "rose-pine-moon" | "rose-pine-dawn" => {
            scheme(Color::Rgb(235, 188, 186), Color::Rgb(156, 207, 216))
        }
        "tokyo-night" => scheme(Color::Rgb(122, 162, 247), Color::Rgb(158, 206, 106)),
        // monokai and anything unrecognized
        _ => scheme(Color::Rgb(249, 38, 114), Color::Rgb(166, 226, 46)),
    }
}

fn scheme(primary: Color, secondary: Color) -> ColorScheme {
    ColorScheme {
        prompt: Style::new().fg(primary).bold(),
        input: Style::new(),
        suggestion: Style::new().fg(secondary).dimmed(),
        error: Style::new().fg(Color::Red),
        hint: Style::new().dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_themes_resolve() {
        for name in [
            "monokai",
            "dracula",
            "nord",
            "gruvbox",
            "solarized-dark",
            "tokyo-night",
        ] {
            let _ = scheme_for(Some(name));
        }
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        // falls back to the monokai scheme instead of failing
        let fallback = scheme_for(Some("no-such-theme"));
        let monokai = scheme_for(Some(DEFAULT_THEME));
        assert_eq!(
            format!("{:?}", fallback.prompt),
            format!("{:?}", monokai.prompt)
        );
    }

    #[test]
    fn test_none_uses_default() {
        let none = scheme_for(None);
        let default = scheme_for(Some(DEFAULT_THEME));
        assert_eq!(format!("{:?}", none.prompt), format!("{:?}", default.prompt));
    }
}
