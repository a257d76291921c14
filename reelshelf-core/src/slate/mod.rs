//! Placeholder cover ("slate") rendering.
//!
//! A slate is a 640x360 SVG built from a title and a [`Theme`]. Rendering is
//! a pure function of its inputs: the same title and theme always produce
//! byte-identical output, which lets callers regenerate a slate at any time
//! without tracking what was written before.

pub mod text;

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::library::atomic::write_atomic;

pub const SLATE_WIDTH: u32 = 640;
pub const SLATE_HEIGHT: u32 = 360;

pub const DEFAULT_BRAND: &str = "Reelshelf";
pub const DEFAULT_FALLBACK_TITLE: &str = "Untitled video";

// Title region inside the canvas.
const TITLE_X: u32 = 32;
const TITLE_TOP: u32 = 118;
const TITLE_REGION_HEIGHT: u32 = 160;
const TITLE_FONT_SIZE: u32 = 38;
const TITLE_LINE_HEIGHT: u32 = 44;

/// Named slate styles. Unknown names resolve to the default theme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Theme {
    #[default]
    Midnight,
    Chalk,
    Paper,
}

/// Fixed colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_start: &'static str,
    pub background_end: &'static str,
    pub accent: &'static str,
    pub title: &'static str,
    pub brand: &'static str,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Midnight, Theme::Chalk, Theme::Paper];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Midnight => "midnight",
            Theme::Chalk => "chalk",
            Theme::Paper => "paper",
        }
    }

    /// ASCII-case-insensitive lookup by name.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(name))
    }

    /// Like [`Theme::lookup`], with anything unrecognised mapped to `fallback`.
    pub fn parse_or(name: &str, fallback: Self) -> Self {
        Self::lookup(name).unwrap_or(fallback)
    }

    /// Like [`Theme::lookup`], with anything unrecognised mapped to the default.
    pub fn parse(name: &str) -> Self {
        Self::parse_or(name, Self::default())
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Midnight => Palette {
                background_start: "#0d1117",
                background_end: "#1f2937",
                accent: "#374151",
                title: "#ffffff",
                brand: "#9ca3af",
            },
            Theme::Chalk => Palette {
                background_start: "#193a2a",
                background_end: "#132e21",
                accent: "#2a4b39",
                title: "#e8f5e9",
                brand: "#b7d7c3",
            },
            Theme::Paper => Palette {
                background_start: "#faf8f3",
                background_end: "#f1ede3",
                accent: "#d9d3c3",
                title: "#222222",
                brand: "#6b7280",
            },
        }
    }
}

impl FromStr for Theme {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Theme {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SlateGenerator {
    brand: String,
    fallback_title: String,
}

impl Default for SlateGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BRAND, DEFAULT_FALLBACK_TITLE)
    }
}

impl SlateGenerator {
    pub fn new(brand: impl AsRef<str>, fallback_title: impl AsRef<str>) -> Self {
        let fallback = text::sanitize(fallback_title.as_ref());
        Self {
            brand: text::sanitize(brand.as_ref()),
            fallback_title: if fallback.is_empty() {
                DEFAULT_FALLBACK_TITLE.to_string()
            } else {
                fallback
            },
        }
    }

    /// Render the slate for `title` in `theme` as SVG bytes.
    pub fn generate(&self, title: &str, theme: Theme) -> Vec<u8> {
        self.render(title, theme).into_bytes()
    }

    /// Render and atomically write the slate to `out`.
    pub async fn write(&self, title: &str, theme: Theme, out: &Path) -> std::io::Result<()> {
        let bytes = self.generate(title, theme);
        write_atomic(out, &bytes).await?;
        debug!(path = %out.display(), theme = %theme, "slate written");
        Ok(())
    }

    fn render(&self, title: &str, theme: Theme) -> String {
        let palette = theme.palette();
        let mut title = text::sanitize(title);
        if title.is_empty() {
            title = self.fallback_title.clone();
        }
        let lines = text::wrap(&title);

        let mut svg = String::with_capacity(2048);
        // Writing into a String cannot fail.
        let _ = write_document(&mut svg, &self.brand, &lines, palette);
        svg
    }
}

fn write_document(
    svg: &mut String,
    brand: &str,
    lines: &[String],
    palette: Palette,
) -> std::fmt::Result {
    let Palette {
        background_start,
        background_end,
        accent,
        title: title_fill,
        brand: brand_fill,
    } = palette;

    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg width="{SLATE_WIDTH}" height="{SLATE_HEIGHT}" viewBox="0 0 {SLATE_WIDTH} {SLATE_HEIGHT}" xmlns="http://www.w3.org/2000/svg">"#
    )?;
    writeln!(svg, "  <defs>")?;
    writeln!(
        svg,
        r#"    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="{background_start}"/>
      <stop offset="100%" stop-color="{background_end}"/>
    </linearGradient>
    <pattern id="grid" width="20" height="20" patternUnits="userSpaceOnUse">
      <path d="M20 0H0V20" fill="none" stroke="{accent}" stroke-opacity="0.25" stroke-width="1"/>
    </pattern>
    <filter id="grain" x="0" y="0" width="1" height="1">
      <feTurbulence type="fractalNoise" baseFrequency="0.9" numOctaves="1" seed="7" stitchTiles="stitch"/>
      <feColorMatrix type="saturate" values="0"/>
      <feComponentTransfer>
        <feFuncA type="table" tableValues="0 0.04"/>
      </feComponentTransfer>
    </filter>"#
    )?;
    writeln!(svg, "  </defs>")?;

    writeln!(
        svg,
        r#"  <rect width="{SLATE_WIDTH}" height="{SLATE_HEIGHT}" fill="url(#bg)"/>
  <rect width="{SLATE_WIDTH}" height="{SLATE_HEIGHT}" fill="url(#grid)"/>
  <rect width="{SLATE_WIDTH}" height="{SLATE_HEIGHT}" filter="url(#grain)"/>"#
    )?;

    writeln!(
        svg,
        r#"  <text x="32" y="72" font-family="'Segoe UI', Roboto, Arial, sans-serif" font-size="18" font-weight="600" fill="{brand_fill}">{brand}</text>"#
    )?;

    let block = TITLE_LINE_HEIGHT * lines.len() as u32;
    let top = TITLE_TOP + TITLE_REGION_HEIGHT.saturating_sub(block) / 2;
    writeln!(
        svg,
        r#"  <text font-family="'Segoe UI', Roboto, Arial, sans-serif" font-size="{TITLE_FONT_SIZE}" font-weight="800" fill="{title_fill}">"#
    )?;
    for (index, line) in lines.iter().enumerate() {
        let baseline = top + 34 + TITLE_LINE_HEIGHT * index as u32;
        writeln!(svg, r#"    <tspan x="{TITLE_X}" y="{baseline}">{line}</tspan>"#)?;
    }
    writeln!(svg, "  </text>")?;

    writeln!(
        svg,
        r#"  <text x="40" y="300" font-family="'Segoe UI', Roboto, Arial, sans-serif" font-size="22" opacity="0.25" fill="{brand_fill}">&#960;  &#8226;  &#931;  &#8226;  &#8730;  &#8226;  &#8747;  &#8226;  &#8734;</text>
  <rect x="40" y="314" width="180" height="6" rx="3" fill="{accent}" opacity="0.8"/>
  <rect x="40" y="328" width="240" height="6" rx="3" fill="{accent}" opacity="0.6"/>"#
    )?;
    writeln!(svg, "</svg>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("svg is utf-8")
    }

    #[test]
    fn identical_inputs_render_identical_bytes() {
        let slate = SlateGenerator::default();
        for theme in Theme::ALL {
            assert_eq!(
                slate.generate("Quadratic equations", theme),
                slate.generate("Quadratic equations", theme)
            );
        }
    }

    #[test]
    fn themes_change_content() {
        let slate = SlateGenerator::default();
        assert_ne!(
            slate.generate("Fractions", Theme::Midnight),
            slate.generate("Fractions", Theme::Paper)
        );
    }

    #[test]
    fn unknown_theme_names_use_default() {
        assert_eq!(Theme::parse("neon"), Theme::Midnight);
        assert_eq!(Theme::parse(" CHALK "), Theme::Chalk);
        assert_eq!("paper".parse::<Theme>().unwrap(), Theme::Paper);
        assert_eq!(Theme::lookup("neon"), None);
        assert_eq!(Theme::parse_or("neon", Theme::Chalk), Theme::Chalk);
        assert_eq!(Theme::parse_or("paper", Theme::Chalk), Theme::Paper);
        let theme: Theme = serde_json::from_str(r#""bogus""#).unwrap();
        assert_eq!(theme, Theme::Midnight);
    }

    #[test]
    fn title_is_sanitized_into_markup() {
        let svg = as_text(SlateGenerator::default().generate("<b>lesson1</b>", Theme::Chalk));
        assert!(svg.contains(">blesson1/b</tspan>"));
        assert!(!svg.contains("<b>"));
        assert!(svg.contains(Theme::Chalk.palette().background_start));
    }

    #[test]
    fn blank_title_uses_fallback() {
        let slate = SlateGenerator::new("Roniz", "Roniz Lesson");
        let svg = as_text(slate.generate("   ", Theme::Midnight));
        assert!(svg.contains(">Roniz Lesson</tspan>"));
        assert!(svg.contains(">Roniz</text>"));
    }

    #[test]
    fn canvas_is_sixteen_by_nine() {
        let svg = as_text(SlateGenerator::default().generate("x", Theme::Midnight));
        assert!(svg.contains(r#"viewBox="0 0 640 360""#));
        assert_eq!(SLATE_WIDTH * 9, SLATE_HEIGHT * 16);
    }

    #[tokio::test]
    async fn write_persists_generated_bytes() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let out = dir.path().join("a.mp4.svg");
        let slate = SlateGenerator::default();

        slate.write("Angles", Theme::Paper, &out).await.expect("write");

        let on_disk = tokio::fs::read(&out).await.unwrap();
        assert_eq!(on_disk, slate.generate("Angles", Theme::Paper));
    }
}
