// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run configuration: user-facing settings, the rc file, and validation into
// the immutable layout/render configuration consumed by the layout engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BinderyError, Result};
use crate::types::{
    BindingEdge, Columns, FontSlant, FontWeight, Orientation, OutputFormat, PaperSize,
    TimestampSource, Unit,
};

/// Default rc file name, looked up in `$HOME`.
pub const RC_FILE_NAME: &str = ".binderyrc";

pub const DEFAULT_BINDING_PT: f64 = 72.0;
pub const DEFAULT_OUTER_PT: f64 = 36.0;
pub const DEFAULT_TOP_PT: f64 = 36.0;
pub const DEFAULT_BOTTOM_PT: f64 = 36.0;
pub const DEFAULT_DIVIDE_PT: f64 = 36.0;
pub const DEFAULT_FONT_SIZE: f64 = 9.8;
pub const DEFAULT_FONT_SIZE_TWO_COLUMNS: f64 = 6.6;
pub const DEFAULT_HEADER_SIZE: f64 = 16.0;
pub const DEFAULT_HEADER_SIZE_TWO_COLUMNS: f64 = 9.0;
/// Ratio of the medium header font to the large one.
pub const HEADER_MEDIUM_RATIO: f64 = 0.75;
pub const DEFAULT_LINE_SPACING: f64 = 1.0;
pub const DEFAULT_TAB_WIDTH: u32 = 8;
pub const DEFAULT_DATE_FORMAT: &str = "%D %R";
/// Body font family looked up when none is configured.
pub const DEFAULT_FONT: &str = "IPAGothic";
pub const DEFAULT_HEADER_FONT: &str = "sans-serif";

/// User-facing settings. Every field is optional so that layers (rc file,
/// command line) can be merged before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub binding: Option<f64>,
    pub outer: Option<f64>,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub divide: Option<f64>,
    pub unit: Option<Unit>,
    /// Binding edge code: `l`, `s` or `n`.
    pub binddir: Option<String>,
    pub columns: Option<Columns>,
    pub orientation: Option<Orientation>,
    pub duplex: Option<bool>,
    pub paper: Option<String>,
    /// Body font: a family name or a TrueType/OpenType file path.
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub header_size: Option<f64>,
    pub line_spacing: Option<f64>,
    pub tab: Option<u32>,
    pub notebook: Option<bool>,
    pub header: Option<bool>,
    pub header_text: Option<String>,
    /// Header font: a family name or a file path.
    pub header_font: Option<String>,
    pub header_slant: Option<FontSlant>,
    pub header_weight: Option<FontWeight>,
    pub date_format: Option<String>,
    pub format: Option<OutputFormat>,
    pub fold_arrow: Option<bool>,
    pub timestamp: Option<TimestampSource>,
    pub border: Option<bool>,
    pub punch: Option<bool>,
    pub number: Option<bool>,
}

/// Margin lengths in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub binding: f64,
    pub outer: f64,
    pub top: f64,
    pub bottom: f64,
    pub divide: f64,
}

/// Resolved, validated page layout. Immutable for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    pub columns: Columns,
    pub duplex: bool,
    pub binding_edge: BindingEdge,
    pub margins: Margins,
    pub page_width: f64,
    pub page_height: f64,
}

/// Resolved text and decoration options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub font: String,
    pub font_size: f64,
    pub line_spacing: f64,
    pub tab_width: u32,
    pub numbering: bool,
    pub fold_arrows: bool,
    pub header: bool,
    pub header_text: Option<String>,
    pub header_size: f64,
    pub header_medium_size: f64,
    pub header_font: String,
    /// Slant of every header element.
    pub header_slant: FontSlant,
    /// Weight of the centred title; date and page number stay normal.
    pub header_weight: FontWeight,
    pub date_format: String,
    pub timestamp: TimestampSource,
    pub border: bool,
    pub punch_marks: bool,
    pub notebook: bool,
}

impl RenderOptions {
    /// Height of one body line.
    pub fn line_height(&self) -> f64 {
        self.font_size + self.line_spacing
    }

    /// Vertical space taken by the header above the body, if any.
    pub fn header_band(&self) -> f64 {
        if self.header {
            self.header_size + self.line_height()
        } else {
            0.0
        }
    }
}

/// Everything a run needs, after defaults and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    pub paper: PaperSize,
    pub format: OutputFormat,
    pub layout: LayoutConfig,
    pub render: RenderOptions,
}

impl Settings {
    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: Settings) -> Settings {
        Settings {
            binding: other.binding.or(self.binding),
            outer: other.outer.or(self.outer),
            top: other.top.or(self.top),
            bottom: other.bottom.or(self.bottom),
            divide: other.divide.or(self.divide),
            unit: other.unit.or(self.unit),
            binddir: other.binddir.or(self.binddir),
            columns: other.columns.or(self.columns),
            orientation: other.orientation.or(self.orientation),
            duplex: other.duplex.or(self.duplex),
            paper: other.paper.or(self.paper),
            font: other.font.or(self.font),
            font_size: other.font_size.or(self.font_size),
            header_size: other.header_size.or(self.header_size),
            line_spacing: other.line_spacing.or(self.line_spacing),
            tab: other.tab.or(self.tab),
            notebook: other.notebook.or(self.notebook),
            header: other.header.or(self.header),
            header_text: other.header_text.or(self.header_text),
            header_font: other.header_font.or(self.header_font),
            header_slant: other.header_slant.or(self.header_slant),
            header_weight: other.header_weight.or(self.header_weight),
            date_format: other.date_format.or(self.date_format),
            format: other.format.or(self.format),
            fold_arrow: other.fold_arrow.or(self.fold_arrow),
            timestamp: other.timestamp.or(self.timestamp),
            border: other.border.or(self.border),
            punch: other.punch.or(self.punch),
            number: other.number.or(self.number),
        }
    }

    /// Path of the per-user rc file, if `$HOME` is set.
    pub fn default_rc_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(RC_FILE_NAME))
    }

    /// Load an rc file. A missing file yields `Ok(None)`.
    pub fn load_rc_file(path: impl AsRef<Path>) -> Result<Option<Settings>> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no rc file");
                return Ok(None);
            }
            Err(source) => {
                return Err(BinderyError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::parse_rc(&text, path).map(Some)
    }

    /// Parse rc-file text: one `key: value` per line, `#` comments.
    pub fn parse_rc(text: &str, path: &Path) -> Result<Settings> {
        let mut settings = Settings::default();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fail = |reason: String| BinderyError::ConfigFile {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            };
            let Some((key, value)) = line.split_once(':') else {
                return Err(fail(format!("expected `key: value`, got {line:?}")));
            };
            let value = value.trim();
            let value = (!value.is_empty()).then_some(value);
            settings.apply(key.trim(), value).map_err(fail)?;
        }
        Ok(settings)
    }

    /// Set one option by its rc-file key. A missing value turns a switch on.
    pub fn apply(&mut self, key: &str, value: Option<&str>) -> std::result::Result<(), String> {
        let need = || value.ok_or_else(|| format!("{key} requires an argument"));
        match key {
            "binding" => self.binding = Some(parse_num(key, need()?)?),
            "outer" => self.outer = Some(parse_num(key, need()?)?),
            "top" => self.top = Some(parse_num(key, need()?)?),
            "bottom" => self.bottom = Some(parse_num(key, need()?)?),
            "divide" => self.divide = Some(parse_num(key, need()?)?),
            "unit" => {
                self.unit = Some(match need()? {
                    "mm" => Unit::Mm,
                    "inch" => Unit::Inch,
                    other => return Err(choice_error(key, other, "inch", "mm")),
                })
            }
            "binddir" => self.binddir = Some(need()?.to_string()),
            "side" => {
                self.columns = Some(match value {
                    None | Some("2") => Columns::Two,
                    Some("1") => Columns::One,
                    Some(other) => return Err(choice_error(key, other, "2", "1")),
                })
            }
            "orientation" => {
                self.orientation = Some(match value {
                    None | Some("p") => Orientation::Portrait,
                    Some("l") => Orientation::Landscape,
                    Some(other) => return Err(choice_error(key, other, "p", "l")),
                })
            }
            "paper" => self.paper = Some(need()?.to_string()),
            "font" => self.font = Some(need()?.to_string()),
            "header-font" => self.header_font = Some(need()?.to_string()),
            "header-slant" => self.header_slant = Some(parse_named(need()?)?),
            "header-weight" => self.header_weight = Some(parse_named(need()?)?),
            "format" => self.format = Some(parse_named(need()?)?),
            "font-size" => self.font_size = Some(parse_num(key, need()?)?),
            "header-size" => self.header_size = Some(parse_num(key, need()?)?),
            "line-spacing" => self.line_spacing = Some(parse_num(key, need()?)?),
            "tab" => {
                let tab = need()?;
                self.tab = Some(
                    tab.parse()
                        .map_err(|_| format!("{key} argument {tab:?} was wrong, e.g. `tab: 8`"))?,
                )
            }
            "timestamp" => {
                self.timestamp = Some(match value {
                    None | Some("cur") => TimestampSource::Current,
                    Some("mod") => TimestampSource::Modified,
                    Some(other) => return Err(choice_error(key, other, "cur", "mod")),
                })
            }
            "header-text" => self.header_text = value.map(str::to_string),
            "date-format" => self.date_format = value.map(str::to_string),
            "notebook" => self.notebook = Some(on_off(key, value)?),
            "header" => self.header = Some(on_off(key, value)?),
            "fold-arrow" => self.fold_arrow = Some(on_off(key, value)?),
            "border" => self.border = Some(on_off(key, value)?),
            "punch" => self.punch = Some(on_off(key, value)?),
            "number" => self.number = Some(on_off(key, value)?),
            "duplex" => self.duplex = Some(on_off(key, value)?),
            _ => return Err(format!("{key}: no such option")),
        }
        Ok(())
    }

    /// Apply defaults and validate, producing the run configuration.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let orientation = self.orientation.unwrap_or(Orientation::Portrait);
        let columns = self.columns.unwrap_or(match orientation {
            Orientation::Portrait => Columns::One,
            Orientation::Landscape => Columns::Two,
        });
        let two = columns == Columns::Two;

        let paper = match &self.paper {
            Some(name) => name.parse::<PaperSize>()?,
            None => PaperSize::A4,
        };
        let (page_width, page_height) = paper.oriented_pt(orientation);

        let unit = self.unit.unwrap_or_default();
        let margin = |key: &str, value: Option<f64>, default: f64| -> Result<f64> {
            let value = value.unwrap_or(0.0);
            if !value.is_finite() || value < 0.0 {
                return Err(BinderyError::invalid(key, value.to_string()));
            }
            // Zero means "use the default".
            Ok(if value == 0.0 { default } else { unit.to_pt(value) })
        };
        let mut margins = Margins {
            binding: margin("binding", self.binding, DEFAULT_BINDING_PT)?,
            outer: margin("outer", self.outer, DEFAULT_OUTER_PT)?,
            top: margin("top", self.top, DEFAULT_TOP_PT)?,
            bottom: margin("bottom", self.bottom, DEFAULT_BOTTOM_PT)?,
            divide: margin("divide", self.divide, DEFAULT_DIVIDE_PT)?,
        };

        let binding_edge = match &self.binddir {
            Some(code) => BindingEdge::from_code(code)?,
            None if orientation.is_portrait() => BindingEdge::Long,
            None => BindingEdge::Short,
        };
        let mut punch_marks = self.punch.unwrap_or(false);
        if binding_edge == BindingEdge::None {
            margins.binding = margins.outer;
            punch_marks = false;
        }

        let font_size = positive(
            "font-size",
            self.font_size.unwrap_or(if two {
                DEFAULT_FONT_SIZE_TWO_COLUMNS
            } else {
                DEFAULT_FONT_SIZE
            }),
        )?;
        let header_size = positive(
            "header-size",
            self.header_size.unwrap_or(if two {
                DEFAULT_HEADER_SIZE_TWO_COLUMNS
            } else {
                DEFAULT_HEADER_SIZE
            }),
        )?;
        let line_spacing = self.line_spacing.unwrap_or(DEFAULT_LINE_SPACING);
        if !line_spacing.is_finite() || line_spacing < 0.0 {
            return Err(BinderyError::invalid("line-spacing", line_spacing.to_string()));
        }
        let tab_width = self.tab.unwrap_or(DEFAULT_TAB_WIDTH);
        if tab_width == 0 {
            return Err(BinderyError::invalid("tab", "0"));
        }

        let layout = LayoutConfig {
            orientation,
            columns,
            duplex: self.duplex.unwrap_or(true),
            binding_edge,
            margins,
            page_width,
            page_height,
        };
        layout.validate()?;

        let render = RenderOptions {
            font: self
                .font
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_FONT.to_string()),
            font_size,
            line_spacing,
            tab_width,
            numbering: self.number.unwrap_or(false),
            fold_arrows: self.fold_arrow.unwrap_or(true),
            header: self.header.unwrap_or(true),
            header_text: self.header_text.clone().filter(|t| !t.is_empty()),
            header_size,
            header_medium_size: header_size * HEADER_MEDIUM_RATIO,
            header_font: self
                .header_font
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_HEADER_FONT.to_string()),
            header_slant: self.header_slant.unwrap_or_default(),
            header_weight: self.header_weight.unwrap_or_default(),
            date_format: self
                .date_format
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            timestamp: self.timestamp.unwrap_or_default(),
            border: self.border.unwrap_or(false),
            punch_marks,
            notebook: self.notebook.unwrap_or(false),
        };

        // The smallest body any page side can get must still hold one line.
        let room = layout.min_body_height() - render.header_band();
        let line_h = render.line_height();
        if room < line_h {
            return Err(BinderyError::Config {
                key: "font-size".into(),
                reason: format!("a {line_h:.1}pt line does not fit in the {room:.1}pt page body"),
            });
        }

        Ok(ResolvedConfig {
            paper,
            format: self.format.unwrap_or_default(),
            layout,
            render,
        })
    }
}

impl LayoutConfig {
    /// Check that every page-side/column combination leaves a positive body.
    ///
    /// Which pair of margins runs across the page depends on orientation,
    /// binding edge and page side, so both pairs are checked in both axes.
    pub fn validate(&self) -> Result<()> {
        let m = &self.margins;
        let widest = self.widest_margin_pair();
        let divide = match self.columns {
            Columns::One => 0.0,
            Columns::Two => m.divide,
        };
        if self.page_width - widest - divide <= 0.0 {
            return Err(BinderyError::Config {
                key: "margins".into(),
                reason: format!(
                    "margins leave no body width on a {:.1}pt wide page",
                    self.page_width
                ),
            });
        }
        if self.min_body_height() <= 0.0 {
            return Err(BinderyError::Config {
                key: "margins".into(),
                reason: format!(
                    "margins leave no body height on a {:.1}pt tall page",
                    self.page_height
                ),
            });
        }
        Ok(())
    }
}

impl LayoutConfig {
    /// Larger of the two margin pairs; either may run along either axis.
    fn widest_margin_pair(&self) -> f64 {
        let m = &self.margins;
        (m.binding + m.outer).max(m.top + m.bottom)
    }

    /// Body height on the page side with the deepest head and foot margins.
    pub fn min_body_height(&self) -> f64 {
        self.page_height - self.widest_margin_pair()
    }
}

fn parse_num(key: &str, value: &str) -> std::result::Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("{key} argument {value:?} was wrong, e.g. `{key}: 12.7`"))
}

fn parse_named<T>(value: &str) -> std::result::Result<T, String>
where
    T: std::str::FromStr<Err = BinderyError>,
{
    value.parse().map_err(|err: BinderyError| err.to_string())
}

fn on_off(key: &str, value: Option<&str>) -> std::result::Result<bool, String> {
    match value {
        None | Some("on") => Ok(true),
        Some("off") => Ok(false),
        Some(other) => Err(choice_error(key, other, "on", "off")),
    }
}

fn choice_error(key: &str, got: &str, positive: &str, negative: &str) -> String {
    format!("{key} must be \"{positive}\" or \"{negative}\", but got {got:?}")
}

fn positive(key: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BinderyError::invalid(key, value.to_string()))
    }
}
