// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line definition. Every flag maps onto one `Settings` field so the
// command line can be layered over the rc file.

use std::path::PathBuf;

use bindery_core::{
    Columns, FontSlant, FontWeight, Orientation, OutputFormat, Settings, TimestampSource, Unit,
};
use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "bindery",
    author,
    version,
    about = "Margin-aware converter from UTF-8 text to PDF or PostScript",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Input text files; `-` reads standard input.
    #[arg(required_unless_present = "print_config")]
    pub files: Vec<PathBuf>,

    /// Write every input into this one file (`-` for stdout). PostScript
    /// goes to stdout when no file is given.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatArg>,

    /// Same as `--format ps`.
    #[arg(long = "ps", visible_alias = "postscript", conflicts_with = "format")]
    pub postscript: bool,

    /// Read settings from FILE instead of ~/.binderyrc.
    #[arg(short = 'f', long = "rc-file", value_name = "FILE")]
    pub rc_file: Option<PathBuf>,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    // -- Paper ----------------------------------------------------------------
    /// Paper size: a3, a4, a5, b3, b4, b5, letter, legal.
    #[arg(short = 'P', long, value_name = "PAPER")]
    pub paper: Option<String>,

    /// Portrait orientation (default).
    #[arg(short = 'p', conflicts_with = "landscape")]
    pub portrait: bool,

    /// Landscape orientation.
    #[arg(short = 'l')]
    pub landscape: bool,

    /// One column per side (portrait default).
    #[arg(short = '1', conflicts_with = "two_columns")]
    pub one_column: bool,

    /// Two columns per side (landscape default).
    #[arg(short = '2')]
    pub two_columns: bool,

    /// Duplex printing (default).
    #[arg(short = 'd', conflicts_with = "simplex")]
    pub duplex: bool,

    /// Simplex printing.
    #[arg(short = 's')]
    pub simplex: bool,

    /// Binding edge: l(ong), s(hort) or n(one).
    #[arg(long, value_name = "EDGE")]
    pub binddir: Option<String>,

    // -- Margins --------------------------------------------------------------
    /// Length unit for margins.
    #[arg(long, value_enum)]
    pub unit: Option<UnitArg>,

    /// Binding margin.
    #[arg(long, value_name = "LEN")]
    pub binding: Option<f64>,

    /// Margin opposite the binding.
    #[arg(long, value_name = "LEN")]
    pub outer: Option<f64>,

    #[arg(long, value_name = "LEN")]
    pub top: Option<f64>,

    #[arg(long, value_name = "LEN")]
    pub bottom: Option<f64>,

    /// Gap between the two columns.
    #[arg(long, value_name = "LEN")]
    pub divide: Option<f64>,

    // -- Text -----------------------------------------------------------------
    /// Body font family or TrueType/OpenType file (default: IPAGothic;
    /// built-in Courier when not installed).
    #[arg(short = 'F', long, value_name = "NAME|FILE")]
    pub font: Option<String>,

    /// Body font size in points.
    #[arg(short = 'S', long, value_name = "PT")]
    pub font_size: Option<f64>,

    /// Extra space between lines in points.
    #[arg(short = 'B', long, value_name = "PT")]
    pub line_spacing: Option<f64>,

    /// Tab width in characters.
    #[arg(short = 't', long, value_name = "N")]
    pub tab: Option<u32>,

    // -- Decoration -----------------------------------------------------------
    /// Show line numbers.
    #[arg(short = 'n', long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub number: Option<bool>,

    /// Draw a border around the body.
    #[arg(short = 'b', long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub border: Option<bool>,

    /// Draw a punch mark in the binding margin.
    #[arg(short = 'm', long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub punch: Option<bool>,

    /// Rule baselines like a notebook.
    #[arg(long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub notebook: Option<bool>,

    /// Draw arrows around folded lines.
    #[arg(long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub fold_arrow: Option<bool>,

    /// Same as `--fold-arrow=off`.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "fold_arrow")]
    pub no_fold_arrow: bool,

    // -- Header ---------------------------------------------------------------
    /// Show the page header.
    #[arg(long, value_name = "on|off", num_args = 0..=1,
          default_missing_value = "on", require_equals = true,
          value_parser = parse_switch)]
    pub header: Option<bool>,

    /// Omit the page header.
    #[arg(short = 'H', conflicts_with = "header")]
    pub no_header: bool,

    /// Header font size in points.
    #[arg(long, value_name = "PT")]
    pub header_size: Option<f64>,

    /// Header font family or file (default: sans-serif).
    #[arg(long, value_name = "NAME|FILE")]
    pub header_font: Option<String>,

    /// Slant of the header text.
    #[arg(long, value_enum)]
    pub header_slant: Option<SlantArg>,

    /// Weight of the header title.
    #[arg(long, value_enum)]
    pub header_weight: Option<WeightArg>,

    /// Header title instead of the file name.
    #[arg(long, value_name = "TEXT")]
    pub header_text: Option<String>,

    /// strftime-style header date format.
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Header date source.
    #[arg(long, value_enum)]
    pub timestamp: Option<TimestampArg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum UnitArg {
    Mm,
    Inch,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Pdf,
    Ps,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SlantArg {
    Normal,
    Italic,
    Oblique,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum WeightArg {
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TimestampArg {
    /// File modification time.
    Mod,
    /// Current time.
    Cur,
}

fn parse_switch(value: &str) -> Result<bool, String> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        other => Err(format!("expected `on` or `off`, got {other:?}")),
    }
}

/// `Some(a)` when only `a_flag` is set, `Some(b)` when only `b_flag` is.
fn pick<T>(a_flag: bool, a: T, b_flag: bool, b: T) -> Option<T> {
    match (a_flag, b_flag) {
        (true, _) => Some(a),
        (_, true) => Some(b),
        _ => None,
    }
}

impl Cli {
    /// The settings layer given on the command line.
    pub fn settings(&self) -> Settings {
        Settings {
            binding: self.binding,
            outer: self.outer,
            top: self.top,
            bottom: self.bottom,
            divide: self.divide,
            unit: self.unit.map(|u| match u {
                UnitArg::Mm => Unit::Mm,
                UnitArg::Inch => Unit::Inch,
            }),
            binddir: self.binddir.clone(),
            columns: pick(self.one_column, Columns::One, self.two_columns, Columns::Two),
            orientation: pick(
                self.portrait,
                Orientation::Portrait,
                self.landscape,
                Orientation::Landscape,
            ),
            duplex: pick(self.duplex, true, self.simplex, false),
            paper: self.paper.clone(),
            font: self.font.clone(),
            font_size: self.font_size,
            header_size: self.header_size,
            line_spacing: self.line_spacing,
            tab: self.tab,
            notebook: self.notebook,
            header: if self.no_header { Some(false) } else { self.header },
            header_text: self.header_text.clone(),
            header_font: self.header_font.clone(),
            header_slant: self.header_slant.map(|s| match s {
                SlantArg::Normal => FontSlant::Normal,
                SlantArg::Italic => FontSlant::Italic,
                SlantArg::Oblique => FontSlant::Oblique,
            }),
            header_weight: self.header_weight.map(|w| match w {
                WeightArg::Normal => FontWeight::Normal,
                WeightArg::Bold => FontWeight::Bold,
            }),
            date_format: self.date_format.clone(),
            format: if self.postscript {
                Some(OutputFormat::PostScript)
            } else {
                self.format.map(|f| match f {
                    FormatArg::Pdf => OutputFormat::Pdf,
                    FormatArg::Ps => OutputFormat::PostScript,
                })
            },
            fold_arrow: if self.no_fold_arrow {
                Some(false)
            } else {
                self.fold_arrow
            },
            timestamp: self.timestamp.map(|t| match t {
                TimestampArg::Mod => TimestampSource::Modified,
                TimestampArg::Cur => TimestampSource::Current,
            }),
            border: self.border,
            punch: self.punch,
            number: self.number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("bindery").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn untouched_flags_leave_settings_empty() {
        assert_eq!(parse(&["in.txt"]).settings(), Settings::default());
    }

    #[test]
    fn short_flags_map_onto_settings() {
        let cli = parse(&["-l", "-1", "-s", "-n", "-b", "-H", "-P", "b5", "-t", "4", "a.txt"]);
        let s = cli.settings();
        assert_eq!(s.orientation, Some(Orientation::Landscape));
        assert_eq!(s.columns, Some(Columns::One));
        assert_eq!(s.duplex, Some(false));
        assert_eq!(s.number, Some(true));
        assert_eq!(s.border, Some(true));
        assert_eq!(s.header, Some(false));
        assert_eq!(s.paper.as_deref(), Some("b5"));
        assert_eq!(s.tab, Some(4));
        assert_eq!(cli.files, [PathBuf::from("a.txt")]);
    }

    #[test]
    fn switches_take_optional_on_off() {
        let s = parse(&["--notebook=off", "--punch", "--fold-arrow=on", "x"]).settings();
        assert_eq!(s.notebook, Some(false));
        assert_eq!(s.punch, Some(true));
        assert_eq!(s.fold_arrow, Some(true));
        assert!(Cli::try_parse_from(["bindery", "--border=maybe", "x"]).is_err());
    }

    #[test]
    fn switch_does_not_swallow_the_next_file() {
        let cli = parse(&["-n", "notes.txt"]);
        assert_eq!(cli.number, Some(true));
        assert_eq!(cli.files, [PathBuf::from("notes.txt")]);
    }

    #[test]
    fn no_fold_arrow_turns_arrows_off() {
        let s = parse(&["--no-fold-arrow", "x"]).settings();
        assert_eq!(s.fold_arrow, Some(false));
    }

    #[test]
    fn margins_and_units() {
        let s = parse(&["--unit", "inch", "--binding", "1.5", "--binddir", "s", "x"]).settings();
        assert_eq!(s.unit, Some(Unit::Inch));
        assert_eq!(s.binding, Some(1.5));
        assert_eq!(s.binddir.as_deref(), Some("s"));
    }

    #[test]
    fn font_accepts_family_names_and_paths() {
        let s = parse(&["-F", "IPAGothic", "x"]).settings();
        assert_eq!(s.font.as_deref(), Some("IPAGothic"));
        let s = parse(&["--font", "/usr/share/fonts/ipag.ttf", "x"]).settings();
        assert_eq!(s.font.as_deref(), Some("/usr/share/fonts/ipag.ttf"));
    }

    #[test]
    fn header_font_options() {
        let s = parse(&[
            "--header-font",
            "DejaVu Sans",
            "--header-slant",
            "italic",
            "--header-weight",
            "normal",
            "x",
        ])
        .settings();
        assert_eq!(s.header_font.as_deref(), Some("DejaVu Sans"));
        assert_eq!(s.header_slant, Some(FontSlant::Italic));
        assert_eq!(s.header_weight, Some(FontWeight::Normal));
        assert!(Cli::try_parse_from(["bindery", "--header-weight", "heavy", "x"]).is_err());
    }

    #[test]
    fn postscript_flag_and_format() {
        assert_eq!(
            parse(&["--ps", "x"]).settings().format,
            Some(OutputFormat::PostScript)
        );
        assert_eq!(
            parse(&["--postscript", "x"]).settings().format,
            Some(OutputFormat::PostScript)
        );
        assert_eq!(
            parse(&["--format", "pdf", "x"]).settings().format,
            Some(OutputFormat::Pdf)
        );
        assert!(Cli::try_parse_from(["bindery", "--ps", "--format", "pdf", "x"]).is_err());
    }

    #[test]
    fn print_config_needs_no_files() {
        let cli = parse(&["--print-config"]);
        assert!(cli.print_config);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn conflicting_orientation_is_rejected() {
        assert!(Cli::try_parse_from(["bindery", "-p", "-l", "x"]).is_err());
    }
}
