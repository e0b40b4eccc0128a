// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion jobs: input files to composed sides to PDF or PostScript output.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};

use bindery_core::error::{BinderyError, Result};
use bindery_core::{OutputFormat, ResolvedConfig, TimestampSource};
use chrono::{DateTime, Local};
use tracing::{debug, info, instrument};

use crate::compose::{ComposedDocument, HeaderInfo, PageComposer, SheetSide, format_header_date};
use crate::fonts::{FontLocator, needs_lookup};
use crate::measure::FaceSet;
use crate::output::{STDOUT_NAME, write_output};
use crate::pdf::PdfWriter;
use crate::ps::PsWriter;
use crate::reader::Utf8Reader;

/// Input name that selects standard input.
pub const STDIN_NAME: &str = "-";
/// Name shown in the header for standard input.
pub const STDIN_TITLE: &str = "STDIN";

/// One run of the converter with a fixed configuration and fonts.
pub struct ConvertJob {
    config: ResolvedConfig,
    faces: FaceSet,
}

impl ConvertJob {
    /// Resolve the configured fonts and prepare a job. The system font
    /// database is only scanned when a family name needs looking up.
    pub fn new(config: ResolvedConfig) -> Result<Self> {
        let render = &config.render;
        let locator = if needs_lookup(&render.font) || needs_lookup(&render.header_font) {
            FontLocator::system()
        } else {
            FontLocator::empty()
        };
        let faces = locator.faces(render)?;
        Ok(Self::with_faces(config, faces))
    }

    pub fn with_faces(config: ResolvedConfig, faces: FaceSet) -> Self {
        Self { config, faces }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn faces(&self) -> &FaceSet {
        &self.faces
    }

    /// Default output path for an input: `<input>.pdf` or `<input>.ps`.
    pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
        let mut name: OsString = if input == Path::new(STDIN_NAME) {
            STDIN_TITLE.into()
        } else {
            input.as_os_str().to_owned()
        };
        name.push(".");
        name.push(format.extension());
        PathBuf::from(name)
    }

    /// Where a single combined document goes. PostScript with no explicit
    /// output is written to stdout as one stream.
    pub fn combined_output(&self, output: Option<&Path>) -> Option<PathBuf> {
        match (output, self.config.format) {
            (Some(path), _) => Some(path.to_path_buf()),
            (None, OutputFormat::PostScript) => Some(PathBuf::from(STDOUT_NAME)),
            (None, OutputFormat::Pdf) => None,
        }
    }

    /// Compose one input file, or standard input for `-`.
    #[instrument(skip(self), fields(path = %input.display()))]
    pub fn compose_path(&self, input: &Path) -> Result<ComposedDocument> {
        if input == Path::new(STDIN_NAME) {
            let mut reader = Utf8Reader::new(std::io::stdin().lock(), STDIN_TITLE);
            return self.compose_reader(&mut reader, STDIN_TITLE, Local::now());
        }

        let mut reader = Utf8Reader::open(input)?;
        let time = match self.config.render.timestamp {
            TimestampSource::Current => Local::now(),
            TimestampSource::Modified => {
                let modified = std::fs::metadata(input)
                    .and_then(|meta| meta.modified())
                    .map_err(|source| BinderyError::Read {
                        path: input.to_path_buf(),
                        source,
                    })?;
                DateTime::<Local>::from(modified)
            }
        };
        self.compose_reader(&mut reader, &input.display().to_string(), time)
    }

    /// Compose from an open reader. `name` is shown when no header text is set.
    pub fn compose_reader<R: Read>(
        &self,
        reader: &mut Utf8Reader<R>,
        name: &str,
        time: DateTime<Local>,
    ) -> Result<ComposedDocument> {
        let render = &self.config.render;
        let header = HeaderInfo {
            title: render.header_text.clone().unwrap_or_else(|| name.to_string()),
            date: format_header_date(&render.date_format, &time)?,
        };
        let composer = PageComposer::new(&self.config.layout, render, self.faces.measurers());
        composer.compose(reader, &header)
    }

    /// Serialise sides in the configured output format.
    pub fn render(&self, title: &str, sides: &[SheetSide]) -> Result<Vec<u8>> {
        match self.config.format {
            OutputFormat::Pdf => PdfWriter::new(title).render(sides, &self.faces),
            OutputFormat::PostScript => {
                PsWriter::for_layout(title, &self.config.layout).render(sides, &self.faces)
            }
        }
    }

    /// Convert every input. With a combined output, all inputs go into that
    /// one document; otherwise each input gets its own `<input>.pdf`. Returns
    /// the paths written.
    #[instrument(skip_all, fields(inputs = inputs.len(), format = ?self.config.format))]
    pub fn run(&self, inputs: &[PathBuf], output: Option<&Path>) -> Result<Vec<PathBuf>> {
        let Some(output) = self.combined_output(output) else {
            let mut written = Vec::with_capacity(inputs.len());
            for input in inputs {
                let doc = self.compose_path(input)?;
                let dest = Self::default_output_path(input, self.config.format);
                let bytes = self.render(&input.display().to_string(), &doc.sides)?;
                write_output(&bytes, &dest)?;
                written.push(dest);
            }
            return Ok(written);
        };

        let layout = &self.config.layout;
        let mut sides = Vec::new();
        for (i, input) in inputs.iter().enumerate() {
            let doc = self.compose_path(input)?;
            let count = doc.sides.len();
            sides.extend(doc.sides);
            // Keep the next file starting on the front of a sheet.
            if layout.duplex && count % 2 == 1 && i + 1 < inputs.len() {
                debug!(path = %input.display(), "padding odd side count");
                sides.push(SheetSide::blank(layout.page_width, layout.page_height));
            }
        }

        let bytes = self.render(&output.display().to_string(), &sides)?;
        write_output(&bytes, &output)?;
        info!(path = %output.display(), sides = sides.len(), "combined output written");
        Ok(vec![output])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_core::Settings;
    use chrono::TimeZone;

    fn job(settings: Settings) -> ConvertJob {
        ConvertJob::with_faces(settings.resolve().unwrap(), FaceSet::courier())
    }

    #[test]
    fn default_output_appends_the_format_extension() {
        assert_eq!(
            ConvertJob::default_output_path(Path::new("src/main.rs"), OutputFormat::Pdf),
            PathBuf::from("src/main.rs.pdf")
        );
        assert_eq!(
            ConvertJob::default_output_path(Path::new("-"), OutputFormat::Pdf),
            PathBuf::from("STDIN.pdf")
        );
        assert_eq!(
            ConvertJob::default_output_path(Path::new("a.txt"), OutputFormat::PostScript),
            PathBuf::from("a.txt.ps")
        );
    }

    #[test]
    fn postscript_without_output_streams_to_stdout() {
        let ps = job(Settings {
            format: Some(OutputFormat::PostScript),
            ..Default::default()
        });
        assert_eq!(ps.combined_output(None), Some(PathBuf::from("-")));
        let explicit = Path::new("out.ps");
        assert_eq!(ps.combined_output(Some(explicit)), Some(explicit.to_path_buf()));
        assert_eq!(job(Settings::default()).combined_output(None), None);
    }

    #[test]
    fn render_follows_the_configured_format() {
        let ps = job(Settings {
            format: Some(OutputFormat::PostScript),
            binddir: Some("s".into()),
            ..Default::default()
        });
        let mut reader = Utf8Reader::new(&b"x\n"[..], "t");
        let doc = ps.compose_reader(&mut reader, "f", Local::now()).unwrap();
        let bytes = ps.render("f", &doc.sides).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%!PS-Adobe-3.0"));
        assert!(text.contains("%%IncludeFeature: *Duplex DuplexTumble"));

        let pdf = job(Settings::default());
        assert!(pdf.render("f", &doc.sides).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn config_courier_skips_the_font_database() {
        let job = ConvertJob::new(
            Settings {
                font: Some("courier".into()),
                header_font: Some("Courier".into()),
                ..Default::default()
            }
            .resolve()
            .unwrap(),
        )
        .unwrap();
        assert!(job.faces().body.embedded().is_none());
        assert_eq!(job.faces().header_title.name(), "Courier-Bold");
    }

    #[test]
    fn header_text_overrides_file_name() {
        let job = job(Settings {
            header_text: Some("Listing".into()),
            date_format: Some("%Y".into()),
            ..Default::default()
        });
        let time = Local.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        let mut reader = Utf8Reader::new(&b"x\n"[..], "t");
        let doc = job.compose_reader(&mut reader, "file.txt", time).unwrap();
        let texts: Vec<&str> = doc.sides[0]
            .commands
            .iter()
            .filter_map(|c| match c {
                crate::compose::DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(&texts[..2], ["2021", "Listing"]);
    }

    #[test]
    fn bad_date_format_fails_before_layout() {
        let job = job(Settings {
            date_format: Some("%Q".into()),
            ..Default::default()
        });
        let mut reader = Utf8Reader::new(&b""[..], "t");
        let err = job.compose_reader(&mut reader, "f", Local::now()).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(Settings::default());
        let err = job.compose_path(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, BinderyError::Read { .. }));
    }
}
