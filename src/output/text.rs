//! Plain-text statistics.
//!
//! ```text
//! Mode:     real
//! Files:    1204
//! Linked:   37 files
//! Compared: 41 files
//! Saved:    12.3 MiB
//! Duration: 0.84 seconds
//! ```
//!
//! An `Errors:` line follows when any per-file failure occurred.

use std::io::{self, Write};

use bytesize::ByteSize;

use super::RunSummary;

/// Text formatter for a [`RunSummary`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    summary: &'a RunSummary,
}

impl<'a> TextOutput<'a> {
    /// Wrap a summary.
    #[must_use]
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }

    /// Write the statistics block.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let s = self.summary;
        writeln!(writer, "Mode:     {}", s.mode())?;
        writeln!(writer, "Files:    {}", s.files)?;
        writeln!(writer, "Linked:   {} files", s.link.linked)?;
        writeln!(writer, "Compared: {} files", s.link.compared)?;
        writeln!(writer, "Saved:    {}", ByteSize::b(s.link.saved))?;
        writeln!(
            writer,
            "Duration: {:.2} seconds",
            s.duration.as_secs_f64()
        )?;
        if s.errors() > 0 {
            writeln!(writer, "Errors:   {}", s.errors())?;
        }
        if s.link.interrupted {
            writeln!(writer, "Interrupted before completion")?;
        }
        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
