//! Output device seam: every tick writes one full axis/button frame.

use std::{
    collections::BTreeSet,
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::mapping::ControlOutput;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkError {
    /// The device could not be opened or acquired.
    Unavailable(String),
    Write(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "output device unavailable: {msg}"),
            Self::Write(msg) => write!(f, "output write failed: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

pub trait OutputSink {
    /// Writes every axis and every button. Synchronous.
    fn write_frame(&mut self, output: &ControlOutput) -> Result<(), SinkError>;

    /// Gives the device back. Called once after the final neutral frame.
    fn release(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Formats one frame as `output,<seq>,<x>,<y>,<z>,<rx>,<b1>,<b2>,<b3>,<b4>`.
pub fn format_frame(seq: u64, output: &ControlOutput) -> String {
    let mut line = format!("output,{seq}");
    for value in output.axes {
        line.push(',');
        line.push_str(&value.to_string());
    }
    for pressed in output.buttons {
        line.push_str(if pressed { ",1" } else { ",0" });
    }
    line
}

/// Writes frames as CSV lines to a file or stdout.
pub struct CsvSink {
    writer: Box<dyn Write + Send>,
    seq: u64,
}

impl CsvSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer, seq: 0 }
    }

    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path)
            .map_err(|err| SinkError::Unavailable(format!("{}: {err}", path.display())))?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn frames_written(&self) -> u64 {
        self.seq
    }
}

impl OutputSink for CsvSink {
    fn write_frame(&mut self, output: &ControlOutput) -> Result<(), SinkError> {
        let line = format_frame(self.seq, output);
        writeln!(self.writer, "{line}").map_err(|err| SinkError::Write(err.to_string()))?;
        self.seq += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), SinkError> {
        self.writer
            .flush()
            .map_err(|err| SinkError::Write(err.to_string()))
    }
}

/// Keeps every accepted frame in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    frames: Vec<ControlOutput>,
    attempts: u64,
    failing_attempts: BTreeSet<u64>,
    unavailable: bool,
    released: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the listed write attempts (zero-based, counting failures).
    pub fn failing_on(attempts: impl IntoIterator<Item = u64>) -> Self {
        Self {
            failing_attempts: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Rejects every write, like a device that never came up.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn frames(&self) -> &[ControlOutput] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&ControlOutput> {
        self.frames.last()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl OutputSink for RecordingSink {
    fn write_frame(&mut self, output: &ControlOutput) -> Result<(), SinkError> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.unavailable {
            return Err(SinkError::Unavailable("device not acquired".to_owned()));
        }
        if self.failing_attempts.contains(&attempt) {
            return Err(SinkError::Write(format!("injected failure on attempt {attempt}")));
        }
        self.frames.push(*output);
        Ok(())
    }

    fn release(&mut self) -> Result<(), SinkError> {
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::mapping::{DeviceRange, AXIS_COUNT, BUTTON_COUNT};

    #[test]
    fn frame_line_lists_axes_then_buttons() {
        let output = ControlOutput {
            axes: [1, 32_767, 16_384, 20_000],
            buttons: [false, true, false, false],
        };
        assert_eq!(
            format_frame(7, &output),
            "output,7,1,32767,16384,20000,0,1,0,0"
        );
    }

    #[test]
    fn csv_sink_numbers_frames_and_flushes_on_release() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let neutral = ControlOutput::neutral(DeviceRange::default());

        let mut sink = CsvSink::create(&path).expect("create sink");
        sink.write_frame(&neutral).expect("first");
        sink.write_frame(&neutral).expect("second");
        sink.release().expect("release");
        assert_eq!(sink.frames_written(), 2);

        let written = fs::read_to_string(&path).expect("read back");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("output,0,16384,"));
        assert!(lines[1].starts_with("output,1,"));
    }

    #[test]
    fn csv_sink_reports_unavailable_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("out.csv");
        assert!(matches!(
            CsvSink::create(&path),
            Err(SinkError::Unavailable(_))
        ));
    }

    #[test]
    fn recording_sink_injects_failures() {
        let frame = ControlOutput {
            axes: [5; AXIS_COUNT],
            buttons: [false; BUTTON_COUNT],
        };
        let mut sink = RecordingSink::failing_on([1]);
        assert!(sink.write_frame(&frame).is_ok());
        assert!(matches!(sink.write_frame(&frame), Err(SinkError::Write(_))));
        assert!(sink.write_frame(&frame).is_ok());
        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.attempts(), 3);
    }
}
