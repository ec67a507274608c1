//! Display buffer with in-place status line overwrite
//!
//! The buffer is one text string plus one styled run per line. The status
//! region is a byte span into that string. It can only be overwritten while it
//! is still the last thing in the buffer; any other append invalidates it.

use std::collections::VecDeque;

use crate::protocol::ConsoleColor;

/// Default number of lines kept before the oldest are discarded.
pub const DEFAULT_MAX_RETAINED_LINES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

impl Alignment {
    pub fn centered(centered: bool) -> Self {
        if centered {
            Alignment::Center
        } else {
            Alignment::Left
        }
    }
}

/// One line of the buffer: `len` bytes of `text` starting at `start`, newline included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledRun {
    pub start: usize,
    pub len: usize,
    pub foreground: ConsoleColor,
    pub background: ConsoleColor,
    pub alignment: Alignment,
}

/// Span holding the most recent status directive's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegion {
    pub start: usize,
    pub len: usize,
}

impl StatusRegion {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Borrowed view of one buffer line, without its newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledLine<'a> {
    pub text: &'a str,
    pub foreground: ConsoleColor,
    pub background: ConsoleColor,
    pub alignment: Alignment,
}

#[derive(Debug, Clone)]
pub struct DisplayBuffer {
    text: String,
    runs: VecDeque<StyledRun>,
    status: Option<StatusRegion>,
    max_lines: usize,
    revision: u64,
}

impl Default for DisplayBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETAINED_LINES)
    }
}

impl DisplayBuffer {
    pub fn new(max_lines: usize) -> Self {
        Self {
            text: String::new(),
            runs: VecDeque::new(),
            status: None,
            max_lines: max_lines.max(1),
            revision: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn status_region(&self) -> Option<StatusRegion> {
        self.status
    }

    /// Bumped on every append, status write and clear. Unlike `line_count`
    /// it keeps advancing once retention starts dropping old lines.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a regular line. Invalidates the status region.
    pub fn append_line(
        &mut self,
        content: &str,
        foreground: ConsoleColor,
        background: ConsoleColor,
        alignment: Alignment,
    ) {
        self.status = None;
        self.push_run(content, foreground, background, alignment);
        self.enforce_retention();
        self.revision += 1;
    }

    /// Write the status line.
    ///
    /// Overwrites the tracked status region when it still ends at the buffer
    /// tail; otherwise appends and starts tracking the new line. Returns
    /// whether an overwrite happened.
    pub fn write_status(
        &mut self,
        content: &str,
        foreground: ConsoleColor,
        background: ConsoleColor,
        alignment: Alignment,
    ) -> bool {
        let overwrite = match self.status {
            Some(region) if region.end() == self.text.len() => {
                self.text.truncate(region.start);
                while self.runs.back().is_some_and(|run| run.start >= region.start) {
                    self.runs.pop_back();
                }
                true
            }
            _ => false,
        };

        let region = self.push_run(content, foreground, background, alignment);
        self.status = Some(region);
        self.enforce_retention();
        self.revision += 1;
        overwrite
    }

    /// Empty the buffer and forget the status region.
    pub fn clear(&mut self) {
        self.text.clear();
        self.runs.clear();
        self.status = None;
        self.revision += 1;
    }

    pub fn lines(&self) -> impl Iterator<Item = StyledLine<'_>> + '_ {
        self.runs.iter().map(move |run| self.line_for(run))
    }

    /// The last `count` lines, oldest first.
    pub fn tail_lines(&self, count: usize) -> Vec<StyledLine<'_>> {
        let skip = self.runs.len().saturating_sub(count);
        self.runs
            .iter()
            .skip(skip)
            .map(|run| self.line_for(run))
            .collect()
    }

    fn line_for(&self, run: &StyledRun) -> StyledLine<'_> {
        let line = &self.text[run.start..run.start + run.len];
        StyledLine {
            text: line.strip_suffix('\n').unwrap_or(line),
            foreground: run.foreground,
            background: run.background,
            alignment: run.alignment,
        }
    }

    fn push_run(
        &mut self,
        content: &str,
        foreground: ConsoleColor,
        background: ConsoleColor,
        alignment: Alignment,
    ) -> StatusRegion {
        let start = self.text.len();
        // One run is exactly one line
        if content.contains(['\n', '\r']) {
            self.text.push_str(&content.replace(['\n', '\r'], " "));
        } else {
            self.text.push_str(content);
        }
        self.text.push('\n');

        let len = self.text.len() - start;
        self.runs.push_back(StyledRun {
            start,
            len,
            foreground,
            background,
            alignment,
        });
        StatusRegion { start, len }
    }

    fn enforce_retention(&mut self) {
        let excess = self.runs.len().saturating_sub(self.max_lines);
        if excess == 0 {
            return;
        }

        let cut = self
            .runs
            .iter()
            .take(excess)
            .map(|run| run.len)
            .sum::<usize>();
        self.runs.drain(..excess);
        self.text.drain(..cut);
        for run in self.runs.iter_mut() {
            run.start -= cut;
        }
        self.status = match self.status {
            Some(region) if region.start >= cut => Some(StatusRegion {
                start: region.start - cut,
                len: region.len,
            }),
            _ => None,
        };
    }
}
