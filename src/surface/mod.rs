//! Render surface: the single owner of display state
//!
//! All display mutations are expressed as [`SurfaceCommand`]s and posted
//! through a cloneable [`SurfaceHandle`]. Posting never blocks and never
//! applies the change in place; the owning context drains the queue in FIFO
//! order (a gpui task in the window front end, a blocking loop headless).
//!
//! # Module Structure
//!
//! - `buffer`: text buffer, styled runs and the status region

mod buffer;

pub use buffer::{
    Alignment, DisplayBuffer, StatusRegion, StyledLine, StyledRun, DEFAULT_MAX_RETAINED_LINES,
};

use async_channel::{Receiver, Sender};
use tracing::{debug, info, warn};

use crate::continuation::{ContinuationGate, KeyDisposition, KeyInput, ResumeAction};
use crate::font_fit::{
    fit_font_size, MonospaceEstimate, PixelArea, SizeSequence, TextMeasurer, MIN_CLIENT_HEIGHT,
    MIN_CLIENT_WIDTH,
};
use crate::protocol::{ConsoleColor, OutputEvent};

/// Action run when the user asks to close the window.
pub type CloseHandler = Box<dyn FnMut() + Send>;

/// Fixed character grid. `columns` and `rows` never change after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalGrid {
    columns: u16,
    rows: u16,
    font_size: f32,
}

impl TerminalGrid {
    pub fn columns(&self) -> u16 {
        self.columns
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }
}

/// Window client geometry. `min_size == max_size == client` once sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub client: PixelArea,
    pub min_size: PixelArea,
    pub max_size: PixelArea,
    pub char_width: u32,
    pub line_height: u32,
}

impl WindowGeometry {
    fn locked(client: PixelArea, char_width: u32, line_height: u32) -> Self {
        Self {
            client,
            min_size: client,
            max_size: client,
            char_width,
            line_height,
        }
    }

    pub fn is_resizable(&self) -> bool {
        self.min_size != self.max_size
    }
}

/// Creation parameters for a [`RenderSurface`].
#[derive(Debug, Clone)]
pub struct SurfaceOptions {
    pub title: String,
    pub columns: u16,
    pub rows: u16,
    pub font_family: String,
    pub font_sizes: SizeSequence,
    /// Screen work area the window must fit into
    pub work_area: PixelArea,
    pub max_retained_lines: usize,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            title: "Script Host".to_string(),
            columns: 120,
            rows: 30,
            font_family: "Consolas".to_string(),
            font_sizes: SizeSequence::default(),
            work_area: PixelArea::new(1920, 1040),
            max_retained_lines: DEFAULT_MAX_RETAINED_LINES,
        }
    }
}

/// One unit of work for the surface owner.
pub enum SurfaceCommand {
    Append(OutputEvent),
    ApplySize { columns: u16, rows: u16 },
    ShowContinue(String),
    BindResume(ResumeAction),
    BindCloseHandler(CloseHandler),
    Key(KeyInput),
    ProcessExited { exit_code: Option<i32> },
    EndSession,
}

impl std::fmt::Debug for SurfaceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceCommand::Append(event) => f.debug_tuple("Append").field(event).finish(),
            SurfaceCommand::ApplySize { columns, rows } => f
                .debug_struct("ApplySize")
                .field("columns", columns)
                .field("rows", rows)
                .finish(),
            SurfaceCommand::ShowContinue(prompt) => {
                f.debug_tuple("ShowContinue").field(prompt).finish()
            }
            SurfaceCommand::BindResume(_) => f.write_str("BindResume(..)"),
            SurfaceCommand::BindCloseHandler(_) => f.write_str("BindCloseHandler(..)"),
            SurfaceCommand::Key(key) => f.debug_tuple("Key").field(key).finish(),
            SurfaceCommand::ProcessExited { exit_code } => f
                .debug_struct("ProcessExited")
                .field("exit_code", exit_code)
                .finish(),
            SurfaceCommand::EndSession => f.write_str("EndSession"),
        }
    }
}

/// What changed after applying a command; front ends redraw accordingly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceUpdate {
    Unchanged,
    Content,
    Title,
    Geometry,
    SessionEnded,
}

/// Thread-safe posting API for the surface. Every call returns immediately.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: Sender<SurfaceCommand>,
}

impl std::fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl SurfaceHandle {
    /// Enqueue a command. Returns false once the surface is gone.
    pub fn post(&self, command: SurfaceCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(e) => {
                debug!(command = ?e.into_inner(), "Surface closed, dropping command");
                false
            }
        }
    }

    pub fn append(&self, event: OutputEvent) -> bool {
        self.post(SurfaceCommand::Append(event))
    }

    pub fn apply_size(&self, columns: u16, rows: u16) -> bool {
        self.post(SurfaceCommand::ApplySize { columns, rows })
    }

    pub fn show_continue(&self, prompt_text: impl Into<String>) -> bool {
        self.post(SurfaceCommand::ShowContinue(prompt_text.into()))
    }

    pub fn bind_resume(&self, action: ResumeAction) -> bool {
        self.post(SurfaceCommand::BindResume(action))
    }

    pub fn bind_close_handler(&self, handler: CloseHandler) -> bool {
        self.post(SurfaceCommand::BindCloseHandler(handler))
    }

    pub fn key(&self, key: KeyInput) -> bool {
        self.post(SurfaceCommand::Key(key))
    }

    pub fn process_exited(&self, exit_code: Option<i32>) -> bool {
        self.post(SurfaceCommand::ProcessExited { exit_code })
    }

    pub fn end_session(&self) -> bool {
        self.post(SurfaceCommand::EndSession)
    }
}

/// Display state owner. Lives on one thread; never shared.
pub struct RenderSurface {
    grid: TerminalGrid,
    buffer: DisplayBuffer,
    gate: ContinuationGate,
    title: String,
    geometry: WindowGeometry,
    font_family: String,
    font_sizes: SizeSequence,
    work_area: PixelArea,
    measurer: Box<dyn TextMeasurer>,
    close_handler: Option<CloseHandler>,
    exit_code: Option<i32>,
    session_ended: bool,
    commands: Receiver<SurfaceCommand>,
}

impl RenderSurface {
    /// Create the surface and its posting handle, sized with the monospace estimate.
    pub fn new(options: SurfaceOptions) -> (Self, SurfaceHandle) {
        Self::with_measurer(options, Box::new(MonospaceEstimate::default()))
    }

    pub fn with_measurer(
        options: SurfaceOptions,
        measurer: Box<dyn TextMeasurer>,
    ) -> (Self, SurfaceHandle) {
        let (tx, rx) = async_channel::unbounded();
        let columns = options.columns.max(1);
        let rows = options.rows.max(1);

        let mut surface = Self {
            grid: TerminalGrid {
                columns,
                rows,
                font_size: options.font_sizes.max_size,
            },
            buffer: DisplayBuffer::new(options.max_retained_lines),
            gate: ContinuationGate::new(),
            title: options.title,
            geometry: WindowGeometry::locked(
                PixelArea::new(MIN_CLIENT_WIDTH, MIN_CLIENT_HEIGHT),
                1,
                1,
            ),
            font_family: options.font_family,
            font_sizes: options.font_sizes,
            work_area: options.work_area,
            measurer,
            close_handler: None,
            exit_code: None,
            session_ended: false,
            commands: rx,
        };
        surface.apply_size(columns, rows);

        info!(
            columns,
            rows,
            font_size = surface.grid.font_size,
            width = surface.geometry.client.width,
            height = surface.geometry.client.height,
            "Render surface created"
        );
        (surface, SurfaceHandle { tx })
    }

    pub fn grid(&self) -> TerminalGrid {
        self.grid
    }

    pub fn buffer(&self) -> &DisplayBuffer {
        &self.buffer
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn status_region(&self) -> Option<StatusRegion> {
        self.buffer.status_region()
    }

    pub fn is_awaiting_continue(&self) -> bool {
        self.gate.is_awaiting()
    }

    pub fn gate(&self) -> &ContinuationGate {
        &self.gate
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn session_ended(&self) -> bool {
        self.session_ended
    }

    /// Lines inside the fixed viewport (the last `rows` lines).
    pub fn visible_lines(&self) -> Vec<StyledLine<'_>> {
        self.buffer.tail_lines(self.grid.rows as usize)
    }

    /// Receiver for draining from an async executor.
    pub fn commands(&self) -> Receiver<SurfaceCommand> {
        self.commands.clone()
    }

    /// Swap in a real text system once one exists. Callers re-run `apply_size`.
    pub fn set_measurer(&mut self, measurer: Box<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    pub fn set_work_area(&mut self, work_area: PixelArea) {
        self.work_area = work_area;
    }

    /// Apply one command on the owning context.
    pub fn apply(&mut self, command: SurfaceCommand) -> SurfaceUpdate {
        match command {
            SurfaceCommand::Append(event) => self.append(event),
            SurfaceCommand::ApplySize { columns, rows } => self.apply_size(columns, rows),
            SurfaceCommand::ShowContinue(prompt) => {
                self.show_continue(prompt);
                SurfaceUpdate::Unchanged
            }
            SurfaceCommand::BindResume(action) => {
                self.gate.bind_resume(action);
                SurfaceUpdate::Unchanged
            }
            SurfaceCommand::BindCloseHandler(handler) => {
                self.close_handler = Some(handler);
                SurfaceUpdate::Unchanged
            }
            SurfaceCommand::Key(key) => match self.handle_key(key) {
                KeyDisposition::Consumed => SurfaceUpdate::Content,
                KeyDisposition::PassThrough => SurfaceUpdate::Unchanged,
            },
            SurfaceCommand::ProcessExited { exit_code } => {
                info!(exit_code = ?exit_code, "Hosted process exited");
                self.exit_code = exit_code;
                self.gate.process_exited();
                SurfaceUpdate::Unchanged
            }
            SurfaceCommand::EndSession => {
                self.session_ended = true;
                SurfaceUpdate::SessionEnded
            }
        }
    }

    /// Apply everything currently queued without blocking.
    pub fn drain_pending(&mut self) -> Vec<SurfaceUpdate> {
        let mut updates = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            updates.push(self.apply(command));
        }
        updates
    }

    /// Block on the queue, applying commands until the session ends or every handle is dropped.
    pub fn run_until_ended(&mut self, mut observe: impl FnMut(&mut RenderSurface, SurfaceUpdate)) {
        while !self.session_ended {
            let Ok(command) = self.commands.recv_blocking() else {
                debug!("All surface handles dropped");
                break;
            };
            let update = self.apply(command);
            observe(self, update);
        }
    }

    pub fn append(&mut self, event: OutputEvent) -> SurfaceUpdate {
        match event {
            OutputEvent::TextLine {
                content,
                foreground,
                background,
                centered,
            } => {
                self.buffer.append_line(
                    &content,
                    foreground,
                    background,
                    Alignment::centered(centered),
                );
                SurfaceUpdate::Content
            }
            OutputEvent::StatusLine {
                content,
                foreground,
                centered,
            } => {
                self.buffer.write_status(
                    &content,
                    foreground,
                    ConsoleColor::Black,
                    Alignment::centered(centered),
                );
                SurfaceUpdate::Content
            }
            OutputEvent::ClearScreen => {
                self.buffer.clear();
                SurfaceUpdate::Content
            }
            OutputEvent::TitleChange { text } => {
                debug!(title = %text, "Window title changed");
                self.title = text;
                SurfaceUpdate::Title
            }
        }
    }

    /// Fit the font to the locked grid and lock the window to the resulting box.
    pub fn apply_size(&mut self, columns: u16, rows: u16) -> SurfaceUpdate {
        if (columns, rows) != (self.grid.columns, self.grid.rows) {
            warn!(
                requested_columns = columns,
                requested_rows = rows,
                columns = self.grid.columns,
                rows = self.grid.rows,
                "Grid dimensions are fixed; ignoring requested size"
            );
        }
        let (columns, rows) = (self.grid.columns, self.grid.rows);

        let fit = fit_font_size(
            self.measurer.as_ref(),
            &self.font_family,
            &self.font_sizes,
            columns,
            rows,
            PixelArea::available_in(self.work_area),
        );
        let grid = fit.metrics.grid_size(columns, rows);
        let client = PixelArea::new(
            grid.width.max(MIN_CLIENT_WIDTH),
            grid.height.max(MIN_CLIENT_HEIGHT),
        );

        self.grid.font_size = fit.size;
        let geometry =
            WindowGeometry::locked(client, fit.metrics.char_width, fit.metrics.line_height);
        if geometry == self.geometry {
            return SurfaceUpdate::Unchanged;
        }

        debug!(
            font_size = fit.size,
            char_width = fit.metrics.char_width,
            line_height = fit.metrics.line_height,
            width = client.width,
            height = client.height,
            "Applied window size"
        );
        self.geometry = geometry;
        SurfaceUpdate::Geometry
    }

    pub fn show_continue(&mut self, prompt_text: impl Into<String>) -> bool {
        self.gate.arm(prompt_text)
    }

    /// Route a keypress through the continuation gate.
    pub fn handle_key(&mut self, key: KeyInput) -> KeyDisposition {
        self.gate.handle_key(key)
    }

    /// The user asked to close the window. Runs the close handler; closing
    /// always proceeds.
    pub fn request_close(&mut self) {
        if let Some(handler) = self.close_handler.as_mut() {
            handler();
        }
    }
}

#[cfg(test)]
#[path = "../surface_tests.rs"]
mod tests;
