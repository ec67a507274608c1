//! gpui window front end
//!
//! One fixed-size, non-resizable window showing the last `rows` lines of the
//! surface. The surface lives inside the window's view; an async task on the
//! UI executor drains the surface's command queue and applies each command
//! through the view, so display state is only ever touched on the UI thread.

use std::sync::Arc;

use gpui::{
    div, font, prelude::*, px, rgb, size, App, Application, Bounds, Context, FocusHandle,
    Focusable, Hsla, IntoElement, KeyDownEvent, Render, SharedString, TextRun, TitlebarOptions,
    Window, WindowBounds, WindowHandle, WindowOptions, WindowTextSystem,
};
use tracing::{error, info, warn};

use crate::continuation::{KeyDisposition, KeyInput};
use crate::error::HostError;
use crate::font_fit::{TextExtent, TextMeasurer, PIXELS_PER_POINT};
use crate::logging;
use crate::platform::{self, PlatformChrome};
use crate::protocol::{ConsoleColor, OutputEvent};
use crate::supervisor::{LaunchSpec, ProcessSupervisor};
use crate::surface::{Alignment, RenderSurface, SurfaceCommand, SurfaceOptions, SurfaceUpdate};

/// Everything needed to open the window and start the child.
pub struct WindowSession {
    pub surface: SurfaceOptions,
    /// Launch spec, or the error that prevented building one
    pub launch: Result<LaunchSpec, HostError>,
    pub prompt_marker: String,
}

/// Measures with the window's text system. The measured glyph height becomes
/// the surface's line height, which rendering uses as-is.
struct GpuiMeasurer {
    text_system: Arc<WindowTextSystem>,
}

impl TextMeasurer for GpuiMeasurer {
    fn measure(&self, text: &str, family: &str, size: f32) -> TextExtent {
        let font_size = px(size * PIXELS_PER_POINT);
        let run = TextRun {
            len: text.len(),
            font: font(family.to_string()),
            color: Hsla::white(),
            background_color: None,
            underline: None,
            strikethrough: None,
        };
        let line = self.text_system.shape_line(
            SharedString::from(text.to_string()),
            font_size,
            &[run],
            None,
        );
        TextExtent::from_line_metrics(
            f32::from(line.width),
            f32::from(line.ascent),
            f32::from(line.descent),
        )
    }
}

pub struct HostWindow {
    surface: RenderSurface,
    focus_handle: FocusHandle,
}

impl HostWindow {
    fn new(
        mut surface: RenderSurface,
        chrome: &dyn PlatformChrome,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        surface.set_measurer(Box::new(GpuiMeasurer {
            text_system: window.text_system().clone(),
        }));
        if let Some(work_area) = chrome.work_area() {
            surface.set_work_area(work_area);
        }
        let grid = surface.grid();
        if surface.apply_size(grid.columns(), grid.rows()) == SurfaceUpdate::Geometry {
            Self::resize_to_surface(&surface, window);
        }

        let this = cx.weak_entity();
        window.on_window_should_close(cx, move |_window, cx| {
            // The view may already be gone; closing proceeds either way
            let _ = this.update(cx, |view, _cx| view.surface.request_close());
            true
        });

        Self {
            surface,
            focus_handle: cx.focus_handle(),
        }
    }

    fn resize_to_surface(surface: &RenderSurface, window: &mut Window) {
        let client = surface.geometry().client;
        window.resize(size(px(client.width as f32), px(client.height as f32)));
    }

    /// Apply one queued command. Returns true once the session has ended.
    fn apply_command(
        &mut self,
        command: SurfaceCommand,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        match self.surface.apply(command) {
            SurfaceUpdate::Unchanged => {}
            SurfaceUpdate::Content => cx.notify(),
            SurfaceUpdate::Title => window.set_window_title(self.surface.title()),
            SurfaceUpdate::Geometry => {
                Self::resize_to_surface(&self.surface, window);
                cx.notify();
            }
            SurfaceUpdate::SessionEnded => return true,
        }
        false
    }

    fn on_key(&mut self, event: &KeyDownEvent, cx: &mut Context<Self>) {
        let key = match event.keystroke.key.as_str() {
            "enter" | "return" => KeyInput::Enter,
            _ => KeyInput::Other,
        };
        if self.surface.handle_key(key) == KeyDisposition::Consumed {
            cx.stop_propagation();
            cx.notify();
        }
    }

    fn render_line(
        &self,
        text: &str,
        foreground: ConsoleColor,
        background: ConsoleColor,
        alignment: Alignment,
    ) -> impl IntoElement {
        let line_height = self.surface.geometry().line_height as f32;
        div()
            .w_full()
            .h(px(line_height))
            .flex()
            .flex_row()
            .when(alignment == Alignment::Center, |d| d.justify_center())
            .bg(rgb(background.rgb()))
            .text_color(rgb(foreground.rgb()))
            .whitespace_nowrap()
            .overflow_hidden()
            .child(SharedString::from(text.to_string()))
    }
}

impl Focusable for HostWindow {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for HostWindow {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let geometry = self.surface.geometry();
        let font_px = self.surface.grid().font_size() * PIXELS_PER_POINT;

        div()
            .flex()
            .flex_col()
            .size_full()
            .bg(rgb(ConsoleColor::Black.rgb()))
            .font_family(SharedString::from(self.surface.font_family().to_string()))
            .text_size(px(font_px))
            .line_height(px(geometry.line_height as f32))
            .track_focus(&self.focus_handle)
            .on_key_down(cx.listener(|this, event: &KeyDownEvent, _window, cx| {
                this.on_key(event, cx);
            }))
            .children(self.surface.visible_lines().into_iter().map(|line| {
                self.render_line(line.text, line.foreground, line.background, line.alignment)
            }))
    }
}

/// Open the host window, start the child and run the UI loop until the session ends.
pub fn run(session: WindowSession) -> anyhow::Result<()> {
    Application::new().run(move |cx: &mut App| {
        if let Err(e) = open(session, cx) {
            error!(error = %e, "Failed to open host window");
            cx.quit();
        }
    });
    Ok(())
}

fn open(session: WindowSession, cx: &mut App) -> Result<(), HostError> {
    let chrome = platform::native_chrome();
    chrome.apply_dark_appearance();
    info!(chrome = chrome.name(), "Opening host window");

    let (surface, handle) = RenderSurface::new(session.surface);
    let commands = surface.commands();
    let client = surface.geometry().client;
    let window_size = size(px(client.width as f32), px(client.height as f32));

    let window: WindowHandle<HostWindow> = cx
        .open_window(
            WindowOptions {
                window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                    None,
                    window_size,
                    cx,
                ))),
                titlebar: Some(TitlebarOptions {
                    title: Some(surface.title().to_string().into()),
                    ..Default::default()
                }),
                is_resizable: false,
                window_min_size: Some(window_size),
                focus: true,
                show: true,
                ..Default::default()
            },
            |window, cx| cx.new(|cx| HostWindow::new(surface, chrome.as_ref(), window, cx)),
        )
        .map_err(|e| HostError::Window(e.to_string()))?;

    window
        .update(cx, |view: &mut HostWindow, window: &mut Window, cx: &mut Context<HostWindow>| {
            let focus_handle = view.focus_handle(cx);
            window.focus(&focus_handle, cx);
        })
        .map_err(|e| HostError::Window(e.to_string()))?;
    cx.activate(true);

    // Drain the surface queue on the UI executor
    let window_for_queue = window;
    cx.spawn(async move |cx: &mut gpui::AsyncApp| {
        while let Ok(command) = commands.recv().await {
            let ended = cx.update(|cx| {
                window_for_queue.update(
                    cx,
                    |view: &mut HostWindow, window: &mut Window, cx: &mut Context<HostWindow>| {
                        let ended = view.apply_command(command, window, cx);
                        if ended {
                            window.remove_window();
                        }
                        ended
                    },
                )
            });
            match ended {
                Ok(Ok(false)) => {}
                Ok(Ok(true)) => {
                    info!("Session ended, closing window");
                    let _ = cx.update(|cx| cx.quit());
                    break;
                }
                _ => {
                    // Closed by the user; the child has been told to terminate
                    warn!("Host window gone, stopping queue");
                    let _ = cx.update(|cx| cx.quit());
                    break;
                }
            }
        }
    })
    .detach();

    match session.launch {
        Ok(spec) => {
            let supervisor =
                ProcessSupervisor::new(handle).with_prompt_marker(session.prompt_marker);
            if let Err(e) = supervisor.spawn(spec) {
                logging::log("EXEC", &format!("Failed to start supervisor thread: {}", e));
                return Err(HostError::Window(e.to_string()));
            }
        }
        Err(e) => {
            // Window stays open showing the failure
            error!(error = %e, "Cannot launch script");
            handle.append(OutputEvent::text(e.user_message(), ConsoleColor::Red));
        }
    }
    Ok(())
}
