//! Drawing session: stroke state machine, undo history and dual-channel dispatch.
//!
//! Every stroke event goes out immediately on the direct channel. The wide
//! channel only ever carries whole raster snapshots, rate limited by
//! [`FrameThrottle`].

use std::time::Instant;

use telestrator_media::MediaError;
use telestrator_protocol::{DrawMessage, Point, Size};

use crate::error::Result;
use crate::geometry::{Geometry, GeometrySync, Padding};
use crate::history::{UndoStack, UndoStep};
use crate::input::{InputEvent, InputPhase, PointerKind};
use crate::surface::Surface;
use crate::throttle::FrameThrottle;
use crate::transport::OutboundChannel;

/// Rendered width for a requested line width. The same factor is applied to
/// local and replayed strokes.
pub fn stroke_width(line_width: f64) -> f64 {
    line_width * 5.0 + 1.0
}

/// A stroke between pointer-down and its matching pointer-up
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub pointer_id: i64,
    pub kind: PointerKind,
    /// Video-space points, including every coalesced sample
    pub points: Vec<Point>,
    pub color: String,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// A new stroke was opened
    Started,
    /// The active stroke grew; `sent` is the only point put on the wire
    Extended { sent: Point },
    /// The active stroke was closed and recorded in history
    Finished(Stroke),
    /// A pen took over: `finished` was closed first, then a new stroke opened
    Preempted { finished: Stroke },
    /// A second non-pen pointer while another is drawing
    Rejected,
    /// Nothing to do for this event
    Ignored,
}

/// What caused an undo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoTrigger {
    /// Button press or shortcut: the previous raster is shown again
    Interactive,
    /// Hover leaving the undo control: history is popped without repainting
    /// so an accidental hover does not flicker the canvas
    HoverOut,
}

pub struct DrawingSession<S: Surface> {
    surface: S,
    geometry: GeometrySync,
    remote_geometry: Option<Geometry>,
    history: UndoStack<S::Snapshot>,
    throttle: FrameThrottle,
    direct: Option<Box<dyn OutboundChannel>>,
    wide: Option<Box<dyn OutboundChannel>>,
    active: Option<Stroke>,
    /// Last local point, where the next segment starts
    pen_position: Point,
    line_color: String,
    line_width: f64,
    replay_style: (String, f64),
    /// End of the last replayed segment, while a remote stroke is open
    replay_position: Option<Point>,
}

impl<S: Surface> DrawingSession<S> {
    /// A local-only session; attach transports with [`DrawingSession::enable`].
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            geometry: GeometrySync::default(),
            remote_geometry: None,
            history: UndoStack::new(),
            throttle: FrameThrottle::default(),
            direct: None,
            wide: None,
            active: None,
            pen_position: Point::default(),
            line_color: "black".to_string(),
            line_width: 1.0,
            replay_style: ("black".to_string(), stroke_width(1.0)),
            replay_position: None,
        }
    }

    /// Attach the direct and wide channels. Either may be absent, in which
    /// case that side of replication is skipped.
    pub fn enable(
        &mut self,
        direct: Option<Box<dyn OutboundChannel>>,
        wide: Option<Box<dyn OutboundChannel>>,
    ) {
        if direct.is_none() || wide.is_none() {
            tracing::info!(
                direct = direct.is_some(),
                wide = wide.is_some(),
                "Drawing session running without full replication"
            );
        }
        self.direct = direct;
        self.wide = wide;
    }

    pub fn with_throttle(mut self, throttle: FrameThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.current()
    }

    /// Geometry announced by the last replayed `resize`.
    pub fn remote_geometry(&self) -> Option<&Geometry> {
        self.remote_geometry.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    pub fn tracked_pointer(&self) -> Option<(i64, PointerKind)> {
        self.active.as_ref().map(|s| (s.pointer_id, s.kind))
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn undo_cursor(&self) -> isize {
        self.history.cursor()
    }

    pub fn set_line_color(&mut self, color: impl Into<String>) {
        self.line_color = color.into();
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    // --- Input -----------------------------------------------------------

    /// Feed one canonical input event.
    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> InputOutcome {
        match event.phase {
            InputPhase::Down => self.pointer_down(event, now),
            InputPhase::Move => self.pointer_move(event, now),
            phase if phase.is_stop() => self.pointer_stop(event, now),
            _ => InputOutcome::Ignored,
        }
    }

    fn pointer_down(&mut self, event: &InputEvent, now: Instant) -> InputOutcome {
        let mut preempted = None;

        if let Some(active) = &self.active {
            if active.pointer_id == event.pointer_id {
                return InputOutcome::Ignored;
            }
            if !event.kind.is_pen() {
                tracing::trace!(
                    pointer = event.pointer_id,
                    tracked = active.pointer_id,
                    "Rejecting second pointer"
                );
                return InputOutcome::Rejected;
            }
            preempted = self.finish_stroke(now);
        }

        let point = self.geometry.to_video(event.position());
        self.surface.begin_path();
        self.surface.move_to(point);
        self.pen_position = point;
        self.active = Some(Stroke {
            pointer_id: event.pointer_id,
            kind: event.kind,
            points: vec![point],
            color: self.line_color.clone(),
            line_width: self.line_width,
        });

        self.dispatch(Some(DrawMessage::start(point)), false, now);

        match preempted {
            Some(finished) => InputOutcome::Preempted { finished },
            None => InputOutcome::Started,
        }
    }

    fn pointer_move(&mut self, event: &InputEvent, now: Instant) -> InputOutcome {
        let Some(active) = self.active.as_mut() else {
            return InputOutcome::Ignored;
        };
        if active.pointer_id != event.pointer_id {
            return InputOutcome::Ignored;
        }

        let width = stroke_width(self.line_width);
        self.surface.begin_path();
        self.surface.move_to(self.pen_position);
        for sample in &event.samples {
            let point = self.geometry.to_video(*sample);
            self.surface.line_to(point);
            active.points.push(point);
            self.pen_position = point;
        }
        self.surface.stroke(&self.line_color, width);

        // Only the newest sample is replicated
        let sent = self.pen_position;
        let message = DrawMessage::move_to(sent, self.line_color.clone(), self.line_width);
        self.dispatch(Some(message), false, now);

        InputOutcome::Extended { sent }
    }

    fn pointer_stop(&mut self, event: &InputEvent, now: Instant) -> InputOutcome {
        if let Some(active) = &self.active {
            if active.pointer_id != event.pointer_id {
                return InputOutcome::Ignored;
            }
        }
        match self.finish_stroke(now) {
            Some(stroke) => InputOutcome::Finished(stroke),
            None => InputOutcome::Ignored,
        }
    }

    /// Close the active stroke, record it and announce it.
    fn finish_stroke(&mut self, now: Instant) -> Option<Stroke> {
        let stroke = self.active.take()?;

        self.surface.stroke(&self.line_color, stroke_width(self.line_width));
        self.surface.close_path();
        self.history.push(self.surface.snapshot());

        tracing::debug!(
            pointer = stroke.pointer_id,
            points = stroke.points.len(),
            history = self.history.len(),
            "Stroke finished"
        );

        self.dispatch(Some(DrawMessage::Stop), true, now);
        Some(stroke)
    }

    // --- History ---------------------------------------------------------

    pub fn undo(&mut self, trigger: UndoTrigger, now: Instant) {
        match self.history.undo() {
            UndoStep::Cleared => self.surface.clear(),
            UndoStep::Restore(snapshot) => {
                if trigger == UndoTrigger::Interactive {
                    self.surface.restore(snapshot);
                }
            }
        }
        self.dispatch(None, true, now);
    }

    pub fn clear(&mut self, now: Instant) {
        self.surface.clear();
        self.history.clear();
        self.dispatch(None, true, now);
    }

    // --- Geometry --------------------------------------------------------

    /// The source video or the viewport changed size.
    pub fn resize(&mut self, intrinsic: Size, available: Size, now: Instant) -> Option<Geometry> {
        let previous = self.geometry.clone();
        let Some(geometry) = self.geometry.on_resize(intrinsic, available) else {
            tracing::debug!(?intrinsic, ?available, "Ignoring resize to an empty size");
            return None;
        };
        self.apply_geometry(geometry, previous, now)
    }

    /// Change the offset/inset padding and recompute with the last sizes.
    pub fn set_padding(&mut self, padding: Padding, now: Instant) -> Option<Geometry> {
        let previous = self.geometry.clone();
        let geometry = self.geometry.set_padding(padding)?;
        self.apply_geometry(geometry, previous, now)
    }

    /// Size the surface for `geometry` and announce it. If the surface cannot
    /// take that size the sync state goes back to `previous` and nothing is sent.
    fn apply_geometry(
        &mut self,
        geometry: Geometry,
        previous: GeometrySync,
        now: Instant,
    ) -> Option<Geometry> {
        if let Err(e) = resize_surface(&mut self.surface, &geometry) {
            tracing::warn!("Ignoring resize: {}", e);
            self.geometry = previous;
            return None;
        }
        self.dispatch(Some(geometry.resize_message()), false, now);
        Some(geometry)
    }

    // --- Remote replay ---------------------------------------------------

    /// Replay a stroke event received from a peer. Coordinates are already
    /// in the sender's video space.
    pub fn draw_remote(&mut self, message: &DrawMessage) {
        match message {
            DrawMessage::Resize {
                width,
                height,
                video_width,
                video_height,
            } => {
                let displayed = Size::new(*width, *height);
                let intrinsic = Size::new(*video_width, *video_height);
                let Some(geometry) = Geometry::from_remote(displayed, intrinsic) else {
                    tracing::debug!(?displayed, ?intrinsic, "Ignoring remote resize to an empty size");
                    return;
                };
                match resize_surface(&mut self.surface, &geometry) {
                    Ok(()) => {
                        self.remote_geometry = Some(geometry);
                        self.replay_position = None;
                    }
                    Err(e) => tracing::warn!("Ignoring remote resize: {}", e),
                }
            }
            DrawMessage::Start { x, y } => {
                let point = Point::new(*x, *y);
                self.surface.begin_path();
                self.surface.move_to(point);
                self.replay_position = Some(point);
            }
            DrawMessage::Move {
                x,
                y,
                stroke_style,
                line_width,
            } => {
                let point = Point::new(*x, *y);
                self.replay_style = (stroke_style.clone(), stroke_width(*line_width));
                // Only the newest segment is stroked; round caps hide the seams
                self.surface.begin_path();
                match self.replay_position.replace(point) {
                    Some(last) => {
                        self.surface.move_to(last);
                        self.surface.line_to(point);
                        self.surface.stroke(&self.replay_style.0, self.replay_style.1);
                    }
                    None => self.surface.move_to(point),
                }
            }
            DrawMessage::Stop => {
                self.surface.stroke(&self.replay_style.0, self.replay_style.1);
                self.surface.close_path();
                self.replay_position = None;
            }
        }
    }

    /// Parse and replay a direct-channel text frame.
    pub fn apply_remote_text(&mut self, text: &str) -> Result<()> {
        let message: DrawMessage = serde_json::from_str(text)?;
        self.draw_remote(&message);
        Ok(())
    }

    // --- Dispatch --------------------------------------------------------

    /// Send `message` on the direct channel and schedule a wide snapshot.
    fn dispatch(&mut self, message: Option<DrawMessage>, redundant: bool, now: Instant) {
        if let (Some(direct), Some(message)) = (self.direct.as_mut(), message) {
            match serde_json::to_string(&message) {
                Ok(json) => {
                    if let Err(e) = direct.send_text(json) {
                        tracing::debug!("Direct channel send failed: {}", e);
                    }
                }
                Err(e) => tracing::error!("Failed to serialize draw message: {}", e),
            }
        }

        if self.wide.is_some() {
            self.throttle.request(now, redundant);
        }
    }

    /// When the next wide-channel snapshot is due, if one is scheduled.
    pub fn next_wide_deadline(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// Send the scheduled snapshot if it is due. The raster is captured now,
    /// not when the send was requested. Returns the number of frames sent.
    pub fn poll_wide(&mut self, now: Instant) -> usize {
        let Some(copies) = self.throttle.poll(now) else {
            return 0;
        };
        let Some(wide) = self.wide.as_mut() else {
            return 0;
        };

        let frame = match self.surface.encode_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to encode snapshot: {}", e);
                return 0;
            }
        };

        let mut sent = 0;
        for _ in 0..copies {
            match wide.send_text(frame.clone()) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::debug!("Wide channel send failed: {}", e);
                    break;
                }
            }
        }
        sent
    }
}

/// Resize `surface` to the geometry's backing store and apply its scale.
fn resize_surface<S: Surface>(surface: &mut S, geometry: &Geometry) -> Result<()> {
    let (width, height) = geometry
        .surface_pixels()
        .ok_or(MediaError::SurfaceTooLarge {
            width: geometry.surface.width as u32,
            height: geometry.surface.height as u32,
        })?;
    surface.resize(width, height)?;
    surface.set_scale(geometry.scale.x, geometry.scale.y);
    Ok(())
}
