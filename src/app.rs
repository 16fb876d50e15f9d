use crate::canvas::{MindmapCanvas, RegenerationOutcome, RegenerationTicket};
use crate::config::AppConfig;
use crate::generate::{truncate_label, GenerationError};
use crate::model::{MindmapNode, NodeId, PositionedNode};
use crate::source::MapSource;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq)]
pub enum AppMode {
    Normal,
    Help,
}

/// A node held by the mouse, with the grab point relative to the node origin
/// so it does not jump under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGrab {
    pub node_id: NodeId,
    pub offset_x: f64,
    pub offset_y: f64,
}

type RegenerationMessage = (
    RegenerationTicket,
    Result<Vec<MindmapNode>, GenerationError>,
);

pub struct AppState {
    pub running: bool,
    pub mode: AppMode,
    pub canvas: MindmapCanvas,
    pub config: AppConfig,
    pub source: Option<MapSource>,

    // Viewport state, in terminal cells
    pub viewport_top: f64,
    pub viewport_left: f64,
    pub terminal_width: u16,
    pub terminal_height: u16,

    // Pointer state
    pub hovered: Option<NodeId>,
    pub grab: Option<DragGrab>,

    // Message for status line
    pub message: Option<String>,

    regen_tx: Sender<RegenerationMessage>,
    regen_rx: Receiver<RegenerationMessage>,
}

impl AppState {
    pub fn new(config: AppConfig, canonical: Vec<MindmapNode>) -> Self {
        let canvas =
            MindmapCanvas::with_capacity(canonical, config.layout_settings(), config.max_history);
        let (regen_tx, regen_rx) = mpsc::channel();

        Self {
            running: true,
            mode: AppMode::Normal,
            canvas,
            config,
            source: None,
            viewport_top: 0.0,
            viewport_left: 0.0,
            terminal_width: 80,
            terminal_height: 24,
            hovered: None,
            grab: None,
            message: None,
            regen_tx,
            regen_rx,
        }
    }

    pub fn with_source(mut self, source: MapSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    // --- Geometry ---

    /// Rows available to the map; the last row is the status line.
    pub fn map_height(&self) -> u16 {
        self.terminal_height.saturating_sub(1)
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (i32, i32) {
        let col = f64::from(self.terminal_width) / 2.0 + x * self.config.zoom_x - self.viewport_left;
        let row = f64::from(self.map_height()) / 2.0 + y * self.config.zoom_y - self.viewport_top;
        (col.round() as i32, row.round() as i32)
    }

    pub fn to_world(&self, col: u16, row: u16) -> (f64, f64) {
        let x = (f64::from(col) + self.viewport_left - f64::from(self.terminal_width) / 2.0)
            / self.config.zoom_x;
        let y = (f64::from(row) + self.viewport_top - f64::from(self.map_height()) / 2.0)
            / self.config.zoom_y;
        (x, y)
    }

    pub fn display_label(&self, node: &PositionedNode) -> String {
        truncate_label(&node.label, self.config.max_label_width)
    }

    /// Start column, row and width of a node's label on screen. Labels are
    /// centred on the node position.
    pub fn label_span(&self, node: &PositionedNode) -> (i32, i32, usize) {
        let width = UnicodeWidthStr::width(self.display_label(node).as_str());
        let (col, row) = self.to_screen(node.x, node.y);
        (col - (width / 2) as i32, row, width)
    }

    /// Topmost node under a screen cell.
    pub fn node_at(&self, col: u16, row: u16) -> Option<NodeId> {
        let (col, row) = (i32::from(col), i32::from(row));
        self.canvas
            .draw_order()
            .into_iter()
            .rev()
            .find(|node| {
                let (start, node_row, width) = self.label_span(node);
                node_row == row && col >= start && col < start + width as i32
            })
            .map(|node| node.id.clone())
    }

    // --- Regeneration ---

    /// Spawns a worker that rebuilds the mindmap from its source. Returns false
    /// when there is nothing to regenerate from.
    pub fn start_regeneration(&mut self) -> bool {
        let Some(source) = self.source.clone() else {
            return false;
        };

        let ticket = self.canvas.request_regeneration();
        let tx = self.regen_tx.clone();
        let config = self.config.clone();
        thread::spawn(move || {
            let result = source.regenerate(&config);
            // Receiver only goes away on shutdown
            let _ = tx.send((ticket, result));
        });

        debug!(ticket = ticket.sequence(), "regeneration started");
        true
    }

    /// Applies finished regenerations. Results for superseded requests are
    /// dropped by the canvas.
    pub fn poll_regeneration(&mut self) {
        while let Ok((ticket, result)) = self.regen_rx.try_recv() {
            match self.canvas.finish_regeneration(ticket, result) {
                Ok(RegenerationOutcome::Applied) => {
                    self.hovered = None;
                    self.grab = None;
                    let count = self.canvas.nodes().len();
                    self.set_message(format!("Regenerated mindmap ({count} nodes)"));
                }
                Ok(RegenerationOutcome::Stale) => {}
                Err(err) => {
                    warn!(error = %err, "regeneration failed");
                    self.set_message("Failed to regenerate mindmap");
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn deliver_regeneration(
        &self,
        ticket: RegenerationTicket,
        result: Result<Vec<MindmapNode>, GenerationError>,
    ) {
        let _ = self.regen_tx.send((ticket, result));
    }
}
