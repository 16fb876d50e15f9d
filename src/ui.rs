use crate::app::{AppMode, AppState};
use crate::model::{Edge, HandleSide, PositionedNode};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

type CharBuffer = Vec<Vec<char>>;
type StyleBuffer = Vec<Vec<Style>>;

// Second half of a double-width character
const WIDE_CONTINUATION: char = '\0';

mod junction {
    pub const HORIZONTAL: char = '─';
    pub const VERTICAL: char = '│';
    pub const TOP_LEFT: char = '╭';
    pub const TOP_RIGHT: char = '╮';
    pub const BOTTOM_LEFT: char = '╰';
    pub const BOTTOM_RIGHT: char = '╯';
}

mod help {
    pub struct HelpSection {
        pub title: &'static str,
        pub items: &'static [(&'static str, &'static str)],
    }

    pub const SECTIONS: &[HelpSection] = &[
        HelpSection {
            title: "Mouse:",
            items: &[
                ("hover  ", "Highlight ancestors and descendants"),
                ("drag   ", "Move a node"),
            ],
        },
        HelpSection {
            title: "History:",
            items: &[
                ("u/^z   ", "Undo"),
                ("^r/^y  ", "Redo"),
                ("r      ", "Reset layout"),
            ],
        },
        HelpSection {
            title: "View:",
            items: &[
                ("h/←    ", "Pan left"),
                ("j/↓    ", "Pan down"),
                ("k/↑    ", "Pan up"),
                ("l/→    ", "Pan right"),
                ("c      ", "Center view"),
            ],
        },
        HelpSection {
            title: "Mindmap:",
            items: &[
                ("g      ", "Regenerate from source"),
                ("?      ", "Help"),
                ("q      ", "Quit"),
            ],
        },
    ];
}

pub fn render(frame: &mut Frame, app: &mut AppState) {
    // Update terminal size
    let size = frame.area();
    app.terminal_width = size.width;
    app.terminal_height = size.height;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(size);

    match &app.mode {
        AppMode::Help => HelpRenderer::render(frame, chunks[0]),
        AppMode::Normal => MindmapRenderer::new(app).render(frame, chunks[0]),
    }

    StatusLineRenderer::render(frame, app, chunks[1]);
}

// Buffer canvas for drawing characters and styles
struct BufferCanvas {
    char_buffer: CharBuffer,
    style_buffer: StyleBuffer,
    width: usize,
    height: usize,
}

impl BufferCanvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            char_buffer: vec![vec![' '; width]; height],
            style_buffer: vec![vec![Style::default(); width]; height],
            width,
            height,
        }
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn set_char(&mut self, x: i32, y: i32, ch: char, style: Style) {
        if self.in_bounds(x, y) {
            self.char_buffer[y as usize][x as usize] = ch;
            self.style_buffer[y as usize][x as usize] = style;
        }
    }

    fn draw_styled_text(&mut self, x: i32, y: i32, text: &str, style: Style) {
        let mut col = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0) as i32;
            if width == 0 {
                continue;
            }
            // A wide char must fit whole or not at all
            if width == 2 && !self.in_bounds(col + 1, y) {
                break;
            }
            self.set_char(col, y, ch, style);
            if width == 2 {
                self.set_char(col + 1, y, WIDE_CONTINUATION, style);
            }
            col += width;
        }
    }

    fn hline(&mut self, from: i32, to: i32, y: i32, style: Style) {
        for x in from.min(to)..=from.max(to) {
            self.set_char(x, y, junction::HORIZONTAL, style);
        }
    }

    fn vline(&mut self, x: i32, from: i32, to: i32, style: Style) {
        for y in from.min(to) + 1..from.max(to) {
            self.set_char(x, y, junction::VERTICAL, style);
        }
    }

    /// Draws a horizontal-vertical-horizontal connector between two cells and
    /// returns the column where it turns.
    fn draw_elbow(&mut self, from: (i32, i32), to: (i32, i32), style: Style) -> i32 {
        let ((fx, fy), (tx, ty)) = (from, to);
        let mid = (fx + tx) / 2;

        self.hline(fx, mid, fy, style);
        self.hline(mid, tx, ty, style);

        if fy != ty {
            let rightward = tx >= fx;
            let downward = ty > fy;
            let (turn_out, turn_in) = match (rightward, downward) {
                (true, true) => (junction::TOP_RIGHT, junction::BOTTOM_LEFT),
                (true, false) => (junction::BOTTOM_RIGHT, junction::TOP_LEFT),
                (false, true) => (junction::TOP_LEFT, junction::BOTTOM_RIGHT),
                (false, false) => (junction::BOTTOM_LEFT, junction::TOP_RIGHT),
            };
            self.vline(mid, fy, ty, style);
            self.set_char(mid, fy, turn_out, style);
            self.set_char(mid, ty, turn_in, style);
        }

        mid
    }

    fn to_lines(&self) -> Vec<Line<'_>> {
        let mut lines = Vec::new();

        for (y, row) in self.char_buffer.iter().enumerate() {
            let mut spans = Vec::new();
            let mut current_style = Style::default();
            let mut current_text = String::new();

            for (x, &ch) in row.iter().enumerate() {
                if ch == WIDE_CONTINUATION {
                    continue;
                }
                let style = self.style_buffer[y][x];
                if style != current_style {
                    if !current_text.is_empty() {
                        spans.push(Span::styled(current_text.clone(), current_style));
                        current_text.clear();
                    }
                    current_style = style;
                }
                current_text.push(ch);
            }

            if !current_text.is_empty() {
                spans.push(Span::styled(current_text, current_style));
            }

            lines.push(Line::from(spans));
        }

        lines
    }
}

struct MindmapRenderer<'a> {
    app: &'a AppState,
}

impl<'a> MindmapRenderer<'a> {
    fn new(app: &'a AppState) -> Self {
        Self { app }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let mut canvas = BufferCanvas::new(area.width as usize, area.height as usize);

        // Edges first so labels sit on top
        for edge in self.app.canvas.edges() {
            self.draw_edge(&mut canvas, edge);
        }
        for node in self.app.canvas.draw_order() {
            self.draw_node(&mut canvas, node);
        }

        let paragraph = Paragraph::new(canvas.to_lines());
        frame.render_widget(paragraph, area);
    }

    fn draw_edge(&self, canvas: &mut BufferCanvas, edge: &Edge) {
        let (Some(source), Some(target)) = (
            self.app.canvas.node(&edge.source_id),
            self.app.canvas.node(&edge.target_id),
        ) else {
            return;
        };

        let from = self.handle_cell(source, edge.source_handle_side);
        let to = self.handle_cell(target, edge.target_handle_side);
        let animated = self.app.canvas.is_animated(&edge.id);
        let style = if animated {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let mid = canvas.draw_elbow(from, to, style);

        if !self.app.config.show_edge_labels {
            return;
        }
        let Some(ref label) = edge.label else {
            return;
        };

        // Label goes on the target-side run, if it fits between the turn and
        // the target
        let (left, right) = (mid.min(to.0) + 1, mid.max(to.0) - 1);
        let room = right - left + 1;
        let width = UnicodeWidthStr::width(label.as_str()) as i32;
        if width > 0 && width <= room {
            let start = left + (room - width) / 2;
            let label_style = if animated {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC)
            };
            canvas.draw_styled_text(start, to.1, label, label_style);
        }
    }

    /// The cell just outside a node's label on the given side.
    fn handle_cell(&self, node: &PositionedNode, side: HandleSide) -> (i32, i32) {
        let (start, row, width) = self.app.label_span(node);
        match side {
            HandleSide::Left => (start - 1, row),
            HandleSide::Right => (start + width as i32, row),
        }
    }

    fn draw_node(&self, canvas: &mut BufferCanvas, node: &PositionedNode) {
        let (start, row, _) = self.app.label_span(node);
        let label = self.app.display_label(node);
        canvas.draw_styled_text(start, row, &label, self.node_style(node));
    }

    fn node_style(&self, node: &PositionedNode) -> Style {
        let grabbed = self
            .app
            .grab
            .as_ref()
            .is_some_and(|grab| grab.node_id == node.id);

        if grabbed {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if self.app.hovered.as_deref() == Some(node.id.as_str()) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if self.app.canvas.is_active(&node.id) {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if node.level == 0 {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }
}

struct StatusLineRenderer;

impl StatusLineRenderer {
    fn render(frame: &mut Frame, app: &AppState, area: Rect) {
        let (content, style) = match &app.mode {
            AppMode::Normal => Self::render_normal_mode(app),
            AppMode::Help => Self::render_help_mode(),
        };

        let paragraph = Paragraph::new(content).style(style);
        frame.render_widget(paragraph, area);
    }

    fn render_normal_mode(app: &AppState) -> (String, Style) {
        if let Some(ref msg) = app.message {
            let style = Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD);
            return (msg.clone(), style);
        }

        let history = app.canvas.history();
        let mut parts = vec![
            format!("mindmap | {} nodes", app.canvas.nodes().len()),
            format!("history {}/{}", history.cursor() + 1, history.len()),
        ];

        let orphans = app.canvas.diagnostics().orphans.len();
        if orphans > 0 {
            parts.push(format!("{orphans} unplaced"));
        }
        if app.canvas.is_regenerating() {
            parts.push("regenerating...".to_string());
        }
        if let Some(node) = app.hovered.as_deref().and_then(|id| app.canvas.node(id)) {
            parts.push(node.label.clone());
        }

        (
            parts.join(" | "),
            Style::default().fg(Color::Gray).bg(Color::Black),
        )
    }

    fn render_help_mode() -> (String, Style) {
        let content = String::from("Press ESC or q to close help");
        let style = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        (content, style)
    }
}

struct HelpRenderer;

impl HelpRenderer {
    fn render(frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(" Help ");
        let paragraph = Paragraph::new(Self::build_help_text())
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }

    fn build_help_text() -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![Span::styled(
                "Mindmap Viewer Help",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];

        for section in help::SECTIONS {
            lines.push(Line::from(vec![Span::styled(
                section.title,
                Style::default().add_modifier(Modifier::BOLD),
            )]));

            for (key, desc) in section.items {
                lines.push(Line::from(format!("  {}  {}", key, desc)));
            }

            lines.push(Line::from(""));
        }

        lines
    }
}
