use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use webbrowser::Browser;

use stroll::{
    app::App,
    narration::NarrationKind,
    scheduler::NarrationDispatcher,
    util::{format_distance, format_eta},
    WalkState,
};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

/// Whole-screen view of a walk.
pub struct WalkScreen<'a, D: NarrationDispatcher> {
    app: &'a App<D>,
}

impl<'a, D: NarrationDispatcher> WalkScreen<'a, D> {
    pub fn new(app: &'a App<D>) -> Self {
        Self { app }
    }
}

impl<D: NarrationDispatcher> Widget for WalkScreen<'_, D> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let sim = &app.sim;

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let state_style = match sim.state() {
            WalkState::Walking => Style::default().patch(bold_style).fg(Color::Green),
            WalkState::Paused => Style::default().patch(bold_style).fg(Color::Yellow),
            WalkState::Stopped => Style::default().patch(bold_style).fg(Color::Gray),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(4), // status
                    Constraint::Length(3), // progress
                    Constraint::Min(3),    // narration log
                    Constraint::Length(1), // legend
                ]
                .as_ref(),
            )
            .split(area);

        let position = sim
            .position()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let eta = sim
            .eta()
            .map(format_eta)
            .unwrap_or_else(|| "-".to_string());

        let status_lines = vec![
            Line::from(vec![
                Span::styled(sim.state().to_string().to_uppercase(), state_style),
                Span::raw("   "),
                Span::styled(format!("{:.1} km/h", sim.pace()), bold_style),
                Span::raw("   "),
                Span::styled(
                    if sim.narration_in_flight() {
                        "narrating..."
                    } else {
                        ""
                    },
                    italic_style,
                ),
            ]),
            Line::from(vec![
                Span::styled("at ", dim_style),
                Span::raw(position),
                Span::styled("   segment ", dim_style),
                Span::raw(sim.segment_index().to_string()),
                Span::styled("   remaining ", dim_style),
                Span::raw(format_distance(sim.remaining_distance())),
                Span::styled("   eta ", dim_style),
                Span::raw(eta),
            ]),
        ];

        Paragraph::new(status_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" stroll: {} ", app.route_label)),
            )
            .render(chunks[0], buf);

        let total = sim.route().map(|r| r.total_distance()).unwrap_or(0.0);
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" progress "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(sim.progress())
            .label(format!(
                "{} of {} ({:.0}%)",
                format_distance(sim.distance_traveled()),
                format_distance(total),
                sim.progress() * 100.0
            ))
            .render(chunks[1], buf);

        let log_lines: Vec<Line> = if sim.log().is_empty() {
            vec![Line::from(Span::styled(
                "Press Enter to start walking.",
                Style::default().patch(italic_style).fg(Color::Gray),
            ))]
        } else {
            sim.session()
                .recent_log()
                .map(|ev| {
                    let style = match ev.kind {
                        NarrationKind::Commentary => Style::default(),
                        NarrationKind::Failure => Style::default().fg(Color::Red),
                    };
                    Line::from(vec![
                        Span::styled(format!("{} ", ev.timestamp.format("%H:%M:%S")), dim_style),
                        Span::styled(ev.message.clone(), style),
                    ])
                })
                .collect()
        };

        Paragraph::new(log_lines)
            .block(Block::default().borders(Borders::ALL).title(" narration "))
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let legend = match &app.status {
            Some(msg) => Paragraph::new(Span::styled(
                msg.clone(),
                Style::default().fg(Color::Red).patch(italic_style),
            )),
            None => Paragraph::new(Span::styled(
                String::from(if Browser::is_available() {
                    "(enter) start / (space) pause-continue / (x) stop / (+/-) pace / (o)pen map / (q)uit"
                } else {
                    "(enter) start / (space) pause-continue / (x) stop / (+/-) pace / (q)uit"
                }),
                italic_style,
            )),
        };

        legend.alignment(Alignment::Center).render(chunks[3], buf);
    }
}
