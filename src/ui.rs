use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use repcue::{
    cues::Cue,
    session::SessionStatus,
    util::{format_time, set_display},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.controller.state();
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let yellow_bold_style = Style::default().patch(bold_style).fg(Color::Yellow);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(3), // progress box
                Constraint::Min(1),    // main message
                Constraint::Length(1), // stage / arm
                Constraint::Length(1), // last cue
                Constraint::Length(1), // padding
                Constraint::Length(1), // legend
            ])
            .split(area);

        let progress = Paragraph::new(Span::styled(
            set_display(state, self.controller.config()),
            bold_style,
        ))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" repcue · {} ", state.status)),
        )
        .alignment(Alignment::Center);
        progress.render(chunks[0], buf);

        let main_line = match state.status {
            SessionStatus::Resting => Span::styled(
                format_time(state.rest_remaining_secs(self.now).unwrap_or(0)),
                yellow_bold_style,
            ),
            SessionStatus::Complete => Span::styled(
                "Session Complete",
                Style::default().patch(bold_style).fg(Color::LightGreen),
            ),
            SessionStatus::Paused => Span::styled("Paused", yellow_bold_style),
            SessionStatus::Idle => Span::styled("Stopped - press (r) to start", dim_style),
            SessionStatus::Running => match state.feedback {
                Some(code) => {
                    let style = if code.is_correction() {
                        Style::default().patch(bold_style).fg(Color::Red)
                    } else {
                        yellow_bold_style
                    };
                    Span::styled(code.message(self.controller.arm()), style)
                }
                None => Span::styled("Waiting for pose...", dim_style),
            },
        };
        let main_rows = chunks[1].height;
        let centered = Rect {
            y: chunks[1].y + main_rows / 2,
            height: main_rows.min(1),
            ..chunks[1]
        };
        Paragraph::new(Line::from(main_line))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(centered, buf);

        Paragraph::new(Span::styled(
            format!(
                "arm: {}   stage: {}{}",
                self.controller.arm(),
                self.controller.stage(),
                if self.replay_done { "   (recording ended)" } else { "" }
            ),
            dim_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        if let Some(cue) = &self.last_cue {
            let text = match cue {
                Cue::Speak(words) => format!("🔊 \"{}\"", words),
                Cue::Tone(tone) => format!("♪ {}", tone),
            };
            Paragraph::new(Span::styled(text, italic_style))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(
            "(space) pause/resume / (a)rm switch / (s)top / (r)estart / (q)uit",
            italic_style,
        ))
        .render(chunks[5], buf);
    }
}
