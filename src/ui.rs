use crate::app::App;
use crate::evaluator::SimulatedPortfolio;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};

const BIN_COLORS: [Color; 3] = [Color::Red, Color::Yellow, Color::Green];
const BIN_NAMES: [&str; 3] = ["Low Sharpe", "Mid Sharpe", "High Sharpe"];

pub fn render(f: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, layout[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(layout[1]);

    render_chart(f, app, body[0]);
    render_side_panel(f, app, body[1]);
    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let run = &app.run;
    let spans = vec![
        Span::styled(" Efficient Frontier ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(run.table.tickers.join(", "), Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw(" | "),
        Span::styled(
            format!("{} portfolios", run.table.len()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" | "),
        Span::styled(format!("seed {}", run.table.seed), Style::default().fg(Color::Gray)),
    ];

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" Controls: ", Style::default().fg(Color::Gray)),
        Span::styled("r: re-simulate | q/Esc: quit", Style::default().fg(Color::White)),
    ];
    if let Some(err) = &app.error_msg {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(err.as_str(), Style::default().fg(Color::Red)));
    }

    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn render_chart(f: &mut Frame, app: &App, area: Rect) {
    let scatter = &app.scatter;
    let pick = &app.run.pick;
    let best = [(pick.best_sharpe.volatility, pick.best_sharpe.expected_return)];
    let min_vol = [(pick.min_volatility.volatility, pick.min_volatility.expected_return)];

    let mut datasets: Vec<Dataset> = scatter
        .bins
        .iter()
        .zip(BIN_COLORS.iter().zip(BIN_NAMES.iter()))
        .map(|(points, (&color, &name))| {
            Dataset::default()
                .name(name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(color))
                .data(points)
        })
        .collect();

    if !scatter.degenerate.is_empty() {
        datasets.push(
            Dataset::default()
                .name("Zero volatility")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::DarkGray))
                .data(&scatter.degenerate),
        );
    }

    datasets.push(
        Dataset::default()
            .name("Max Sharpe")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD))
            .data(&best),
    );
    datasets.push(
        Dataset::default()
            .name("Min Volatility")
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::LightBlue).add_modifier(Modifier::BOLD))
            .data(&min_vol),
    );

    let [x_min, x_max] = scatter.x_bounds;
    let [y_min, y_max] = scatter.y_bounds;

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Risk / Return ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("Volatility (Std. Deviation)")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(vec![
                    Span::raw(format!("{:.1}%", x_min * 100.0)),
                    Span::raw(format!("{:.1}%", (x_min + x_max) * 50.0)),
                    Span::raw(format!("{:.1}%", x_max * 100.0)),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Expected Returns")
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::raw(format!("{:.1}%", y_min * 100.0)),
                    Span::raw(format!("{:.1}%", (y_min + y_max) * 50.0)),
                    Span::raw(format!("{:.1}%", y_max * 100.0)),
                ]),
        );

    f.render_widget(chart, area);
}

fn portfolio_lines<'a>(title: &'a str, color: Color, p: &'a SimulatedPortfolio) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(title, Style::default().fg(color).add_modifier(Modifier::BOLD))),
        Line::from(vec![
            Span::styled("  Return ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:+.2}%", p.expected_return * 100.0)),
        ]),
        Line::from(vec![
            Span::styled("  Vol    ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.2}%", p.volatility * 100.0)),
        ]),
        Line::from(vec![
            Span::styled("  Sharpe ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{:.3}", p.sharpe_ratio)),
        ]),
    ];
    for (ticker, weight) in p.weights.iter() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<6}", ticker), Style::default().fg(Color::White)),
            Span::raw(format!("{:>6.2}% ", weight * 100.0)),
            Span::styled(
                "▇".repeat((weight * 20.0).round() as usize),
                Style::default().fg(color),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines
}

fn render_side_panel(f: &mut Frame, app: &App, area: Rect) {
    let run = &app.run;
    let mut lines = portfolio_lines("Max Sharpe Portfolio", Color::LightRed, &run.pick.best_sharpe);
    lines.extend(portfolio_lines("Min Volatility Portfolio", Color::LightBlue, &run.pick.min_volatility));

    lines.push(Line::from(Span::styled(
        "Assets (annualized)",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )));
    for (i, ticker) in run.stats.tickers.iter().enumerate() {
        lines.push(Line::from(format!(
            "  {:<6} {:>+7.2}%  σ {:>6.2}%",
            ticker,
            run.stats.mean_return[i] * 100.0,
            run.stats.asset_volatility(i) * 100.0
        )));
    }
    if run.pick.degenerate_count > 0 {
        lines.push(Line::from(Span::styled(
            format!("  {} zero-volatility portfolios", run.pick.degenerate_count),
            Style::default().fg(Color::Yellow),
        )));
    }

    let panel = Paragraph::new(lines).block(Block::default().title(" Portfolios ").borders(Borders::ALL));
    f.render_widget(panel, area);
}
