use crate::evaluator::SimulatedPortfolio;
use crate::pipeline::FrontierRun;
use crate::scatter::{ScatterBins, bin_by_sharpe};
use eframe::egui;
use egui_plot::{Legend, MarkerShape, Plot, PlotPoints, Points};
use tracing::{error, info};

// ──────────────────────────────────────────────────────────────────────────────
// Color Palette
// ──────────────────────────────────────────────────────────────────────────────

const ACCENT_BLUE: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
const ACCENT_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
const ACCENT_CYAN: egui::Color32 = egui::Color32::from_rgb(34, 211, 238);

const BG_DARK: egui::Color32 = egui::Color32::from_rgb(15, 15, 20);
const BG_CARD: egui::Color32 = egui::Color32::from_rgb(24, 24, 32);
const TEXT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);

const RDYLGN: [(u8, u8, u8); 3] = [(215, 48, 39), (254, 224, 139), (26, 152, 80)];

/// Colour bands used for the Sharpe gradient.
const GUI_SHARPE_BINS: usize = 12;

/// Red-yellow-green ramp for `t` in [0, 1].
fn sharpe_color(t: f64) -> egui::Color32 {
    let t = t.clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (RDYLGN[0], RDYLGN[1], t * 2.0)
    } else {
        (RDYLGN[1], RDYLGN[2], (t - 0.5) * 2.0)
    };
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * local).round() as u8;
    egui::Color32::from_rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

pub struct GuiApp {
    run: FrontierRun,
    scatter: ScatterBins,
    error_msg: Option<String>,
}

impl GuiApp {
    pub fn new(run: FrontierRun) -> Self {
        let scatter = bin_by_sharpe(&run.table.portfolios, GUI_SHARPE_BINS);
        Self {
            run,
            scatter,
            error_msg: None,
        }
    }

    fn apply_theme(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        style.visuals.dark_mode = true;
        style.visuals.panel_fill = BG_DARK;
        style.visuals.window_fill = BG_CARD;
        style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
        style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
        style.visuals.widgets.active.bg_fill = ACCENT_BLUE;
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        ctx.set_style(style);
    }

    fn resimulate(&mut self) {
        let seed = self.run.table.seed.wrapping_add(1);
        match self.run.resimulate(seed) {
            Ok(()) => {
                info!("Re-simulated with seed {}", seed);
                self.scatter = bin_by_sharpe(&self.run.table.portfolios, GUI_SHARPE_BINS);
                self.error_msg = None;
            }
            Err(e) => {
                error!("Re-simulation failed: {}", e);
                self.error_msg = Some(e.to_string());
            }
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        Self::apply_theme(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.add_space(8.0);
                ui.label(egui::RichText::new("Efficient Frontier")
                    .size(18.0)
                    .strong()
                    .color(ACCENT_BLUE));
                ui.add_space(4.0);
                ui.label(egui::RichText::new(format!(
                    "{} portfolios | seed {} | {}",
                    self.run.table.len(),
                    self.run.table.seed,
                    self.run.table.tickers.join(", ")
                ))
                .size(11.0)
                .color(TEXT_SECONDARY));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add_space(8.0);
                    if ui.button("Re-simulate").clicked() {
                        self.resimulate();
                    }
                });
            });
            if let Some(err) = &self.error_msg {
                ui.colored_label(ACCENT_RED, err);
            }
            ui.add_space(4.0);
        });

        egui::SidePanel::right("portfolios")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    portfolio_card(ui, "Max Sharpe Portfolio", ACCENT_RED, &self.run.pick.best_sharpe);
                    ui.add_space(8.0);
                    portfolio_card(ui, "Min Volatility Portfolio", ACCENT_BLUE, &self.run.pick.min_volatility);
                    ui.add_space(8.0);
                    self.render_asset_stats(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_scatter(ui);
        });
    }
}

impl GuiApp {
    fn render_scatter(&self, ui: &mut egui::Ui) {
        let scatter = &self.scatter;
        let pick = &self.run.pick;
        let bins = scatter.bins.len().max(1);

        Plot::new("frontier_scatter")
            .legend(Legend::default())
            .x_axis_label("Volatility (Std. Deviation)")
            .y_axis_label("Expected Returns")
            .show(ui, |plot_ui| {
                for (i, points) in scatter.bins.iter().enumerate() {
                    if points.is_empty() {
                        continue;
                    }
                    let t = if bins > 1 { i as f64 / (bins - 1) as f64 } else { 1.0 };
                    let series: PlotPoints = points.iter().map(|&(x, y)| [x, y]).collect();
                    plot_ui.points(Points::new(series).color(sharpe_color(t)).radius(1.5));
                }

                if !scatter.degenerate.is_empty() {
                    let series: PlotPoints = scatter.degenerate.iter().map(|&(x, y)| [x, y]).collect();
                    plot_ui.points(Points::new(series)
                        .color(TEXT_SECONDARY)
                        .radius(2.0)
                        .name("Zero volatility"));
                }

                plot_ui.points(Points::new(vec![[pick.best_sharpe.volatility, pick.best_sharpe.expected_return]])
                    .shape(MarkerShape::Diamond)
                    .filled(true)
                    .radius(9.0)
                    .color(ACCENT_RED)
                    .name("Max Sharpe"));
                plot_ui.points(Points::new(vec![[pick.min_volatility.volatility, pick.min_volatility.expected_return]])
                    .shape(MarkerShape::Diamond)
                    .filled(true)
                    .radius(9.0)
                    .color(ACCENT_BLUE)
                    .name("Min Volatility"));
            });
    }

    fn render_asset_stats(&self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Assets (annualized)").strong().color(ACCENT_CYAN));
        let (lo, hi) = self.scatter.sharpe_range;
        if lo.is_finite() && hi.is_finite() {
            ui.label(egui::RichText::new(format!("Sharpe range {:.2} .. {:.2}", lo, hi))
                .size(11.0)
                .color(TEXT_SECONDARY));
        }
        egui::Grid::new("asset_stats").striped(true).show(ui, |ui| {
            ui.label("Symbol");
            ui.label("E[Ret]");
            ui.label("Vol");
            ui.end_row();
            for (i, ticker) in self.run.stats.tickers.iter().enumerate() {
                ui.label(ticker);
                ui.label(format!("{:+.2}%", self.run.stats.mean_return[i] * 100.0));
                ui.label(format!("{:.2}%", self.run.stats.asset_volatility(i) * 100.0));
                ui.end_row();
            }
        });
        if self.run.pick.degenerate_count > 0 {
            ui.label(egui::RichText::new(format!(
                "{} zero-volatility portfolios ranked last",
                self.run.pick.degenerate_count
            ))
            .color(TEXT_SECONDARY));
        }
    }
}

fn portfolio_card(ui: &mut egui::Ui, title: &str, color: egui::Color32, p: &SimulatedPortfolio) {
    egui::Frame::none()
        .fill(BG_CARD)
        .inner_margin(egui::Margin::same(10.0))
        .rounding(egui::Rounding::same(6.0))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(title).strong().color(color));
            ui.label(format!(
                "Return {:+.2}%   Vol {:.2}%   Sharpe {:.3}",
                p.expected_return * 100.0,
                p.volatility * 100.0,
                p.sharpe_ratio
            ));
            for (ticker, weight) in p.weights.iter() {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(format!("{:<6}", ticker)).monospace().color(TEXT_PRIMARY));
                    ui.add(egui::ProgressBar::new(weight as f32)
                        .desired_width(120.0)
                        .fill(color)
                        .text(format!("{:.2}%", weight * 100.0)));
                });
            }
        });
}
