use crate::pipeline::FrontierRun;
use crate::scatter::{ScatterBins, bin_by_sharpe};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io;
use tracing::{error, info};

/// Low / mid / high Sharpe colour bands in the terminal chart.
pub const TUI_SHARPE_BINS: usize = 3;

pub struct App {
    pub should_quit: bool,
    pub run: FrontierRun,
    pub scatter: ScatterBins,
    pub error_msg: Option<String>,
}

impl App {
    pub fn new(run: FrontierRun) -> Self {
        let scatter = bin_by_sharpe(&run.table.portfolios, TUI_SHARPE_BINS);
        Self {
            should_quit: false,
            run,
            scatter,
            error_msg: None,
        }
    }

    /// Draws a fresh table with the next seed.
    pub fn resimulate(&mut self) {
        let seed = self.run.table.seed.wrapping_add(1);
        match self.run.resimulate(seed) {
            Ok(()) => {
                info!("Re-simulated with seed {}", seed);
                self.scatter = bin_by_sharpe(&self.run.table.portfolios, TUI_SHARPE_BINS);
                self.error_msg = None;
            }
            Err(e) => {
                error!("Re-simulation failed: {}", e);
                self.error_msg = Some(e.to_string());
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.resimulate(),
            _ => {}
        }
    }

    pub fn run(&mut self, terminal: &mut crate::tui::Tui) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|f| crate::ui::render(f, self))?;

            if event::poll(std::time::Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let seed = self.run.table.seed;
                        self.handle_key(key.code);
                        // Simulation logs land on the alternate screen.
                        if self.run.table.seed != seed {
                            terminal.clear()?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
