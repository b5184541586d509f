// UI layer: the real `Terminal` used by the binary. Prompts come from
// `dialoguer`, spinners from `indicatif`, colors from `crossterm`.

use crate::workflow::Terminal;
use crossterm::style::Stylize;
use dialoguer::{Confirm, MultiSelect};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

/// Interactive terminal. Status lines go to stdout; spinners draw on
/// stderr and are cleared before the next line is printed.
#[derive(Default)]
pub struct DialoguerTerminal {
    spinner: Option<ProgressBar>,
}

impl DialoguerTerminal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Terminal for DialoguerTerminal {
    fn multi_select(&mut self, prompt: &str, items: &[String]) -> io::Result<Vec<usize>> {
        // `MultiSelect` is keyboard-driven: arrows to move, space to
        // toggle, enter to accept.
        MultiSelect::new().with_prompt(prompt).items(items).interact()
    }

    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Confirm::new().with_prompt(prompt).default(false).interact()
    }

    fn info(&mut self, line: &str) {
        println!("{}", line);
    }

    fn success(&mut self, line: &str) {
        println!("{}", line.green());
    }

    fn failure(&mut self, line: &str) {
        println!("{}", line.red());
    }

    fn start_task(&mut self, message: &str) {
        self.finish_task();
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn finish_task(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Drop for DialoguerTerminal {
    fn drop(&mut self) {
        self.finish_task();
    }
}
