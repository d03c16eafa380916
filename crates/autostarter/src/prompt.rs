//! Terminal confirmation step for `ask_to_launch`

use autostarter_core::{LaunchPrompt, PromptOutcome};
use autostarter_util::LoadoutName;
use std::io::{self, BufRead, Write};
use tracing::warn;

/// Invalid answers tolerated before giving up
const MAX_ATTEMPTS: usize = 3;

/// Asks on the terminal which loadout to launch
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(io::stdin().lock(), io::stderr(), assume_yes)
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }

    fn ask(&mut self, available: &[LoadoutName], default: usize) -> io::Result<PromptOutcome> {
        writeln!(self.output, "Autostarter: choose a loadout to launch")?;
        for (i, name) in available.iter().enumerate() {
            let marker = if i == default { " (default)" } else { "" };
            writeln!(self.output, "  {}) {}{}", i + 1, name, marker)?;
        }

        for _ in 0..MAX_ATTEMPTS {
            write!(self.output, "Launch which loadout? [{}] (n to cancel): ", default + 1)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                // EOF: nobody to ask
                return Ok(PromptOutcome::Cancel);
            }

            match parse_answer(line.trim(), available, default) {
                Some(outcome) => return Ok(outcome),
                None => writeln!(self.output, "Unknown loadout '{}'", line.trim())?,
            }
        }

        Ok(PromptOutcome::Cancel)
    }
}

impl<R: BufRead, W: Write> LaunchPrompt for TerminalPrompt<R, W> {
    fn confirm(&mut self, available: &[LoadoutName], current: Option<&LoadoutName>) -> PromptOutcome {
        if available.is_empty() {
            warn!("No loadouts configured, nothing to offer");
            return PromptOutcome::Cancel;
        }

        let default = current
            .and_then(|c| available.iter().position(|n| n == c))
            .unwrap_or(0);

        if self.assume_yes {
            return PromptOutcome::Launch(available[default].clone());
        }

        self.ask(available, default).unwrap_or_else(|e| {
            warn!(error = %e, "Confirmation prompt failed, not launching");
            PromptOutcome::Cancel
        })
    }
}

/// Accepts an empty answer (default), a 1-based index, or an exact name
fn parse_answer(answer: &str, available: &[LoadoutName], default: usize) -> Option<PromptOutcome> {
    if answer.is_empty() {
        return Some(PromptOutcome::Launch(available[default].clone()));
    }

    if matches!(answer.to_lowercase().as_str(), "n" | "no" | "q" | "quit") {
        return Some(PromptOutcome::Cancel);
    }

    if let Ok(index) = answer.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|i| available.get(i))
            .map(|name| PromptOutcome::Launch(name.clone()));
    }

    available
        .iter()
        .find(|name| name.as_str() == answer)
        .map(|name| PromptOutcome::Launch(name.clone()))
}
