use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

/// Blocking dialogs the task operations rely on.
pub trait Interaction {
    /// Asks for a line of text seeded with `default`; `None` means cancelled.
    fn ask_text(&mut self, prompt: &str, default: &str) -> Option<String>;

    fn confirm(&mut self, prompt: &str) -> bool;

    fn notify(&mut self, message: &str);
}

/// Dialogs over a line reader and a writer, normally stdin and stdout.
#[derive(Debug)]
pub struct TerminalInteraction<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl TerminalInteraction<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(assume_yes: bool) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), assume_yes)
    }
}

impl<R: BufRead, W: Write> TerminalInteraction<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Reads one line without its terminator; `Ok(None)` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    fn prompt_line(&mut self, prompt: &str) -> Option<String> {
        let written = write!(self.output, "{prompt}").and_then(|_| self.output.flush());
        if let Err(err) = written {
            warn!(error = %err, "failed writing prompt");
        }
        match self.read_line() {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "failed reading answer; treating as cancelled");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Interaction for TerminalInteraction<R, W> {
    fn ask_text(&mut self, prompt: &str, default: &str) -> Option<String> {
        let answer = self.prompt_line(&format!("{prompt} [{default}] "))?;
        if answer.is_empty() {
            Some(default.to_string())
        } else {
            Some(answer)
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            debug!(prompt, "auto-confirmed");
            return true;
        }
        let Some(answer) = self.prompt_line(&format!("{prompt} (yes/no) ")) else {
            return false;
        };
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn notify(&mut self, message: &str) {
        if let Err(err) = writeln!(self.output, "{message}") {
            warn!(error = %err, "failed writing notice");
        }
    }
}

/// Replays queued answers and records every dialog shown.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInteraction {
    texts: VecDeque<Option<String>>,
    confirms: VecDeque<bool>,
    pub prompts: Vec<(String, String)>,
    pub notices: Vec<String>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer_text(mut self, answer: Option<&str>) -> Self {
        self.texts.push_back(answer.map(str::to_string));
        self
    }

    pub fn answer_confirm(mut self, answer: bool) -> Self {
        self.confirms.push_back(answer);
        self
    }
}

impl Interaction for ScriptedInteraction {
    fn ask_text(&mut self, prompt: &str, default: &str) -> Option<String> {
        self.prompts.push((prompt.to_string(), default.to_string()));
        self.texts.pop_front().flatten()
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push((prompt.to_string(), String::new()));
        self.confirms.pop_front().unwrap_or(false)
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{Interaction, TerminalInteraction};

    fn terminal(input: &str, assume_yes: bool) -> TerminalInteraction<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalInteraction::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), assume_yes)
    }

    #[test]
    fn empty_answer_keeps_the_default() {
        let mut term = terminal("\n", false);
        assert_eq!(
            term.ask_text("Edit your task:", "buy milk").as_deref(),
            Some("buy milk")
        );
        let shown = String::from_utf8(term.output().clone()).expect("utf8");
        assert_eq!(shown, "Edit your task: [buy milk] ");
    }

    #[test]
    fn end_of_input_cancels_prompts() {
        let mut term = terminal("", false);
        assert_eq!(term.ask_text("Edit your task:", "x"), None);
        assert!(!term.confirm("Sure?"));
    }

    #[test]
    fn confirm_accepts_yes_variants_only() {
        let mut term = terminal("Y\nyes\nnope\n", false);
        assert!(term.confirm("Sure?"));
        assert!(term.confirm("Sure?"));
        assert!(!term.confirm("Sure?"));
    }

    #[test]
    fn assume_yes_skips_the_question() {
        let mut term = terminal("", true);
        assert!(term.confirm("Sure?"));
        assert!(term.output().is_empty());
    }

    #[test]
    fn read_line_strips_crlf() {
        let mut term = terminal("add eggs\r\n", false);
        assert_eq!(
            term.read_line().expect("read").as_deref(),
            Some("add eggs")
        );
        assert_eq!(term.read_line().expect("read"), None);
    }
}
