//! Line-based interactive prompts with re-ask on invalid input.

use crate::error::{Result, SeqScoutError};
use std::io::{self, BufRead, StdinLock, Stdout, Write};

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

pub fn stdio() -> Prompter<StdinLock<'static>, Stdout> {
    Prompter::new(io::stdin().lock(), io::stdout())
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// One trimmed line of input. Closed input is an error, not an empty answer.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SeqScoutError::Message(format!(
                "Input closed while waiting for: {}",
                question.trim()
            )));
        }
        Ok(line.trim().to_string())
    }

    pub fn ask_until<T, F>(&mut self, question: &str, parse: F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, String>,
    {
        loop {
            let answer = self.ask(question)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(msg) => writeln!(self.output, "{msg}")?,
            }
        }
    }

    pub fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        Ok(is_affirmative(&self.ask(question)?))
    }

    pub fn say(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "t" | "tak"
    )
}

pub fn parse_length(raw: &str) -> std::result::Result<usize, String> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a whole number, try again.", raw.trim()))
}

pub fn parse_positive_length(raw: &str) -> std::result::Result<usize, String> {
    match parse_length(raw)? {
        0 => Err("Sequence length must be a positive number, try again.".to_string()),
        n => Ok(n),
    }
}

pub fn parse_nonempty(raw: &str) -> std::result::Result<String, String> {
    let text = raw.trim();
    if text.is_empty() {
        Err("A value is required, try again.".to_string())
    } else {
        Ok(text.to_string())
    }
}
