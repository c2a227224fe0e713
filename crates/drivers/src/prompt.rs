use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use shotbook_application::{ApplicationError, DuplicateResolver, GuestPrompt};
use shotbook_domain::{DuplicateDecision, DuplicateMatch, GuestIdentity, UploadCandidate};

/// Terminal prompts for the two points where a command needs a human:
/// duplicate uploads and guest identity. Clones share one terminal.
pub struct TerminalPrompt<R, W> {
    io: Rc<RefCell<(R, W)>>,
}

impl<R, W> Clone for TerminalPrompt<R, W> {
    fn clone(&self) -> Self {
        Self {
            io: Rc::clone(&self.io),
        }
    }
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Rc::new(RefCell::new((input, output))),
        }
    }

    fn say(&self, text: &str) -> Result<(), ApplicationError> {
        let mut io = self.io.borrow_mut();
        let output = &mut io.1;
        write!(output, "{text}").map_err(|error| ApplicationError::Io(error.to_string()))?;
        output
            .flush()
            .map_err(|error| ApplicationError::Io(error.to_string()))
    }

    fn ask(&self, question: &str) -> Result<Option<String>, ApplicationError> {
        self.say(question)?;
        let mut io = self.io.borrow_mut();
        let input = &mut io.0;
        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|error| ApplicationError::Io(error.to_string()))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> DuplicateResolver for TerminalPrompt<R, W> {
    fn resolve(
        &self,
        candidate: &UploadCandidate,
        duplicates: &[DuplicateMatch],
    ) -> Result<DuplicateDecision, ApplicationError> {
        let existing = duplicates
            .iter()
            .map(|duplicate| duplicate.photo_id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let question = format!(
            "{} ({} bytes) already exists as {existing}. Upload anyway? [y/N] ",
            candidate.filename, candidate.file_size
        );
        let answer = self.ask(&question)?.unwrap_or_default();
        Ok(match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => DuplicateDecision::UploadAnyway,
            _ => DuplicateDecision::Skip,
        })
    }
}

impl<R: BufRead, W: Write> GuestPrompt for TerminalPrompt<R, W> {
    fn prompt_guest(
        &self,
        current: &GuestIdentity,
    ) -> Result<Option<GuestIdentity>, ApplicationError> {
        let Some(email) = self.ask("This gallery needs your email to continue: ")? else {
            return Ok(None);
        };
        if email.is_empty() {
            return Ok(None);
        }
        let guest = GuestIdentity {
            share_token: current.share_token.clone(),
            email: Some(email),
            name: current.name.clone(),
        };
        if !guest.has_email() {
            self.say("That does not look like an email address.\n")?;
            return Ok(None);
        }
        let name = self.ask("Your name (optional): ")?.unwrap_or_default();
        Ok(Some(GuestIdentity {
            name: if name.is_empty() { guest.name } else { Some(name) },
            ..guest
        }))
    }
}
