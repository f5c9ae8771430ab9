// src/reddit/operator.rs

use super::publish::Thread;
use std::io::{self, BufRead, Write};

/// What to do with a fetched post before anything is downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAction {
    Post,
    /// Post this one and stop asking for the rest of the run
    Auto,
    Retitle(String),
    Skip,
    Quit,
}

/// What to do when publishing could not be confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    PostedManually,
    Skip,
    Quit,
}

/// The person (or policy) making decisions during a posting run.
pub trait Operator {
    fn choose(&mut self, title: &str) -> PostAction;
    fn escalate(&mut self, thread: &Thread) -> Escalation;
}

/// Asks on a terminal. End of input counts as quitting.
pub struct ConsoleOperator<R, W> {
    input: R,
    output: W,
}

impl ConsoleOperator<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and reads one trimmed line; `None` on EOF or a broken terminal.
    fn ask(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{prompt}").ok()?;
        self.output.flush().ok()?;
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read from terminal");
                None
            }
        }
    }

    fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{text}");
    }

    fn ask_title(&mut self, prompt: &str) -> Option<Option<String>> {
        let title = self.ask(prompt)?;
        if title.is_empty() {
            self.say("Title cannot be empty. Try again.");
            Some(None)
        } else {
            Some(Some(title))
        }
    }
}

impl<R: BufRead, W: Write> Operator for ConsoleOperator<R, W> {
    fn choose(&mut self, title: &str) -> PostAction {
        let rule = "=".repeat(60);
        self.say(&format!("\n{rule}\nPost: {title}\n{rule}"));
        self.say("Options:");
        self.say("  y = Post with original title");
        self.say("  a = Auto-process remaining posts");
        self.say("  r = Reword title (edit original)");
        self.say("  n = Enter new title");
        self.say("  s = Skip this post");
        self.say("  q = Quit");

        loop {
            let Some(choice) = self.ask("\nYour choice [y/a/r/n/s/q]: ") else {
                return PostAction::Quit;
            };
            let retitle = match choice.to_lowercase().as_str() {
                "y" => return PostAction::Post,
                "a" => return PostAction::Auto,
                "s" => return PostAction::Skip,
                "q" => return PostAction::Quit,
                "r" => {
                    self.say(&format!("Original: {title}"));
                    self.ask_title("Reword title: ")
                }
                "n" => self.ask_title("Enter new title: "),
                _ => {
                    self.say("Invalid choice. Please enter y, a, r, n, s, or q.");
                    continue;
                }
            };
            match retitle {
                None => return PostAction::Quit,
                Some(Some(t)) => return PostAction::Retitle(t),
                Some(None) => {}
            }
        }
    }

    fn escalate(&mut self, thread: &Thread) -> Escalation {
        self.say(&format!(
            "Could not confirm \"{}\" ({} media) was published. It can still be posted by hand.",
            thread.title,
            thread.media_count()
        ));
        loop {
            let Some(choice) = self.ask("Choose: [p]osted manually, [s]kip this post, or [q]uit: ") else {
                return Escalation::Quit;
            };
            match choice.to_lowercase().as_str() {
                "p" => {
                    if self.ask("Press Enter after you post manually...").is_none() {
                        return Escalation::Quit;
                    }
                    return Escalation::PostedManually;
                }
                "s" => return Escalation::Skip,
                "q" => return Escalation::Quit,
                _ => self.say("Please enter p, s, or q."),
            }
        }
    }
}

/// Used when stdin carries URLs instead of answers: posts as-is, skips on escalation.
#[derive(Debug, Default)]
pub struct UnattendedOperator;

impl Operator for UnattendedOperator {
    fn choose(&mut self, _title: &str) -> PostAction {
        PostAction::Post
    }

    fn escalate(&mut self, thread: &Thread) -> Escalation {
        tracing::warn!(url = %thread.source_url, "publish unconfirmed, skipping");
        Escalation::Skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn operator(input: &str) -> ConsoleOperator<Cursor<Vec<u8>>, Vec<u8>> {
        ConsoleOperator::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn thread() -> Thread {
        Thread { source_url: "https://r/1".into(), title: "Cats".into(), batches: Vec::new() }
    }

    #[test]
    fn simple_choices() {
        assert_eq!(operator("y\n").choose("t"), PostAction::Post);
        assert_eq!(operator("A\n").choose("t"), PostAction::Auto);
        assert_eq!(operator("s\n").choose("t"), PostAction::Skip);
        assert_eq!(operator("q\n").choose("t"), PostAction::Quit);
    }

    #[test]
    fn retitle_reprompts_on_empty_title() {
        let mut op = operator("r\n\nn\n  Dogs  \n");
        assert_eq!(op.choose("Cats"), PostAction::Retitle("Dogs".into()));
        let shown = String::from_utf8(op.output).unwrap();
        assert!(shown.contains("Original: Cats"));
        assert!(shown.contains("Title cannot be empty"));
    }

    #[test]
    fn invalid_input_then_choice() {
        let mut op = operator("x\n\ny\n");
        assert_eq!(op.choose("t"), PostAction::Post);
        assert_eq!(String::from_utf8(op.output).unwrap().matches("Invalid choice").count(), 2);
    }

    #[test]
    fn eof_quits() {
        assert_eq!(operator("").choose("t"), PostAction::Quit);
        assert_eq!(operator("n\n").choose("t"), PostAction::Quit);
        assert_eq!(operator("").escalate(&thread()), Escalation::Quit);
    }

    #[test]
    fn escalation_choices() {
        assert_eq!(operator("p\n\n").escalate(&thread()), Escalation::PostedManually);
        assert_eq!(operator("?\ns\n").escalate(&thread()), Escalation::Skip);
        assert_eq!(operator("q\n").escalate(&thread()), Escalation::Quit);
    }

    #[test]
    fn unattended_posts_and_skips() {
        let mut op = UnattendedOperator;
        assert_eq!(op.choose("t"), PostAction::Post);
        assert_eq!(op.escalate(&thread()), Escalation::Skip);
    }
}
