//! Confirmation before replacing existing destination files.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::Path;

/// Answers whether an existing file may be replaced.
pub trait Confirm {
    /// Return `true` to replace `path`, `false` to leave it alone.
    fn confirm(&mut self, path: &Path) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&Path) -> bool,
{
    fn confirm(&mut self, path: &Path) -> bool {
        self(path)
    }
}

/// Interactive `[Y/n]` prompt over a reader and a writer.
///
/// Only the first character of each answer line counts. `y` and a bare
/// newline approve, `n` declines, anything else asks again. End of input
/// declines.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    /// Prompt on the process's terminal.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Create a prompt over arbitrary streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompt, returning its streams.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Read one answer character, discarding the rest of its line.
    fn read_answer(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return None,
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::warn!(%err, "failed to read confirmation");
                    return None;
                }
            }
        }

        if byte[0] != b'\n' {
            let mut rest = Vec::new();
            let _ = self.input.read_until(b'\n', &mut rest);
        }

        Some(byte[0].to_ascii_lowercase())
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, path: &Path) -> bool {
        loop {
            if let Err(err) = write!(self.output, "{path:?} already exists. Replace it? [Y/n] ")
                .and_then(|()| self.output.flush())
            {
                tracing::warn!(%err, "failed to write confirmation prompt");
            }

            match self.read_answer() {
                Some(b'y' | b'\n') => return true,
                Some(b'n') | None => return false,
                Some(_) => continue,
            }
        }
    }
}

/// Applies the `confirm` policy in front of a [`Confirm`] implementation.
pub struct ConfirmGate<'a> {
    enabled: bool,
    prompt: Box<dyn Confirm + 'a>,
}

impl<'a> ConfirmGate<'a> {
    /// Ask `prompt` before each replacement when `enabled`, otherwise approve.
    pub fn new(enabled: bool, prompt: impl Confirm + 'a) -> Self {
        Self {
            enabled,
            prompt: Box::new(prompt),
        }
    }

    /// A gate that approves everything without asking.
    pub fn auto() -> Self {
        Self::new(false, |_: &Path| true)
    }

    /// Decide whether `path` may be replaced.
    pub fn approve(&mut self, path: &Path) -> bool {
        if !self.enabled {
            return true;
        }
        self.prompt.confirm(path)
    }
}

impl std::fmt::Debug for ConfirmGate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmGate")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(input: &str) -> (bool, String) {
        let mut prompt = Prompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let answer = prompt.confirm(Path::new("/dest/foo"));
        let (_, output) = prompt.into_inner();
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_prompt_answers() {
        assert!(ask("y\n").0);
        assert!(ask("Y\n").0);
        assert!(ask("yes please\n").0);
        assert!(ask("\n").0);
        assert!(!ask("n\n").0);
        assert!(!ask("No\n").0);
    }

    #[test]
    fn test_prompt_repeats_on_other_input() {
        let (answer, output) = ask("maybe\nq\nn\n");
        assert!(!answer);
        assert_eq!(output.matches("Replace it?").count(), 3);
        assert!(output.starts_with(r#""/dest/foo" already exists. Replace it? [Y/n] "#));
    }

    #[test]
    fn test_prompt_eof_declines() {
        let (answer, output) = ask("");
        assert!(!answer);
        assert_eq!(output.matches("Replace it?").count(), 1);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_prompt_survives_write_failure() {
        let mut prompt = Prompt::new(Cursor::new(b"n\ny\n".to_vec()), BrokenPipe);
        assert!(!prompt.confirm(Path::new("/a")));
        assert!(prompt.confirm(Path::new("/b")));
    }

    #[test]
    fn test_answers_are_per_line() {
        let input = Cursor::new(b"y\nn\n".to_vec());
        let mut prompt = Prompt::new(input, Vec::new());
        assert!(prompt.confirm(Path::new("/a")));
        assert!(!prompt.confirm(Path::new("/b")));
    }

    #[test]
    fn test_gate_disabled_skips_prompt() {
        let mut asked = 0;
        {
            let mut gate = ConfirmGate::new(false, |_: &Path| {
                asked += 1;
                false
            });
            assert!(gate.approve(Path::new("/a")));
        }
        assert_eq!(asked, 0);
    }

    #[test]
    fn test_gate_enabled_delegates() {
        let mut gate = ConfirmGate::new(true, |p: &Path| p.ends_with("ok"));
        assert!(gate.approve(Path::new("/dest/ok")));
        assert!(!gate.approve(Path::new("/dest/nope")));
        assert!(ConfirmGate::auto().approve(Path::new("/anything")));
    }
}
