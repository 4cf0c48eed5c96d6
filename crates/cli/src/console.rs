//! Human-facing progress output, gated on `--verbose`.
//!
//! Everything goes to stderr so stdout stays clean for `--json`.

use std::io::Write;

#[derive(Debug, Clone, Copy)]
pub struct Console {
    verbose: bool,
}

impl Console {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Print a line when verbose; silent otherwise.
    pub fn say(&self, message: impl AsRef<str>) {
        if self.verbose {
            eprintln!("{}", message.as_ref());
        }
    }

    /// Print a preformatted block (trailing newline already included).
    pub fn block(&self, text: &str) {
        if self.verbose {
            let stderr = std::io::stderr();
            let mut handle = stderr.lock();
            let _ = handle.write_all(text.as_bytes());
            let _ = handle.flush();
        }
    }
}
