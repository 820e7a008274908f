//! Console output abstraction for command handlers.

/// Trait for outputting messages to the user.
///
/// Handlers write through this instead of `println!` directly so their
/// output can be captured in tests.
pub trait Output {
    /// Print a line of text.
    fn println(&self, message: &str);

    /// Print an empty line.
    fn newline(&self) {
        self.println("");
    }

    /// Print a section header.
    fn header(&self, title: &str) {
        self.println(title);
        self.println(&"=".repeat(title.len()));
    }

    /// Print an indented line.
    fn indented(&self, message: &str) {
        self.println(&format!("  {}", message));
    }
}

/// Output that writes to stdout.
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn println(&self, message: &str) {
        println!("{}", message);
    }
}
