//! User-visible notifications raised by the response interceptor.

use log::debug;
use std::fmt;
use std::io::{self, Write};

/// Screen corner a notification is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub position: Position,
    pub progress: bool,
    pub multi_line: bool,
    pub color: &'static str,
    pub text_color: &'static str,
    pub icon: &'static str,
    pub message: String,
}

impl Notification {
    /// Error toast with the fixed styling used for every classified failure.
    /// Only the message varies.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            position: Position::BottomRight,
            progress: true,
            multi_line: true,
            color: "red-5",
            text_color: "white",
            icon: "warning",
            message: message.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Renders notifications on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

/// Writes a notification to any writer. Continuation lines of a multi-line
/// message are indented under the icon; single-line notifications have their
/// line breaks collapsed.
pub(crate) fn render_with_io<W: Write>(notification: &Notification, output: &mut W) -> io::Result<()> {
    let symbol = match notification.icon {
        "warning" => "⚠",
        "info" => "ℹ",
        _ => "•",
    };

    if notification.multi_line {
        let mut lines = notification.message.lines();
        writeln!(output, "{} {}", symbol, lines.next().unwrap_or_default())?;
        for line in lines {
            writeln!(output, "  {}", line)?;
        }
    } else {
        let flat = notification.message.lines().collect::<Vec<_>>().join(" ");
        writeln!(output, "{} {}", symbol, flat)?;
    }
    output.flush()
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) {
        debug!("Notification at {}: {}", notification.position, notification.message);
        let stderr = io::stderr();
        let mut lock = stderr.lock();
        // A closed stderr leaves nowhere to report to.
        let _ = render_with_io(notification, &mut lock);
    }
}
