//! Terminal session ownership and glyph-frame blitting.
//!
//! [`TerminalSession`] is an explicit handle for the alternate-screen
//! state, owned by the top-level driver and cloned (via `Arc`) into the
//! interrupt handler. Restoration is idempotent, so every exit path —
//! normal, error, interrupt — can call it without coordinating.
//!
//! [`Renderer`] exposes the clear/print/refresh-style primitives the
//! playback consumer blits glyph rows through. It is only ever driven by
//! a consumer task, never by the decode producer.

use std::io::{self, BufWriter, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::{cursor, execute, queue, style, terminal};

/// Scoped owner of the alternate-screen terminal state.
pub struct TerminalSession {
    active: AtomicBool,
}

impl TerminalSession {
    /// Switches to the alternate screen and hides the cursor.
    pub fn enter() -> io::Result<Arc<Self>> {
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        Ok(Arc::new(Self {
            active: AtomicBool::new(true),
        }))
    }

    /// Restores the cursor and leaves the alternate screen.
    ///
    /// Safe to call from any exit path; only the first call acts.
    pub fn restore(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Terminal size in (columns, rows).
pub fn size() -> io::Result<(u16, u16)> {
    terminal::size()
}

/// Output frame dimensions derived from the terminal size.
///
/// The last column is left unused so a full row never triggers autowrap.
pub fn output_dimensions() -> io::Result<(u32, u32)> {
    let (cols, rows) = terminal::size()?;
    Ok((cols.saturating_sub(1) as u32, rows as u32))
}

/// Row-by-row glyph blitter over stdout.
pub struct Renderer {
    out: BufWriter<Stdout>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            out: BufWriter::new(io::stdout()),
        }
    }

    /// Homes the cursor for the next frame.
    pub fn begin_frame(&mut self) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(0, 0))?;
        Ok(())
    }

    /// Writes one glyph row and steps to the next line.
    pub fn draw_row(&mut self, row: &str) -> io::Result<()> {
        queue!(self.out, style::Print(row), cursor::MoveToNextLine(1))?;
        Ok(())
    }

    /// Flushes the queued frame to the terminal.
    pub fn present(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
