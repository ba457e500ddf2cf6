use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

static BUFFER: Mutex<Option<Vec<String>>> = Mutex::new(None);

fn buffer() -> MutexGuard<'static, Option<Vec<String>>> {
    BUFFER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Activate buffering. While active, log lines are stored instead of
/// printed, so they don't tear the TUI's alternate screen.
pub fn activate() {
    *buffer() = Some(Vec::new());
}

/// Deactivate buffering and return all collected lines.
pub fn drain() -> Vec<String> {
    buffer().take().unwrap_or_default()
}

/// Store the line if buffering is active, otherwise print it to stderr.
pub fn emit(line: String) {
    let mut guard = buffer();
    if let Some(buf) = guard.as_mut() {
        buf.push(line);
    } else {
        drop(guard);
        eprintln!("{}", line);
    }
}

/// `tracing_subscriber` writer that routes every formatted event through [`emit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferedStderr;

impl<'a> MakeWriter<'a> for BufferedStderr {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter { bytes: Vec::new() }
    }
}

/// Collects one formatted event and hands it over when dropped.
pub struct EventWriter {
    bytes: Vec<u8>,
}

impl io::Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.bytes.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.bytes);
        emit(text.trim_end_matches('\n').to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lines_are_held_while_active() {
        activate();
        {
            let mut writer = BufferedStderr.make_writer();
            write!(writer, " WARN scoreboard: ").unwrap();
            writeln!(writer, "realtime disconnected").unwrap();
        }
        {
            let _empty = BufferedStderr.make_writer();
        }
        emit("plain".to_string());

        let lines = drain();
        assert_eq!(lines, vec![" WARN scoreboard: realtime disconnected", "plain"]);
        assert!(drain().is_empty());
    }
}
