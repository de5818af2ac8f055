use crate::reporter::message::ServiceMessage;
use std::io::{self, Write};
use std::sync::Arc;

/// Destination of protocol lines. Each `emit` writes one whole line.
pub trait Sink: Send + Sync {
    fn emit(&self, message: &ServiceMessage) -> io::Result<()>;

    /// Writes `messages` as adjacent lines. Implementations shared between
    /// threads must not let other lines in between.
    fn emit_all(&self, messages: &[ServiceMessage]) -> io::Result<()> {
        messages.iter().try_for_each(|message| self.emit(message))
    }
}

pub struct StdoutSink;

impl StdoutSink {
    fn write(&self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut locked = stdout.lock();
        locked.write_all(text.as_bytes())?;
        locked.flush()
    }
}

impl Sink for StdoutSink {
    fn emit(&self, message: &ServiceMessage) -> io::Result<()> {
        self.write(&format!("{}\n", message))
    }

    fn emit_all(&self, messages: &[ServiceMessage]) -> io::Result<()> {
        let text: String = messages
            .iter()
            .map(|message| format!("{}\n", message))
            .collect();
        self.write(&text)
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    #[inline]
    fn emit(&self, message: &ServiceMessage) -> io::Result<()> {
        (**self).emit(message)
    }

    #[inline]
    fn emit_all(&self, messages: &[ServiceMessage]) -> io::Result<()> {
        (**self).emit_all(messages)
    }
}

#[cfg(test)]
pub(crate) mod buffer {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct BufferSink {
        lines: Mutex<Vec<String>>,
    }

    impl BufferSink {
        pub fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Sink for BufferSink {
        fn emit(&self, message: &ServiceMessage) -> io::Result<()> {
            self.lines.lock().unwrap().push(message.to_string());
            Ok(())
        }

        fn emit_all(&self, messages: &[ServiceMessage]) -> io::Result<()> {
            let mut lines = self.lines.lock().unwrap();
            lines.extend(messages.iter().map(ToString::to_string));
            Ok(())
        }
    }

    /// Accepts `capacity` lines, then fails every write.
    pub struct BrokenSink {
        pub capacity: Mutex<usize>,
    }

    impl Sink for BrokenSink {
        fn emit(&self, _message: &ServiceMessage) -> io::Result<()> {
            let mut capacity = self.capacity.lock().unwrap();
            if *capacity == 0 {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"));
            }
            *capacity -= 1;
            Ok(())
        }
    }
}
