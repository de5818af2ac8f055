use std::fmt;

pub const PROTOCOL_PREFIX: &str = "##protocol";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Handshake,
    SuiteStarted,
    SuiteFinished,
    TestStarted,
    TestFinished,
    TestFailed,
    TestIgnored,
}

/// One protocol line: an event name followed by quoted attributes, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceMessage {
    event: Event,
    attributes: Vec<(&'static str, String)>,
}

impl Event {
    pub fn name(self) -> &'static str {
        match self {
            Event::Handshake => "handshake",
            Event::SuiteStarted => "suiteStarted",
            Event::SuiteFinished => "suiteFinished",
            Event::TestStarted => "testStarted",
            Event::TestFinished => "testFinished",
            Event::TestFailed => "testFailed",
            Event::TestIgnored => "testIgnored",
        }
    }
}

/// Escapes line breaks so free text stays on a single protocol line.
pub fn safe_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => escaped.push_str("|n"),
            '\r' => escaped.push_str("|r"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl ServiceMessage {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            attributes: vec![],
        }
    }

    /// Every value passes through [`safe_string`] here and nowhere else.
    pub fn attribute<V: AsRef<str>>(mut self, key: &'static str, value: V) -> Self {
        self.attributes.push((key, safe_string(value.as_ref())));
        self
    }

    #[inline]
    pub fn event(&self) -> Event {
        self.event
    }

    pub fn handshake() -> Self {
        Self::new(Event::Handshake)
    }

    pub fn suite_started(name: &str) -> Self {
        Self::new(Event::SuiteStarted).attribute("name", name)
    }

    pub fn suite_finished(name: &str) -> Self {
        Self::new(Event::SuiteFinished).attribute("name", name)
    }

    pub fn test_started(name: &str) -> Self {
        Self::new(Event::TestStarted).attribute("name", name)
    }

    pub fn test_finished(name: &str, duration: Option<u128>) -> Self {
        let message = Self::new(Event::TestFinished).attribute("name", name);
        match duration {
            Some(duration) => message.attribute("duration", duration.to_string()),
            None => message,
        }
    }

    pub fn test_failed(name: &str, duration: u128, message: &str, details: &str) -> Self {
        Self::new(Event::TestFailed)
            .attribute("name", name)
            .attribute("duration", duration.to_string())
            .attribute("message", message)
            .attribute("details", details)
    }

    pub fn test_ignored(name: &str, comment: &str) -> Self {
        Self::new(Event::TestIgnored)
            .attribute("name", name)
            .attribute("ignoreComment", comment)
    }
}

impl fmt::Display for ServiceMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}", PROTOCOL_PREFIX, self.event.name())?;
        for (key, value) in &self.attributes {
            write!(f, " {}='{}'", key, value)?;
        }
        f.write_str("]")
    }
}
