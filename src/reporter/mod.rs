macro_rules! lock {
    ($name: expr) => {
        match $name.lock() {
            Ok(locked) => locked,
            Err(e) => panic!("{:#?}", e),
        }
    };
}

pub(crate) mod listener;
pub(crate) mod message;
pub(crate) mod sink;

use crate::configuration::constants::common::ENGINE_ID;
use crate::engine::request::{DiscoveryRequest, Selector};
use crate::engine::unique_id::UniqueId;
use crate::engine::TestEngine;
use crate::error::{Error, Result};
use crate::reporter::listener::ProtocolListener;
use crate::reporter::sink::{Sink, StdoutSink};
use crate::time::{Clock, MonotonicClock};

/// Runs one test source through an engine and reports it on the protocol.
#[derive(Debug)]
pub struct ExecutionReporter {
    source: String,
    scope: Option<UniqueId>,
}

impl ExecutionReporter {
    /// Fails when `scope` is not a well-formed identifier path.
    pub fn new<S: Into<String>>(source: S, scope: Option<&str>) -> Result<Self> {
        let scope = match scope {
            Some(raw) => {
                let segments = raw.parse::<UniqueId>()?;
                Some(UniqueId::for_engine(ENGINE_ID).join(&segments))
            }
            None => None,
        };
        Ok(Self {
            source: source.into(),
            scope,
        })
    }

    pub fn request(&self) -> Result<DiscoveryRequest> {
        let mut builder = DiscoveryRequest::builder();
        builder.include_engine(ENGINE_ID);
        if let Some(scope) = &self.scope {
            builder.selector(Selector::UniqueId(scope.clone()));
        }
        builder
            .selector(Selector::Source(self.source.clone()))
            .build()
            .map_err(Error::Request)
    }

    pub fn run(&self, engine: &dyn TestEngine) -> Result<()> {
        self.run_with(engine, StdoutSink, MonotonicClock::new())
    }

    pub fn run_with<S, C>(&self, engine: &dyn TestEngine, sink: S, clock: C) -> Result<()>
    where
        S: Sink,
        C: Clock,
    {
        let request = self.request()?;
        info!(
            "Running '{}' on engine '{}'{}",
            self.source,
            engine.id(),
            self.scope
                .as_ref()
                .map(|scope| format!(" within {}", scope))
                .unwrap_or_default()
        );
        debug!("Discovery selectors {:?}", request.selectors());
        let listener = ProtocolListener::new(sink, clock);
        engine.execute(&request, &listener)
    }
}
