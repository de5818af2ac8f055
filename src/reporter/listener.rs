use crate::engine::unique_id::UniqueId;
use crate::engine::{ExecutionListener, Status, TestExecutionResult, TestIdentifier, TestPlan};
use crate::error::{Error, Result};
use crate::reporter::message::ServiceMessage;
use crate::reporter::sink::Sink;
use crate::time::Clock;
use derivative::*;
use std::collections::HashMap;
use std::sync::Mutex;

/// Translates engine callbacks into protocol lines.
///
/// Holds start times of in-flight test cases; everything else is formatted
/// straight from the callback arguments and written in arrival order.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct ProtocolListener<S: Sink, C: Clock> {
    #[derivative(Debug = "ignore")]
    sink: S,
    #[derivative(Debug = "ignore")]
    clock: C,
    durations: Mutex<HashMap<UniqueId, u128>>,
}

impl<S: Sink, C: Clock> ProtocolListener<S, C> {
    pub fn new(sink: S, clock: C) -> Self {
        Self {
            sink,
            clock,
            durations: Mutex::new(HashMap::new()),
        }
    }

    fn emit(&self, message: ServiceMessage) -> Result<()> {
        trace!("Emitting {:?}: {}", message.event(), message);
        self.sink.emit(&message).map_err(Error::from)
    }

    fn elapsed(&self, id: &UniqueId) -> Result<u128> {
        let started = lock!(self.durations).remove(id);
        match started {
            Some(started) => Ok(self.clock.now_millis().saturating_sub(started)),
            None => Err(Error::MissingStart(id.clone())),
        }
    }
}

impl<S: Sink, C: Clock> ExecutionListener for ProtocolListener<S, C> {
    fn plan_started(&self, plan: &TestPlan) -> Result<()> {
        let roots: Vec<String> = plan
            .roots
            .iter()
            .map(|root| root.unique_id.to_string())
            .collect();
        debug!(
            "Test plan started with {} tests in {} containers under {}",
            plan.test_count,
            plan.container_count,
            roots.join(", ")
        );
        self.emit(ServiceMessage::handshake())
    }

    fn execution_started(&self, identifier: &TestIdentifier) -> Result<()> {
        if identifier.is_root() {
            return Ok(());
        }
        let name = identifier.display_name.as_str();
        if identifier.is_container() {
            self.emit(ServiceMessage::suite_started(name))
        } else {
            let now = self.clock.now_millis();
            lock!(self.durations).insert(identifier.unique_id.clone(), now);
            self.emit(ServiceMessage::test_started(name))
        }
    }

    fn execution_finished(
        &self,
        identifier: &TestIdentifier,
        result: &TestExecutionResult,
    ) -> Result<()> {
        if identifier.is_root() {
            return Ok(());
        }
        let name = identifier.display_name.as_str();
        if identifier.is_container() {
            return self.emit(ServiceMessage::suite_finished(name));
        }
        let duration = self.elapsed(&identifier.unique_id)?;
        if result.status == Status::Successful {
            return self.emit(ServiceMessage::test_finished(name, Some(duration)));
        }
        let failure = match &result.failure {
            Some(failure) => failure,
            None => return Err(Error::MissingFailure(identifier.unique_id.clone())),
        };
        debug!("{} finished as {:?}", identifier.unique_id, result.status);
        self.emit(ServiceMessage::test_failed(
            name,
            duration,
            &failure.message,
            &failure.trace,
        ))
    }

    fn execution_skipped(&self, identifier: &TestIdentifier, reason: &str) -> Result<()> {
        let name = identifier.display_name.as_str();
        let messages = [
            ServiceMessage::test_ignored(name, reason),
            ServiceMessage::test_finished(name, None),
        ];
        trace!("Emitting {} and {}", messages[0], messages[1]);
        self.sink.emit_all(&messages).map_err(Error::from)
    }
}
