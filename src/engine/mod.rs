pub(crate) mod executor;
pub(crate) mod plan;
pub(crate) mod request;
pub(crate) mod unique_id;

use crate::engine::request::DiscoveryRequest;
use crate::engine::unique_id::UniqueId;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Test,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestIdentifier {
    pub unique_id: UniqueId,
    pub parent_id: Option<UniqueId>,
    pub display_name: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Successful,
    Failed,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub message: String,
    /// Full error text including its cause chain, usually multi-line.
    pub trace: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestExecutionResult {
    pub status: Status,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestPlan {
    pub roots: Vec<TestIdentifier>,
    pub test_count: usize,
    pub container_count: usize,
}

impl TestIdentifier {
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }
}

impl TestExecutionResult {
    pub fn successful() -> Self {
        Self {
            status: Status::Successful,
            failure: None,
        }
    }

    pub fn failed(failure: Failure) -> Self {
        Self {
            status: Status::Failed,
            failure: Some(failure),
        }
    }

    pub fn aborted(failure: Failure) -> Self {
        Self {
            status: Status::Aborted,
            failure: Some(failure),
        }
    }
}

impl From<&anyhow::Error> for Failure {
    fn from(error: &anyhow::Error) -> Self {
        Self {
            message: error.to_string(),
            trace: format!("{:?}", error),
        }
    }
}

/// Receives lifecycle callbacks from an engine run.
///
/// Engines may call these from several worker threads at once. Any error
/// returned aborts the run and is handed back from [`TestEngine::execute`].
pub trait ExecutionListener: Send + Sync {
    fn plan_started(&self, plan: &TestPlan) -> Result<()>;
    fn execution_started(&self, identifier: &TestIdentifier) -> Result<()>;
    fn execution_finished(
        &self,
        identifier: &TestIdentifier,
        result: &TestExecutionResult,
    ) -> Result<()>;
    fn execution_skipped(&self, identifier: &TestIdentifier, reason: &str) -> Result<()>;
}

pub trait TestEngine {
    fn id(&self) -> &str;

    /// Discovers the tests selected by `request` and runs them, blocking until
    /// the whole tree has finished.
    fn execute(&self, request: &DiscoveryRequest, listener: &dyn ExecutionListener) -> Result<()>;
}
