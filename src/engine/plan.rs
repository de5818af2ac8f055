use crate::configuration::constants::common::ENGINE_ID;
use crate::configuration::manifest::{Manifest, NodeEntry};
use crate::engine::executor::Executor;
use crate::engine::request::DiscoveryRequest;
use crate::engine::unique_id::UniqueId;
use crate::engine::{ExecutionListener, NodeKind, TestEngine, TestIdentifier, TestPlan};
use crate::error::{Error, Result};
use std::path::PathBuf;

const SUITE_SEGMENT: &str = "suite";
const GROUP_SEGMENT: &str = "group";
const TEST_SEGMENT: &str = "test";

#[derive(Debug, Clone)]
pub(crate) enum Action {
    Group,
    Run {
        command: String,
        workdir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct PlanNode {
    pub identifier: TestIdentifier,
    pub action: Action,
    pub skip: Option<String>,
    pub children: Vec<PlanNode>,
}

/// Engine running the command lines declared by a manifest.
pub struct PlanEngine {
    manifest: Manifest,
    threads: usize,
}

impl PlanNode {
    fn root(name: &str) -> Self {
        Self {
            identifier: TestIdentifier {
                unique_id: UniqueId::for_engine(ENGINE_ID),
                parent_id: None,
                display_name: name.to_owned(),
                kind: NodeKind::Container,
            },
            action: Action::Group,
            skip: None,
            children: vec![],
        }
    }

    fn from_entry(entry: &NodeEntry, parent: &UniqueId, kind: &str) -> Self {
        let unique_id = parent.append(kind, entry.name.as_str());
        let children = entry
            .children()
            .iter()
            .map(|child| {
                let kind = if child.is_container() {
                    GROUP_SEGMENT
                } else {
                    TEST_SEGMENT
                };
                PlanNode::from_entry(child, &unique_id, kind)
            })
            .collect();
        let (node_kind, action) = match &entry.run {
            Some(command) => (
                NodeKind::Test,
                Action::Run {
                    command: command.clone(),
                    workdir: entry.workdir.clone(),
                },
            ),
            None => (NodeKind::Container, Action::Group),
        };
        let parent_id = unique_id.parent();
        Self {
            identifier: TestIdentifier {
                unique_id,
                parent_id,
                display_name: entry.name.clone(),
                kind: node_kind,
            },
            action,
            skip: entry.skip.clone(),
            children,
        }
    }

    fn contains(&self, id: &UniqueId) -> bool {
        &self.identifier.unique_id == id || self.children.iter().any(|child| child.contains(id))
    }

    /// Keeps nodes that lie on the path to a scope or below one.
    fn retain_scopes(&mut self, scopes: &[&UniqueId]) {
        self.children.retain(|child| {
            let id = &child.identifier.unique_id;
            scopes
                .iter()
                .any(|scope| id.starts_with(scope) || scope.starts_with(id))
        });
        for child in &mut self.children {
            if !scopes.iter().any(|scope| child.identifier.unique_id.starts_with(scope)) {
                child.retain_scopes(scopes);
            }
        }
    }

    fn count(&self, kind: NodeKind) -> usize {
        let own = if self.identifier.kind == kind { 1 } else { 0 };
        own + self.children.iter().map(|child| child.count(kind)).sum::<usize>()
    }
}

impl PlanEngine {
    pub fn new(manifest: Manifest, threads: usize) -> Self {
        Self {
            manifest,
            threads: threads.max(1),
        }
    }

    pub(crate) fn discover(&self, request: &DiscoveryRequest) -> Result<PlanNode> {
        if !request.includes_engine(self.id()) {
            return Err(Error::EngineExcluded(self.id().to_owned()));
        }
        let mut root = PlanNode::root(&self.manifest.name);
        let sources: Vec<&str> = request.sources().collect();
        for suite in &self.manifest.suites {
            if sources.is_empty() || sources.contains(&suite.name.as_str()) {
                root.children.push(PlanNode::from_entry(
                    suite,
                    &root.identifier.unique_id,
                    SUITE_SEGMENT,
                ));
            }
        }
        for source in sources {
            if !self.manifest.suites.iter().any(|suite| suite.name == source) {
                return Err(Error::UnknownSource(source.to_owned()));
            }
        }

        let scopes: Vec<&UniqueId> = request.unique_ids().collect();
        if let Some(missing) = scopes.iter().find(|scope| !root.contains(scope)) {
            return Err(Error::UnknownScope((*missing).clone()));
        }
        if !scopes.is_empty() {
            root.retain_scopes(&scopes);
        }
        Ok(root)
    }
}

impl TestEngine for PlanEngine {
    fn id(&self) -> &str {
        ENGINE_ID
    }

    fn execute(&self, request: &DiscoveryRequest, listener: &dyn ExecutionListener) -> Result<()> {
        let root = self.discover(request)?;
        let plan = TestPlan {
            roots: vec![root.identifier.clone()],
            test_count: root.count(NodeKind::Test),
            container_count: root.count(NodeKind::Container),
        };
        info!(
            "Discovered {} tests in {} containers",
            plan.test_count, plan.container_count
        );
        let executor = Executor::new(self.manifest.shell_command(), self.threads)?;
        listener.plan_started(&plan)?;
        executor.execute(&root, listener)
    }
}
