use crate::engine::plan::{Action, PlanNode};
use crate::engine::{ExecutionListener, Failure, TestExecutionResult};
use crate::error::Result;
use anyhow::{anyhow, Context as _};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Walks a discovered plan, running sibling test cases on a worker pool.
pub(crate) struct Executor {
    shell: Vec<String>,
    threads: usize,
    pool: ThreadPool,
}

impl Executor {
    pub fn new(shell: Vec<String>, threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("testrelay-worker-{}", i))
            .build()?;
        Ok(Self {
            shell,
            threads,
            pool,
        })
    }

    pub fn execute(&self, node: &PlanNode, listener: &dyn ExecutionListener) -> Result<()> {
        let identifier = &node.identifier;
        if let Some(reason) = &node.skip {
            debug!("Skipping {}: {}", identifier.unique_id, reason);
            return listener.execution_skipped(identifier, reason);
        }
        listener.execution_started(identifier)?;
        let result = match &node.action {
            Action::Group => {
                self.execute_children(&node.children, listener)?;
                TestExecutionResult::successful()
            }
            Action::Run { command, workdir } => self.run_case(command, workdir.as_deref()),
        };
        listener.execution_finished(identifier, &result)
    }

    /// Containers run one after another; each stretch of test cases between
    /// them is spread over the pool.
    fn execute_children(&self, children: &[PlanNode], listener: &dyn ExecutionListener) -> Result<()> {
        let mut batch: Vec<&PlanNode> = vec![];
        for child in children {
            if child.identifier.is_container() {
                self.execute_batch(&batch, listener)?;
                batch.clear();
                self.execute(child, listener)?;
            } else {
                batch.push(child);
            }
        }
        self.execute_batch(&batch, listener)
    }

    fn execute_batch(&self, batch: &[&PlanNode], listener: &dyn ExecutionListener) -> Result<()> {
        if self.threads <= 1 || batch.len() <= 1 {
            return batch.iter().try_for_each(|node| self.execute(node, listener));
        }
        self.pool.install(|| {
            batch
                .par_iter()
                .try_for_each(|node| self.execute(node, listener))
        })
    }

    fn run_case(&self, line: &str, workdir: Option<&Path>) -> TestExecutionResult {
        let mut command = Command::new(&self.shell[0]);
        command
            .args(&self.shell[1..])
            .arg(line)
            .stdin(Stdio::null());
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }
        let now = Instant::now();
        let output = match command
            .output()
            .with_context(|| format!("failed to start `{}`", line))
        {
            Ok(output) => output,
            Err(e) => {
                error!("{:#}", e);
                return TestExecutionResult::aborted(Failure::from(&e));
            }
        };
        trace!(
            "`{}` wrote {:?} to stdout",
            line,
            String::from_utf8_lossy(&output.stdout)
        );
        info!(
            "Elapsed for execution of `{}`, {} ms ({})",
            line,
            now.elapsed().as_millis(),
            output.status
        );
        if output.status.success() {
            return TestExecutionResult::successful();
        }
        let summary = format!("`{}` exited with {}", line, output.status);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();
        let error = if stderr.is_empty() {
            anyhow!(summary)
        } else {
            anyhow!(stderr.to_owned()).context(summary)
        };
        TestExecutionResult::failed(Failure::from(&error))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{NodeKind, Status, TestIdentifier, TestPlan};
    use crate::engine::unique_id::UniqueId;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        results: Mutex<Vec<(String, TestExecutionResult)>>,
    }

    impl ExecutionListener for Recorder {
        fn plan_started(&self, _plan: &TestPlan) -> Result<()> {
            Ok(())
        }

        fn execution_started(&self, identifier: &TestIdentifier) -> Result<()> {
            let mut events = self.events.lock().unwrap();
            events.push(format!("start {}", identifier.display_name));
            Ok(())
        }

        fn execution_finished(
            &self,
            identifier: &TestIdentifier,
            result: &TestExecutionResult,
        ) -> Result<()> {
            let mut events = self.events.lock().unwrap();
            events.push(format!("finish {}", identifier.display_name));
            let mut results = self.results.lock().unwrap();
            results.push((identifier.display_name.clone(), result.clone()));
            Ok(())
        }

        fn execution_skipped(&self, identifier: &TestIdentifier, reason: &str) -> Result<()> {
            let mut events = self.events.lock().unwrap();
            events.push(format!("skip {} ({})", identifier.display_name, reason));
            Ok(())
        }
    }

    fn node(parent: &UniqueId, name: &str, action: Action, children: Vec<PlanNode>) -> PlanNode {
        let kind = match action {
            Action::Group => NodeKind::Container,
            Action::Run { .. } => NodeKind::Test,
        };
        PlanNode {
            identifier: TestIdentifier {
                unique_id: parent.append("test", name),
                parent_id: Some(parent.clone()),
                display_name: name.to_owned(),
                kind,
            },
            action,
            skip: None,
            children,
        }
    }

    fn case(parent: &UniqueId, name: &str, command: &str) -> PlanNode {
        node(
            parent,
            name,
            Action::Run {
                command: command.to_owned(),
                workdir: None,
            },
            vec![],
        )
    }

    fn shell() -> Vec<String> {
        vec!["sh".to_owned(), "-c".to_owned()]
    }

    #[test]
    fn test_container_wraps_children_in_order() {
        let root = UniqueId::for_engine("testrelay");
        let suite_id = root.append("test", "suite");
        let mut skipped = case(&suite_id, "later", "true");
        skipped.skip = Some("disabled".to_owned());
        let suite = node(
            &root,
            "suite",
            Action::Group,
            vec![case(&suite_id, "first", "true"), skipped],
        );
        let recorder = Recorder::default();

        Executor::new(shell(), 1)
            .unwrap()
            .execute(&suite, &recorder)
            .unwrap();

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec![
                "start suite",
                "start first",
                "finish first",
                "skip later (disabled)",
                "finish suite"
            ]
        );
    }

    #[test]
    fn test_failed_case_carries_stderr_as_cause() {
        let root = UniqueId::for_engine("testrelay");
        let failing = case(&root, "boom", "echo broken >&2; exit 3");
        let recorder = Recorder::default();

        Executor::new(shell(), 1)
            .unwrap()
            .execute(&failing, &recorder)
            .unwrap();

        let results = recorder.results.lock().unwrap();
        let (_, result) = &results[0];
        let failure = result.failure.as_ref().unwrap();
        assert_eq!(result.status, Status::Failed);
        assert!(failure.message.contains("exited with"));
        assert!(failure.trace.contains("Caused by:"));
        assert!(failure.trace.contains("broken"));
    }

    #[test]
    fn test_unstartable_shell_aborts_case() {
        let root = UniqueId::for_engine("testrelay");
        let recorder = Recorder::default();

        Executor::new(vec!["/nonexistent/testrelay-shell".to_owned()], 1)
            .unwrap()
            .execute(&case(&root, "x", "true"), &recorder)
            .unwrap();

        let results = recorder.results.lock().unwrap();
        assert_eq!(results[0].1.status, Status::Aborted);
        assert!(results[0]
            .1
            .failure
            .as_ref()
            .unwrap()
            .message
            .contains("failed to start"));
    }

    #[test]
    fn test_parallel_cases_all_reported() {
        let root = UniqueId::for_engine("testrelay");
        let suite_id = root.append("test", "suite");
        let children = (0..8)
            .map(|i| case(&suite_id, &format!("case {}", i), "sleep 0.05"))
            .collect();
        let suite = node(&root, "suite", Action::Group, children);
        let recorder = Recorder::default();

        Executor::new(shell(), 4)
            .unwrap()
            .execute(&suite, &recorder)
            .unwrap();

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 18);
        assert_eq!(events.first().unwrap(), "start suite");
        assert_eq!(events.last().unwrap(), "finish suite");
        let results = recorder.results.lock().unwrap();
        assert!(results.iter().all(|(_, r)| r.status == Status::Successful));
    }
}
