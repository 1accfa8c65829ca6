// src/config/loader.rs

use std::fs;
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::model::{PipelineFile, TaskSection};
use crate::errors::{DagrunError, Result};
use crate::exec::ShellAction;
use crate::graph::{Backoff, Graph, GraphBuilder, RetryPolicy, Task};

/// Read and deserialize a pipeline file.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to get
/// a runnable [`Graph`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let file: PipelineFile = toml::from_str(&contents)?;
    Ok(file)
}

/// Load a pipeline file and convert it into a validated graph.
///
/// Returns the effective concurrency limit alongside the graph. Semantic
/// errors in the task set (unknown `after` references, cycles) surface as
/// [`ValidationError`](crate::errors::ValidationError)s.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<(NonZeroUsize, Graph)> {
    let file = load_from_path(path)?;
    let concurrency = NonZeroUsize::new(file.pipeline.concurrency).ok_or_else(|| {
        DagrunError::ConfigError("[pipeline].concurrency must be >= 1 (got 0)".to_string())
    })?;
    let graph = graph_from_file(&file)?;
    Ok((concurrency, graph))
}

fn graph_from_file(file: &PipelineFile) -> Result<Graph> {
    if file.task.is_empty() {
        return Err(DagrunError::ConfigError(
            "pipeline must contain at least one [task.<name>] section".to_string(),
        ));
    }

    let mut builder = GraphBuilder::new();
    for (name, section) in file.task.iter() {
        builder = builder.add(task_from_section(name, section)?);
    }
    Ok(builder.build()?)
}

fn task_from_section(name: &str, section: &TaskSection) -> Result<Task> {
    let max_attempts = NonZeroU32::new(section.max_attempts).ok_or_else(|| {
        DagrunError::ConfigError(format!(
            "task '{name}': max_attempts must be >= 1 (got 0)"
        ))
    })?;

    let backoff = match section.backoff_ms {
        Some(ms) => Backoff::Fixed(Duration::from_millis(ms)),
        None => Backoff::None,
    };

    let mut task = Task::new(name, Arc::new(ShellAction::new(section.cmd.clone())))
        .retry(RetryPolicy::new(max_attempts, backoff));

    if let Some(ms) = section.timeout_ms {
        task = task.timeout(Duration::from_millis(ms));
    }

    for dep in &section.after {
        task = task.after(dep.clone());
    }

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::errors::ValidationError;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_a_minimal_pipeline() {
        let file = write_config(
            r#"
            [task.a]
            cmd = "true"

            [task.b]
            cmd = "true"
            after = ["a"]
            max_attempts = 3
            backoff_ms = 250
            timeout_ms = 1000
            "#,
        );

        let (concurrency, graph) = load_and_validate(file.path()).unwrap();
        assert_eq!(concurrency.get(), 1);
        assert_eq!(graph.len(), 2);

        let b = graph.task("b").unwrap();
        assert_eq!(b.dependencies(), &["a".to_string()]);
        assert_eq!(b.retry_policy().max_attempts(), 3);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let file = write_config(
            r#"
            [pipeline]
            concurrency = 0

            [task.a]
            cmd = "true"
            "#,
        );
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, DagrunError::ConfigError(_)));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let file = write_config(
            r#"
            [task.a]
            cmd = "true"
            max_attempts = 0
            "#,
        );
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, DagrunError::ConfigError(_)));
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let file = write_config("");
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, DagrunError::ConfigError(_)));
    }

    #[test]
    fn unknown_dependency_surfaces_as_validation_error() {
        let file = write_config(
            r#"
            [task.a]
            cmd = "true"
            after = ["ghost"]
            "#,
        );
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DagrunError::Validation(ValidationError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn cycle_surfaces_as_validation_error() {
        let file = write_config(
            r#"
            [task.a]
            cmd = "true"
            after = ["b"]

            [task.b]
            cmd = "true"
            after = ["a"]
            "#,
        );
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DagrunError::Validation(ValidationError::CycleDetected(_))
        ));
    }
}
