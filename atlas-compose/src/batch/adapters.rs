//! Entry points for string-keyed batches.

use super::{BatchOptions, BatchProcessor, BatchResult};
use std::fmt::Display;
use std::future::Future;

/// Runs `operation` over a list of IDs.
pub async fn batch_process_ids<I, R, E, F, Fut>(
    ids: I,
    operation: F,
    options: BatchOptions,
) -> BatchResult<String, R>
where
    I: IntoIterator,
    I::Item: Into<String>,
    R: Send + 'static,
    E: Display + Send,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let items: Vec<String> = ids.into_iter().map(Into::into).collect();
    BatchProcessor::new(options).process(items, operation).await
}

/// Runs `operation` over a list of file paths.
pub async fn batch_process_paths<I, R, E, F, Fut>(
    paths: I,
    operation: F,
    options: BatchOptions,
) -> BatchResult<String, R>
where
    I: IntoIterator,
    I::Item: Into<String>,
    R: Send + 'static,
    E: Display + Send,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    batch_process_ids(paths, operation, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_batch_process_ids() {
        let result = batch_process_ids(
            ["id1", "id2", "id3"],
            |id| async move { Ok::<_, String>(format!("{id}_processed")) },
            BatchOptions::new().with_continue_on_error(true),
        )
        .await;

        assert_eq!(result.succeeded, 3);
        assert_eq!(
            result.results,
            vec!["id1_processed", "id2_processed", "id3_processed"]
        );
    }

    #[tokio::test]
    async fn test_batch_process_paths() {
        let paths = vec!["path1".to_string(), "path2".to_string()];
        let result = batch_process_paths(
            paths,
            |path| async move { Ok::<_, String>(serde_json::json!({ "path": path })) },
            BatchOptions::new(),
        )
        .await;

        assert_eq!(result.succeeded, 2);
        assert_eq!(
            result.to_compact_json()["results"],
            serde_json::json!([{"path": "path1"}, {"path": "path2"}])
        );
    }

    #[tokio::test]
    async fn test_batch_process_ids_parallel_with_failure() {
        let result = batch_process_ids(
            vec!["P-01", "missing", "P-02"],
            |id| async move {
                if id == "missing" {
                    Err(format!("phase {id} not found"))
                } else {
                    Ok(id.len())
                }
            },
            BatchOptions::new()
                .with_parallel(true)
                .with_continue_on_error(true),
        )
        .await;

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.errors[0].item, "missing");
        assert_eq!(result.errors[0].error, "phase missing not found");
    }
}
