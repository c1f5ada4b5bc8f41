use futures::StreamExt;
use futures::stream;
use std::future::Future;

/// 以最大并发数执行一组future，结果顺序与输入顺序一致
pub async fn do_parallel_with_limit<F, T>(futures: Vec<F>, max_concurrent: usize) -> Vec<T>
where
    F: Future<Output = T>,
{
    stream::iter(futures)
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}
