//! Lazy, pull-based sequence combinators.
//!
//! Both combinators only do work when the consumer polls for the next element. A consumer
//! that stops pulling (or drops the stream) stops all further fetches; there is nothing to
//! tear down because no state is held between pulls beyond the last fetched element.

use futures::{Stream, TryStream, TryStreamExt, stream};
use std::future::Future;

/// Walks a linked sequence starting at `seed`.
///
/// Each pull fetches the element for the current key with `fetch`, yields it, and derives
/// the next key with `next_of`. The sequence ends after the first element whose `next_of` is
/// `None`. A failed fetch is yielded as an error and ends the sequence.
///
/// The walk cannot be rewound; build a new one from a new seed to restart.
pub fn walk<K, T, E, F, Fut, N>(seed: K, fetch: F, next_of: N) -> impl Stream<Item = Result<T, E>>
where
    F: FnMut(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(&T) -> Option<K>,
{
    stream::unfold((Some(seed), fetch, next_of), |(cursor, mut fetch, mut next_of)| async move {
        let key = cursor?;
        match fetch(key).await {
            Ok(item) => {
                let next = next_of(&item);
                Some((Ok(item), (next, fetch, next_of)))
            }
            Err(err) => Some((Err(err), (None, fetch, next_of))),
        }
    })
}

/// Applies an asynchronous `transform` to every element of `source`, in order, on demand.
///
/// Errors from `source` are passed through without invoking `transform`.
pub fn amap<S, F, Fut, U, E>(source: S, transform: F) -> impl Stream<Item = Result<U, E>>
where
    S: TryStream<Error = E>,
    F: FnMut(S::Ok) -> Fut,
    Fut: Future<Output = Result<U, E>>,
{
    source.and_then(transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, TryStreamExt};
    use std::{
        collections::HashMap,
        convert::Infallible,
        pin::pin,
        sync::{Arc, Mutex},
        time::Duration,
    };

    /// A three-element chain `1 -> 2 -> 3` that records every fetched key.
    fn chain_fetcher(
        fetched: Arc<Mutex<Vec<u32>>>,
    ) -> impl FnMut(u32) -> std::future::Ready<Result<(u32, Option<u32>), &'static str>> {
        move |key| {
            fetched.lock().unwrap().push(key);
            std::future::ready(Ok((key, (key < 3).then_some(key + 1))))
        }
    }

    #[tokio::test]
    async fn test_walk_visits_each_element_once_in_order() {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let blocks: Vec<_> = walk(1, chain_fetcher(Arc::clone(&fetched)), |(_, next)| *next)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(blocks.iter().map(|(key, _)| *key).collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(*fetched.lock().unwrap(), [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_walk_is_lazy() {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let mut chain = pin!(walk(1, chain_fetcher(Arc::clone(&fetched)), |(_, next)| *next));

        assert!(fetched.lock().unwrap().is_empty());
        assert_eq!(chain.next().await.unwrap().unwrap().0, 1);
        assert_eq!(*fetched.lock().unwrap(), [1]);

        drop(chain);
        assert_eq!(*fetched.lock().unwrap(), [1]);
    }

    #[tokio::test]
    async fn test_walk_stops_at_missing_successor() {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let mut chain = pin!(walk(3, chain_fetcher(Arc::clone(&fetched)), |(_, next)| *next));

        assert!(chain.next().await.is_some());
        assert!(chain.next().await.is_none());
        assert!(chain.next().await.is_none());
        assert_eq!(*fetched.lock().unwrap(), [3]);
    }

    #[tokio::test]
    async fn test_walk_ends_after_fetch_error() {
        let fetch = |key: u32| async move {
            if key == 2 { Err(format!("unreachable {key}")) } else { Ok(key) }
        };
        let items: Vec<_> = walk(1, fetch, |key| Some(key + 1)).collect().await;

        assert_eq!(items, vec![Ok(1), Err("unreachable 2".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_amap_preserves_order_under_uneven_latency() {
        let latencies = HashMap::from([(1u64, 30u64), (2, 1), (3, 10)]);
        let source = stream::iter([1u64, 2, 3].map(Ok::<_, Infallible>));
        let mapped = amap(source, |x| {
            let latency = latencies[&x];
            async move {
                tokio::time::sleep(Duration::from_millis(latency)).await;
                Ok::<_, Infallible>(x * 10)
            }
        });

        assert_eq!(mapped.try_collect::<Vec<_>>().await.unwrap(), [10, 20, 30]);
    }

    #[tokio::test]
    async fn test_amap_composes_with_walk() {
        let fetch = |key: u32| async move { Ok::<_, Infallible>(key) };
        let chain = walk(1, fetch, |key| (*key < 3).then_some(key + 1));
        let doubled = amap(chain, |key| async move { Ok::<_, Infallible>(key * 2) });
        let squared = amap(doubled, |key| async move { Ok::<_, Infallible>(key * key) });

        assert_eq!(squared.try_collect::<Vec<_>>().await.unwrap(), [4, 16, 36]);
    }

    #[tokio::test]
    async fn test_amap_skips_transform_for_errors() {
        let calls = Arc::new(Mutex::new(0));
        let source = stream::iter([Ok(1), Err("boom"), Ok(3)]);
        let counted = Arc::clone(&calls);
        let mapped = amap(source, move |x| {
            *counted.lock().unwrap() += 1;
            async move { Ok::<_, &str>(x) }
        });

        let items: Vec<_> = mapped.collect().await;
        assert_eq!(items, vec![Ok(1), Err("boom"), Ok(3)]);
        assert_eq!(*calls.lock().unwrap(), 2);
    }
}
