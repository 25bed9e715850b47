use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Coalesces bursts of values into a single callback carrying the last one.
///
/// The callback fires once the input has been quiet for `delay`. Dropping
/// the debouncer discards any value still waiting.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, mut callback: F) -> Self
    where
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(value) => latest = value,
                            None => return,
                        },
                        _ = sleep(delay) => break,
                    }
                }
                callback(latest).await;
            }
        });

        Self { tx, task }
    }

    pub fn push(&self, value: T) {
        // Only fails once the task is gone, nothing left to notify then
        let _ = self.tx.send(value);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Debouncer<String>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let debouncer = Debouncer::new(Duration::from_millis(80), move |value: String| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push(value);
            }
        });
        (calls, debouncer)
    }

    #[tokio::test]
    async fn test_burst_yields_one_call_with_final_value() {
        let (calls, debouncer) = recorder();

        let mut typed = String::new();
        for c in "amoxi".chars() {
            typed.push(c);
            debouncer.push(typed.clone());
            sleep(Duration::from_millis(10)).await;
        }
        sleep(Duration::from_millis(250)).await;

        assert_eq!(*calls.lock().unwrap(), vec!["amoxi".to_string()]);
    }

    #[tokio::test]
    async fn test_separate_bursts_yield_separate_calls() {
        let (calls, debouncer) = recorder();

        debouncer.push("par".to_string());
        debouncer.push("para".to_string());
        sleep(Duration::from_millis(250)).await;
        debouncer.push("ibu".to_string());
        sleep(Duration::from_millis(250)).await;

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["para".to_string(), "ibu".to_string()]
        );
    }

    #[tokio::test]
    async fn test_drop_discards_pending_value() {
        let (calls, debouncer) = recorder();

        debouncer.push("cet".to_string());
        drop(debouncer);
        sleep(Duration::from_millis(250)).await;

        assert!(calls.lock().unwrap().is_empty());
    }
}
