#[cfg(test)]
mod tests {
    use crate::{error::RunError, execution::coordinator::Pipeline};
    use async_trait::async_trait;
    use connectors::{
        error::AdapterError,
        memory::{VecRowSink, VecRowSource},
        source::RowSource,
    };
    use engine_config::settings::Settings;
    use engine_core::metrics::Metrics;
    use engine_processing::{normalize::DialableNormalizer, verify::BatchVerifier};
    use model::records::{
        row::Columns,
        status::{VerificationResult, VerificationStatus},
    };
    use std::{
        collections::HashMap,
        convert::Infallible,
        sync::{Arc, Mutex},
        time::Duration,
    };
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    /// Answers from a fixed table; numbers it does not know are left out.
    struct TableVerifier {
        table: HashMap<String, VerificationStatus>,
        seen: Mutex<Vec<Vec<String>>>,
        delay: fn(&[String]) -> Duration,
    }

    impl TableVerifier {
        fn new<const N: usize>(entries: [(&str, VerificationStatus); N]) -> Self {
            TableVerifier {
                table: entries
                    .into_iter()
                    .map(|(n, s)| (n.to_string(), s))
                    .collect(),
                seen: Mutex::new(Vec::new()),
                delay: |_| Duration::ZERO,
            }
        }

        fn everything_exists() -> Self {
            TableVerifier::new([])
        }

        fn with_delay(mut self, delay: fn(&[String]) -> Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl BatchVerifier for TableVerifier {
        async fn verify(&self, numbers: &[String]) -> VerificationResult {
            self.seen.lock().unwrap().push(numbers.to_vec());
            tokio::time::sleep((self.delay)(numbers)).await;

            numbers
                .iter()
                .filter_map(|n| {
                    if self.table.is_empty() {
                        Some((n.clone(), VerificationStatus::Exists))
                    } else {
                        self.table.get(n).map(|s| (n.clone(), *s))
                    }
                })
                .collect()
        }
    }

    fn settings() -> Settings {
        Settings::builder()
            .base_url("http://127.0.0.1:1/v1")
            .token("test-token")
            .number_column("phone")
            .concurrency(4)
            .batch_size(2)
            .build()
            .unwrap()
    }

    fn sink_for(source: &impl RowSource) -> VecRowSink {
        VecRowSink::new(source.columns(), "wa_status")
    }

    fn indices(sink: &VecRowSink) -> Vec<u64> {
        sink.written().iter().map(|(i, _)| *i).collect()
    }

    #[traced_test]
    #[tokio::test]
    async fn test_mixed_rows_scenario() {
        let verifier = Arc::new(TableVerifier::new([
            ("+1234567890", VerificationStatus::Exists),
            ("+44123456789", VerificationStatus::NonExist),
        ]));
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::clone(&verifier),
            Metrics::new(),
        );

        let mut source =
            VecRowSource::numbers("phone", ["+1234567890", "bad", "0044123456789"]);
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(
            sink.statuses(),
            vec![
                VerificationStatus::Exists,
                VerificationStatus::Error,
                VerificationStatus::NonExist
            ]
        );
        assert_eq!(sink.rows()[2], vec!["0044123456789", "non_exist"]);
        assert_eq!(summary.rows_processed, 3);
        assert_eq!((summary.exists, summary.non_exist, summary.error), (1, 1, 1));
        assert_eq!(summary.unresolved_rows, 0);
        assert_eq!(summary.batches, 1);
        assert!(!summary.interrupted);

        // The unparseable row never reaches the verifier.
        let seen = verifier.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![vec!["+1234567890".to_string(), "+44123456789".to_string()]]);
        assert!(logs_contain("Verification run finished"));
    }

    #[tokio::test]
    async fn test_digitless_numbers_stay_local() {
        let verifier = Arc::new(TableVerifier::everything_exists());
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::clone(&verifier),
            Metrics::new(),
        );

        let mut source = VecRowSource::numbers("phone", ["00", "+", "0 0", "+111"]);
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(
            sink.statuses(),
            vec![
                VerificationStatus::Error,
                VerificationStatus::Error,
                VerificationStatus::Error,
                VerificationStatus::Exists
            ]
        );
        assert_eq!((summary.exists, summary.error), (1, 3));

        let seen = verifier.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![vec!["+111".to_string()]]);
    }

    #[tokio::test]
    async fn test_missing_number_column_is_fatal() {
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::new(TableVerifier::everything_exists()),
            Metrics::new(),
        );

        let mut source = VecRowSource::numbers("msisdn", ["+1"]);
        let sink = sink_for(&source);
        let err = pipeline.run(&mut source, sink).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::Adapter(AdapterError::MissingColumn(ref column)) if column == "phone"
        ));
    }

    #[tokio::test]
    async fn test_number_column_matches_case_insensitively() {
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::new(TableVerifier::everything_exists()),
            Metrics::new(),
        );

        let mut source = VecRowSource::new(
            Columns::new(["Name", "Phone"]),
            vec![vec!["Ada".into(), "+1 555".into()]],
        );
        let sink = sink_for(&source);
        let (_, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(sink.rows(), &[vec!["Ada", "+1 555", "exists"]]);
    }

    #[tokio::test]
    async fn test_reverse_completion_preserves_order() {
        let mut settings = settings();
        settings.batch_size = 1;
        settings.concurrency = 8;
        settings.read_chunk_rows = 1;

        // Earlier numbers take longer, so batches finish in reverse order.
        let verifier = TableVerifier::everything_exists().with_delay(|numbers| {
            let index: u64 = numbers[0].trim_start_matches("+100").parse().unwrap_or(0);
            Duration::from_millis(40 - index * 5)
        });
        let pipeline = Pipeline::new(settings, DialableNormalizer, Arc::new(verifier), Metrics::new());

        let mut source = VecRowSource::numbers("phone", (0..8).map(|i| format!("+100{i}")));
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(indices(&sink), (0..8).collect::<Vec<_>>());
        assert_eq!(summary.batches, 8);
        assert_eq!(summary.exists, 8);
    }

    #[tokio::test]
    async fn test_small_queue_and_memory_cap() {
        let mut settings = settings();
        settings.concurrency = 2;
        settings.queue_capacity = Some(1);
        settings.batch_size = 3;
        settings.max_pending_rows = 4;

        let verifier = TableVerifier::everything_exists().with_delay(|_| Duration::from_millis(1));
        let metrics = Metrics::new();
        let pipeline = Pipeline::new(settings, DialableNormalizer, Arc::new(verifier), metrics.clone());

        let mut source = VecRowSource::numbers("phone", (0..200).map(|i| format!("+1{i:04}")));
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(summary.rows_processed, 200);
        assert_eq!(summary.unresolved_rows, 0);
        assert_eq!(indices(&sink), (0..200).collect::<Vec<_>>());
        assert_eq!(metrics.snapshot().rows_read, 200);
        assert_eq!(metrics.snapshot().rows_written, 200);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::new(TableVerifier::everything_exists()),
            Metrics::new(),
        );

        let mut source = VecRowSource::new(Columns::new(["phone"]), Vec::new());
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert_eq!(summary.rows_processed, 0);
        assert_eq!(summary.batches, 0);
        assert!(sink.rows().is_empty());
        assert_eq!(sink.flushes(), 1);
    }

    /// Cancels the token after handing out `limit` records.
    struct CancellingSource {
        inner: VecRowSource,
        served: usize,
        limit: usize,
        cancel: CancellationToken,
    }

    impl RowSource for CancellingSource {
        type Error = Infallible;

        fn columns(&self) -> &Columns {
            self.inner.columns()
        }

        fn next_record(&mut self) -> Option<Result<Vec<String>, Infallible>> {
            let record = self.inner.next_record();
            self.served += 1;
            if self.served == self.limit {
                self.cancel.cancel();
            }
            record
        }
    }

    #[tokio::test]
    async fn test_cancellation_writes_complete_prefix() {
        let cancel = CancellationToken::new();
        let pipeline = Pipeline::new(
            settings(),
            DialableNormalizer,
            Arc::new(TableVerifier::everything_exists()),
            Metrics::new(),
        )
        .with_cancel(cancel.clone());

        let mut source = CancellingSource {
            inner: VecRowSource::numbers("phone", (0..50).map(|i| format!("+2{i:03}"))),
            served: 0,
            limit: 7,
            cancel,
        };
        let sink = sink_for(&source);
        let (summary, sink) = pipeline.run(&mut source, sink).await.unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.rows_processed, 7);
        assert_eq!(summary.unresolved_rows, 0);
        assert_eq!(indices(&sink), (0..7).collect::<Vec<_>>());
        assert!(sink.statuses().iter().all(|s| *s == VerificationStatus::Exists));
    }
}
