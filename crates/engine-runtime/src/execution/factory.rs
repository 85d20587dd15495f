use crate::{error::RunError, execution::coordinator::Pipeline, report::RunSummary};
use connectors::{
    contacts::api::HttpContactsApi,
    error::AdapterError,
    file::csv::{sink::CsvRowSink, source::CsvRowSource},
    source::RowSource,
};
use engine_config::settings::Settings;
use engine_core::metrics::Metrics;
use engine_processing::{normalize::DialableNormalizer, verify::ContactsVerifier};
use std::{path::Path, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Verifier talking to the configured contacts endpoint.
pub fn http_verifier(
    settings: &Settings,
    metrics: Metrics,
) -> Result<ContactsVerifier<HttpContactsApi>, RunError> {
    let api = HttpContactsApi::new(
        &settings.base_url,
        settings.token.clone(),
        settings.request_timeout,
        settings.concurrency,
    )
    .map_err(AdapterError::from)?;

    info!(endpoint = %api.url(), "Contacts endpoint configured");
    Ok(ContactsVerifier::new(api, settings.retry_policy(), metrics))
}

/// Verifies every row of `input` and writes the annotated rows to `output`.
///
/// The output file is only created once the input header, the number column
/// and the HTTP client have been checked.
pub async fn run_csv(
    settings: Settings,
    input: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<RunSummary, RunError> {
    settings.validate()?;

    let mut source = CsvRowSource::open(input).map_err(AdapterError::from)?;
    if source.columns().position(&settings.number_column).is_none() {
        return Err(AdapterError::MissingColumn(settings.number_column.clone()).into());
    }

    let metrics = Metrics::new();
    let verifier = Arc::new(http_verifier(&settings, metrics.clone())?);
    let sink = CsvRowSink::create(output, source.columns(), &settings.status_column)
        .map_err(AdapterError::from)?;

    info!(input = %input.display(), output = %output.display(), "Processing CSV");

    let pipeline =
        Pipeline::new(settings, DialableNormalizer, verifier, metrics).with_cancel(cancel);
    let (summary, sink) = pipeline.run(&mut source, sink).await?;
    sink.into_inner().map_err(AdapterError::from)?;

    Ok(summary)
}
