//! # Lifecycle
//!
//! [`Ignition`] owns every piece of per-worker state: the recorders, the
//! solution providers and the Flare client. Long-lived workers serve many
//! units of work (requests, queue jobs, scheduler ticks) with one
//! instance, so the host calls the reset hooks at every boundary.
//!
//! Worker events only reset. Queued reports are delivered by the async
//! hooks: [`Ignition::end_unit_of_work`], the queue job hooks and
//! [`Ignition::run_unit_of_work`]. Hosts driven by worker events should
//! await `end_unit_of_work` when a request terminates.

use std::future::Future;
use std::sync::Arc;

use tracing::Level;

use crate::captured::CapturedError;
use crate::config::IgnitionConfig;
use crate::error::Result;
use crate::flare::{Flare, SentReports};
use crate::logging::CaptureLayer;
use crate::middleware;
use crate::recorders::{Recorder, Recorders};
use crate::report::Report;
use crate::solutions::providers::ProviderContext;
use crate::solutions::{KnownNames, SolutionProvider, SolutionProviderRepository};
use crate::transport::ReportTransport;

/// Worker events that mark a unit-of-work boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    RequestReceived,
    TaskReceived,
    TickReceived,
    RequestTerminated,
}

/// The error reporting context of one worker
#[derive(Debug)]
pub struct Ignition {
    config: IgnitionConfig,
    recorders: Recorders,
    repository: Arc<SolutionProviderRepository>,
    flare: Arc<Flare>,
    report_level: Level,
}

impl Ignition {
    pub fn builder(config: IgnitionConfig) -> IgnitionBuilder {
        IgnitionBuilder::new(config)
    }

    /// Wires everything from configuration alone
    pub fn from_config(config: IgnitionConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Starts the configured recorders
    pub fn boot(&self) {
        for recorder in self.recorders.iter() {
            if self.config.ignition.records(recorder.name()) {
                recorder.start();
            }
        }

        tracing::info!(
            recorders = ?self.config.ignition.recorders,
            providers = ?self.repository.names(),
            "Ignition booted"
        );
    }

    /// Clears per-unit-of-work state
    ///
    /// Log, query and job recorders are only reset when their middleware is
    /// enabled; dumps are always reset. Queued reports are kept.
    pub fn reset(&self) {
        self.flare.sent_reports().clear();

        let middleware = &self.config.flare.middleware;
        if middleware.add_logs.enabled {
            self.recorders.logs.reset();
        }
        if middleware.add_queries.enabled {
            self.recorders.queries.reset();
        }
        if middleware.add_jobs.enabled {
            self.recorders.jobs.reset();
        }
        self.recorders.dumps.reset();

        tracing::trace!("Ignition reset");
    }

    pub fn handle_worker_event(&self, event: WorkerEvent) {
        tracing::trace!(?event, "Worker event");
        match event {
            WorkerEvent::RequestReceived
            | WorkerEvent::TaskReceived
            | WorkerEvent::TickReceived
            | WorkerEvent::RequestTerminated => self.reset(),
        }
    }

    /// Runs before a queue job: delivers reports of earlier jobs and
    /// switches to sending reports immediately
    pub async fn before_job(&self) -> usize {
        self.reset();
        let delivered = self.flare.send_queued_reports().await;
        self.flare.send_reports_immediately();
        delivered
    }

    /// Runs after a queue job
    pub async fn after_job(&self) -> usize {
        self.reset();
        self.flare.send_queued_reports().await
    }

    /// Delivers the reports of the finished unit of work, then resets
    pub async fn end_unit_of_work(&self) -> usize {
        let delivered = self.flare.send_queued_reports().await;
        self.reset();
        delivered
    }

    /// Runs one unit of work between two resets
    pub async fn run_unit_of_work<F, Fut, T>(&self, unit: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.reset();
        let output = unit().await;
        self.end_unit_of_work().await;
        output
    }

    /// Reports an error, delivering it right away when configured to
    pub async fn handle_error(&self, error: &CapturedError) -> Report {
        let report = self.flare.report(error);

        if self.flare.sends_reports_immediately() {
            self.flare.send_queued_reports().await;
        }

        report
    }

    /// A `tracing` layer feeding this context's log recorder
    pub fn capture_layer(&self) -> CaptureLayer {
        CaptureLayer::new(Arc::clone(&self.recorders.logs), Arc::clone(&self.flare), self.report_level)
    }

    pub fn config(&self) -> &IgnitionConfig {
        &self.config
    }

    pub fn recorders(&self) -> &Recorders {
        &self.recorders
    }

    pub fn repository(&self) -> &SolutionProviderRepository {
        &self.repository
    }

    pub fn flare(&self) -> &Arc<Flare> {
        &self.flare
    }

    pub fn sent_reports(&self) -> Arc<SentReports> {
        self.flare.sent_reports()
    }
}

/// Wires an [`Ignition`] with host-provided names, providers and transport
pub struct IgnitionBuilder {
    config: IgnitionConfig,
    known_names: KnownNames,
    transport: Option<Arc<dyn ReportTransport>>,
    providers: Vec<Arc<dyn SolutionProvider>>,
}

impl IgnitionBuilder {
    pub fn new(config: IgnitionConfig) -> Self {
        Self {
            config,
            known_names: KnownNames::default(),
            transport: None,
            providers: Vec::new(),
        }
    }

    /// Route, view and validation rule names the typo providers rank against
    pub fn known_names(mut self, known_names: KnownNames) -> Self {
        self.known_names = known_names;
        self
    }

    /// Replaces the HTTP transport derived from `flare.key`
    pub fn transport(mut self, transport: Arc<dyn ReportTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Registers a host provider, asked after the built-in ones
    pub fn provider(mut self, provider: Arc<dyn SolutionProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn build(self) -> Result<Ignition> {
        let config = self.config;
        config.validate()?;
        let report_level = config.flare.report_level()?;

        let context = ProviderContext {
            known_names: self.known_names,
            ranker: config.ignition.ranker(),
            stage: config.flare.stage.clone(),
        };
        let mut repository = SolutionProviderRepository::from_config(&config.ignition, &context)?;
        repository.register_many(self.providers);
        let repository = Arc::new(repository);

        let recorders = Recorders::from_config(&config.flare.middleware);
        let pipeline = middleware::pipeline(&config.flare.middleware, &recorders, Arc::clone(&repository));

        let transport = match self.transport {
            Some(transport) => Some(transport),
            None => Flare::http_transport(&config.flare)?,
        };
        let flare = Arc::new(Flare::new(&config.flare, pipeline, transport));

        Ok(Ignition {
            config,
            recorders,
            repository,
            flare,
            report_level,
        })
    }
}
