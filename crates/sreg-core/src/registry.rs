use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use sreg_gate::{SchemaRegistry, ValidatorChain};
use sreg_handlers::{HandlerRegistry, HandlerService};
use sreg_log::{EventLog, EventSender, LogPosition};
use sreg_repository::Repository;
use sreg_types::{
    Consumer, ConsumerBinding, Domain, Infrastructure, Model, ProcessBinding, Producer,
    ProducerBinding, Schema, Stream, StreamBinding, Zone,
};
use sreg_view::{Materializer, MaterializerHandle, ViewSet};

use crate::config::RegistryConfig;
use crate::error::ServiceResult;
use crate::service::{DependentService, EntityService};

/// Shared pieces every service is assembled from.
struct Parts {
    sender: EventSender,
    views: Arc<ViewSet>,
    validator: Arc<ValidatorChain>,
    handlers: HandlerService,
}

impl Parts {
    fn service<M: Model>(&self, dependents: &[Arc<dyn DependentService>]) -> Arc<EntityService<M>> {
        let repository = Repository::new(
            self.sender.clone(),
            Arc::clone(self.views.view(M::ENTITY_TYPE)),
        );
        let service = dependents.iter().fold(
            EntityService::new(repository, Arc::clone(&self.validator), self.handlers.clone()),
            |service, dependent| service.with_dependent(Arc::clone(dependent)),
        );
        Arc::new(service)
    }
}

fn dependent<M: Model>(service: &Arc<EntityService<M>>) -> Arc<dyn DependentService> {
    Arc::clone(service) as Arc<dyn DependentService>
}

/// The composition root: one log, one view set, one materializer, and a
/// service per entity type wired for cascading deletes.
pub struct Registry {
    config: RegistryConfig,
    log: Arc<dyn EventLog>,
    views: Arc<ViewSet>,
    materializer: Arc<Materializer>,
    background: Mutex<Option<MaterializerHandle>>,

    domains: Arc<EntityService<Domain>>,
    schemas: Arc<EntityService<Schema>>,
    streams: Arc<EntityService<Stream>>,
    zones: Arc<EntityService<Zone>>,
    infrastructures: Arc<EntityService<Infrastructure>>,
    producers: Arc<EntityService<Producer>>,
    consumers: Arc<EntityService<Consumer>>,
    stream_bindings: Arc<EntityService<StreamBinding>>,
    producer_bindings: Arc<EntityService<ProducerBinding>>,
    consumer_bindings: Arc<EntityService<ConsumerBinding>>,
    process_bindings: Arc<EntityService<ProcessBinding>>,
}

impl Registry {
    /// Open the configured log and assemble everything from `config`.
    pub async fn open(config: RegistryConfig) -> ServiceResult<Self> {
        let log = config.log.open().await?;
        Ok(Self::with_log(config, log))
    }

    /// Assemble around an already open log.
    pub fn with_log(config: RegistryConfig, log: Arc<dyn EventLog>) -> Self {
        let schemas = SchemaRegistry::from_config(&config.validation);
        let handlers = HandlerRegistry::from_config(&config.handlers);
        Self::with_parts(config, log, schemas, handlers)
    }

    /// Assemble with caller-built schema and handler registries.
    pub fn with_parts(
        config: RegistryConfig,
        log: Arc<dyn EventLog>,
        schemas: SchemaRegistry,
        handlers: HandlerRegistry,
    ) -> Self {
        let views = Arc::new(ViewSet::new());
        let materializer = Arc::new(Materializer::new(
            Arc::clone(&log),
            Arc::clone(&views),
            config.materializer.clone(),
        ));
        let parts = Parts {
            sender: EventSender::new(Arc::clone(&log), config.log.append_timeout()),
            views: Arc::clone(&views),
            validator: Arc::new(ValidatorChain::with_default_stages(
                config.validation.clone(),
                Arc::clone(&views),
                Arc::new(schemas),
            )),
            handlers: HandlerService::new(Arc::new(handlers)),
        };

        // Leaves first: a service can only cascade into services built
        // before it.
        let producer_bindings = parts.service::<ProducerBinding>(&[]);
        let consumer_bindings = parts.service::<ConsumerBinding>(&[]);
        let process_bindings = parts.service::<ProcessBinding>(&[]);
        let stream_bindings = parts.service::<StreamBinding>(&[
            dependent(&producer_bindings),
            dependent(&consumer_bindings),
            dependent(&process_bindings),
        ]);
        let producers = parts.service::<Producer>(&[dependent(&producer_bindings)]);
        let consumers = parts.service::<Consumer>(&[dependent(&consumer_bindings)]);
        let infrastructures = parts.service::<Infrastructure>(&[
            dependent(&stream_bindings),
            dependent(&producer_bindings),
            dependent(&consumer_bindings),
        ]);
        let streams = parts.service::<Stream>(&[
            dependent(&producers),
            dependent(&consumers),
            dependent(&stream_bindings),
        ]);
        let schemas = parts.service::<Schema>(&[dependent(&streams)]);
        let zones = parts.service::<Zone>(&[
            dependent(&infrastructures),
            dependent(&producers),
            dependent(&consumers),
            dependent(&process_bindings),
        ]);
        let domains = parts.service::<Domain>(&[
            dependent(&schemas),
            dependent(&streams),
            dependent(&process_bindings),
        ]);

        Self {
            config,
            log,
            views,
            materializer,
            background: Mutex::new(None),
            domains,
            schemas,
            streams,
            zones,
            infrastructures,
            producers,
            consumers,
            stream_bindings,
            producer_bindings,
            consumer_bindings,
            process_bindings,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn log(&self) -> &Arc<dyn EventLog> {
        &self.log
    }

    pub fn views(&self) -> &Arc<ViewSet> {
        &self.views
    }

    pub fn materializer(&self) -> &Arc<Materializer> {
        &self.materializer
    }

    /// Fold everything appended so far into the views. Returns the next
    /// unapplied log position.
    pub async fn sync(&self) -> ServiceResult<LogPosition> {
        Ok(self.materializer.catch_up().await?)
    }

    /// Start background materialization. Does nothing if already running.
    pub async fn start(&self) {
        let mut background = self.background.lock().await;
        if background.is_none() {
            *background = Some(Arc::clone(&self.materializer).spawn());
            info!("registry started");
        }
    }

    /// Stop background materialization, if running.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.background.lock().await.take() {
            handle.shutdown().await;
            info!("registry stopped");
        }
    }

    pub fn domains(&self) -> &EntityService<Domain> {
        &self.domains
    }

    pub fn schemas(&self) -> &EntityService<Schema> {
        &self.schemas
    }

    pub fn streams(&self) -> &EntityService<Stream> {
        &self.streams
    }

    pub fn zones(&self) -> &EntityService<Zone> {
        &self.zones
    }

    pub fn infrastructures(&self) -> &EntityService<Infrastructure> {
        &self.infrastructures
    }

    pub fn producers(&self) -> &EntityService<Producer> {
        &self.producers
    }

    pub fn consumers(&self) -> &EntityService<Consumer> {
        &self.consumers
    }

    pub fn stream_bindings(&self) -> &EntityService<StreamBinding> {
        &self.stream_bindings
    }

    pub fn producer_bindings(&self) -> &EntityService<ProducerBinding> {
        &self.producer_bindings
    }

    pub fn consumer_bindings(&self) -> &EntityService<ConsumerBinding> {
        &self.consumer_bindings
    }

    pub fn process_bindings(&self) -> &EntityService<ProcessBinding> {
        &self.process_bindings
    }
}
