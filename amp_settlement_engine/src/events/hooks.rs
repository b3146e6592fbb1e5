//! Wiring between the settlement engine and whoever wants to hear about what it did.
//!
//! Callbacks are collected in [`EventHooks`] at start-up. [`EventHandlers`] gives each callback its own channel and
//! hands the sending ends to the engine as [`EventProducers`]. Every registered callback receives its own copy of
//! every event, so a slow subscriber never holds up the others.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, ProjectFundedEvent};

pub type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Default, Clone)]
pub struct EventHooks {
    project_funded: Vec<Handler<ProjectFundedEvent>>,
}

impl EventHooks {
    /// Registers a callback for newly funded projects. Can be called any number of times.
    pub fn on_project_funded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ProjectFundedEvent) -> HookFuture) + Send + Sync + 'static {
        self.project_funded.push(Arc::new(f));
        self
    }

    pub fn subscriber_count(&self) -> usize {
        self.project_funded.len()
    }
}

pub struct EventHandlers {
    project_funded: Vec<EventHandler<ProjectFundedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let project_funded = hooks.project_funded.into_iter().map(|f| EventHandler::new(buffer_size, f)).collect();
        Self { project_funded }
    }

    /// One producer per registered callback. Hand the result to every engine instance that settles payments.
    pub fn producers(&self) -> EventProducers {
        EventProducers { project_funded_producer: self.project_funded.iter().map(EventHandler::subscribe).collect() }
    }

    /// Spawns a task for each callback. A task stops once every producer handed out by [`Self::producers`] has been
    /// dropped.
    pub fn start_handlers(self) {
        let count = self.project_funded.len();
        for handler in self.project_funded {
            tokio::spawn(handler.start_handler());
        }
        debug!("📬️ Started {count} project funded subscriber(s)");
    }
}

#[derive(Default, Clone)]
pub struct EventProducers {
    pub project_funded_producer: Vec<EventProducer<ProjectFundedEvent>>,
}

impl EventProducers {
    /// Sends the event to every subscriber. Delivery failures are logged by the producer and never surface here.
    pub async fn publish_project_funded(&self, event: ProjectFundedEvent) {
        let Some((last, others)) = self.project_funded_producer.split_last() else {
            trace!("📬️ No subscribers for project #{}", event.project.id);
            return;
        };
        for producer in others {
            producer.publish_event(event.clone()).await;
        }
        last.publish_event(event).await;
    }
}
