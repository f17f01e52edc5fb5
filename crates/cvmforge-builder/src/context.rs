//! State shared by the steps of one build

use crate::config::BuildConfig;
use cvmforge_cloud::{ClientProvider, CloudError, Image, Instance, RetryPolicy, WaitOptions};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A value written once by the step that discovers it, read by later steps
/// and by cleanups.
///
/// Unset and set-to-empty are different states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T>(Option<T>);

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Slot<T> {
    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The value, or a `ResourceNotFound` error naming what is missing
    pub fn require(&self, what: &str) -> cvmforge_cloud::Result<&T> {
        self.0
            .as_ref()
            .ok_or_else(|| CloudError::ResourceNotFound(format!("{} not recorded", what)))
    }
}

/// Cooperative cancellation flag, observed between steps
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BuildContext {
    pub config: BuildConfig,
    pub clients: Arc<dyn ClientProvider>,
    pub zone: String,
    pub retry: RetryPolicy,
    pub wait: WaitOptions,

    pub source_image: Slot<Image>,
    pub vpc_id: Slot<String>,
    pub subnet_id: Slot<String>,
    pub security_group_id: Slot<String>,
    pub instance_id: Slot<String>,
    pub instance: Slot<Instance>,
    pub image_id: Slot<String>,
    pub image: Slot<Image>,
    /// Image id per region, source region included
    pub images: BTreeMap<String, String>,

    halted: bool,
    cancel: CancelHandle,
}

impl BuildContext {
    pub fn new(
        config: BuildConfig,
        clients: Arc<dyn ClientProvider>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            config,
            clients,
            zone: zone.into(),
            retry: RetryPolicy::default(),
            wait: WaitOptions::default(),
            source_image: Slot::default(),
            vpc_id: Slot::default(),
            subnet_id: Slot::default(),
            security_group_id: Slot::default(),
            instance_id: Slot::default(),
            instance: Slot::default(),
            image_id: Slot::default(),
            image: Slot::default(),
            images: BTreeMap::new(),
            halted: false,
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Source region
    pub fn region(&self) -> &str {
        self.clients.region()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    /// Whether the build ended badly, for cleanups that only undo on failure
    pub fn is_failed(&self) -> bool {
        self.is_halted() || self.is_cancelled()
    }
}
