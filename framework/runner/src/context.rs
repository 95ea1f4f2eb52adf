use std::{fmt::Debug, sync::Arc};

use load_driver_core::prelude::{DelegatedShutdownListener, ShutdownHandle};
use load_driver_instruments::Reporter;

use crate::executor::Executor;

/// Bound for the user-defined values stored in [RunnerContext] and [VirtualUserContext].
pub trait UserValuesConstraint: Default + Debug + Send + Sync + 'static {}

/// State shared by every virtual user for the whole run.
///
/// Global hooks get mutable access, virtual users get a shared read-only reference.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    executor: Arc<Executor>,
    reporter: Arc<Reporter>,
    shutdown_handle: ShutdownHandle,
    base_url: String,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub(crate) fn new(
        executor: Arc<Executor>,
        reporter: Arc<Reporter>,
        shutdown_handle: ShutdownHandle,
        base_url: String,
    ) -> Self {
        Self {
            executor,
            reporter,
            shutdown_handle,
            base_url,
            value: Default::default(),
        }
    }

    pub fn executor(&self) -> &Arc<Executor> {
        &self.executor
    }

    pub fn reporter(&self) -> Arc<Reporter> {
        self.reporter.clone()
    }

    /// The base URL of the service under test, as given on the command line.
    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    /// Signal every virtual user to stop, ending the run early.
    pub fn force_stop_scenario(&self) {
        self.shutdown_handle.shutdown();
    }

    pub fn get_mut(&mut self) -> &mut RV {
        &mut self.value
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// State owned by a single virtual user.
pub struct VirtualUserContext<RV: UserValuesConstraint, V: UserValuesConstraint> {
    virtual_user_id: String,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: DelegatedShutdownListener,
    iteration: u64,
    value: V,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> VirtualUserContext<RV, V> {
    pub(crate) fn new(
        virtual_user_id: String,
        runner_context: Arc<RunnerContext<RV>>,
        shutdown_listener: DelegatedShutdownListener,
    ) -> Self {
        Self {
            virtual_user_id,
            runner_context,
            shutdown_listener,
            iteration: 0,
            value: Default::default(),
        }
    }

    /// A name for this virtual user that is unique within the run, `vu-<index>`.
    pub fn virtual_user_id(&self) -> &str {
        &self.virtual_user_id
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub(crate) fn shutdown_listener(&mut self) -> &mut DelegatedShutdownListener {
        &mut self.shutdown_listener
    }

    /// The number of behaviour iterations this virtual user has started, starting from 1 inside the
    /// first iteration. Zero during setup.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn next_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn get(&self) -> &V {
        &self.value
    }
}
