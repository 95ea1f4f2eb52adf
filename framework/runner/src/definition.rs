use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Context as _;

use crate::cli::ScenarioCli;
use crate::context::{RunnerContext, UserValuesConstraint, VirtualUserContext};
use crate::init::init;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHookMut<RV> = fn(&mut RunnerContext<RV>) -> HookResult;
pub type GlobalHook<RV> = fn(Arc<RunnerContext<RV>>) -> HookResult;
pub type AgentHookMut<RV, V> = fn(&mut VirtualUserContext<RV, V>) -> HookResult;

/// The name of the behaviour registered by [ScenarioDefinitionBuilder::use_agent_behaviour].
pub(crate) const DEFAULT_BEHAVIOUR: &str = "default";

/// The builder for a scenario definition.
///
/// This must be used at the start of a scenario binary to define the scenario that you want to run.
pub struct ScenarioDefinitionBuilder<RV: UserValuesConstraint, V: UserValuesConstraint> {
    /// The name of the scenario. Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    cli: ScenarioCli,
    default_virtual_users: Option<usize>,
    default_duration_s: Option<u64>,
    capture_env: HashSet<String>,
    /// Global setup hook, run once before any virtual user starts.
    setup_fn: Option<GlobalHookMut<RV>>,
    /// Setup hook run once by each virtual user before its first iteration.
    setup_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Behaviours by name. Virtual users not assigned a behaviour on the command line run the
    /// [DEFAULT_BEHAVIOUR].
    agent_behaviour: HashMap<String, AgentHookMut<RV, V>>,
    /// Teardown hook run once by each virtual user after its last iteration.
    teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    /// Global teardown hook, run once after every virtual user has stopped. Best effort, errors
    /// are logged.
    teardown_fn: Option<GlobalHook<RV>>,
}

pub(crate) struct ScenarioDefinition<RV: UserValuesConstraint, V: UserValuesConstraint> {
    pub(crate) name: String,
    pub(crate) virtual_user_count: usize,
    pub(crate) assigned_behaviours: Vec<(String, usize)>,
    pub(crate) duration_s: Option<u64>,
    pub(crate) base_url: String,
    pub(crate) no_progress: bool,
    pub(crate) cli: ScenarioCli,
    pub(crate) capture_env: HashSet<String>,
    pub(crate) setup_fn: Option<GlobalHookMut<RV>>,
    pub(crate) setup_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) agent_behaviour: HashMap<String, AgentHookMut<RV, V>>,
    pub(crate) teardown_agent_fn: Option<AgentHookMut<RV, V>>,
    pub(crate) teardown_fn: Option<GlobalHook<RV>>,
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinitionBuilder<RV, V> {
    /// Create a scenario definition from a name and an already parsed command line.
    pub fn new(name: &str, cli: ScenarioCli) -> Self {
        Self {
            name: name.to_string(),
            cli,
            default_virtual_users: None,
            default_duration_s: None,
            capture_env: HashSet::with_capacity(0),
            setup_fn: None,
            setup_agent_fn: None,
            agent_behaviour: HashMap::new(),
            teardown_agent_fn: None,
            teardown_fn: None,
        }
    }

    /// Initialise logging, parse the command line and create the scenario definition.
    pub fn new_with_init(name: &str) -> Self {
        Self::new(name, init())
    }

    /// Number of virtual users to run when `--virtual-users` is not given.
    pub fn with_default_virtual_users(mut self, virtual_users: usize) -> Self {
        self.default_virtual_users = Some(virtual_users);
        self
    }

    /// Number of seconds to run for when `--duration` is not given.
    pub fn with_default_duration_s(mut self, duration: u64) -> Self {
        self.default_duration_s = Some(duration);
        self
    }

    /// Record the value of this environment variable, if set, in the run summary.
    pub fn add_capture_env(mut self, key: &str) -> Self {
        self.capture_env.insert(key.to_string());
        self
    }

    pub fn use_setup(mut self, setup_fn: GlobalHookMut<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    pub fn use_agent_setup(mut self, setup_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.setup_agent_fn = Some(setup_agent_fn);
        self
    }

    /// Set the behaviour run by every virtual user that isn't assigned a named behaviour.
    pub fn use_agent_behaviour(self, behaviour: AgentHookMut<RV, V>) -> Self {
        self.use_named_agent_behaviour(DEFAULT_BEHAVIOUR, behaviour)
    }

    /// Register a named behaviour that virtual users can be assigned with `--behaviour`.
    pub fn use_named_agent_behaviour(mut self, name: &str, behaviour: AgentHookMut<RV, V>) -> Self {
        let previous = self.agent_behaviour.insert(name.to_string(), behaviour);

        if previous.is_some() {
            panic!("Behaviour [{name}] is already defined");
        }

        self
    }

    pub fn use_agent_teardown(mut self, teardown_agent_fn: AgentHookMut<RV, V>) -> Self {
        self.teardown_agent_fn = Some(teardown_agent_fn);
        self
    }

    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<ScenarioDefinition<RV, V>> {
        let base_url = self
            .cli
            .base_url
            .clone()
            .context("No base URL provided, set one with --base-url")?;
        let parsed =
            url::Url::parse(&base_url).with_context(|| format!("Invalid base URL [{base_url}]"))?;
        if !matches!(parsed.scheme(), "http" | "https") || !parsed.has_host() {
            anyhow::bail!("Base URL [{base_url}] must be an http or https URL with a host");
        }

        let mut assigned_behaviours: Vec<(String, usize)> = Vec::new();
        for (name, count) in &self.cli.behaviour {
            if !self.agent_behaviour.contains_key(name) {
                anyhow::bail!("Behaviour [{name}] is not defined by this scenario");
            }
            match assigned_behaviours.iter_mut().find(|(n, _)| n == name) {
                Some((_, total)) => *total += count,
                None => assigned_behaviours.push((name.clone(), *count)),
            }
        }

        let total_assigned = assigned_behaviours.iter().map(|(_, c)| c).sum::<usize>();
        let virtual_user_count = self
            .cli
            .virtual_users
            .or(self.default_virtual_users)
            .unwrap_or_else(|| total_assigned.max(1));

        if total_assigned > virtual_user_count {
            anyhow::bail!(
                "Behaviours are assigned to {total_assigned} virtual users but only {virtual_user_count} will run"
            );
        }

        let duration_s = if self.cli.soak {
            None
        } else {
            self.cli.duration.or(self.default_duration_s)
        };

        Ok(ScenarioDefinition {
            name: self.name,
            virtual_user_count,
            assigned_behaviours,
            duration_s,
            base_url,
            no_progress: self.cli.no_progress,
            cli: self.cli,
            capture_env: self.capture_env,
            setup_fn: self.setup_fn,
            setup_agent_fn: self.setup_agent_fn,
            agent_behaviour: self.agent_behaviour,
            teardown_agent_fn: self.teardown_agent_fn,
            teardown_fn: self.teardown_fn,
        })
    }
}

impl<RV: UserValuesConstraint, V: UserValuesConstraint> ScenarioDefinition<RV, V> {
    /// One behaviour name per virtual user, explicitly assigned behaviours first.
    pub(crate) fn assigned_behaviours_flat(&self) -> Vec<String> {
        let mut flat = self
            .assigned_behaviours
            .iter()
            .flat_map(|(name, count)| std::iter::repeat(name.clone()).take(*count))
            .collect::<Vec<_>>();
        flat.resize(self.virtual_user_count, DEFAULT_BEHAVIOUR.to_string());
        flat
    }

    /// Number of virtual users per behaviour, as recorded in the run summary.
    pub(crate) fn behaviour_counts(&self) -> HashMap<String, usize> {
        self.assigned_behaviours_flat()
            .into_iter()
            .fold(HashMap::new(), |mut acc, name| {
                *acc.entry(name).or_insert(0) += 1;
                acc
            })
    }
}
