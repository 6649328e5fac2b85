//! The start/shutdown lifecycle shared by cache services.
//!
//! A service moves through `NotStarted -> Running -> {Shutdown | Stop} ->
//! Terminated`. Work done on behalf of the service is bracketed by an
//! [`ActiveGuard`] obtained from [`ServiceLifecycle::enter`], which only
//! succeeds while the service is running. Once a shutdown has been requested
//! the service terminates as soon as the last guard is dropped.

use crate::error::ServiceError;

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// The run state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
  /// Created, not yet started.
  NotStarted,
  /// Accepting work.
  Running,
  /// A graceful shutdown was requested.
  Shutdown,
  /// An immediate shutdown was requested.
  Stop,
  /// Shut down and no work in flight. Terminal.
  Terminated,
}

impl RunState {
  /// Whether a shutdown has begun (or completed).
  pub fn is_shutdown(&self) -> bool {
    matches!(self, RunState::Shutdown | RunState::Stop | RunState::Terminated)
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunState::NotStarted => write!(f, "not started"),
      RunState::Running => write!(f, "running"),
      RunState::Shutdown => write!(f, "shutting down"),
      RunState::Stop => write!(f, "stopping"),
      RunState::Terminated => write!(f, "terminated"),
    }
  }
}

/// Callbacks fired on lifecycle transitions.
///
/// Hooks run after the lifecycle lock has been released, so they may call
/// back into the service.
pub trait LifecycleHooks: Send + Sync {
  fn on_start(&self) {}

  /// Called once with the state the shutdown moved the service to.
  fn on_shutdown(&self, _state: RunState) {}

  fn on_terminated(&self) {}
}

/// A gate consulted before any shutdown transition.
pub trait ShutdownPermission: Send + Sync {
  fn check_shutdown(&self) -> Result<(), ServiceError>;
}

impl<F> ShutdownPermission for F
where
  F: Fn() -> Result<(), ServiceError> + Send + Sync,
{
  fn check_shutdown(&self) -> Result<(), ServiceError> {
    self()
  }
}

#[derive(Debug)]
struct LifecycleState {
  run_state: RunState,
  // Number of outstanding `ActiveGuard`s.
  active: usize,
}

/// A thread-safe lifecycle state machine.
///
/// All transitions happen under a single lock; `await_termination` waits on a
/// condition variable signalled when the service reaches `Terminated`.
pub struct ServiceLifecycle {
  name: String,
  state: Mutex<LifecycleState>,
  terminated: Condvar,
  hooks: Option<Arc<dyn LifecycleHooks>>,
  permission: Option<Arc<dyn ShutdownPermission>>,
}

impl fmt::Debug for ServiceLifecycle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServiceLifecycle")
      .field("name", &self.name)
      .field("state", &self.state())
      .field("has_hooks", &self.hooks.is_some())
      .field("has_permission", &self.permission.is_some())
      .finish()
  }
}

impl ServiceLifecycle {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      state: Mutex::new(LifecycleState {
        run_state: RunState::NotStarted,
        active: 0,
      }),
      terminated: Condvar::new(),
      hooks: None,
      permission: None,
    }
  }

  pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
    self.hooks = Some(hooks);
    self
  }

  pub fn with_permission(mut self, permission: Arc<dyn ShutdownPermission>) -> Self {
    self.permission = Some(permission);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn state(&self) -> RunState {
    self.state.lock().run_state
  }

  pub fn is_running(&self) -> bool {
    self.state() == RunState::Running
  }

  pub fn is_shutdown(&self) -> bool {
    self.state().is_shutdown()
  }

  pub fn is_terminated(&self) -> bool {
    self.state() == RunState::Terminated
  }

  /// Moves a fresh service to `Running`.
  ///
  /// Returns `Ok(false)` if the service is already running, and
  /// `Err(ServiceError::CannotRestart)` once a shutdown has begun.
  pub fn try_start(&self) -> Result<bool, ServiceError> {
    {
      let mut state = self.state.lock();
      match state.run_state {
        RunState::NotStarted => state.run_state = RunState::Running,
        RunState::Running => return Ok(false),
        other => return Err(ServiceError::CannotRestart(other)),
      }
    }

    tracing::debug!(service = %self.name, "service started");
    if let Some(hooks) = &self.hooks {
      hooks.on_start();
    }
    Ok(true)
  }

  /// Requests a graceful shutdown. Repeated calls have no further effect.
  pub fn shutdown(&self) -> Result<(), ServiceError> {
    self.begin_shutdown(RunState::Shutdown)
  }

  /// Requests an immediate shutdown. Upgrades a pending graceful shutdown.
  pub fn shutdown_now(&self) -> Result<(), ServiceError> {
    self.begin_shutdown(RunState::Stop)
  }

  fn begin_shutdown(&self, target: RunState) -> Result<(), ServiceError> {
    if let Some(permission) = &self.permission {
      if let Err(err) = permission.check_shutdown() {
        tracing::warn!(service = %self.name, error = %err, "shutdown refused");
        return Err(err);
      }
    }

    let (transitioned, terminated) = {
      let mut state = self.state.lock();
      let transitioned = match (state.run_state, target) {
        (RunState::NotStarted | RunState::Running, _) => true,
        (RunState::Shutdown, RunState::Stop) => true,
        _ => false,
      };
      if transitioned {
        state.run_state = target;
      }
      let terminated = transitioned && state.active == 0;
      if terminated {
        state.run_state = RunState::Terminated;
        self.terminated.notify_all();
      }
      (transitioned, terminated)
    };

    if transitioned {
      tracing::debug!(service = %self.name, state = %target, "service shutting down");
      if let Some(hooks) = &self.hooks {
        hooks.on_shutdown(target);
      }
    }
    if terminated {
      self.fire_terminated();
    }
    Ok(())
  }

  /// Blocks until the service has terminated or `timeout` elapses.
  /// Returns whether termination was observed.
  pub fn await_termination(&self, timeout: Duration) -> bool {
    let deadline = Instant::now().checked_add(timeout);
    let mut state = self.state.lock();
    while state.run_state != RunState::Terminated {
      match deadline {
        Some(deadline) => {
          if self.terminated.wait_until(&mut state, deadline).timed_out() {
            return state.run_state == RunState::Terminated;
          }
        }
        None => self.terminated.wait(&mut state),
      }
    }
    true
  }

  /// Registers a unit of work. Returns `None` unless the service is running.
  pub fn enter(&self) -> Option<ActiveGuard<'_>> {
    let mut state = self.state.lock();
    if state.run_state != RunState::Running {
      return None;
    }
    state.active += 1;
    Some(ActiveGuard { lifecycle: self })
  }

  fn leave(&self) {
    let terminated = {
      let mut state = self.state.lock();
      state.active = state.active.saturating_sub(1);
      let terminated =
        state.active == 0 && matches!(state.run_state, RunState::Shutdown | RunState::Stop);
      if terminated {
        state.run_state = RunState::Terminated;
        self.terminated.notify_all();
      }
      terminated
    };

    if terminated {
      self.fire_terminated();
    }
  }

  fn fire_terminated(&self) {
    tracing::debug!(service = %self.name, "service terminated");
    if let Some(hooks) = &self.hooks {
      hooks.on_terminated();
    }
  }
}

/// Marks a unit of work in progress on a running service.
#[must_use = "the work is only registered while the guard is alive"]
#[derive(Debug)]
pub struct ActiveGuard<'a> {
  lifecycle: &'a ServiceLifecycle,
}

impl Drop for ActiveGuard<'_> {
  fn drop(&mut self) {
    self.lifecycle.leave();
  }
}
