// ABOUTME: Swap state marker types for the type state pattern.
// ABOUTME: Zero-sized types make out-of-order swap steps fail to compile.

/// Planned: active color read, nothing touched yet.
/// Available actions: `start_inactive()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Planned;

/// Start was requested for the inactive instance.
/// Available actions: `wait_running()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct InactiveStarting;

/// Inactive instance reached RUNNING.
/// Available actions: `switch_pointer()`, `abort()`
#[derive(Debug, Clone, Copy, Default)]
pub struct InactiveRunning;

/// Active color persisted as the new color.
/// Available actions: `stop_previous()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Switched;

/// Previous instance stop attempted; swap finished.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;
