// ABOUTME: Config scaffolding for new installations.
// ABOUTME: Creates a commented fleetvisor.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, socket_dir: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = Config::template();
    if let Some(s) = socket_dir {
        if s.trim().is_empty() {
            return Err(Error::InvalidConfig("socket_dir cannot be empty".to_string()));
        }
        config.socket_dir = s.into();
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let markers: Vec<String> = config
        .workers
        .markers
        .iter()
        .map(|m| format!("\"{m}\""))
        .collect();

    format!(
        r#"socket_dir: {socket_dir}
# state_dir: {socket_dir}/rolling-state
# parallelism: 8
connect:
  interval: {interval}
  timeout: {timeout}
workers:
  markers: [{markers}]
  graceful_signal: "{signal}"
stop:
  poll_interval: {stop_poll}
  kill_signal: {kill}
  kill_settle: {settle}
  # force_kill_timeout: 30s
rolling:
  colors: [{colors}]
  timeout: {rolling_timeout}
  poll_interval: {rolling_poll}
drain:
  # Drain steps of graceful-restart need a suspension store
  # store_dir: /var/lib/fleetvisor/drain
  suspension_key: "{key}"
  timeout: {drain_timeout}
  poll_interval: {drain_poll}
site:
  # JSON site config toggled by graceful-restart --pause-upstream
  # config_path: /srv/site/site_config.json
"#,
        socket_dir = config.socket_dir.display(),
        interval = humantime_serde::re::humantime::format_duration(config.connect.interval),
        timeout = humantime_serde::re::humantime::format_duration(config.connect.timeout),
        markers = markers.join(", "),
        signal = config.workers.graceful_signal,
        stop_poll = humantime_serde::re::humantime::format_duration(config.stop.poll_interval),
        kill = config.stop.kill_signal,
        settle = humantime_serde::re::humantime::format_duration(config.stop.kill_settle),
        colors = config.rolling.colors,
        rolling_timeout = humantime_serde::re::humantime::format_duration(config.rolling.timeout),
        rolling_poll = humantime_serde::re::humantime::format_duration(config.rolling.poll_interval),
        key = config.drain.suspension_key,
        drain_timeout = humantime_serde::re::humantime::format_duration(config.drain.timeout),
        drain_poll = humantime_serde::re::humantime::format_duration(config.drain.poll_interval),
    )
}
