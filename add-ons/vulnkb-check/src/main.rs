//! Pre-flight check for a report run: acquire every knowledge base, print what is
//! usable, release. Config-driven via CoreConfig.

use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vulnkb_core::{AcquireError, BoxError, CoreConfig, Orchestrator, SlotState, SlotStatus};

/// Exit status when a store is mid-update (sysexits `EX_TEMPFAIL`): retry later.
const EXIT_LOCKED: u8 = 75;

fn render_status(rows: &[SlotStatus]) -> String {
    let mut out = String::new();
    for row in rows {
        let state = match row.state {
            SlotState::Opened => match row.entry_count {
                Some(n) => format!("OK ({} entries)", n),
                None => "OK".to_string(),
            },
            SlotState::Released => "released".to_string(),
            SlotState::Remote => "remote".to_string(),
            SlotState::Missing => "not found".to_string(),
            SlotState::Degraded => "UNAVAILABLE".to_string(),
        };
        out.push_str(&format!("{:<16} {:<12} {}", row.name, state, row.location));
        if let Some(err) = &row.error {
            out.push_str(&format!("  ({})", err));
        }
        out.push('\n');
    }
    out
}

/// Acquire, print status, release. Close failures are logged, never returned.
fn run_check(config: &CoreConfig, json: bool) -> Result<(), BoxError> {
    let specs = config.resource_specs()?;
    let mut bundle = Orchestrator::new().acquire_all(&specs)?;
    let status = bundle.status();
    if json {
        match serde_json::to_string_pretty(&status) {
            Ok(s) => println!("{}", s),
            Err(e) => tracing::warn!("failed to serialize status: {}", e),
        }
    } else {
        print!("{}", render_status(&status));
    }

    for err in bundle.release_all() {
        tracing::warn!("{}", err);
    }
    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[vulnkb-check] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let json = args.iter().any(|a| a == "--json");

    let config = match CoreConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Config load failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_check(&config, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<AcquireError>().is_some_and(AcquireError::is_locked) => {
            eprintln!("⏳ {}", e);
            ExitCode::from(EXIT_LOCKED)
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vulnkb_core::{Criticality, ResourceKind, StoreConfig};

    #[test]
    fn test_render_status_rows() {
        let rows = vec![
            SlotStatus {
                kind: ResourceKind::CveDictionary,
                name: "cve-dictionary".to_string(),
                criticality: Criticality::Critical,
                state: SlotState::Opened,
                location: "/data/cve.sled".to_string(),
                entry_count: Some(42),
                error: None,
            },
            SlotStatus {
                kind: ResourceKind::ExploitIndex,
                name: "exploitdb".to_string(),
                criticality: Criticality::Optional,
                state: SlotState::Degraded,
                location: "/data/go-exploitdb.sled".to_string(),
                entry_count: None,
                error: Some("corrupt".to_string()),
            },
        ];
        let text = render_status(&rows);
        assert!(text.contains("OK (42 entries)"));
        assert!(text.contains("UNAVAILABLE"));
        assert!(text.contains("(corrupt)"));
    }

    #[test]
    fn test_run_check_with_remote_and_missing_stores() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = CoreConfig {
            storage_path: dir.path().display().to_string(),
            cve_dict: StoreConfig::remote("http://127.0.0.1:1323"),
            ..CoreConfig::default()
        };
        assert!(run_check(&config, true).is_ok());
    }
}
