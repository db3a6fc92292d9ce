//! `culturedrone chat`: Interactive or single-message drone session.

use std::io::Write;
use std::sync::Arc;
use culturedrone_agent::{DroneInterpreter, Effect, JsonlSink};
use culturedrone_config::{AppConfig, ConfigError};
use culturedrone_core::diagnostic::{DiagnosticSink, TracingSink};
use tokio::io::{AsyncBufReadExt, BufReader};

const PROMPT: &str = "Enter command: ";

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let diagnostics = open_diagnostics(&config);
    let mut interpreter = match DroneInterpreter::from_config(&config, diagnostics) {
        Ok(interpreter) => interpreter,
        Err(e @ ConfigError::MissingCredential { .. }) => {
            print_setup_hints(&e);
            return Err("No API key found. See above for setup instructions.".into());
        }
        Err(e) => return Err(format!("Configuration error: {e}").into()),
    };
    let name = interpreter.drone().name.clone();

    if let Some(msg) = message {
        let effect = interpreter.handle(&msg).await;
        report(&name, &effect);
        return Ok(());
    }

    let effect = interpreter.handle(&config.drone.greeting).await;
    report(&name, &effect);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            println!("{name}: Shutting down. Goodbye.");
            break;
        }

        let effect = interpreter.handle(input).await;
        report(&name, &effect);
    }

    Ok(())
}

/// JSONL file when enabled and writable, otherwise the tracing log.
fn open_diagnostics(config: &AppConfig) -> Arc<dyn DiagnosticSink> {
    if !config.diagnostics.enabled {
        return Arc::new(TracingSink);
    }

    let path = config.diagnostics.resolved_path();
    match JsonlSink::open(&path) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Diagnostic log unavailable");
            Arc::new(TracingSink)
        }
    }
}

fn report(name: &str, effect: &Effect) {
    if let Effect::Apology { diagnostic, .. } = effect {
        eprintln!("  [Error] {diagnostic}");
    }
    println!("{name}: {}", effect.message());
}

fn print_setup_hints(error: &ConfigError) {
    eprintln!();
    eprintln!("  ERROR: {error}");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    CULTUREDRONE_API_KEY = '...'      (generic)");
    eprintln!("    XAI_API_KEY          = 'xai-...'  (xAI, the default oracle)");
    eprintln!("    OPENAI_API_KEY       = 'sk-...'   (OpenAI-compatible)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    eprintln!("  Run `culturedrone onboard` to create one.");
    eprintln!();
}
