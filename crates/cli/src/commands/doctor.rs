//! `culturedrone doctor`: Diagnose configuration and oracle health.

use culturedrone_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 culturedrone Doctor: System Diagnostics");
    println!("==========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults: run `culturedrone onboard`");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (provider: {}, model: {})", config.provider, config.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid config.");
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured: set XAI_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    if config.diagnostics.enabled {
        println!("  ✅ Diagnostic log: {}", config.diagnostics.resolved_path().display());
    } else {
        println!("  ℹ️  Diagnostic log disabled");
    }

    match culturedrone_providers::build_from_config(&config) {
        Ok(provider) => match provider.health_check().await {
            Ok(true) => {
                println!("  ✅ Oracle reachable ({})", provider.name());
                let models = provider.list_models().await.unwrap_or_default();
                match check_model(&models, &config.model) {
                    ModelCheck::Listed => println!("  ✅ Model available: {}", config.model),
                    ModelCheck::Missing => {
                        println!(
                            "  ⚠️  Model '{}' not offered by {} ({} models listed)",
                            config.model,
                            provider.name(),
                            models.len()
                        );
                        issues += 1;
                    }
                    ModelCheck::Unknown => println!("  ℹ️  Provider does not list its models"),
                }
            }
            Ok(false) => {
                println!("  ❌ Oracle unhealthy ({})", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Oracle unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ⚠️  Oracle check skipped: {e}");
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Whether the configured model appears in the provider's catalogue.
#[derive(Debug, PartialEq)]
enum ModelCheck {
    Listed,
    Missing,
    Unknown,
}

fn check_model(models: &[String], model: &str) -> ModelCheck {
    if models.is_empty() {
        ModelCheck::Unknown
    } else if models.iter().any(|m| m == model) {
        ModelCheck::Listed
    } else {
        ModelCheck::Missing
    }
}
