//! `culturedrone onboard`: First-time setup.

use culturedrone_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_path();

    println!("🛸 culturedrone: First-Time Setup");
    println!("==================================\n");

    if AppConfig::write_default(&config_path)? {
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Edit {} and add your API key", config_path.display());
        println!("      (or export XAI_API_KEY)");
        println!("   2. Run: culturedrone chat");
        println!("   3. Tell the drone where to go!\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    Ok(())
}
