use clap::Parser;
use marsh::utils::{logger, validation::Validate};
use marsh::{CliConfig, Engine, JobFile, LocalStorage, MarshalPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting marsh CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let job_file = match JobFile::from_file(&config.config) {
        Ok(job_file) => job_file,
        Err(e) => {
            tracing::error!("❌ Failed to load job file '{}': {}", config.config, e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    if let Err(e) = job_file.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let run = async {
        job_file.register_schemas()?;
        let marshaller = job_file.build_marshaller()?;
        let source = job_file.data_source()?;

        let output_path = config
            .output_path
            .clone()
            .unwrap_or_else(|| job_file.job.output_path.clone());

        let storage = LocalStorage::new(output_path.clone());
        let mut pipeline = MarshalPipeline::new(
            job_file.job.name.clone(),
            source,
            marshaller,
            storage,
            output_path,
        )
        .with_formats(job_file.output_formats())
        .with_many(job_file.many());
        if let Some(timeout) = job_file.timeout() {
            pipeline = pipeline.with_timeout(timeout);
        }

        Engine::new(pipeline).run().await
    };

    match run.await {
        Ok(output_path) => {
            tracing::info!("✅ Marshalling completed successfully!");
            tracing::info!("📁 Output saved to: {}", output_path);
            println!("✅ Marshalling completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Marshalling failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                marsh::utils::error::ErrorSeverity::Low => 0,
                marsh::utils::error::ErrorSeverity::Medium => 2,
                marsh::utils::error::ErrorSeverity::High => 1,
                marsh::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
