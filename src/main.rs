use std::io::Read;
use std::process::ExitCode;

use gitquill::config::Config;
use gitquill::facade::Generator;
use gitquill::message::GenerationRequest;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();
    let generator = Generator::new(config.endpoints.clone());

    // `gitquill validate` probes the configured credential instead of
    // generating; everything else reads a diff from stdin.
    if std::env::args().nth(1).as_deref() == Some("validate") {
        let result = generator
            .validate(config.provider, config.credential.as_deref())
            .await;
        match (result.success, &result.warning) {
            (true, Some(warning)) => {
                println!("{}: valid, with a warning: {warning}", config.provider)
            }
            (true, None) => println!("{}: valid", config.provider),
            (false, _) => {
                eprintln!(
                    "{}: {}",
                    config.provider,
                    result.error.as_deref().unwrap_or("validation failed")
                );
                if let Some(hint) = &result.troubleshooting {
                    eprintln!("  {hint}");
                }
                return Ok(ExitCode::FAILURE);
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut diff = String::new();
    std::io::stdin().read_to_string(&mut diff)?;

    let mut request = GenerationRequest::new(config.provider, config.model, diff);
    request.credential = config.credential;

    match generator.generate(request).await {
        Ok(message) => {
            println!("{}", message.render());
            Ok(ExitCode::SUCCESS)
        }
        // Superseded, not failed — exit quietly.
        Err(err) if err.is_cancellation() => Ok(ExitCode::SUCCESS),
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
