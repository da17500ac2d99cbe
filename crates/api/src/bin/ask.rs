use anyhow::Result;
use std::process::ExitCode;

use api::{build_pipeline, logging, AppConfig};
use query::PipelineError;

fn main() -> Result<ExitCode> {
    let config = AppConfig::load()?;
    logging::init_tracing(&config.logging);

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let pipeline = build_pipeline(&config)?;

    match pipeline.ask(&question) {
        Ok(answer) => {
            if config.display.show_translation {
                println!("{}\n", answer.translated_query);
            }
            if config.display.show_context {
                println!("{}\n", answer.context);
            }
            println!("Answer:");
            println!("{}", answer.answer);
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ PipelineError::EmptyQuestion) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::from(2))
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}
