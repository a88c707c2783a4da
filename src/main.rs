use std::error::Error;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;

use school_performance::config::{Cli, Command, Settings, TrainSettings};
use school_performance::data::load_training_set;
use school_performance::database::Database;
use school_performance::logging::init_logging;
use school_performance::model::{train_model, LinearGradeModel, TrainOptions};
use school_performance::routes::{self, AppState};

async fn serve(settings: Settings) -> Result<(), Box<dyn Error>> {
    let _logger = init_logging(&settings.log_level, settings.log_dir.as_deref())?;

    let db = Database::connect(&settings.database_url).await?;
    log::info!("connected to {}", settings.database_url);

    let model = LinearGradeModel::load(&settings.model_path)?;
    let metrics = model.metrics();
    log::info!(
        "loaded grade model from {} (trained on {} rows, held out {}: mse={:?} r2={:?})",
        settings.model_path.display(),
        metrics.train_rows,
        metrics.test_rows,
        metrics.mse,
        metrics.r2
    );

    let state = web::Data::new(AppState::new(db, Arc::new(model)));

    log::info!("listening on http://{}", settings.bind);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(&settings.bind)?
    .run()
    .await?;

    Ok(())
}

fn train(settings: TrainSettings) -> Result<(), Box<dyn Error>> {
    let _logger = init_logging(&settings.log_level, None)?;

    let set = load_training_set(&settings.data)?;
    log::info!("loaded {} rows from {}", set.len(), settings.data.display());

    let artifact = train_model(
        set,
        TrainOptions {
            test_ratio: settings.test_ratio,
            seed: settings.seed,
        },
    )?;
    artifact.save(&settings.out)?;
    log::info!("wrote grade model to {}", settings.out.display());

    Ok(())
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    match Cli::parse().command {
        Command::Serve(settings) => serve(settings).await,
        Command::Train(settings) => train(settings),
    }
}
