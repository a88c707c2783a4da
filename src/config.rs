use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "school_performance",
    version,
    about = "School management backend with final-grade prediction"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(Settings),
    /// Fit the grade model from a CSV export and write the artifact
    Train(TrainSettings),
}

/// Runtime settings for the API server.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Address to listen on
    #[arg(long, env = "SCHOOL_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// SQLite connection URL
    #[arg(long, env = "SCHOOL_DATABASE_URL", default_value = "sqlite://school.db")]
    pub database_url: String,

    /// Trained grade model artifact, loaded once at startup
    #[arg(long = "model", env = "SCHOOL_MODEL_PATH", default_value = "models/final_grade_model.json")]
    pub model_path: PathBuf,

    /// Log level or filter spec; `RUST_LOG` takes precedence
    #[arg(long, env = "SCHOOL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write rotating log files into this directory
    #[arg(long, env = "SCHOOL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TrainSettings {
    /// CSV with AttendancePercent,ParticipationScore,PastGrade,FinalGrade
    #[arg(long, default_value = "data/student_grades.csv")]
    pub data: PathBuf,

    /// Where to write the fitted artifact
    #[arg(long, default_value = "models/final_grade_model.json")]
    pub out: PathBuf,

    /// Share of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_ratio: f32,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["school_performance", "serve"]).unwrap();
        let Command::Serve(settings) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(settings.bind, "127.0.0.1:8080");
        assert_eq!(settings.model_path, PathBuf::from("models/final_grade_model.json"));
    }

    #[test]
    fn train_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "school_performance",
            "train",
            "--data",
            "grades.csv",
            "--test-ratio",
            "0.25",
            "--seed",
            "7",
        ])
        .unwrap();
        let Command::Train(train) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(train.data, PathBuf::from("grades.csv"));
        assert_eq!(train.test_ratio, 0.25);
        assert_eq!(train.seed, 7);
    }
}
