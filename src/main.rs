use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use std::path::PathBuf;
use tracing::info;

use iris_classifier::features::FeatureVector;
use iris_classifier::service::IrisService;
use iris_classifier::species::Species;
use iris_classifier::training::{train_reference_model, TrainingConfig};

#[derive(Parser)]
#[command(
    name = "iris-classifier",
    about = "Iris species classifier: HTTP service, training and one-shot prediction."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP classifier service
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1:8000")]
        bind: String,

        /// Path to the model artifact (defaults to $IRIS_MODEL_PATH or iris_model.json)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Train the reference model on the iris dataset
    Train {
        /// Where to write the model artifact
        #[arg(long, default_value = "iris_model.json")]
        output: PathBuf,

        /// L-BFGS iteration cap
        #[arg(long, default_value_t = 1000)]
        max_iterations: u64,
    },

    /// Classify one flower locally
    Predict {
        /// Path to the model artifact (defaults to $IRIS_MODEL_PATH or iris_model.json)
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long)]
        sepal_length: f64,

        #[arg(long)]
        sepal_width: f64,

        #[arg(long)]
        petal_length: f64,

        #[arg(long)]
        petal_width: f64,

        /// Output format: json or summary
        #[arg(long, default_value = "summary")]
        format: String,
    },
}

fn cmd_serve(bind: String, model: Option<PathBuf>) -> Result<()> {
    use iris_classifier::server::{default_model_path, run_server, ServerConfig};

    let bind_addr = bind
        .parse()
        .wrap_err_with(|| format!("Invalid bind address: {}", bind))?;

    let config = ServerConfig {
        bind_addr,
        model_path: model.unwrap_or_else(default_model_path),
        ..Default::default()
    };

    info!(
        bind = %config.bind_addr,
        model = %config.model_path.display(),
        "starting iris classifier service"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_server(config))?;

    Ok(())
}

fn cmd_train(output: PathBuf, max_iterations: u64) -> Result<()> {
    let config = TrainingConfig {
        max_iterations,
        ..Default::default()
    };
    let (model, evaluation) = train_reference_model(&config)?;
    model.save(&output)?;

    println!("Training Results");
    println!("================");
    println!(
        "Samples:   {} train / {} test",
        model.training.train_samples, model.training.test_samples
    );
    println!("Accuracy:  {:.1}%", evaluation.accuracy * 100.0);
    println!();
    println!("Confusion (rows = actual, columns = predicted):");
    println!("              setosa versicolor virginica");
    for species in Species::ALL {
        let row = evaluation.confusion[species.index()];
        println!(
            "  {:<11} {:>6} {:>10} {:>9}",
            species.as_str(),
            row[0],
            row[1],
            row[2]
        );
    }
    println!();
    println!("Model written to {}", output.display());
    println!("Model Hash: {}", model.hash());
    Ok(())
}

fn cmd_predict(model: Option<PathBuf>, measurements: [f64; 4], format: String) -> Result<()> {
    use iris_classifier::server::default_model_path;

    let path = model.unwrap_or_else(default_model_path);
    let service = IrisService::load(&path)?;

    let [sl, sw, pl, pw] = measurements;
    let features = FeatureVector::new(sl, sw, pl, pw)?;
    let result = service.predict_features(&features)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("Iris Prediction");
            println!("===============");
            println!("Species:    {}", result.species);
            println!("Confidence: {}", result.confidence_percentage);
            println!();
            println!("Probabilities:");
            for species in Species::ALL {
                println!(
                    "  {:<11} {:.1}%",
                    species.as_str(),
                    result.probabilities.get(species) * 100.0
                );
            }
            println!();
            println!("{}", result.interpretation);
            if let Some(hash) = service.model_hash() {
                println!("Model Hash: {}", hash);
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, model } => cmd_serve(bind, model),
        Commands::Train {
            output,
            max_iterations,
        } => cmd_train(output, max_iterations),
        Commands::Predict {
            model,
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
            format,
        } => cmd_predict(
            model,
            [sepal_length, sepal_width, petal_length, petal_width],
            format,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
