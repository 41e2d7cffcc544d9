use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_shared::HealthService;
use hopital_core::{
    config::{database_url_from_env_value, max_image_bytes_from_env_value},
    CoreConfig, Database, MaladieService, PatientService,
};

#[derive(Parser)]
#[command(name = "hopital")]
#[command(about = "Hospital records CLI")]
struct Cli {
    /// SQLite database URL (overrides HOPITAL_DATABASE_URL)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if needed and apply pending migrations
    Migrate,
    /// Check that the database answers
    Health,
    /// List all patients
    Patients,
    /// List all maladies
    Maladies,
    /// Print the medical record of a patient
    Dossier {
        /// Patient id
        id: i64,
    },
    /// Print patient and maladie statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hopital=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'hopital --help' for commands");
        return Ok(());
    };

    let database_url = database_url_from_env_value(
        cli.database_url
            .or_else(|| std::env::var("HOPITAL_DATABASE_URL").ok()),
    );
    let max_image_bytes =
        max_image_bytes_from_env_value(std::env::var("HOPITAL_MAX_IMAGE_BYTES").ok())?;
    let cfg = CoreConfig::new(database_url, max_image_bytes)?;
    let db = Database::open(&cfg).await?;

    let patients = PatientService::new(db.clone());
    let maladies = MaladieService::new(db.clone());

    match command {
        Commands::Migrate => {
            println!("Database ready: {}", cfg.database_url());
        }
        Commands::Health => {
            let database_ok = match db.health_check().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Database health check error: {:?}", e);
                    false
                }
            };
            let res = HealthService::with_database(database_ok);
            println!("{}", res.message);
        }
        Commands::Patients => {
            let list = patients.get_all_patients().await?;
            if list.is_empty() {
                println!("No patients found.");
            }
            for p in list {
                let stade = p.stade.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                let names: Vec<&str> =
                    p.maladies_affectees.iter().map(|m| m.nom.as_str()).collect();
                println!(
                    "ID: {}, Name: {} {}, Stade: {}, Maladies: [{}]",
                    p.id,
                    p.nom,
                    p.prenom,
                    stade,
                    names.join(", ")
                );
            }
        }
        Commands::Maladies => {
            let list = maladies.get_all_maladies().await?;
            if list.is_empty() {
                println!("No maladies found.");
            }
            for m in list {
                println!(
                    "ID: {}, Nom: {}, Type: {}, Symptomes: {}, Traitements: {}",
                    m.id.unwrap_or_default(),
                    m.nom,
                    m.kind.as_deref().unwrap_or("-"),
                    m.symptomes.len(),
                    m.traitements.len()
                );
            }
        }
        Commands::Dossier { id } => match patients.dossier(id).await? {
            Some(text) => print!("{text}"),
            None => println!("Aucun dossier trouvé pour l'ID patient: {id}"),
        },
        Commands::Stats => {
            let patient_stats = patients.get_patient_stats().await?;
            let maladie_stats = maladies.get_maladies_stats().await?;
            let with_symptomes = maladies.count_with_symptomes().await?;

            println!("Patients: {}", patient_stats.total_patients);
            for (stade, count) in &patient_stats.patients_by_stade {
                println!("  {stade}: {count}");
            }
            println!("  critical: {}", patient_stats.critical_patients_count);
            println!(
                "  with symptoms: {}, under treatment: {}",
                patient_stats.patients_with_symptoms_recorded,
                patient_stats.patients_under_treatment
            );
            println!("Maladies: {}", maladie_stats.total);
            for (kind, count) in &maladie_stats.by_type {
                let kind = if kind.is_empty() { "(sans type)" } else { kind.as_str() };
                println!("  {kind}: {count}");
            }
            println!(
                "  with symptoms: {}, with treatments: {}, with images: {}",
                with_symptomes, maladie_stats.with_traitements, maladie_stats.with_images
            );
            for (nom, count) in &maladie_stats.patients_per_maladie {
                println!("  patients with {nom}: {count}");
            }
        }
    }

    db.close().await;
    Ok(())
}
