use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobpost::api_client::{HttpJobClient, JobFetcher};
use jobpost::collaborators::{Role, StaticCategories};
use jobpost::config::{self, Config};
use jobpost::errors::WizardError;
use jobpost::models::{ApiJobRecord, FormState, SubmitStatus};
use jobpost::posting::{
    from_api, review_summary, to_api, validate_all, SubmitOutcome, WizardSession,
};

#[derive(Parser)]
#[command(name = "jobpost")]
#[command(about = "Job posting wizard: map, validate and submit job postings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a stored job record into the form and show what would be sent
    Preview {
        /// Path to a job record as returned by the API
        record: PathBuf,
    },

    /// Submit a filled-in form
    Submit {
        /// Path to a form state JSON file
        form: PathBuf,

        /// Save as draft instead of publishing
        #[arg(long)]
        draft: bool,

        /// Update this existing job instead of creating a new one
        #[arg(long)]
        job_id: Option<String>,

        /// Role of the posting user (provider, admin)
        #[arg(short, long, default_value = "provider")]
        role: String,
    },

    /// Fetch an existing job and submit it again
    Edit {
        /// Job ID
        job_id: String,

        /// Save as draft instead of publishing
        #[arg(long)]
        draft: bool,

        /// Role of the posting user (provider, admin)
        #[arg(short, long, default_value = "provider")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), config::rust_log()))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Preview { record } => preview(&record),
        Commands::Submit {
            form,
            draft,
            job_id,
            role,
        } => submit(&form, draft, job_id, Role::from(role.as_str())).await,
        Commands::Edit {
            job_id,
            draft,
            role,
        } => edit(job_id, draft, Role::from(role.as_str())).await,
    };

    if let Err(e) = &result {
        if let Some(WizardError::StepBlocked { step, errors } | WizardError::PublishBlocked { step, errors }) =
            e.downcast_ref::<WizardError>()
        {
            eprintln!("{} needs attention:", step.title());
            for (field, message) in errors.iter() {
                eprintln!("  {field}: {message}");
            }
        }
    }
    result
}

fn preview(path: &Path) -> Result<()> {
    let record = ApiJobRecord::from_value(read_json(path)?);
    let form = from_api(&record);
    let validation = match validate_all(&form) {
        Ok(()) => json!({ "ok": true }),
        Err(failure) => json!({
            "ok": false,
            "step": failure.step.title(),
            "errors": failure.errors,
        }),
    };
    let payload = to_api(&form, SubmitStatus::Open);

    let output = json!({
        "form": form,
        "validation": validation,
        "payload": payload,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn submit(path: &Path, draft: bool, job_id: Option<String>, role: Role) -> Result<()> {
    let form: FormState = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not a valid form", path.display()))?;
    let client = client()?;
    let mut session = WizardSession::with_form(role, job_id, form)?;
    print_review(&client, session.form()).await;
    let outcome = run(&mut session, &client, draft).await?;
    print_outcome(&outcome)
}

async fn edit(job_id: String, draft: bool, role: Role) -> Result<()> {
    let client = client()?;
    let record = client
        .fetch(&job_id)
        .await
        .with_context(|| format!("Failed to load job {job_id}"))?;
    let mut session = WizardSession::edit(role, job_id, &record)?;
    print_review(&client, session.form()).await;
    let outcome = run(&mut session, &client, draft).await?;
    print_outcome(&outcome)
}

async fn run(
    session: &mut WizardSession,
    client: &HttpJobClient,
    draft: bool,
) -> Result<SubmitOutcome, WizardError> {
    if draft {
        session.save_draft(client).await
    } else {
        session.publish(client).await
    }
}

fn client() -> Result<HttpJobClient> {
    let config = Config::from_env()?;
    info!("Using job API at {}", config.api_url);
    Ok(HttpJobClient::from_config(&config)?)
}

async fn print_review(client: &HttpJobClient, form: &FormState) {
    let categories = match client.fetch_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            warn!("Could not load categories, showing raw ids: {}", e);
            StaticCategories::default()
        }
    };
    for section in review_summary(form, &categories) {
        println!("{}", section.title);
        for (label, value) in &section.rows {
            println!("  {label}: {value}");
        }
    }
}

fn print_outcome(outcome: &SubmitOutcome) -> Result<()> {
    let output = json!({
        "jobId": outcome.job_id,
        "status": outcome.status.job_status(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
