use clap::Args;
use trust_score::config::AppConfig;
use trust_score::error::AppError;
use trust_score::scoring::{build_pipeline, ScoringRequest};
use trust_score::telemetry;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Policy number to look up in the reference data
    #[arg(long)]
    pub(crate) policy_number: String,
    /// Incident date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) incident_date: String,
    /// Property claim amount
    #[arg(long)]
    pub(crate) property_claim: f64,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    // stdout carries the JSON result.
    telemetry::init_with_writer(&config.telemetry, std::io::stderr)?;

    let pipeline = build_pipeline(&config.scoring)?;
    let request = ScoringRequest::new(args.policy_number, args.incident_date, args.property_claim);
    let result = pipeline.handle(request).await?;

    let rendered = serde_json::to_string_pretty(&result).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}
