use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::compose_product_model;
use anyhow::Result;
use clap::Args;
use kneadback_client::{SubmitOutcome, Submitter};
use kneadback_core::{
    ContactInput, DemographicInput, FeedbackInput, RatingsInput, UsageInput, UsageMode,
};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// One of full_body, neck, shoulder, waist, stretch
    #[arg(long)]
    pub mode: String,
    #[arg(long, default_value_t = 3)]
    pub intensity: i64,
    /// Session length in minutes
    #[arg(long = "duration", default_value_t = 15)]
    pub duration_minutes: i64,
    #[arg(long, default_value_t = 4)]
    pub relax: i64,
    #[arg(long, default_value_t = 4)]
    pub pain_relief: i64,
    #[arg(long, default_value_t = 3)]
    pub noise: i64,
    #[arg(long, default_value_t = 4)]
    pub heat_fit: i64,
    #[arg(long, default_value_t = 8)]
    pub nps: i64,
    #[arg(long, default_value = "guest")]
    pub user_id: String,
    #[arg(long, default_value = "undisclosed")]
    pub gender: String,
    #[arg(long, default_value_t = 0)]
    pub age: i64,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub product: Option<String>,
    /// Where the product was used, e.g. "store trial"
    #[arg(long, default_value = "")]
    pub context: String,
    /// Heat was switched on
    #[arg(long)]
    pub heat: bool,
    #[arg(long, default_value = "")]
    pub pain_areas: String,
    #[arg(long, default_value = "")]
    pub issues: String,
    #[arg(long, default_value = "")]
    pub notes: String,
    /// Consent to follow-up; requires --phone and --email
    #[arg(long)]
    pub contact: bool,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum SubmitDto {
    Delivered { id: i64, submitted_at: i64 },
    Queued { reason: String, queue: String },
}

impl SubmitArgs {
    pub fn into_input(self) -> FeedbackInput {
        let product_model =
            compose_product_model(self.category.as_deref(), self.product.as_deref());
        let (phone, email) = if self.contact {
            (self.phone, self.email)
        } else {
            (String::new(), String::new())
        };
        FeedbackInput {
            user_id: self.user_id,
            demographic: DemographicInput {
                gender: self.gender,
                age: self.age,
            },
            product_model,
            usage: UsageInput {
                mode: Some(self.mode),
                intensity: Some(self.intensity),
                heat_enabled: self.heat,
                duration_minutes: Some(self.duration_minutes),
                context: self.context,
            },
            ratings: RatingsInput {
                relax: Some(self.relax),
                pain_relief: Some(self.pain_relief),
                noise: Some(self.noise),
                heat_fit: Some(self.heat_fit),
            },
            pain_areas: self.pain_areas,
            issues: self.issues,
            nps: Some(self.nps),
            notes: self.notes,
            contact: ContactInput {
                allowed: self.contact,
                phone,
                email,
            },
        }
    }
}

pub fn submit(ctx: &Context<'_>, args: SubmitArgs) -> Result<()> {
    let input = args.into_input();
    // Never queue a record the server would reject.
    if let Err(errors) = input.validate() {
        if errors.contains("usage.mode") {
            return Err(invalid_input(format!(
                "{errors} (modes: {})",
                UsageMode::labels().join(", ")
            )));
        }
        return Err(errors.into());
    }

    let submitter = Submitter::new(ctx.api, ctx.queue.clone());
    let outcome = submitter.submit(&input)?;

    let dto = match outcome {
        SubmitOutcome::Delivered(record) => SubmitDto::Delivered {
            id: record.id.get(),
            submitted_at: record.submitted_at,
        },
        SubmitOutcome::Queued { reason } => SubmitDto::Queued {
            reason,
            queue: ctx.queue.path().display().to_string(),
        },
    };

    if ctx.json {
        return print_json(&dto);
    }
    match dto {
        SubmitDto::Delivered { id, .. } => println!("delivered feedback {id}"),
        SubmitDto::Queued { reason, queue } => {
            println!("server unavailable, queued in {queue}");
            println!("  reason: {reason}");
        }
    }
    Ok(())
}
