use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::format_timestamp;
use anyhow::{anyhow, Result};
use clap::Args;
use kneadback_core::{FeedbackId, FeedbackRecord};
use std::str::FromStr;

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub limit: Option<i64>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Debug, Args)]
pub struct InsightsArgs {}

#[derive(Debug, Args)]
pub struct HealthArgs {}

pub fn list(ctx: &Context<'_>, args: ListArgs) -> Result<()> {
    if matches!(args.limit, Some(limit) if limit < 1) {
        return Err(invalid_input("--limit must be at least 1"));
    }
    let records = ctx.api.list_records(args.limit)?;
    if ctx.json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("no feedback yet");
        return Ok(());
    }
    for record in records {
        let feedback = &record.feedback;
        println!(
            "{:>5}  {}  nps {:>2}  {:<9}  {}",
            record.id.get(),
            format_timestamp(record.submitted_at),
            feedback.nps,
            feedback.usage.mode.as_str(),
            feedback.product_model
        );
    }
    Ok(())
}

pub fn show(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let id = FeedbackId::from_str(&args.id)?;
    let record = ctx.api.get_record(id)?;
    if ctx.json {
        return print_json(&record);
    }
    print_record(&record);
    Ok(())
}

fn print_record(record: &FeedbackRecord) {
    let feedback = &record.feedback;
    println!("id: {}", record.id);
    println!("submitted: {}", format_timestamp(record.submitted_at));
    println!("user: {}", feedback.user_id);
    println!("product: {}", feedback.product_model);
    println!(
        "usage: {} intensity {} for {} min{}",
        feedback.usage.mode.as_str(),
        feedback.usage.intensity,
        feedback.usage.duration_minutes,
        if feedback.usage.heat_enabled { " with heat" } else { "" }
    );
    let ratings = &feedback.ratings;
    println!(
        "ratings: relax {} pain relief {} noise {} heat fit {}",
        ratings.relax, ratings.pain_relief, ratings.noise, ratings.heat_fit
    );
    println!("nps: {}", feedback.nps);
    if !feedback.issues.is_empty() {
        println!("issues: {}", feedback.issues);
    }
    if !feedback.notes.is_empty() {
        println!("notes: {}", feedback.notes);
    }
}

pub fn insights(ctx: &Context<'_>, _args: InsightsArgs) -> Result<()> {
    let insights = ctx.api.insights()?;
    if ctx.json {
        return print_json(&insights);
    }
    println!("count: {}", insights.count);
    println!("average nps: {:.2}", insights.average_nps);
    if let Some(issue) = insights.top_issue {
        println!("top issue: {issue}");
    }
    Ok(())
}

pub fn health(ctx: &Context<'_>, _args: HealthArgs) -> Result<()> {
    let status = ctx.api.health()?;
    if ctx.json {
        print_json(&status)?;
    } else if status.ok {
        println!("ok");
    }
    if status.ok {
        Ok(())
    } else {
        Err(anyhow!(
            "server unhealthy: {}",
            status.error.as_deref().unwrap_or("unknown error")
        ))
    }
}
