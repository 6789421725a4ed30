//! Demo: job browse filters over a canned page of listings
//!
//! Run with: cargo run -p radboard-models --example filter_demo

use chrono::Utc;
use radboard_models::{
    EmploymentType, Job, JobFilters, JobId, JobListing, JobStatus, PayPeriod, ShiftType, UserId,
    WorkType,
};

fn listing(
    title: &str,
    location: &str,
    company: &str,
    employment_type: EmploymentType,
    work_type: WorkType,
) -> JobListing {
    let now = Utc::now();
    JobListing {
        job: Job {
            id: JobId::from_string(format!("job-{}", title.to_lowercase().replace(' ', "-"))),
            employer_id: UserId::from_string("employer-demo"),
            title: title.to_string(),
            location: location.to_string(),
            address: None,
            latitude: None,
            longitude: None,
            work_type,
            employment_type,
            pay_min: Some(38.0),
            pay_max: Some(55.0),
            pay_period: PayPeriod::Hourly,
            description: "See posting for details".to_string(),
            requirements: vec!["ARRT (R)".to_string()],
            benefits: Vec::new(),
            shifts: vec![ShiftType::Day],
            status: JobStatus::Active,
            created_at: now,
            updated_at: now,
        },
        company_name: Some(company.to_string()),
        distance_km: None,
    }
}

fn main() {
    let page = vec![
        listing(
            "CT Technologist",
            "Dallas, TX",
            "Mercy Imaging",
            EmploymentType::FullTime,
            WorkType::OnSite,
        ),
        listing(
            "MRI Technologist",
            "Austin, TX",
            "Lakeside Radiology",
            EmploymentType::Contract,
            WorkType::OnSite,
        ),
        listing(
            "Remote Imaging QA Tech",
            "Houston, TX",
            "TeleRad Partners",
            EmploymentType::PartTime,
            WorkType::Remote,
        ),
    ];

    let scenarios = [
        ("no filters", JobFilters::default()),
        (
            "search: \"mri\"",
            JobFilters {
                search: Some("mri".to_string()),
                ..Default::default()
            },
        ),
        (
            "search: \"tech\" + remote only",
            JobFilters {
                search: Some("tech".to_string()),
                work_type: Some(WorkType::Remote),
                ..Default::default()
            },
        ),
        (
            "contract positions",
            JobFilters {
                employment_type: Some(EmploymentType::Contract),
                ..Default::default()
            },
        ),
    ];

    for (label, filters) in scenarios {
        println!("\n{}", "=".repeat(60));
        println!("FILTERS: {}", label);
        println!("{}", "=".repeat(60));

        let hits = filters.apply(page.clone());
        if hits.is_empty() {
            println!("(no matching jobs)");
        }
        for hit in hits {
            println!(
                "{} @ {} ({}, {})",
                hit.job.title,
                hit.company_name.as_deref().unwrap_or("unknown employer"),
                hit.job.location,
                hit.job.employment_type
            );
        }
    }
}
