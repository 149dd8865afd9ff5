//! # Seed Data Generator
//!
//! Populates the database with demo businesses and a month of attendance.
//!
//! ## Usage
//! ```bash
//! # Seed ./hisaab_dev.db with 30 days of history
//! cargo run -p hisaab-db --bin seed
//!
//! # Custom history length and database path
//! cargo run -p hisaab-db --bin seed -- --days 60 --db ./data/hisaab.db
//! ```
//!
//! ## Generated Data
//! - `Corner Store` on FREE (join-code `CORNER01`) with 3 active staff
//! - `Spice Kitchen` on PREMIUM (join-code `SPICE001`) with 6 active staff
//! - One weekday shift per business, default attendance settings
//! - Weekday attendance per staff with a deterministic mix of late,
//!   WFH and overtime days
//! - A pending and an approved leave request per business

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hisaab_core::{
    AttendanceRecord, AttendanceSettings, AttendanceStatus, Business, LeaveRequest, LeaveStatus,
    LeaveType, PlanTier, Shift, StaffRequest, StaffRequestStatus, WorkLocation,
};
use hisaab_db::{Database, DbConfig};

/// (name, type, plan, join-code, staff names)
const BUSINESSES: &[(&str, &str, PlanTier, &str, &[&str])] = &[
    (
        "Corner Store",
        "retail",
        PlanTier::Free,
        "CORNER01",
        &["Ayesha", "Bilal", "Chand"],
    ),
    (
        "Spice Kitchen",
        "restaurant",
        PlanTier::Premium,
        "SPICE001",
        &["Danish", "Erum", "Faraz", "Ghazala", "Hamza", "Iqra"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hisaab=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 30;
    let mut db_path = String::from("./hisaab_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" | "-n" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(30);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Hisaab Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --days <N>     Days of attendance history (default: 30)");
                println!("  -d, --db <PATH>    Database file path (default: ./hisaab_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Hisaab Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("History:  {} days", days);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.businesses().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} businesses", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = std::time::Instant::now();
    let mut record_count = 0usize;

    for (name, business_type, plan, join_code, staff) in BUSINESSES {
        let business = seed_business(&db, name, business_type, *plan, join_code).await?;
        println!("✓ {} ({}) join-code {}", business.name, business.plan, business.join_code);

        for (index, staff_name) in staff.iter().enumerate() {
            let staff_id = seed_staff(&db, &business, staff_name).await?;

            for offset in 1..=days {
                let date = today - Duration::days(offset);
                if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                    continue;
                }

                let record = generate_record(&business.id, &staff_id, date, index);
                if let Err(e) = db.attendance().insert(&record).await {
                    eprintln!("Failed to insert attendance for {} on {}: {}", staff_id, date, e);
                    continue;
                }
                record_count += 1;
            }

            if index == 0 {
                seed_leave(&db, &business.id, &staff_id, today).await?;
            }
        }
    }

    println!();
    println!(
        "✓ Generated {} attendance records in {:?}",
        record_count,
        start.elapsed()
    );
    println!("✓ Seed complete!");

    Ok(())
}

async fn seed_business(
    db: &Database,
    name: &str,
    business_type: &str,
    plan: PlanTier,
    join_code: &str,
) -> Result<Business, Box<dyn std::error::Error>> {
    let now = Utc::now();
    let business = Business {
        id: format!("biz_{}", Uuid::new_v4()),
        name: name.to_string(),
        business_type: business_type.to_string(),
        plan,
        join_code: join_code.to_string(),
        created_at: now,
        updated_at: now,
    };
    db.businesses().insert(&business).await?;
    db.settings()
        .upsert(&AttendanceSettings::defaults_for(&business.id))
        .await?;

    let shift = Shift {
        id: Uuid::new_v4().to_string(),
        business_id: business.id.clone(),
        name: "Day".to_string(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
        end_time: NaiveTime::from_hms_opt(17, 30, 0).unwrap_or_default(),
        break_duration_minutes: 30,
        days_of_week: vec![1, 2, 3, 4, 5],
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.shifts().insert(&shift).await?;

    Ok(business)
}

async fn seed_staff(
    db: &Database,
    business: &Business,
    staff_name: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let now = Utc::now();
    let request = StaffRequest {
        id: format!("sr_{}", Uuid::new_v4()),
        business_id: business.id.clone(),
        business_code: business.join_code.clone(),
        staff_name: staff_name.to_string(),
        role: "staff".to_string(),
        status: StaffRequestStatus::Active,
        rejection_reason: None,
        requested_at: now,
        resolved_at: Some(now),
    };
    db.staff_requests().insert(&request).await?;
    Ok(request.id)
}

async fn seed_leave(
    db: &Database,
    business_id: &str,
    staff_id: &str,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    let approved = LeaveRequest {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        staff_id: staff_id.to_string(),
        leave_type: LeaveType::Casual,
        start_date: today - Duration::days(10),
        end_date: today - Duration::days(9),
        reason: "Family event".to_string(),
        status: LeaveStatus::Approved,
        requested_at: now - Duration::days(14),
        approved_by: Some("owner".to_string()),
        approved_at: Some(now - Duration::days(13)),
        rejected_by: None,
        rejected_at: None,
        rejection_reason: None,
    };
    let pending = LeaveRequest {
        id: Uuid::new_v4().to_string(),
        leave_type: LeaveType::Annual,
        start_date: today + Duration::days(7),
        end_date: today + Duration::days(11),
        reason: "Vacation".to_string(),
        status: LeaveStatus::Pending,
        requested_at: now,
        approved_by: None,
        approved_at: None,
        ..approved.clone()
    };

    db.leave().insert(&approved).await?;
    db.leave().insert(&pending).await?;
    Ok(())
}

/// Generates one day of attendance with a deterministic pattern per staff.
fn generate_record(
    business_id: &str,
    staff_id: &str,
    date: NaiveDate,
    staff_index: usize,
) -> AttendanceRecord {
    let seed = date.ordinal() as usize * 7 + staff_index * 13;

    // 0-24 minutes after 09:00; past 15 is late
    let arrival_minutes = (seed % 25) as i64;
    // 7h30m - 10h
    let worked_minutes = 450 + ((seed * 17) % 150) as i64;

    let check_in = Utc
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        + Duration::minutes(arrival_minutes);
    let check_out = check_in + Duration::minutes(worked_minutes);

    let work_location = match seed % 10 {
        0 | 1 => WorkLocation::Wfh,
        2 => WorkLocation::Field,
        _ => WorkLocation::Onsite,
    };

    AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        staff_id: staff_id.to_string(),
        date,
        check_in_time: Some(check_in),
        check_out_time: Some(check_out),
        work_location,
        coordinates: None,
        status: AttendanceStatus::Present,
        is_late: arrival_minutes > 15,
        working_hours: Some(worked_minutes as f64 / 60.0),
        notes: None,
        created_at: check_in,
        updated_at: check_out,
    }
}
