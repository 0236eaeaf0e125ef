//! SQLite persistence for plans, blocks, days, workouts, personal bests and
//! user settings. Parsers never touch this module; callers hand it the
//! canonical model after an import.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::models::{Block, Day, DayPlan, DayType, PersonalBestLift, Plan, WeightUnit, Workout};

/// Personal best slots every new database starts with (0 x 1 placeholders)
pub const SEEDED_PERSONAL_BESTS: [&str; 3] = ["Back Squat", "Deadlift", "Bench Press"];

fn notes_to_json(notes: &[String]) -> Result<String, String> {
    serde_json::to_string(notes).map_err(|e| format!("Failed to serialize notes: {}", e))
}

fn notes_from_json(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// ---------------------------------------------------------------------------
/// Inserts
/// ---------------------------------------------------------------------------

/// Insert days (and their workouts) under a plan and optional block
pub async fn insert_days(
    conn: &mut SqliteConnection,
    plan_id: i64,
    block_id: Option<i64>,
    days: &DayPlan,
) -> Result<usize, String> {
    let mut workout_count = 0;

    for (day, workouts) in days {
        let day_id = sqlx::query(
            r#"
            INSERT INTO workout_days (plan_id, block_id, name, day_type, day, is_completed)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan_id)
        .bind(block_id)
        .bind(&day.name)
        .bind(day.day_type.to_string())
        .bind(day.day)
        .bind(day.is_completed)
        .execute(&mut *conn)
        .await
        .map_err(|e| format!("Failed to insert day: {}", e))?
        .last_insert_rowid();

        for (position, workout) in workouts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO workouts
                    (day_id, position, exercise_name, sets, warm_up_sets, working_sets,
                     reps, time, load, rpe, rest, notes, is_completed)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(day_id)
            .bind(position as i64)
            .bind(&workout.exercise_name)
            .bind(workout.sets)
            .bind(workout.warm_up_sets)
            .bind(workout.working_sets)
            .bind(workout.reps)
            .bind(&workout.time)
            .bind(workout.load)
            .bind(&workout.rpe)
            .bind(&workout.rest)
            .bind(&workout.notes)
            .bind(workout.is_completed)
            .execute(&mut *conn)
            .await
            .map_err(|e| format!("Failed to insert workout: {}", e))?;
        }
        workout_count += workouts.len();
    }

    Ok(workout_count)
}

/// Insert the plan row only; days are attached separately
pub async fn insert_plan_row(conn: &mut SqliteConnection, plan: &Plan) -> Result<i64, String> {
    let notes_json = notes_to_json(&plan.notes)?;
    let created_at = plan.created_at.unwrap_or_else(Utc::now).to_rfc3339();

    let plan_id = sqlx::query(
        r#"
        INSERT INTO workout_plans (name, is_primary, notes_json, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&plan.name)
    .bind(plan.is_primary)
    .bind(&notes_json)
    .bind(&created_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| format!("Failed to insert plan: {}", e))?
    .last_insert_rowid();

    Ok(plan_id)
}

/// Insert a block with its days under `plan_id`. Returns the block id and
/// the number of workouts written.
pub async fn insert_block_rows(
    conn: &mut SqliteConnection,
    plan_id: i64,
    block_name: &str,
    notes: &[String],
    days: &DayPlan,
) -> Result<(i64, usize), String> {
    let notes_json = notes_to_json(notes)?;

    let block_id = sqlx::query(
        r#"
        INSERT INTO workout_blocks (plan_id, name, notes_json, is_completed)
        VALUES (?, ?, ?, 0)
        "#,
    )
    .bind(plan_id)
    .bind(block_name)
    .bind(&notes_json)
    .execute(&mut *conn)
    .await
    .map_err(|e| format!("Failed to insert block: {}", e))?
    .last_insert_rowid();

    let workouts = insert_days(conn, plan_id, Some(block_id), days).await?;
    Ok((block_id, workouts))
}

/// Insert a plan with its (block-less) days in one transaction
pub async fn insert_full_plan(pool: &SqlitePool, plan: &Plan, days: &DayPlan) -> Result<i64, String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to start transaction: {}", e))?;

    let plan_id = insert_plan_row(&mut tx, plan).await?;
    let workouts = insert_days(&mut tx, plan_id, None, days).await?;

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit plan: {}", e))?;

    info!(plan_id, name = %plan.name, days = days.len(), workouts, "Inserted plan");
    Ok(plan_id)
}

/// Create a block under an existing plan and attach days to it
pub async fn insert_block_with_days(
    pool: &SqlitePool,
    plan_id: i64,
    block_name: &str,
    notes: &[String],
    days: &DayPlan,
) -> Result<i64, String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to start transaction: {}", e))?;

    let (block_id, workouts) = insert_block_rows(&mut tx, plan_id, block_name, notes, days).await?;

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit block: {}", e))?;

    info!(plan_id, block_id, name = %block_name, days = days.len(), workouts, "Inserted block");
    Ok(block_id)
}

/// Err unless `plan_id` names an existing plan
pub async fn ensure_plan_exists(conn: &mut SqliteConnection, plan_id: i64) -> Result<(), String> {
    let row = sqlx::query("SELECT id FROM workout_plans WHERE id = ?")
        .bind(plan_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| format!("Failed to load plan: {}", e))?;

    match row {
        Some(_) => Ok(()),
        None => Err(format!("Plan not found: {}", plan_id)),
    }
}

/// Reset every primary flag and set `plan_id`'s, inside the caller's transaction
pub async fn set_primary_rows(conn: &mut SqliteConnection, plan_id: i64) -> Result<(), String> {
    sqlx::query("UPDATE workout_plans SET is_primary = 0")
        .execute(&mut *conn)
        .await
        .map_err(|e| format!("Failed to reset primary plan: {}", e))?;

    let updated = sqlx::query("UPDATE workout_plans SET is_primary = 1 WHERE id = ?")
        .bind(plan_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| format!("Failed to set primary plan: {}", e))?
        .rows_affected();

    if updated == 0 {
        return Err(format!("Plan not found: {}", plan_id));
    }
    Ok(())
}

/// Make `plan_id` the only primary plan
pub async fn set_primary_plan(pool: &SqlitePool, plan_id: i64) -> Result<(), String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to start transaction: {}", e))?;

    set_primary_rows(&mut tx, plan_id).await?;

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit primary plan: {}", e))?;

    debug!(plan_id, "Primary plan set");
    Ok(())
}

pub async fn delete_plan(pool: &SqlitePool, plan_id: i64) -> Result<(), String> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| format!("Failed to start transaction: {}", e))?;

    sqlx::query("DELETE FROM workouts WHERE day_id IN (SELECT id FROM workout_days WHERE plan_id = ?)")
        .bind(plan_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to delete workouts: {}", e))?;

    for table in ["workout_days", "workout_blocks"] {
        sqlx::query(&format!("DELETE FROM {} WHERE plan_id = ?", table))
            .bind(plan_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| format!("Failed to delete from {}: {}", table, e))?;
    }

    let deleted = sqlx::query("DELETE FROM workout_plans WHERE id = ?")
        .bind(plan_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| format!("Failed to delete plan: {}", e))?
        .rows_affected();

    if deleted == 0 {
        return Err(format!("Plan not found: {}", plan_id));
    }

    tx.commit()
        .await
        .map_err(|e| format!("Failed to commit plan delete: {}", e))?;
    Ok(())
}

/// ---------------------------------------------------------------------------
/// Queries
/// ---------------------------------------------------------------------------

fn plan_from_row(row: &sqlx::sqlite::SqliteRow) -> Plan {
    let notes_json: String = row.get("notes_json");
    let created_at: Option<String> = row.get("created_at");

    Plan {
        id: row.get("id"),
        name: row.get("name"),
        is_primary: row.get("is_primary"),
        notes: notes_from_json(&notes_json),
        created_at: parse_timestamp(created_at),
    }
}

pub async fn load_plans(pool: &SqlitePool) -> Result<Vec<Plan>, String> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, is_primary, notes_json, created_at
        FROM workout_plans
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load plans: {}", e))?;

    Ok(rows.iter().map(plan_from_row).collect())
}

pub async fn load_plan(pool: &SqlitePool, plan_id: i64) -> Result<Plan, String> {
    let row = sqlx::query(
        r#"
        SELECT id, name, is_primary, notes_json, created_at
        FROM workout_plans
        WHERE id = ?
        "#,
    )
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to load plan: {}", e))?;

    row.as_ref()
        .map(plan_from_row)
        .ok_or_else(|| format!("Plan not found: {}", plan_id))
}

pub async fn load_primary_plan(pool: &SqlitePool) -> Result<Option<Plan>, String> {
    let row = sqlx::query(
        r#"
        SELECT id, name, is_primary, notes_json, created_at
        FROM workout_plans
        WHERE is_primary = 1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to load primary plan: {}", e))?;

    Ok(row.as_ref().map(plan_from_row))
}

pub async fn load_blocks(pool: &SqlitePool, plan_id: i64) -> Result<Vec<Block>, String> {
    let rows = sqlx::query(
        r#"
        SELECT id, plan_id, name, notes_json, is_completed
        FROM workout_blocks
        WHERE plan_id = ?
        ORDER BY id
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load blocks: {}", e))?;

    Ok(rows
        .iter()
        .map(|row| {
            let notes_json: String = row.get("notes_json");
            Block {
                id: row.get("id"),
                plan_id: row.get("plan_id"),
                name: row.get("name"),
                notes: notes_from_json(&notes_json),
                is_completed: row.get("is_completed"),
            }
        })
        .collect())
}

fn workout_from_row(row: &sqlx::sqlite::SqliteRow) -> Workout {
    Workout {
        id: row.get("id"),
        day_id: row.get("day_id"),
        exercise_name: row.get("exercise_name"),
        sets: row.get("sets"),
        warm_up_sets: row.get("warm_up_sets"),
        working_sets: row.get("working_sets"),
        reps: row.get("reps"),
        time: row.get("time"),
        load: row.get("load"),
        rpe: row.get("rpe"),
        rest: row.get("rest"),
        notes: row.get("notes"),
        is_completed: row.get("is_completed"),
    }
}

pub async fn load_workout(pool: &SqlitePool, workout_id: i64) -> Result<Workout, String> {
    let row = sqlx::query(
        r#"
        SELECT id, day_id, exercise_name, sets, warm_up_sets, working_sets,
               reps, time, load, rpe, rest, notes, is_completed
        FROM workouts
        WHERE id = ?
        "#,
    )
    .bind(workout_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| format!("Failed to load workout: {}", e))?;

    row.as_ref()
        .map(workout_from_row)
        .ok_or_else(|| format!("Workout not found: {}", workout_id))
}

/// Days of a plan with their workouts, ordered by block, sequence, then id
pub async fn load_plan_days(pool: &SqlitePool, plan_id: i64) -> Result<DayPlan, String> {
    let day_rows = sqlx::query(
        r#"
        SELECT id, plan_id, block_id, name, day_type, day, is_completed
        FROM workout_days
        WHERE plan_id = ?
        ORDER BY COALESCE(block_id, 0), COALESCE(day, 0), id
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load days: {}", e))?;

    let workout_rows = sqlx::query(
        r#"
        SELECT w.id, w.day_id, w.exercise_name, w.sets, w.warm_up_sets, w.working_sets,
               w.reps, w.time, w.load, w.rpe, w.rest, w.notes, w.is_completed
        FROM workouts w
        JOIN workout_days d ON d.id = w.day_id
        WHERE d.plan_id = ?
        ORDER BY w.day_id, w.position, w.id
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load workouts: {}", e))?;

    let mut by_day: HashMap<i64, Vec<Workout>> = HashMap::new();
    for row in workout_rows {
        let day_id: i64 = row.get("day_id");
        by_day.entry(day_id).or_default().push(workout_from_row(&row));
    }

    let days = day_rows
        .into_iter()
        .map(|row| {
            let id: i64 = row.get("id");
            let day_type: String = row.get("day_type");
            let day = Day {
                id: Some(id),
                plan_id: row.get("plan_id"),
                block_id: row.get("block_id"),
                name: row.get("name"),
                day_type: day_type.parse::<DayType>().unwrap_or_default(),
                day: row.get("day"),
                is_completed: row.get("is_completed"),
            };
            (day, by_day.remove(&id).unwrap_or_default())
        })
        .collect();

    Ok(days)
}

/// ---------------------------------------------------------------------------
/// Completion Flags
/// ---------------------------------------------------------------------------

async fn set_completed(pool: &SqlitePool, table: &str, id: i64, completed: bool) -> Result<(), String> {
    let updated = sqlx::query(&format!("UPDATE {} SET is_completed = ? WHERE id = ?", table))
        .bind(completed)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to update {}: {}", table, e))?
        .rows_affected();

    if updated == 0 {
        return Err(format!("No row {} in {}", id, table));
    }
    Ok(())
}

pub async fn set_workout_completed(pool: &SqlitePool, workout_id: i64, completed: bool) -> Result<(), String> {
    set_completed(pool, "workouts", workout_id, completed).await
}

pub async fn set_day_completed(pool: &SqlitePool, day_id: i64, completed: bool) -> Result<(), String> {
    set_completed(pool, "workout_days", day_id, completed).await
}

pub async fn set_block_completed(pool: &SqlitePool, block_id: i64, completed: bool) -> Result<(), String> {
    set_completed(pool, "workout_blocks", block_id, completed).await
}

/// ---------------------------------------------------------------------------
/// Personal Bests
/// ---------------------------------------------------------------------------

pub async fn insert_personal_best(pool: &SqlitePool, pb: &PersonalBestLift) -> Result<i64, String> {
    let id = sqlx::query(
        r#"
        INSERT INTO personal_best_lifts (exercise_name, load, rep_count)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&pb.exercise_name)
    .bind(pb.load)
    .bind(pb.rep_count)
    .execute(pool)
    .await
    .map_err(|e| format!("Failed to insert personal best: {}", e))?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_personal_best(pool: &SqlitePool, pb: &PersonalBestLift) -> Result<(), String> {
    let id = pb
        .id
        .ok_or_else(|| "Cannot update a personal best without an id".to_string())?;

    let updated = sqlx::query(
        r#"
        UPDATE personal_best_lifts
        SET exercise_name = ?, load = ?, rep_count = ?
        WHERE id = ?
        "#,
    )
    .bind(&pb.exercise_name)
    .bind(pb.load)
    .bind(pb.rep_count)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| format!("Failed to update personal best: {}", e))?
    .rows_affected();

    if updated == 0 {
        return Err(format!("Personal best not found: {}", id));
    }
    Ok(())
}

pub async fn load_personal_bests(pool: &SqlitePool) -> Result<Vec<PersonalBestLift>, String> {
    sqlx::query_as::<_, PersonalBestLift>(
        r#"
        SELECT id, exercise_name, load, rep_count
        FROM personal_best_lifts
        ORDER BY exercise_name, rep_count, id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| format!("Failed to load personal bests: {}", e))
}

pub async fn delete_personal_best(pool: &SqlitePool, id: i64) -> Result<(), String> {
    let deleted = sqlx::query("DELETE FROM personal_best_lifts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to delete personal best: {}", e))?
        .rows_affected();

    if deleted == 0 {
        return Err(format!("Personal best not found: {}", id));
    }
    Ok(())
}

/// Insert the placeholder personal bests when the table is empty.
/// Returns how many were inserted.
pub async fn seed_default_personal_bests(pool: &SqlitePool) -> Result<usize, String> {
    let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM personal_best_lifts")
        .fetch_one(pool)
        .await
        .map_err(|e| format!("Failed to count personal bests: {}", e))?
        .get("count");

    if count > 0 {
        return Ok(0);
    }

    for name in SEEDED_PERSONAL_BESTS {
        insert_personal_best(pool, &PersonalBestLift::new(name, 0.0, 1)).await?;
    }
    info!(count = SEEDED_PERSONAL_BESTS.len(), "Seeded placeholder personal bests");
    Ok(SEEDED_PERSONAL_BESTS.len())
}

/// ---------------------------------------------------------------------------
/// User Settings
/// ---------------------------------------------------------------------------

pub async fn get_weight_unit(pool: &SqlitePool) -> Result<WeightUnit, String> {
    let row = sqlx::query("SELECT weight_unit FROM user_settings WHERE id = 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| format!("Failed to load settings: {}", e))?;

    Ok(row
        .and_then(|r| r.get::<String, _>("weight_unit").parse().ok())
        .unwrap_or_default())
}

pub async fn set_weight_unit(pool: &SqlitePool, unit: WeightUnit) -> Result<(), String> {
    sqlx::query(
        r#"
        INSERT INTO user_settings (id, weight_unit) VALUES (1, ?)
        ON CONFLICT(id) DO UPDATE SET weight_unit = excluded.weight_unit
        "#,
    )
    .bind(unit.as_str())
    .execute(pool)
    .await
    .map_err(|e| format!("Failed to save settings: {}", e))?;

    Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
