//! services/api/src/bin/add_user.rs
//!
//! Administrative user provisioning: hashes a password with argon2 and
//! inserts a row into the `users` table. Admin accounts are only ever created
//! out-of-band with this tool; the API itself has no signup surface.
//!
//! Usage: `add-user <username> <email> <password>` with `DATABASE_URL` set.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: add-user <username> <email> <password>");
        std::process::exit(2);
    }
    let (username, email, password) = (&args[1], &args[2], &args[3]);

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set")?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?
        .to_string();

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO NOTHING",
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .execute(&pool)
    .await?;

    if result.rows_affected() == 0 {
        println!("User with email {} already exists; nothing done.", email);
    } else {
        println!("User {} <{}> created.", username, email);
    }

    Ok(())
}
