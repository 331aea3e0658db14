//! CLI tool to create a user and print an access token for it
//!
//! Usage:
//!   cargo run --bin create_user -- --username ada --email ada@example.com --password 'correct horse'

use anyhow::{Context, Result};
use clap::Parser;
use validator::Validate;
use musify::{
    api::users::SignupRequest,
    auth::{JwtManager, PasswordHasher},
    config::Settings,
    db::{Database, NewUser, UserRepository},
};

/// Create a new Musify user
#[derive(Parser, Debug)]
#[command(name = "create_user")]
#[command(about = "Create a new Musify user and print an access token")]
struct Args {
    /// Unique username
    #[arg(short, long)]
    username: String,

    /// Unique email address
    #[arg(short, long)]
    email: String,

    /// Plain-text password (hashed with bcrypt before storage)
    #[arg(short, long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Same rules as POST /signup
    let request = SignupRequest {
        username: args.username,
        email: args.email,
        password: args.password,
    };
    request.validate().context("Invalid user details")?;

    let settings = Settings::load()?;

    let database = Database::connect(&settings)
        .await
        .context("Failed to connect to DATABASE_URI")?;
    database.migrate().await?;

    let password_hash = PasswordHasher::new(settings.bcrypt_cost)
        .hash(&request.password)
        .await?;

    let user = UserRepository::new(database.clone())
        .create(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    let token = JwtManager::new(&settings.jwt).create_access_token(&user)?;

    println!("\nUser created successfully!\n");
    println!("ID:       {}", user.id);
    println!("Username: {}", user.username);
    println!("Email:    {}", user.email);
    println!("\nAccess token (valid {}s):", settings.jwt.access_token_expires_seconds);
    println!("  {}", token);
    if settings.jwt.ephemeral_secret {
        println!("\nJWT_SECRET_KEY is not set: this token will not verify against a running server.");
    }

    database.close().await;

    Ok(())
}
