//! Init command implementation
//!
//! Scaffolds a new medrec deployment: `medrec.toml`, `.env.example`,
//! `.gitignore` and the `data/` directory.

use super::output::{Mark, Output};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Deployment already exists (medrec.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.section(&format!("Initializing {}", config.path.display()));

    let base_path = &config.path;

    let config_path = base_path.join("medrec.toml");
    if config_path.exists() && !config.force {
        output.mark(
            Mark::Warning,
            "medrec.toml already exists (pass --force to overwrite)",
        );
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.mark(Mark::Skipped, "data/ already exists");
    } else {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.mark(Mark::Failed, &format!("could not create data/: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.mark(Mark::Done, "created data/ for the database file");
    }

    let files = [
        ("medrec.toml", generate_medrec_toml()),
        (".env.example", generate_env_example()),
    ];
    for (name, content) in &files {
        if let Err(e) = write_file(&base_path.join(name), content, config.force) {
            output.mark(Mark::Failed, &format!("could not write {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.mark(Mark::Done, &format!("wrote {}", name));
    }

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        match write_file(&gitignore_path, &generate_gitignore(), false) {
            Ok(()) => output.mark(Mark::Done, "wrote .gitignore"),
            Err(e) => output.mark(Mark::Warning, &format!("could not write .gitignore: {}", e)),
        }
    }

    let steps: [(&str, &[&str]); 3] = [
        (
            "Provide the token signing secret (32+ characters)",
            &["cp .env.example .env", "$EDITOR .env"],
        ),
        (
            "Create the schema and a first administrator",
            &[
                "medrec-server migrate",
                "medrec-server create-admin --name Admin --email admin@example.com",
            ],
        ),
        (
            "Start the server on http://127.0.0.1:3000 (OpenAPI at /api/openapi.json)",
            &["medrec-server"],
        ),
    ];
    output.next_steps(&steps);

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_medrec_toml() -> String {
    r#"# medrec configuration
#
# Every value can be overridden with MEDREC__SECTION__KEY environment
# variables, e.g. MEDREC__SERVER__PORT=8080.

[server]
host = "127.0.0.1"
port = 3000
log_level = "info"     # RUST_LOG overrides this
log_format = "pretty"  # or "json"
body_limit_bytes = 1048576

[auth]
# Name of the environment variable holding the token signing secret
jwt_secret_env = "SECRET_KEY"
jwt_expiry_hours = 24

[database]
# Local file, ":memory:", or libsql://... for a remote database
url = "./data/medrec.db"
# When this environment variable is set it replaces `url`
url_env = "DATABASE_URL"
# Environment variable with the auth token for a remote database
# auth_token_env = "DATABASE_AUTH_TOKEN"
"#
    .to_string()
}

fn generate_env_example() -> String {
    r#"# medrec environment variables
# Copy this file to .env and fill in the values.

# REQUIRED: token signing secret (minimum 32 characters)
# Generate with: openssl rand -base64 32
SECRET_KEY=change-me-in-production-use-at-least-32-characters

# Optional: logging filter (trace, debug, info, warn, error)
RUST_LOG=info,medrec=debug

# Optional: database location, overrides [database] url
# DATABASE_URL=./data/medrec.db

# Optional: remote libsql database
# DATABASE_URL=libsql://your-db.turso.io
# DATABASE_AUTH_TOKEN=your-token
"#
    .to_string()
}

fn generate_gitignore() -> String {
    r#"/data/
*.db
*.db-wal
*.db-shm

.env
.env.local

/target/
"#
    .to_string()
}
