//! services/app/src/bin/edudash.rs

use std::io::Write as _;
use std::sync::Arc;

use app_lib::{
    adapters::{FileStore, HttpBackendAdapter},
    config::Config,
    error::AppError,
    session::SessionManager,
    state::AppState,
    views,
};
use chrono::Utc;
use edudash_core::{
    domain::{MaterialUpload, NewAssignment},
    notifications::{relevant_assignments, SeenStore},
    validation::{validate_material_upload, validate_new_assignment},
    wizard::{ChatWizard, WizardPhase},
    ScoutConversation,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Backend: {}", config.api_base_url);

    // --- 2. Build Local Storage & Session ---
    let store = Arc::new(FileStore::new(config.state_path.clone()));
    let session = SessionManager::new(store.clone());

    // --- 3. Initialize the HTTP Adapter ---
    let backend = Arc::new(HttpBackendAdapter::new(&config, session.clone())?);

    // --- 4. Build the Shared AppState ---
    let state = AppState {
        config,
        assignments: backend.clone(),
        materials: backend.clone(),
        qa: backend.clone(),
        scout: backend.clone(),
        auth: backend,
        store,
        session,
    };

    match state.session.current_user() {
        Some(user) => println!("Signed in as {} ({:?}).", user.email, user.role),
        None => println!("Not signed in. Use `login <firebase-id-token>` first."),
    }
    println!("Type `help` for commands.");

    // --- 5. Run the Command Loop ---
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        let (cmd, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line.as_str(), ""),
        };

        match cmd {
            "" => {}
            "help" => print_help(),
            "login" => login(&state, arg).await,
            "register" => register(&state, &mut lines).await?,
            "logout" => logout(&state).await,
            "me" => whoami(&state).await,
            "assignments" => show_assignments(&state).await,
            "materials" => show_materials(&state).await,
            "notifications" => show_notifications(&state).await,
            "download" => download_material(&state, arg).await,
            "delete" => delete_material(&state, arg).await,
            "upload" => upload_material(&state, arg, &mut lines).await?,
            "assign" => create_assignment(&state, &mut lines).await?,
            "chat" => run_chat(&state, &mut lines).await?,
            "scout" => run_scout(&state, &mut lines).await?,
            "quit" | "exit" => break,
            other => println!("Unknown command `{other}`. Type `help` for commands."),
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        "Commands:\n  \
         login <firebase-id-token>  exchange an id token for a session\n  \
         register                   create a new account\n  \
         logout                     clear the session and local state\n  \
         me                         show the current profile\n  \
         assignments                list assignments with deadline status\n  \
         materials                  list study materials\n  \
         notifications              open the reminder panel (marks items seen)\n  \
         download <id> [path]       save a material to disk\n  \
         delete <id>                delete a material (teachers)\n  \
         upload <path>              upload a PDF material (teachers)\n  \
         assign                     create a new assignment (teachers)\n  \
         chat                       ask questions about selected documents\n  \
         scout                      talk to the navigation assistant\n  \
         quit                       exit"
    );
}

fn print_prompt(prompt: &str) {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}

async fn login(state: &AppState, id_token: &str) {
    if id_token.is_empty() {
        println!("Usage: login <firebase-id-token>");
        return;
    }
    match state.auth.login_firebase(id_token).await {
        Ok(user) => println!("Signed in as {} ({:?}).", user.email, user.role),
        Err(e) => {
            error!("Login failed: {e}");
            println!("Login failed. Check the token and try again.");
        }
    }
}

async fn register(
    state: &AppState,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), AppError> {
    let email = prompt_line(lines, "Email: ").await?;
    let password = prompt_line(lines, "Password: ").await?;
    let full_name = prompt_line(lines, "Full name: ").await?;
    if email.is_empty() || password.is_empty() {
        println!("Email and password are required.");
        return Ok(());
    }
    match state.auth.register(&email, &password, &full_name).await {
        Ok(user) => println!("Registered {} ({:?}).", user.email, user.role),
        Err(e) => {
            error!("Registration failed: {e}");
            println!("Registration failed.");
        }
    }
    Ok(())
}

async fn logout(state: &AppState) {
    if let Err(e) = state.auth.logout().await {
        error!("Logout failed: {e}");
    }
    println!("Signed out.");
}

async fn whoami(state: &AppState) {
    match state.auth.me().await {
        Ok(user) => {
            let name = user.full_name.as_deref().unwrap_or("-");
            println!("{} <{}> role: {:?}", name, user.email, user.role);
        }
        Err(e) => {
            error!("Failed to fetch profile: {e}");
            println!("Not signed in.");
        }
    }
}

async fn show_assignments(state: &AppState) {
    let assignments = state.assignments.list_assignments().await.unwrap_or_else(|e| {
        error!("Failed to fetch assignments: {e}");
        Vec::new()
    });
    print!("{}", views::render_assignments(&assignments, Utc::now()));
}

async fn show_materials(state: &AppState) {
    let materials = state.materials.list_materials().await.unwrap_or_else(|e| {
        error!("Failed to fetch materials: {e}");
        Vec::new()
    });
    print!("{}", views::render_materials(&materials));
}

/// Opening the panel renders the relevant subset and immediately marks
/// everything in it as seen, exactly like the web dropdown.
async fn show_notifications(state: &AppState) {
    let assignments = state.assignments.list_assignments().await.unwrap_or_else(|e| {
        error!("Failed to fetch assignments: {e}");
        Vec::new()
    });

    let now = Utc::now();
    let seen_store = SeenStore::new(state.store.as_ref());
    let seen = seen_store.load();
    print!("{}", views::render_notifications(&assignments, &seen, now));

    let relevant = relevant_assignments(&assignments, now);
    if !relevant.is_empty() {
        seen_store.mark_all_seen(&relevant, &seen);
    }
}

async fn download_material(state: &AppState, arg: &str) {
    let (id, out_path) = match arg.split_once(' ') {
        Some((id, path)) => (id, path.trim().to_string()),
        None if !arg.is_empty() => (arg, format!("{arg}.pdf")),
        None => {
            println!("Usage: download <material-id> [path]");
            return;
        }
    };
    match state.materials.download_material(id).await {
        Ok(bytes) => match std::fs::write(&out_path, &bytes) {
            Ok(()) => println!("Saved {} bytes to {out_path}.", bytes.len()),
            Err(e) => {
                error!("Failed to write {out_path}: {e}");
                println!("Could not write the file.");
            }
        },
        Err(e) => {
            error!("Download failed: {e}");
            println!("Could not download material {id}.");
        }
    }
}

async fn delete_material(state: &AppState, id: &str) {
    if id.is_empty() {
        println!("Usage: delete <material-id>");
        return;
    }
    match state.materials.delete_material(id).await {
        Ok(()) => println!("Deleted material {id}."),
        Err(e) => {
            error!("Delete failed: {e}");
            println!("Could not delete material {id}.");
        }
    }
}

/// Prompts for the upload form fields, validates locally, then posts the
/// multipart request. Validation failures print per-field and block the
/// request entirely.
async fn upload_material(
    state: &AppState,
    path: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), AppError> {
    if path.is_empty() {
        println!("Usage: upload <path-to-pdf>");
        return Ok(());
    }
    let file_bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read {path}: {e}");
            println!("Could not read the file.");
            return Ok(());
        }
    };
    let file_name = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.pdf")
        .to_string();

    let title = prompt_line(lines, "Title: ").await?;
    let description = prompt_line(lines, "Description: ").await?;
    let course_id = prompt_line(lines, "Course id: ").await?;
    let tags_raw = prompt_line(lines, "Tags (comma-separated): ").await?;
    let is_public = prompt_line(lines, "Public? (y/n): ").await?.eq_ignore_ascii_case("y");
    let vectorize = prompt_line(lines, "Index for Q&A? (y/n): ").await?.eq_ignore_ascii_case("y");

    let errors = validate_material_upload(&file_name, file_bytes.len() as u64, &title);
    if !errors.is_empty() {
        for (field, message) in errors.iter() {
            println!("  {field}: {message}");
        }
        return Ok(());
    }

    let upload = MaterialUpload {
        file_name,
        file_bytes,
        title,
        description,
        course_id,
        tags: tags_raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        is_public,
        vectorize,
    };
    match state.materials.upload_material(&upload).await {
        Ok(()) => println!("Uploaded {}.", upload.title),
        Err(e) => {
            error!("Upload failed: {e}");
            println!("Upload failed.");
        }
    }
    Ok(())
}

/// Prompts for the new-assignment form, validates, and broadcasts it.
async fn create_assignment(
    state: &AppState,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), AppError> {
    let title = prompt_line(lines, "Title: ").await?;
    let description = prompt_line(lines, "Description: ").await?;
    let due_date = prompt_line(lines, "Due date (ISO 8601): ").await?;
    let course_name = prompt_line(lines, "Course (blank for General): ").await?;
    let points_raw = prompt_line(lines, "Points (0-1000, default 100): ").await?;
    let points = points_raw.parse::<i64>().unwrap_or(100);
    let instructions = prompt_line(lines, "Instructions (optional): ").await?;

    let form = NewAssignment {
        title,
        description,
        due_date,
        course_name: if course_name.is_empty() {
            None
        } else {
            Some(course_name)
        },
        points,
        instructions: if instructions.is_empty() {
            None
        } else {
            Some(instructions)
        },
    };

    let errors = validate_new_assignment(&form, Utc::now());
    if !errors.is_empty() {
        for (field, message) in errors.iter() {
            println!("  {field}: {message}");
        }
        return Ok(());
    }

    match state.assignments.create_assignment(&form).await {
        Ok(()) => println!("Assignment \"{}\" sent to all students.", form.title),
        Err(e) => {
            error!("Failed to create assignment: {e}");
            println!("Could not create the assignment.");
        }
    }
    Ok(())
}

async fn prompt_line(
    lines: &mut Lines<BufReader<Stdin>>,
    prompt: &str,
) -> Result<String, AppError> {
    print_prompt(prompt);
    Ok(lines.next_line().await?.unwrap_or_default().trim().to_string())
}

/// The three-phase document chat flow: config, initial query, follow-ups.
async fn run_chat(state: &AppState, lines: &mut Lines<BufReader<Stdin>>) -> Result<(), AppError> {
    let materials = state.materials.list_materials().await.unwrap_or_else(|e| {
        error!("Failed to fetch materials: {e}");
        Vec::new()
    });
    if materials.is_empty() {
        println!("No materials found.");
        return Ok(());
    }

    let mut wizard = ChatWizard::new();

    // Config phase: select documents and a creativity level.
    for (i, m) in materials.iter().enumerate() {
        println!("  {}. {}", i + 1, m.title);
    }
    println!("Select documents by number (comma-separated), `all`, or `creativity <0..1>`:");
    loop {
        print_prompt("chat/config> ");
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();
        if input == "all" {
            let visible: Vec<_> = materials.iter().collect();
            wizard.toggle_select_all(&visible);
        } else if let Some(raw) = input.strip_prefix("creativity ") {
            match raw.trim().parse::<f64>() {
                Ok(value) => {
                    wizard.set_creativity(value);
                    println!("Creativity set to {:.2}.", wizard.creativity());
                    continue;
                }
                Err(_) => {
                    println!("Creativity must be a number between 0 and 1.");
                    continue;
                }
            }
        } else {
            for token in input.split(',') {
                match token.trim().parse::<usize>() {
                    Ok(n) if n >= 1 && n <= materials.len() => {
                        wizard.toggle_document(&materials[n - 1].id)
                    }
                    _ => println!("Ignoring `{}`.", token.trim()),
                }
            }
        }
        if wizard.finish_config() {
            break;
        }
        println!("Select at least one document to continue.");
    }

    println!(
        "Selected {} document(s), creativity {:.2}. Ask your question (`/close` to exit):",
        wizard.selected_documents().len(),
        wizard.creativity()
    );

    // Query and chat phases.
    loop {
        print_prompt("chat> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input == "/close" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let before = wizard.messages().len();
        match wizard.phase() {
            WizardPhase::Query => wizard.submit_query(state.qa.as_ref(), input).await,
            WizardPhase::Chat => wizard.submit_follow_up(state.qa.as_ref(), input).await,
            WizardPhase::Config => unreachable!("config completed above"),
        }
        for message in &wizard.messages()[before..] {
            println!("[{:?}] {}", message.role, message.content);
        }
    }

    // Closing the wizard discards the whole session.
    wizard.reset();
    Ok(())
}

async fn run_scout(state: &AppState, lines: &mut Lines<BufReader<Stdin>>) -> Result<(), AppError> {
    let mut conversation = ScoutConversation::new();
    println!("Scout is listening (`/close` to exit).");
    loop {
        print_prompt("scout> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input == "/close" {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let before = conversation.messages().len();
        conversation.send(state.scout.as_ref(), input).await;
        for message in &conversation.messages()[before..] {
            println!("[{:?}] {}", message.role, message.content);
        }
    }
    conversation.clear();
    Ok(())
}
