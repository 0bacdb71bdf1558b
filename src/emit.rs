pub mod actions;
pub mod models;
pub mod project;
pub mod routes;
pub mod screens;
pub mod services;
pub mod theme;
pub mod widgets;

use std::collections::{BTreeMap, BTreeSet};

use minijinja::Environment;

use crate::dart::to_snake_case;
use crate::error::GenerateError;
use crate::model::Snapshot;

/// Emitted project tree: relative file path -> source text. BTreeMap keeps
/// the file set in one canonical order so emission is byte-stable.
pub type FileMap = BTreeMap<String, String>;

/// Build the minijinja environment holding the fixed-shape artifact
/// templates. Templates are compiled in; nothing is read from disk.
pub fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("main.dart", include_str!("emit/templates/main.dart.j2"))
        .expect("embedded template parses");
    env.add_template("app_theme.dart", include_str!("emit/templates/app_theme.dart.j2"))
        .expect("embedded template parses");
    env
}

/// Emit the complete project tree for one application snapshot.
///
/// Deterministic and idempotent: the same snapshot always yields a
/// byte-identical file map. Any structural or schema problem aborts the
/// whole run; partial file sets are never returned.
pub fn emit(snap: &Snapshot) -> Result<FileMap, GenerateError> {
    check_screens(snap)?;

    let env = template_env();
    let mut files = FileMap::new();

    files.insert("pubspec.yaml".to_string(), project::pubspec(snap)?);
    files.insert("lib/main.dart".to_string(), project::main_dart(snap, &env)?);
    files.insert("lib/theme/app_theme.dart".to_string(), theme::emit(snap, &env)?);
    files.insert("lib/routes/app_routes.dart".to_string(), routes::emit(snap));
    files.insert("lib/models/app_models.dart".to_string(), models::emit(snap));
    files.insert(
        "lib/services/app_config.dart".to_string(),
        services::emit_app_config(snap),
    );
    files.insert(
        "lib/services/api_service.dart".to_string(),
        services::emit_api_service(snap),
    );

    for screen in &snap.screens {
        let path = format!("lib/screens/{}_screen.dart", to_snake_case(&screen.name));
        files.insert(path, screens::emit(snap, screen)?);
    }

    Ok(files)
}

/// Application-level invariants the routing table depends on: exactly one
/// home screen, no duplicate routes.
fn check_screens(snap: &Snapshot) -> Result<(), GenerateError> {
    let homes = snap.home_screens();
    if homes.len() != 1 {
        return Err(GenerateError::SchemaViolation {
            detail: format!(
                "application {} must have exactly one home screen, found {}",
                snap.application.id,
                homes.len()
            ),
        });
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for screen in &snap.screens {
        if !seen.insert(screen.route.as_str()) {
            return Err(GenerateError::SchemaViolation {
                detail: format!("duplicate route '{}' (screen {})", screen.route, screen.id),
            });
        }
    }

    Ok(())
}
