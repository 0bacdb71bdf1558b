use crate::dart::{escape_string, to_pascal_case};
use crate::error::GenerateError;
use crate::model::{Action, Snapshot};

/// Compile an Action into the closure expression wired to a widget
/// callback. Navigation actions resolve their target screen's route here;
/// a missing target is a dangling reference, not a silent no-op.
pub fn action_closure(snap: &Snapshot, action: &Action) -> Result<String, GenerateError> {
    match action.kind.as_str() {
        "navigate" => {
            let target = action.target_screen.ok_or_else(|| missing_param(action, "target_screen"))?;
            let screen = snap.screen(target).ok_or_else(|| GenerateError::DanglingReference {
                entity: format!("action {}", action.id),
                property: "target_screen".to_string(),
                target: format!("screen {target}"),
            })?;
            Ok(format!(
                "() {{ Navigator.pushNamed(context, '{}'); }}",
                escape_string(&screen.route)
            ))
        }

        "navigate_back" => Ok("() { Navigator.pop(context); }".to_string()),

        "show_dialog" => {
            let title = escape_string(action.dialog_title.as_deref().unwrap_or("Alert"));
            let message = escape_string(action.dialog_message.as_deref().unwrap_or("Message"));
            Ok(format!(
                "() {{ showDialog(context: context, builder: (context) => AlertDialog(\
                 title: Text('{title}'), content: Text('{message}'), \
                 actions: [TextButton(onPressed: () => Navigator.pop(context), \
                 child: const Text('OK'))])); }}"
            ))
        }

        "show_snackbar" => {
            let message = escape_string(action.dialog_message.as_deref().unwrap_or("Message"));
            Ok(format!(
                "() {{ ScaffoldMessenger.of(context).showSnackBar(\
                 SnackBar(content: Text('{message}'))); }}"
            ))
        }

        "api_call" => {
            let id = action.data_source.ok_or_else(|| missing_param(action, "data_source"))?;
            let source = snap.data_source(id).ok_or_else(|| GenerateError::DanglingReference {
                entity: format!("action {}", action.id),
                property: "data_source".to_string(),
                target: format!("data source {id}"),
            })?;
            Ok(format!("() {{ _api.fetch{}(); }}", to_pascal_case(&source.name)))
        }

        "open_url" => {
            let url = action.url.as_deref().ok_or_else(|| missing_param(action, "url"))?;
            Ok(format!(
                "() {{ launchUrl(Uri.parse('{}')); }}",
                escape_string(url)
            ))
        }

        "compose_email" => {
            let address = action.url.as_deref().ok_or_else(|| missing_param(action, "url"))?;
            let mailto = address.strip_prefix("mailto:").unwrap_or(address);
            Ok(format!(
                "() {{ launchUrl(Uri.parse('mailto:{}')); }}",
                escape_string(mailto)
            ))
        }

        other => Err(GenerateError::UnsupportedActionKind {
            action: action.id,
            name: action.name.clone(),
            kind: other.to_string(),
        }),
    }
}

/// Whether the generated closure needs the url_launcher import.
pub fn needs_url_launcher(action: &Action) -> bool {
    matches!(action.kind.as_str(), "open_url" | "compose_email")
}

/// Whether the generated closure calls into the ApiService singleton.
pub fn needs_api_service(action: &Action) -> bool {
    action.kind == "api_call"
}

fn missing_param(action: &Action, param: &str) -> GenerateError {
    GenerateError::SchemaViolation {
        detail: format!(
            "action {} '{}' of kind '{}' is missing its '{param}' parameter",
            action.id, action.name, action.kind
        ),
    }
}
