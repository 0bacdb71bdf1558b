use minijinja::{context, Environment};

use crate::dart::{escape_string, to_pascal_case};
use crate::deps;
use crate::error::GenerateError;
use crate::model::{Snapshot, TransportKind};

/// Render `pubspec.yaml`: package metadata plus the aggregated dependency
/// set, flutter SDK entries pinned in place.
pub fn pubspec(snap: &Snapshot) -> Result<String, GenerateError> {
    let app = &snap.application;
    let dependencies = deps::aggregate(snap)?;

    let project_name = app
        .package_name
        .rsplit('.')
        .next()
        .unwrap_or(&app.package_name)
        .replace('-', "_");
    let description = if app.description.is_empty() {
        "A Flutter application generated by appforge.".to_string()
    } else {
        app.description.clone()
    };

    let mut out = String::new();
    out.push_str(&format!("name: {}\n", yaml_value(&project_name)));
    out.push_str(&format!("description: {}\n", yaml_value(&description)));
    out.push_str(&format!("version: {}\n", yaml_value(&format!("{}+1", app.version))));
    out.push_str("publish_to: 'none'\n");
    out.push('\n');
    out.push_str("environment:\n");
    out.push_str(&format!("  sdk: {}\n", yaml_value(">=3.0.0 <4.0.0")));
    out.push('\n');
    out.push_str("dependencies:\n");
    out.push_str("  flutter:\n    sdk: flutter\n");
    for (name, constraint) in &dependencies {
        out.push_str(&format!("  {}: {}\n", name, yaml_value(constraint)));
    }
    out.push('\n');
    out.push_str("dev_dependencies:\n");
    out.push_str("  flutter_test:\n    sdk: flutter\n");
    out.push_str("  flutter_lints: ^3.0.0\n");
    out.push('\n');
    out.push_str("flutter:\n");
    out.push_str("  uses-material-design: true\n");
    let has_static = snap
        .data_sources
        .iter()
        .any(|d| d.transport == TransportKind::StaticJson);
    if has_static {
        out.push_str("  assets:\n");
        out.push_str("    - assets/data/\n");
    }

    Ok(out)
}

/// Quote a scalar when it contains characters YAML would otherwise parse as
/// structure.
fn yaml_value(v: &str) -> String {
    const SPECIAL: &[char] = &[
        '>', '<', ':', '{', '}', '[', ']', ',', '&', '*', '#', '?', '|', '!', '%', '@', '`',
    ];
    if v.is_empty() || v.contains(SPECIAL) || v.starts_with(' ') || v.ends_with(' ') {
        format!("'{}'", v.replace('\'', "''"))
    } else {
        v.to_string()
    }
}

/// Render `lib/main.dart` from the entry-point template.
pub fn main_dart(snap: &Snapshot, env: &Environment<'_>) -> Result<String, GenerateError> {
    let app = &snap.application;
    let tmpl = env.get_template("main.dart")?;
    let out = tmpl.render(context! {
        app_class => format!("{}App", to_pascal_case(&app.name)),
        title => escape_string(&app.name),
        theme_mode => if snap.theme.dark_mode { "ThemeMode.dark" } else { "ThemeMode.light" },
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::template_env;

    fn snap() -> Snapshot {
        serde_json::from_str(
            r#"{
                "application": {
                    "id": 1, "name": "Corner Shop", "package_name": "com.example.corner_shop",
                    "version": "2.1.0"
                },
                "theme": {"name": "Default", "dark_mode": true},
                "extensions": [
                    {"package": "carousel_slider", "version": "^4.2.1"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn pubspec_lists_base_and_extension_packages() {
        let out = pubspec(&snap()).unwrap();
        assert!(out.contains("name: corner_shop\n"));
        assert!(out.contains("version: '2.1.0+1'\n") || out.contains("version: 2.1.0+1\n"));
        assert!(out.contains("  http: ^1.1.0\n"));
        assert!(out.contains("  carousel_slider: ^4.2.1\n"));
        assert!(out.contains("sdk: '>=3.0.0 <4.0.0'"));
    }

    #[test]
    fn static_sources_register_the_asset_directory() {
        let mut s = snap();
        assert!(!pubspec(&s).unwrap().contains("assets:"));

        let source: crate::model::DataSource = serde_json::from_str(
            r#"{"id": 1, "name": "Categories", "transport": "static_json"}"#,
        )
        .unwrap();
        s.data_sources.push(source);
        let out = pubspec(&s).unwrap();
        assert!(out.contains("  assets:\n    - assets/data/\n"));
    }

    #[test]
    fn main_dart_uses_app_identity() {
        let out = main_dart(&snap(), &template_env()).unwrap();
        assert!(out.contains("class CornerShopApp extends StatelessWidget"));
        assert!(out.contains("title: 'Corner Shop'"));
        assert!(out.contains("themeMode: ThemeMode.dark"));
        assert!(out.contains("initialRoute: AppRoutes.initialRoute"));
    }
}
