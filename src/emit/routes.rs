use crate::dart::{escape_string, to_pascal_case, to_snake_case, DartWriter};
use crate::model::Snapshot;

/// Render `lib/routes/app_routes.dart`: every screen keyed by route, plus
/// the single home route as the initial entry. The one-home invariant is
/// checked before emission starts.
pub fn emit(snap: &Snapshot) -> String {
    let mut w = DartWriter::new();
    w.line("import 'package:flutter/material.dart';");
    for screen in &snap.screens {
        w.line(&format!(
            "import '../screens/{}_screen.dart';",
            to_snake_case(&screen.name)
        ));
    }
    w.blank();

    let home = snap
        .home_screens()
        .first()
        .map(|s| s.route.clone())
        .unwrap_or_else(|| "/".to_string());

    w.open("class AppRoutes {");
    w.line(&format!("static const String initialRoute = '{}';", escape_string(&home)));
    w.blank();
    w.open("static Map<String, WidgetBuilder> get routes {");
    w.open("return {");
    for screen in &snap.screens {
        w.line(&format!(
            "'{}': (context) => const {}Screen(),",
            escape_string(&screen.route),
            to_pascal_case(&screen.name)
        ));
    }
    w.close("};");
    w.close("}");
    w.close("}");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_map_covers_every_screen() {
        let snap: Snapshot = serde_json::from_str(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [
                    {"id": 1, "name": "Home", "route": "/", "is_home": true},
                    {"id": 2, "name": "Product List", "route": "/products"}
                ]
            }"#,
        )
        .unwrap();

        let out = emit(&snap);
        assert!(out.contains("import '../screens/home_screen.dart';"));
        assert!(out.contains("import '../screens/product_list_screen.dart';"));
        assert!(out.contains("static const String initialRoute = '/';"));
        assert!(out.contains("'/products': (context) => const ProductListScreen(),"));
    }
}
