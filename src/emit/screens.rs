use crate::dart::{color_literal, escape_string, to_pascal_case, DartWriter};
use crate::error::GenerateError;
use crate::model::{Screen, Snapshot};
use crate::resolve::{ResolvedValue, Resolver};
use crate::tree::{resolve_tree, WidgetForest};

use super::widgets::{widget_code, Binding};

/// Render `lib/screens/<name>_screen.dart`: a StatefulWidget whose body is
/// the screen's resolved widget tree. Screens with a screen-level field
/// binding load their payload once in initState.
pub fn emit(snap: &Snapshot, screen: &Screen) -> Result<String, GenerateError> {
    let forest = resolve_tree(snap, screen)?;
    let scan = scan_usage(snap, &forest)?;
    let class = format!("{}Screen", to_pascal_case(&screen.name));

    let mut w = DartWriter::new();
    w.line("import 'package:flutter/material.dart';");
    if scan.uses_url_launcher {
        w.line("import 'package:url_launcher/url_launcher.dart';");
    }
    if scan.uses_api {
        w.blank();
        w.line("import '../services/api_service.dart';");
    }
    w.blank();

    w.open(&format!("class {class} extends StatefulWidget {{"));
    w.line(&format!("const {class}({{super.key}});"));
    w.blank();
    w.line("@override");
    w.line(&format!("State<{class}> createState() => _{class}State();"));
    w.close("}");
    w.blank();

    w.open(&format!("class _{class}State extends State<{class}> {{"));
    if scan.uses_api {
        w.line("final ApiService _api = ApiService();");
    }
    if let Some(source) = &scan.screen_source {
        w.line("Map<String, dynamic>? _data;");
        w.line("bool _loading = true;");
        w.line("String? _error;");
        w.blank();
        w.line("@override");
        w.open("void initState() {");
        w.line("super.initState();");
        w.line("_load();");
        w.close("}");
        w.blank();
        w.open("Future<void> _load() async {");
        w.open("try {");
        w.line(&format!("final rows = await _api.fetch{}();", to_pascal_case(source)));
        w.open("setState(() {");
        w.line("_data = rows.isNotEmpty ? Map<String, dynamic>.from(rows.first as Map) : null;");
        w.line("_loading = false;");
        w.close("});");
        w.chain("} catch (e) {");
        w.open("setState(() {");
        w.line("_error = e.toString();");
        w.line("_loading = false;");
        w.close("});");
        w.close("}");
        w.close("}");
    }
    w.blank();

    w.line("@override");
    w.open("Widget build(BuildContext context) {");
    w.open("return Scaffold(");
    if screen.show_app_bar {
        let title = escape_string(screen.app_bar_title.as_deref().unwrap_or(&screen.name));
        if screen.show_back_button {
            w.line(&format!("appBar: AppBar(title: Text('{title}')),"));
        } else {
            w.line(&format!(
                "appBar: AppBar(title: Text('{title}'), automaticallyImplyLeading: false),"
            ));
        }
    }
    if let Some(bg) = &screen.background_color {
        w.line(&format!("backgroundColor: {},", color_literal(bg)));
    }

    let body = body_code(snap, &forest, scan.screen_source.is_some())?;
    w.line(&format!("body: {body},"));
    w.close(");");
    w.close("}");
    w.close("}");
    Ok(w.finish())
}

/// Body expression at Scaffold-argument depth. Every screen must have
/// exactly one root widget; zero and many both fail through `sole_root`.
fn body_code(
    snap: &Snapshot,
    forest: &WidgetForest,
    loads_data: bool,
) -> Result<String, GenerateError> {
    forest.sole_root()?;

    if loads_data {
        // root sits two ternary branches deep
        let root = widget_code(snap, forest, forest.roots[0], 5, Binding::ScreenData)?;
        Ok(format!(
            "_loading\n{p4}? const Center(child: CircularProgressIndicator())\n\
             {p4}: _error != null\n{p5}? Center(child: Text('Error: $_error'))\n{p5}: {root}",
            p4 = "  ".repeat(4),
            p5 = "  ".repeat(5),
        ))
    } else {
        widget_code(snap, forest, forest.roots[0], 3, Binding::ScreenData)
    }
}

struct Usage {
    uses_api: bool,
    uses_url_launcher: bool,
    /// Data source backing screen-level field reads, if any.
    screen_source: Option<String>,
}

/// One pass over the resolved properties to decide imports and state.
/// Field reads under a bound list consume the row, not the screen payload,
/// so they do not force a screen-level load.
fn scan_usage(snap: &Snapshot, forest: &WidgetForest) -> Result<Usage, GenerateError> {
    let mut usage = Usage {
        uses_api: false,
        uses_url_launcher: false,
        screen_source: None,
    };
    let resolver = Resolver::new(snap);

    let mut stack: Vec<(usize, bool)> = forest.roots.iter().map(|&i| (i, false)).collect();
    while let Some((idx, in_list)) = stack.pop() {
        let node = forest.node(idx);
        let props = resolver.resolve(node.widget)?;

        let mut binds_list = false;
        for (name, value) in &props {
            match value {
                ResolvedValue::Field { source, .. } => {
                    usage.uses_api = true;
                    if name == "items" {
                        binds_list = true;
                    } else if !in_list && usage.screen_source.is_none() {
                        usage.screen_source = Some(source.name.clone());
                    }
                }
                ResolvedValue::Action(action) => {
                    if super::actions::needs_api_service(action) {
                        usage.uses_api = true;
                    }
                    if super::actions::needs_url_launcher(action) {
                        usage.uses_url_launcher = true;
                    }
                }
                _ => {}
            }
        }

        for &child in &node.children {
            stack.push((child, in_list || binds_list));
        }
    }

    Ok(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(json: &str) -> Snapshot {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn plain_screen_renders_a_scaffold() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [
                    {"id": 1, "name": "Product List", "route": "/", "is_home": true, "app_bar_title": "Products"}
                ],
                "widgets": [
                    {"id": 1, "screen": 1, "kind": "Center", "order": 0},
                    {"id": 2, "screen": 1, "kind": "Text", "order": 0, "parent": 1}
                ],
                "properties": [
                    {"id": 1, "widget": 2, "name": "text", "kind": "string", "string_value": "Hello"}
                ]
            }"#,
        );
        let out = emit(&s, &s.screens[0]).unwrap();
        assert!(out.contains("class ProductListScreen extends StatefulWidget {"));
        assert!(out.contains("class _ProductListScreenState extends State<ProductListScreen> {"));
        assert!(out.contains("appBar: AppBar(title: Text('Products')),"));
        assert!(out.contains("body: Center("));
        assert!(out.contains("Text('Hello')"));
        // nothing touches the network on this screen
        assert!(!out.contains("api_service.dart"));
        assert!(!out.contains("_api"));
    }

    #[test]
    fn hidden_app_bar_and_background_color() {
        let s = snap(
            r##"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [
                    {"id": 1, "name": "Splash", "route": "/", "is_home": true,
                     "show_app_bar": false, "background_color": "#112233"}
                ],
                "widgets": [{"id": 1, "screen": 1, "kind": "Text", "order": 0}],
                "properties": [
                    {"id": 1, "widget": 1, "name": "text", "kind": "string", "string_value": "Loading"}
                ]
            }"##,
        );
        let out = emit(&s, &s.screens[0]).unwrap();
        assert!(!out.contains("appBar:"));
        assert!(out.contains("backgroundColor: Color(0xFF112233),"));
        assert!(out.contains("body: Text('Loading'),"));
    }

    #[test]
    fn widgetless_screen_is_rejected() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [{"id": 1, "name": "Empty", "route": "/", "is_home": true}]
            }"#,
        );
        let err = emit(&s, &s.screens[0]).unwrap_err();
        assert!(matches!(err, GenerateError::MultipleRoots { count: 0, .. }));
    }

    #[test]
    fn screen_level_binding_adds_the_loading_state() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [{"id": 1, "name": "Detail", "route": "/", "is_home": true}],
                "widgets": [{"id": 1, "screen": 1, "kind": "Text", "order": 0}],
                "properties": [
                    {"id": 1, "widget": 1, "name": "text", "kind": "data_source_field_reference", "data_source_field_id": 4}
                ],
                "data_sources": [{"id": 2, "name": "Product Detail", "endpoint": "/product"}],
                "data_source_fields": [
                    {"id": 4, "data_source": 2, "name": "title", "field_type": "string", "required": true}
                ]
            }"#,
        );
        let out = emit(&s, &s.screens[0]).unwrap();
        assert!(out.contains("import '../services/api_service.dart';"));
        assert!(out.contains("final ApiService _api = ApiService();"));
        assert!(out.contains("Map<String, dynamic>? _data;"));
        assert!(out.contains("final rows = await _api.fetchProductDetail();"));
        assert!(out.contains("body: _loading"));
        assert!(out.contains("Text((_data?['title'] ?? '').toString())"));
    }

    #[test]
    fn list_bound_screen_skips_the_screen_level_load() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [{"id": 1, "name": "Catalog", "route": "/", "is_home": true}],
                "widgets": [
                    {"id": 1, "screen": 1, "kind": "ListView", "order": 0},
                    {"id": 2, "screen": 1, "kind": "Text", "order": 0, "parent": 1}
                ],
                "properties": [
                    {"id": 1, "widget": 1, "name": "items", "kind": "data_source_field_reference", "data_source_field_id": 4},
                    {"id": 2, "widget": 2, "name": "text", "kind": "data_source_field_reference", "data_source_field_id": 4}
                ],
                "data_sources": [{"id": 2, "name": "Products", "endpoint": "/products"}],
                "data_source_fields": [
                    {"id": 4, "data_source": 2, "name": "title", "field_type": "string", "required": true}
                ]
            }"#,
        );
        let out = emit(&s, &s.screens[0]).unwrap();
        assert!(out.contains("final ApiService _api = ApiService();"));
        // rows come through the FutureBuilder, not initState
        assert!(!out.contains("Map<String, dynamic>? _data;"));
        assert!(!out.contains("initState"));
        assert!(out.contains("body: FutureBuilder<List<dynamic>>("));
    }

    #[test]
    fn url_actions_pull_in_the_launcher_import() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [{"id": 1, "name": "About", "route": "/", "is_home": true}],
                "widgets": [{"id": 1, "screen": 1, "kind": "TextButton", "order": 0}],
                "properties": [
                    {"id": 1, "widget": 1, "name": "text", "kind": "string", "string_value": "Site"},
                    {"id": 2, "widget": 1, "name": "onPressed", "kind": "action_reference", "action_id": 7}
                ],
                "actions": [{"id": 7, "name": "Open Site", "kind": "open_url", "url": "https://example.com"}]
            }"#,
        );
        let out = emit(&s, &s.screens[0]).unwrap();
        assert!(out.contains("import 'package:url_launcher/url_launcher.dart';"));
        assert!(out.contains("launchUrl(Uri.parse('https://example.com'))"));
    }

    #[test]
    fn two_roots_fail_the_screen() {
        let s = snap(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "screens": [{"id": 1, "name": "Home", "route": "/", "is_home": true}],
                "widgets": [
                    {"id": 1, "screen": 1, "kind": "Text", "order": 0},
                    {"id": 2, "screen": 1, "kind": "Text", "order": 1}
                ],
                "properties": [
                    {"id": 1, "widget": 1, "name": "text", "kind": "string", "string_value": "a"},
                    {"id": 2, "widget": 2, "name": "text", "kind": "string", "string_value": "b"}
                ]
            }"#,
        );
        let err = emit(&s, &s.screens[0]).unwrap_err();
        assert!(matches!(err, GenerateError::MultipleRoots { count: 2, .. }));
    }
}
