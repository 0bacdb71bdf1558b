use crate::dart::{escape_string, to_pascal_case, to_snake_case, DartWriter};
use crate::model::{Snapshot, TransportKind};

/// Render `lib/services/app_config.dart`: the generated client's endpoint
/// configuration. Resolution order is fixed: persisted user override, then
/// the last server-confirmed default, then the compiled-in default.
pub fn emit_app_config(snap: &Snapshot) -> String {
    let app = &snap.application;
    let compiled = escape_string(app.default_base_url.as_deref().unwrap_or(""));

    let mut w = DartWriter::new();
    w.line("import 'package:http/http.dart' as http;");
    w.line("import 'package:shared_preferences/shared_preferences.dart';");
    w.blank();
    w.line("/// Endpoint configuration for this app.");
    w.line("/// Resolution order: user override > confirmed server default > compiled-in default.");
    w.open("class AppConfig {");
    w.line(&format!("static const String compiledDefaultBaseUrl = '{compiled}';"));
    w.line(&format!(
        "static const bool allowEndpointOverride = {};",
        app.allow_endpoint_override
    ));
    w.blank();
    w.line("static const String _overrideKey = 'override_base_url';");
    w.line("static const String _confirmedKey = 'confirmed_base_url';");
    w.blank();

    w.open("static Future<String> resolveBaseUrl() async {");
    w.line("final prefs = await SharedPreferences.getInstance();");
    w.open("if (allowEndpointOverride) {");
    w.line("final override = prefs.getString(_overrideKey);");
    w.line("if (override != null && override.isNotEmpty) return override;");
    w.close("}");
    w.line("final confirmed = prefs.getString(_confirmedKey);");
    w.line("if (confirmed != null && confirmed.isNotEmpty) return confirmed;");
    w.line("if (compiledDefaultBaseUrl.isNotEmpty) return compiledDefaultBaseUrl;");
    w.line("throw Exception('No server URL configured. Set one from the configuration screen.');");
    w.close("}");
    w.blank();

    w.line("/// Remember the base URL the server last confirmed.");
    w.open("static Future<void> confirmServerDefault(String url) async {");
    w.line("final prefs = await SharedPreferences.getInstance();");
    w.line("await prefs.setString(_confirmedKey, url);");
    w.close("}");
    w.blank();

    w.line("/// Probe the candidate endpoint; only a reachable one is persisted.");
    w.open("static Future<bool> setOverride(String candidate) async {");
    w.line("if (!allowEndpointOverride) return false;");
    w.line("final ok = await revalidate(candidate);");
    w.line("if (!ok) return false;");
    w.line("final prefs = await SharedPreferences.getInstance();");
    w.line("await prefs.setString(_overrideKey, candidate);");
    w.line("return true;");
    w.close("}");
    w.blank();

    w.open("static Future<void> clearOverride() async {");
    w.line("final prefs = await SharedPreferences.getInstance();");
    w.line("await prefs.remove(_overrideKey);");
    w.close("}");
    w.blank();

    w.open("static Future<bool> revalidate(String candidate) async {");
    w.open("try {");
    w.line("final uri = Uri.parse('$candidate/api/health');");
    w.line("final response = await http.get(uri).timeout(const Duration(seconds: 5));");
    w.line("return response.statusCode == 200;");
    w.chain("} catch (_) {");
    w.line("return false;");
    w.close("}");
    w.close("}");
    w.close("}");
    w.finish()
}

/// Render `lib/services/api_service.dart`: one typed fetch method per data
/// source plus a name-keyed dispatch, base URLs resolved through AppConfig.
pub fn emit_api_service(snap: &Snapshot) -> String {
    let has_static = snap
        .data_sources
        .iter()
        .any(|d| d.transport == TransportKind::StaticJson);

    let mut w = DartWriter::new();
    w.line("import 'dart:convert';");
    w.blank();
    if has_static {
        w.line("import 'package:flutter/services.dart' show rootBundle;");
    }
    w.line("import 'package:http/http.dart' as http;");
    w.blank();
    w.line("import 'app_config.dart';");
    w.blank();

    w.open("class ApiService {");
    w.line("static final ApiService _instance = ApiService._internal();");
    w.line("factory ApiService() => _instance;");
    w.line("ApiService._internal();");
    w.blank();
    w.line("String? _cachedBaseUrl;");
    w.blank();

    w.open("Future<String> _resolveBaseUrl(String compiledDefault, bool dynamicBaseUrl) async {");
    w.line("if (!dynamicBaseUrl && compiledDefault.isNotEmpty) return compiledDefault;");
    w.line("_cachedBaseUrl ??= await AppConfig.resolveBaseUrl();");
    w.line("return _cachedBaseUrl!;");
    w.close("}");
    w.blank();

    w.line("/// Drop the cached URL after the configuration changes.");
    w.open("void clearCache() {");
    w.line("_cachedBaseUrl = null;");
    w.close("}");

    for source in &snap.data_sources {
        w.blank();
        let method_name = format!("fetch{}", to_pascal_case(&source.name));
        match source.transport {
            TransportKind::StaticJson => {
                let asset = format!("assets/data/{}.json", to_snake_case(&source.name));
                w.open(&format!("Future<List<dynamic>> {method_name}() async {{"));
                w.line(&format!("final raw = await rootBundle.loadString('{asset}');"));
                w.line("final data = json.decode(raw);");
                w.line("return data is List ? data : [data];");
                w.close("}");
            }
            TransportKind::RestApi => {
                let base = escape_string(source.base_url.as_deref().unwrap_or(""));
                let endpoint = escape_string(&source.endpoint);
                let verb = source.method.to_lowercase();

                w.open(&format!("Future<List<dynamic>> {method_name}() async {{"));
                w.open("try {");
                w.line(&format!(
                    "final baseUrl = await _resolveBaseUrl('{base}', {});",
                    source.use_dynamic_base_url
                ));
                w.line(&format!("final uri = Uri.parse('${{baseUrl}}{endpoint}');"));
                w.open(&format!("final response = await http.{verb}(uri, headers: {{"));
                w.line("'Content-Type': 'application/json',");
                for (key, value) in &source.headers {
                    w.line(&format!("'{}': '{}',", escape_string(key), escape_string(value)));
                }
                w.close("});");
                w.open("if (response.statusCode == 200) {");
                w.line("final data = json.decode(response.body);");
                w.line("return data is List ? data : [data];");
                w.close("}");
                w.line(&format!(
                    "throw Exception('Failed to load {}: ${{response.statusCode}}');",
                    escape_string(&source.name)
                ));
                w.chain("} catch (e) {");
                w.line("throw Exception('Network error: $e');");
                w.close("}");
                w.close("}");
            }
        }
    }

    w.blank();
    w.open("Future<List<dynamic>> fetchData(String dataSourceName) async {");
    w.open("switch (dataSourceName) {");
    for source in &snap.data_sources {
        w.line(&format!(
            "case '{}': return fetch{}();",
            escape_string(&source.name),
            to_pascal_case(&source.name)
        ));
    }
    w.line("default: throw Exception('Unknown data source: $dataSourceName');");
    w.close("}");
    w.close("}");
    w.close("}");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap() -> Snapshot {
        serde_json::from_str(
            r#"{
                "application": {
                    "id": 1, "name": "Demo", "package_name": "com.example.demo",
                    "default_base_url": "https://api.example.com",
                    "allow_endpoint_override": true
                },
                "theme": {"name": "Default"},
                "data_sources": [
                    {
                        "id": 1, "name": "Product List", "endpoint": "/products",
                        "base_url": "https://api.example.com", "method": "GET",
                        "headers": {"X-Api-Key": "abc"}
                    },
                    {
                        "id": 2, "name": "Categories", "transport": "static_json"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn app_config_carries_the_layered_resolution() {
        let out = emit_app_config(&snap());
        assert!(out.contains("compiledDefaultBaseUrl = 'https://api.example.com'"));
        assert!(out.contains("allowEndpointOverride = true"));
        assert!(out.contains("_overrideKey"));
        assert!(out.contains("revalidate"));
        // override layer is consulted before the confirmed default
        let override_at = out.find("getString(_overrideKey)").unwrap();
        let confirmed_at = out.find("getString(_confirmedKey)").unwrap();
        assert!(override_at < confirmed_at);
    }

    #[test]
    fn rest_sources_get_fetch_methods_with_headers() {
        let out = emit_api_service(&snap());
        assert!(out.contains("Future<List<dynamic>> fetchProductList() async {"));
        assert!(out.contains("'X-Api-Key': 'abc',"));
        assert!(out.contains("Uri.parse('${baseUrl}/products')"));
        assert!(out.contains("case 'Product List': return fetchProductList();"));
    }

    #[test]
    fn static_sources_read_from_bundled_assets() {
        let out = emit_api_service(&snap());
        assert!(out.contains("rootBundle.loadString('assets/data/categories.json')"));
    }
}
