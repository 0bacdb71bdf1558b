use crate::dart::{to_camel_case, to_pascal_case, DartWriter};
use crate::model::{DataSourceField, Snapshot};

/// Render `lib/models/app_models.dart`: one typed record class per
/// DataSource with an accessor per declared field.
pub fn emit(snap: &Snapshot) -> String {
    let mut w = DartWriter::new();
    w.line("// Data models generated from the application's data sources.");
    w.blank();

    if snap.data_sources.is_empty() {
        w.line("// This application declares no data sources.");
        return w.finish();
    }

    for (i, source) in snap.data_sources.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        let class_name = format!("{}Item", to_pascal_case(&source.name));
        let fields = snap.fields_of_data_source(source.id);

        w.open(&format!("class {class_name} {{"));
        for field in &fields {
            let ty = dart_type(field);
            w.line(&format!("final {ty} {};", to_camel_case(&field.name)));
        }
        w.blank();

        w.open(&format!("const {class_name}({{"));
        for field in &fields {
            let name = to_camel_case(&field.name);
            if field.required {
                w.line(&format!("required this.{name},"));
            } else {
                w.line(&format!("this.{name},"));
            }
        }
        w.close("});");
        w.blank();

        w.open(&format!(
            "factory {class_name}.fromJson(Map<String, dynamic> json) {{"
        ));
        w.open(&format!("return {class_name}("));
        for field in &fields {
            w.line(&format!(
                "{}: {},",
                to_camel_case(&field.name),
                from_json_expr(field)
            ));
        }
        w.close(");");
        w.close("}");
        w.close("}");
    }

    w.finish()
}

fn dart_type(field: &DataSourceField) -> String {
    let base = match field.field_type.as_str() {
        "integer" => "int",
        "decimal" => "double",
        "boolean" => "bool",
        "date" | "datetime" => "DateTime",
        // string, url, image_url, email and anything untyped
        _ => "String",
    };
    if field.required {
        base.to_string()
    } else {
        format!("{base}?")
    }
}

fn from_json_expr(field: &DataSourceField) -> String {
    let key = format!("json['{}']", field.name);
    match (field.field_type.as_str(), field.required) {
        ("integer", true) => format!("({key} as num?)?.toInt() ?? 0"),
        ("integer", false) => format!("({key} as num?)?.toInt()"),
        ("decimal", true) => format!("({key} as num?)?.toDouble() ?? 0.0"),
        ("decimal", false) => format!("({key} as num?)?.toDouble()"),
        ("boolean", true) => format!("{key} as bool? ?? false"),
        ("boolean", false) => format!("{key} as bool?"),
        ("date" | "datetime", true) => format!(
            "DateTime.tryParse({key}?.toString() ?? '') ?? DateTime.fromMillisecondsSinceEpoch(0)"
        ),
        ("date" | "datetime", false) => format!("DateTime.tryParse({key}?.toString() ?? '')"),
        (_, true) => format!("{key}?.toString() ?? ''"),
        (_, false) => format!("{key}?.toString()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_follow_field_declarations() {
        let snap: Snapshot = serde_json::from_str(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"},
                "data_sources": [
                    {"id": 1, "name": "Product List", "endpoint": "/products"}
                ],
                "data_source_fields": [
                    {"id": 1, "data_source": 1, "name": "product_name", "field_type": "string", "required": true},
                    {"id": 2, "data_source": 1, "name": "price", "field_type": "decimal", "required": true},
                    {"id": 3, "data_source": 1, "name": "in_stock", "field_type": "boolean"}
                ]
            }"#,
        )
        .unwrap();

        let out = emit(&snap);
        assert!(out.contains("class ProductListItem {"));
        assert!(out.contains("final String productName;"));
        assert!(out.contains("final double price;"));
        assert!(out.contains("final bool? inStock;"));
        assert!(out.contains("price: (json['price'] as num?)?.toDouble() ?? 0.0,"));
        assert!(out.contains("inStock: json['in_stock'] as bool?,"));
    }

    #[test]
    fn no_sources_yields_a_stub() {
        let snap: Snapshot = serde_json::from_str(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"}
            }"#,
        )
        .unwrap();
        assert!(emit(&snap).contains("declares no data sources"));
    }
}
