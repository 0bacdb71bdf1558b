use std::collections::BTreeMap;

use crate::error::GenerateError;
use crate::model::{Action, DataSource, DataSourceField, Screen, Snapshot, Widget, WidgetProperty};

/// A stored property after slot selection and reference chasing. Literal
/// slots borrow from the snapshot; reference slots become the target entity
/// itself.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedValue<'a> {
    Str(&'a str),
    Int(i64),
    Decimal(f64),
    Bool(bool),
    Color(&'a str),
    Alignment(&'a str),
    Url(&'a str),
    Json(&'a str),
    Action(&'a Action),
    Field {
        field: &'a DataSourceField,
        source: &'a DataSource,
    },
    Screen(&'a Screen),
}

pub type ResolvedProps<'a> = BTreeMap<String, ResolvedValue<'a>>;

pub struct Resolver<'a> {
    snap: &'a Snapshot,
}

impl<'a> Resolver<'a> {
    pub fn new(snap: &'a Snapshot) -> Self {
        Self { snap }
    }

    /// Resolve every property of `widget` into a name -> value map.
    /// Purely read/derive; fails loudly on duplicate names, empty slots,
    /// unknown type tags, and dangling references.
    pub fn resolve(&self, widget: &Widget) -> Result<ResolvedProps<'a>, GenerateError> {
        let mut out = ResolvedProps::new();

        for prop in self.snap.properties_of_widget(widget.id) {
            let value = self.resolve_one(prop)?;
            if out.insert(prop.name.clone(), value).is_some() {
                // Names are case-sensitive and unique per widget. Detect,
                // do not guess which record wins.
                return Err(GenerateError::SchemaViolation {
                    detail: format!("widget {} has duplicate property '{}'", widget.id, prop.name),
                });
            }
        }

        Ok(out)
    }

    fn resolve_one(&self, prop: &'a WidgetProperty) -> Result<ResolvedValue<'a>, GenerateError> {
        let missing = || GenerateError::SchemaViolation {
            detail: format!(
                "widget {} property '{}' of type '{}' has no value in its slot",
                prop.widget, prop.name, prop.kind
            ),
        };

        match prop.kind.as_str() {
            "string" => prop
                .string_value
                .as_deref()
                .map(ResolvedValue::Str)
                .ok_or_else(missing),
            "integer" => prop.integer_value.map(ResolvedValue::Int).ok_or_else(missing),
            "decimal" => prop
                .decimal_value
                .map(ResolvedValue::Decimal)
                .ok_or_else(missing),
            "boolean" => prop
                .boolean_value
                .map(ResolvedValue::Bool)
                .ok_or_else(missing),
            "color" => prop
                .color_value
                .as_deref()
                .map(ResolvedValue::Color)
                .ok_or_else(missing),
            "alignment" => prop
                .alignment_value
                .as_deref()
                .map(ResolvedValue::Alignment)
                .ok_or_else(missing),
            "url" => prop
                .url_value
                .as_deref()
                .map(ResolvedValue::Url)
                .ok_or_else(missing),
            "json" => prop
                .json_value
                .as_deref()
                .map(ResolvedValue::Json)
                .ok_or_else(missing),

            "action_reference" => {
                let id = prop.action_id.ok_or_else(missing)?;
                let action = self
                    .snap
                    .action(id)
                    .ok_or_else(|| self.dangling(prop, "action", id))?;
                Ok(ResolvedValue::Action(action))
            }
            "data_source_field_reference" => {
                let id = prop.data_source_field_id.ok_or_else(missing)?;
                let field = self
                    .snap
                    .data_source_field(id)
                    .ok_or_else(|| self.dangling(prop, "data source field", id))?;
                let source = self
                    .snap
                    .data_source(field.data_source)
                    .ok_or_else(|| self.dangling(prop, "data source", field.data_source))?;
                Ok(ResolvedValue::Field { field, source })
            }
            "screen_reference" => {
                let id = prop.screen_id.ok_or_else(missing)?;
                let screen = self
                    .snap
                    .screen(id)
                    .ok_or_else(|| self.dangling(prop, "screen", id))?;
                Ok(ResolvedValue::Screen(screen))
            }

            other => Err(GenerateError::UnsupportedPropertyType {
                widget: prop.widget,
                property: prop.name.clone(),
                kind: other.to_string(),
            }),
        }
    }

    fn dangling(&self, prop: &WidgetProperty, what: &str, id: u64) -> GenerateError {
        GenerateError::DanglingReference {
            entity: format!("widget {}", prop.widget),
            property: prop.name.clone(),
            target: format!("{what} {id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, Widget, WidgetProperty};

    fn empty_snapshot() -> Snapshot {
        serde_json::from_str(
            r#"{
                "application": {"id": 1, "name": "Demo", "package_name": "com.example.demo"},
                "theme": {"name": "Default"}
            }"#,
        )
        .unwrap()
    }

    fn prop(widget: EntityId, name: &str, kind: &str) -> WidgetProperty {
        WidgetProperty {
            id: 0,
            widget,
            name: name.to_string(),
            kind: kind.to_string(),
            string_value: None,
            integer_value: None,
            decimal_value: None,
            boolean_value: None,
            color_value: None,
            alignment_value: None,
            url_value: None,
            json_value: None,
            action_id: None,
            data_source_field_id: None,
            screen_id: None,
        }
    }

    fn text_widget(id: EntityId) -> Widget {
        Widget {
            id,
            screen: 1,
            kind: "Text".to_string(),
            parent: None,
            order: 0,
            handle: None,
        }
    }

    #[test]
    fn literal_slots_resolve() {
        let mut snap = empty_snapshot();
        let mut p = prop(7, "text", "string");
        p.string_value = Some("hello".to_string());
        snap.properties.push(p);
        snap.widgets.push(text_widget(7));

        let props = Resolver::new(&snap).resolve(snap.widget(7).unwrap()).unwrap();
        assert!(matches!(props.get("text"), Some(ResolvedValue::Str("hello"))));
    }

    #[test]
    fn empty_slot_is_schema_violation() {
        let mut snap = empty_snapshot();
        snap.properties.push(prop(7, "text", "string"));
        snap.widgets.push(text_widget(7));

        let err = Resolver::new(&snap).resolve(snap.widget(7).unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaViolation { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut snap = empty_snapshot();
        for _ in 0..2 {
            let mut p = prop(7, "text", "string");
            p.string_value = Some("x".to_string());
            snap.properties.push(p);
        }
        snap.widgets.push(text_widget(7));

        let err = Resolver::new(&snap).resolve(snap.widget(7).unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::SchemaViolation { .. }));
    }

    #[test]
    fn dangling_action_reference_fails() {
        let mut snap = empty_snapshot();
        let mut p = prop(7, "onPressed", "action_reference");
        p.action_id = Some(99);
        snap.properties.push(p);
        snap.widgets.push(text_widget(7));

        let err = Resolver::new(&snap).resolve(snap.widget(7).unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::DanglingReference { .. }));
    }

    #[test]
    fn unknown_type_tag_fails() {
        let mut snap = empty_snapshot();
        snap.properties.push(prop(7, "blob", "hologram"));
        snap.widgets.push(text_widget(7));

        let err = Resolver::new(&snap).resolve(snap.widget(7).unwrap()).unwrap_err();
        assert!(matches!(err, GenerateError::UnsupportedPropertyType { .. }));
    }
}
